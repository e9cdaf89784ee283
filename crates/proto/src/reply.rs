use serde_json::Value;

/// Raw reply from an inference provider, classified into the shapes the
/// client recognizes.
///
/// Provider reply formats are not contractually fixed, so anything outside
/// the recognized shapes is kept verbatim in [`ProviderReply::Opaque`].
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderReply {
    /// The provider answered with a bare string.
    Text(String),
    /// The provider answered with an object carrying `message.content`.
    Message(String),
    /// Any other JSON value.
    Opaque(Value),
}

impl ProviderReply {
    /// Classifies a JSON reply body.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::String(text) => Self::Text(text),
            other => match message_content(&other) {
                Some(content) => Self::Message(content),
                None => Self::Opaque(other),
            },
        }
    }
}

impl From<String> for ProviderReply {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for ProviderReply {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<Value> for ProviderReply {
    fn from(value: Value) -> Self {
        Self::from_value(value)
    }
}

/// Extracts `message.content` as text.
///
/// Accepts a non-empty string or an array of `{"type":"text","text":..}`
/// blocks whose text parts are concatenated.
fn message_content(value: &Value) -> Option<String> {
    match value.get("message")?.get("content")? {
        Value::String(text) if !text.is_empty() => Some(text.clone()),
        Value::Array(blocks) => {
            let text: String = blocks
                .iter()
                .filter(|block| {
                    block
                        .get("type")
                        .and_then(Value::as_str)
                        .is_none_or(|kind| kind == "text")
                })
                .filter_map(|block| block.get("text").and_then(Value::as_str))
                .collect();
            if text.is_empty() { None } else { Some(text) }
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn bare_string_is_text() {
        let reply = ProviderReply::from_value(json!("Hi there"));
        assert_eq!(reply, ProviderReply::Text("Hi there".to_string()));
    }

    #[test]
    fn nested_message_content_is_message() {
        let reply = ProviderReply::from_value(json!({"message": {"content": "x"}}));
        assert_eq!(reply, ProviderReply::Message("x".to_string()));
    }

    #[test]
    fn content_blocks_are_concatenated() {
        let reply = ProviderReply::from_value(json!({
            "message": {
                "role": "assistant",
                "content": [
                    {"type": "text", "text": "Hello, "},
                    {"type": "tool_use", "text": "ignored"},
                    {"type": "text", "text": "world"}
                ]
            }
        }));
        assert_eq!(reply, ProviderReply::Message("Hello, world".to_string()));
    }

    #[test]
    fn empty_content_falls_back_to_opaque() {
        let value = json!({"message": {"content": ""}});
        assert_eq!(
            ProviderReply::from_value(value.clone()),
            ProviderReply::Opaque(value)
        );
    }

    #[test]
    fn unknown_shapes_are_opaque() {
        for value in [json!({"foo": 1}), json!(42), json!(null), json!({"message": "x"})] {
            assert_eq!(
                ProviderReply::from_value(value.clone()),
                ProviderReply::Opaque(value)
            );
        }
    }
}
