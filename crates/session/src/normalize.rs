//! Provider reply to display text.

use proto::ProviderReply;

/// Converts a classified provider reply into displayable text.
///
/// Never fails: unrecognized shapes are rendered as their JSON text.
pub fn normalize(reply: &ProviderReply) -> String {
    match reply {
        ProviderReply::Text(text) | ProviderReply::Message(text) => text.clone(),
        ProviderReply::Opaque(value) => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn string_reply_is_returned_verbatim() {
        let reply = ProviderReply::from("  spaced\nlines  ");
        assert_eq!(normalize(&reply), "  spaced\nlines  ");
    }

    #[test]
    fn nested_content_is_extracted() {
        let reply = ProviderReply::from_value(json!({"message": {"content": "x"}}));
        assert_eq!(normalize(&reply), "x");
    }

    #[test]
    fn unknown_object_falls_back_to_json_text() {
        let reply = ProviderReply::from_value(json!({"foo": 1}));
        let text = normalize(&reply);
        assert!(!text.is_empty());
        assert_eq!(text, r#"{"foo":1}"#);
    }

    #[test]
    fn null_reply_still_yields_text() {
        let reply = ProviderReply::from_value(json!(null));
        assert_eq!(normalize(&reply), "null");
    }

    #[test]
    fn empty_string_reply_stays_empty() {
        assert_eq!(normalize(&ProviderReply::from("")), "");
    }
}
