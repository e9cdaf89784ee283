use serde::{Deserialize, Serialize};

/// A selectable inference backend as advertised by the model directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Model {
    /// Stable identifier passed to the inference provider.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Display icon reference (usually a single emoji).
    #[serde(default)]
    pub icon: String,
    /// Vendor label, when the directory reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
}

impl Model {
    /// Creates a model entry without a vendor label.
    pub fn new(id: impl Into<String>, name: impl Into<String>, icon: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            icon: icon.into(),
            provider: None,
        }
    }

    /// Attaches a vendor label.
    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }
}

impl std::fmt::Display for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}
