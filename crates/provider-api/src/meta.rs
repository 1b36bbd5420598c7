use serde::{Deserialize, Serialize};

/// Provider-scoped identifier for one search result.
///
/// Ids are only meaningful to the provider that produced them and are not
/// unique across providers.
pub type ResultId = String;

/// Resolved, display-ready metadata for one result id.
///
/// Immutable once fetched; cached by the aggregation core until the owning
/// provider is unregistered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultMeta {
    pub id: ResultId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Icon name or path, resolved lazily by the view layer.
    #[serde(default)]
    pub icon: Option<String>,
}

impl ResultMeta {
    /// Create a meta with the two required fields set.
    pub fn new(id: impl Into<ResultId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            icon: None,
        }
    }

    /// Attach a description, keeping only its first line.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        let description = description.into();
        let first_line = description.lines().next().unwrap_or_default();
        self.description = Some(first_line.to_string());
        self
    }

    /// Attach an icon reference.
    #[must_use]
    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    /// A meta is invalid when either required field is missing (empty).
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.id.is_empty() && !self.name.is_empty()
    }
}
