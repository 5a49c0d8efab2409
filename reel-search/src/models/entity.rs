//! Normalized typeahead lookup result

use serde::{Deserialize, Serialize};

/// Lookup result in the shape every filter understands
///
/// Produced by the lookup projections from whatever the backend returned.
/// Identity is the `id`; two entities with equal ids are the same selection
/// even if their display fields differ.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl Entity {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            image_url: None,
        }
    }

    /// Entity rebuilt from a bare identifier (URL decoding)
    ///
    /// Display metadata is not carried in URLs, so the id doubles as name.
    pub fn from_id(id: impl Into<String>) -> Self {
        let id = id.into();
        Self::new(id.clone(), id)
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_image_url(mut self, image_url: Option<String>) -> Self {
        self.image_url = image_url;
        self
    }

    pub fn same_id(&self, other: &Entity) -> bool {
        self.id == other.id
    }
}
