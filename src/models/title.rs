use serde::{Deserialize, Serialize};

/// One catalog record. Its position in the catalog is its matrix index.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Title {
    /// Display name, matched exactly when a user selects a title
    pub title: String,
}

impl Title {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
        }
    }
}
