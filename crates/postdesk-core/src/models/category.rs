use serde::{Deserialize, Serialize};

use super::ResourceId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: ResourceId,
    pub title: String,
}

/// Payload for `POST /categories`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NewCategory {
    pub title: String,
}

impl NewCategory {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
        }
    }
}

/// Payload for `PUT /categories/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryUpdate {
    #[serde(skip_serializing)]
    pub id: ResourceId,
    pub title: String,
}
