use serde::{Deserialize, Serialize};

use super::ResourceId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub id: ResourceId,
    pub name: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub avatar: Option<String>,
}

/// Payload for `POST /authors`. `avatar` is always sent, as `null` when unset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NewAuthor {
    pub name: String,
    pub bio: String,
    pub avatar: Option<String>,
}

/// Payload for `PATCH /authors/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorUpdate {
    #[serde(skip_serializing)]
    pub id: ResourceId,
    #[serde(flatten)]
    pub fields: NewAuthor,
}
