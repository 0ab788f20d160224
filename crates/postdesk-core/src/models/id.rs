use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Server-assigned identifier.
///
/// Backends hand these out as JSON strings or numbers depending on how the
/// record was created; both normalize to a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ResourceId(String);

impl ResourceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl From<&str> for ResourceId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ResourceId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl<'de> Deserialize<'de> for ResourceId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Integer(i64),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Text(s) => ResourceId(s),
            Raw::Integer(n) => ResourceId(n.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_string_and_number() {
        let from_text: ResourceId = serde_json::from_str(r#""a1b2""#).expect("string id");
        let from_number: ResourceId = serde_json::from_str("42").expect("numeric id");

        assert_eq!(from_text.as_str(), "a1b2");
        assert_eq!(from_number.as_str(), "42");
        assert_eq!(serde_json::to_string(&from_number).expect("serialize"), r#""42""#);
    }
}
