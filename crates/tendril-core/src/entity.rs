//! Entity identifiers

use serde::{Deserialize, Serialize};

/// Identifier of an entity whose relations are being reconciled.
///
/// Entities are owned by the caller; Tendril only ever refers to them by id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&String> for EntityId {
    fn from(s: &String) -> Self {
        Self(s.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_id_display() {
        let id = EntityId::new("device-42");
        assert_eq!(id.as_str(), "device-42");
        assert_eq!(id.to_string(), "device-42");
    }

    #[test]
    fn test_entity_id_serializes_as_plain_string() {
        let id = EntityId::from("site-1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"site-1\"");
    }
}
