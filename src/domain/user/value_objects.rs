use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// User Value Objects
// ============================================================================

/// Reference to a user account owned by the host application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(Uuid);

impl UserId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_ids_are_unique() {
        assert_ne!(UserId::new(), UserId::new());
    }

    #[test]
    fn test_user_id_serializes_as_bare_uuid() {
        let raw = Uuid::new_v4();
        let json = serde_json::to_string(&UserId::from_uuid(raw)).unwrap();
        assert_eq!(json, format!("\"{}\"", raw));
    }
}
