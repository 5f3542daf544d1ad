//! Entity identifiers.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::sync::OnceLock;

/// What a well-formed identifier refers to, read from its prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Item,
    Property,
}

/// Opaque knowledge-base identifier such as `Q42` or `P31`.
///
/// Equality is exact string match; nothing but the prefix is ever interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

fn id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[QP][0-9]+$").expect("Invalid regex pattern"))
}

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// `Some` only for `Q<digits>` / `P<digits>` identifiers.
    pub fn kind(&self) -> Option<EntityKind> {
        if !id_pattern().is_match(&self.0) {
            return None;
        }
        match self.0.as_bytes()[0] {
            b'Q' => Some(EntityKind::Item),
            _ => Some(EntityKind::Property),
        }
    }

    pub fn is_well_formed(&self) -> bool {
        self.kind().is_some()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for EntityId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl Borrow<str> for EntityId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for EntityId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_kind_from_prefix() {
        assert_eq!(EntityId::from("Q42").kind(), Some(EntityKind::Item));
        assert_eq!(EntityId::from("P31").kind(), Some(EntityKind::Property));
        assert_eq!(EntityId::from("L1").kind(), None);
        assert_eq!(EntityId::from("Q").kind(), None);
        assert_eq!(EntityId::from("Q4a").kind(), None);
        assert_eq!(EntityId::from("q42").kind(), None);
    }

    #[test]
    fn test_equality_is_exact() {
        assert_ne!(EntityId::from("Q42"), EntityId::from("Q042"));
        assert_eq!(EntityId::from("Q42"), EntityId::new(String::from("Q42")));
    }

    #[test]
    fn test_set_lookup_by_str() {
        let set: HashSet<EntityId> = ["Q1", "Q2"].into_iter().map(EntityId::from).collect();
        assert!(set.contains("Q1"));
        assert!(!set.contains("Q3"));
    }

    #[test]
    fn test_serde_transparent() {
        let id = EntityId::from("Q5");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"Q5\"");
        let back: EntityId = serde_json::from_str("\"Q5\"").unwrap();
        assert_eq!(back, id);
    }
}
