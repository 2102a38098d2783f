//! Storage scopes.

use serde::{Deserialize, Serialize};

/// A storage namespace qualifier: one network, or the global fallback shared
/// by every network.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Global,
    Network(String),
}

impl Scope {
    /// Create a network scope.
    pub fn network(name: impl Into<String>) -> Self {
        Self::Network(name.into())
    }

    /// The scope consulted when a lookup in this one comes up empty.
    pub fn fallback(&self) -> Option<Scope> {
        match self {
            Self::Global => None,
            Self::Network(_) => Some(Self::Global),
        }
    }

    /// Network name, if this is a network scope.
    pub fn network_name(&self) -> Option<&str> {
        match self {
            Self::Global => None,
            Self::Network(name) => Some(name),
        }
    }

    /// Whether this is the global scope.
    pub fn is_global(&self) -> bool {
        matches!(self, Self::Global)
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Global => write!(f, "global"),
            Self::Network(name) => write!(f, "{}", name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback() {
        assert_eq!(Scope::network("freenode").fallback(), Some(Scope::Global));
        assert_eq!(Scope::Global.fallback(), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(Scope::network("oftc").to_string(), "oftc");
        assert_eq!(Scope::Global.to_string(), "global");
        assert_eq!(Scope::network("oftc").network_name(), Some("oftc"));
    }
}
