//! Karma counters and their storage keys.

use serde::{Deserialize, Serialize};

/// Direction of a karma change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sign {
    Increase,
    Decrease,
}

impl Sign {
    /// Past-tense verb used in replies and trace records.
    pub fn verb(&self) -> &'static str {
        match self {
            Self::Increase => "increased",
            Self::Decrease => "decreased",
        }
    }

    pub fn is_increase(&self) -> bool {
        matches!(self, Self::Increase)
    }
}

/// Cumulative up/down counters for one object in one scope.
///
/// The net value is always derived; the legacy stored net value is only
/// consulted while reconciling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct KarmaCount {
    pub up: i64,
    pub down: i64,
}

impl KarmaCount {
    pub fn new(up: i64, down: i64) -> Self {
        Self { up, down }
    }

    /// Net karma, `up - down`, saturating at the `i64` bounds.
    pub fn net(&self) -> i64 {
        self.up.saturating_sub(self.down)
    }

    pub fn is_neutral(&self) -> bool {
        self.net() == 0
    }

    /// Apply a single vote.
    pub fn apply(&mut self, sign: Sign) {
        match sign {
            Sign::Increase => self.up = self.up.saturating_add(1),
            Sign::Decrease => self.down = self.down.saturating_add(1),
        }
    }
}

impl std::fmt::Display for KarmaCount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (+{}, -{})", self.net(), self.up, self.down)
    }
}

/// Canonical storage form of an object name.
pub fn canonicalize_object(object: &str) -> String {
    object.to_lowercase()
}

/// The three property keys that make up one karma record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KarmaKeys {
    /// Legacy net value, `karma_<object>`.
    pub current: String,
    /// `upkarma_<object>`.
    pub up: String,
    /// `downkarma_<object>`.
    pub down: String,
}

impl KarmaKeys {
    pub fn new(prefix: &str, object: &str) -> Self {
        let object = canonicalize_object(object);
        Self {
            current: format!("{}karma_{}", prefix, object),
            up: format!("{}upkarma_{}", prefix, object),
            down: format!("{}downkarma_{}", prefix, object),
        }
    }
}
