//! Opaque optimistic-concurrency version tag (spec.md §9).

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Opaque version string. Callers never parse it; they only compare it for
/// equality and pass the value they last observed back into a CAS write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(transparent)]
pub struct Etag(String);

impl Etag {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Etag {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Etag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for Etag {
    fn from(s: String) -> Self {
        Self(s)
    }
}
