//! The authenticated identity a session represents.

use std::fmt;

use serde::{Deserialize, Serialize};

/// An authenticated subject (the username a session was issued for).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Subject(String);

impl Subject {
    /// Wrap a subject name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The subject name.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume into the subject name.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Subject {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for Subject {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl AsRef<str> for Subject {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
