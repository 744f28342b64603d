pub mod orders;
pub mod tasks;

use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Reference number identifying one order, e.g. `RN123456789`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReferenceNumber(String);

impl ReferenceNumber {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ReferenceNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ReferenceNumber {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ReferenceNumber {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl PartialEq<str> for ReferenceNumber {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for ReferenceNumber {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}
