use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque product identifier (stock code or description, depending on how the
/// basket matrix was keyed). The derived `Ord` defines the universe order used
/// for canonical itemsets.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub String);

impl ItemId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for ItemId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<u64> for ItemId {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}
