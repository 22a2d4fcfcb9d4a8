use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a part token. Allocated monotonically starting at 1.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PartId(pub u64);

/// Identifier of a car token. Allocated monotonically starting at 1.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CarId(pub u64);

impl PartId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl CarId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for PartId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "part#{}", self.0)
    }
}

impl fmt::Display for CarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "car#{}", self.0)
    }
}

impl From<u64> for PartId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<u64> for CarId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}
