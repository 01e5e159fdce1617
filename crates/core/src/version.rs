//! Data version counter

use serde::{Deserialize, Serialize};
use std::fmt;

/// Monotonic identifier of a consistent Point Store snapshot.
///
/// Every store mutation produces a strictly greater version. Version 0 is the
/// empty store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct DataVersion(pub u64);

impl DataVersion {
    pub const INITIAL: DataVersion = DataVersion(0);

    pub fn next(self) -> DataVersion {
        DataVersion(self.0 + 1)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for DataVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}
