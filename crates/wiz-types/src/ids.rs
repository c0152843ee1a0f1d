use std::fmt;

use serde::{Deserialize, Serialize};

/// Quantity of native units or asset units.
pub type Amount = u64;

/// Identifier of an asset (token pool) on the ledger.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(pub u64);

impl AssetId {
    /// The raw integer id.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "asset#{}", self.0)
    }
}

impl From<u64> for AssetId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Identifier of a deployed application.
///
/// The id `0` is reserved: an application call carrying it is the call that
/// creates the application.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AppId(pub u64);

impl AppId {
    /// The id carried by the creating call.
    pub const CREATION: AppId = AppId(0);

    /// Returns `true` if this is the creation id.
    pub fn is_creation(self) -> bool {
        self.0 == 0
    }

    /// The raw integer id.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for AppId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "app#{}", self.0)
    }
}

impl From<u64> for AppId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}
