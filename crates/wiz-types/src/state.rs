use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::ids::AssetId;

/// Persisted global state of the membership contract.
///
/// Written once by the creating call and never changed afterwards; it goes
/// away only when the manager deletes the application.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalState {
    /// The only address allowed to administer the contract.
    pub manager: Address,
    /// The membership token pool this contract issues from.
    pub tracked_asset_id: AssetId,
}

impl GlobalState {
    /// Storage the contract needs: one address slot and one integer slot.
    pub const SCHEMA: StateSchema = StateSchema {
        byte_slices: 1,
        uints: 1,
    };

    pub fn new(manager: Address, tracked_asset_id: AssetId) -> Self {
        Self {
            manager,
            tracked_asset_id,
        }
    }

    /// Returns `true` if `address` is the manager.
    pub fn is_manager(&self, address: &Address) -> bool {
        self.manager == *address
    }
}

/// Fixed-capacity global storage reserved for an application at deployment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateSchema {
    /// Number of byte-string slots.
    pub byte_slices: u8,
    /// Number of integer slots.
    pub uints: u8,
}

impl StateSchema {
    /// Returns `true` if this schema has room for everything `required` needs.
    pub fn fits(&self, required: &StateSchema) -> bool {
        self.byte_slices >= required.byte_slices && self.uints >= required.uints
    }
}

impl Default for StateSchema {
    fn default() -> Self {
        GlobalState::SCHEMA
    }
}
