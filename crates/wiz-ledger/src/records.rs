use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use wiz_gate::InnerTransfer;
use wiz_types::{Address, Amount, AppId, AssetId, GlobalState, StateSchema};

// ---------------------------------------------------------------------------
// Assets
// ---------------------------------------------------------------------------

/// Creation parameters of an asset.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetParams {
    pub name: String,
    pub unit_name: String,
    /// Fixed supply, minted to the creator.
    pub total: Amount,
    pub decimals: u32,
    /// May reconfigure or destroy the asset.
    pub manager: Address,
    /// Holds the uncirculated supply.
    pub reserve: Address,
    pub freeze: Address,
    /// May move units out of any holding.
    pub clawback: Address,
    pub default_frozen: bool,
}

impl AssetParams {
    /// The membership token: indivisible, every role held by `owner`.
    pub fn membership(owner: Address, total: Amount) -> Self {
        Self {
            name: "WizCoin".into(),
            unit_name: "WZC".into(),
            total,
            decimals: 0,
            manager: owner,
            reserve: owner,
            freeze: owner,
            clawback: owner,
            default_frozen: false,
        }
    }

    pub fn roles(&self) -> AssetRoles {
        AssetRoles {
            manager: self.manager,
            reserve: self.reserve,
            freeze: self.freeze,
            clawback: self.clawback,
        }
    }
}

/// The reconfigurable part of [`AssetParams`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRoles {
    pub manager: Address,
    pub reserve: Address,
    pub freeze: Address,
    pub clawback: Address,
}

/// A created asset.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRecord {
    pub id: AssetId,
    pub creator: Address,
    pub params: AssetParams,
}

// ---------------------------------------------------------------------------
// Accounts and applications
// ---------------------------------------------------------------------------

/// Native balance plus asset registrations of one account.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRecord {
    pub balance: Amount,
    /// Registered assets. A missing key means "not registered".
    pub holdings: BTreeMap<AssetId, Amount>,
}

/// A deployed application.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationRecord {
    pub id: AppId,
    pub creator: Address,
    /// The account the application controls.
    pub address: Address,
    pub schema: StateSchema,
    pub state: Option<GlobalState>,
}

// ---------------------------------------------------------------------------
// Receipts
// ---------------------------------------------------------------------------

/// What a committed group did.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupReceipt {
    /// Hex BLAKE3 id of the group.
    pub group_id: String,
    /// Number of top-level transactions applied.
    pub applied: usize,
    /// Transfers emitted by application calls, in emission order.
    pub inner_transfers: Vec<InnerTransfer>,
    /// Id assigned to an application created by the group.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_application: Option<AppId>,
}
