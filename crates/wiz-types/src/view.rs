use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::ids::{Amount, AppId, AssetId};

/// Read-only view of ledger holdings, as seen by a validator.
///
/// `holding` returns `None` when the account has not registered to the
/// asset, `Some(0)` when it is registered but holds nothing.
pub trait LedgerView {
    fn holding(&self, account: &Address, asset_id: AssetId) -> Option<Amount>;

    /// The account controlled by `app_id`.
    fn application_address(&self, app_id: AppId) -> Address {
        Address::for_application(app_id)
    }
}

impl<V: LedgerView + ?Sized> LedgerView for &V {
    fn holding(&self, account: &Address, asset_id: AssetId) -> Option<Amount> {
        (**self).holding(account, asset_id)
    }

    fn application_address(&self, app_id: AppId) -> Address {
        (**self).application_address(app_id)
    }
}

/// One `(account, asset) -> amount` row of a snapshot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoldingEntry {
    pub account: Address,
    pub asset_id: AssetId,
    pub amount: Amount,
}

/// Frozen holding table, detached from any ledger.
///
/// Used to evaluate groups offline and in tests. Serializes as a list of
/// [`HoldingEntry`] rows.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<HoldingEntry>", into = "Vec<HoldingEntry>")]
pub struct LedgerSnapshot {
    holdings: BTreeMap<(Address, AssetId), Amount>,
}

impl LedgerSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `account` to `asset_id` with the given amount.
    pub fn with_holding(mut self, account: Address, asset_id: AssetId, amount: Amount) -> Self {
        self.set_holding(account, asset_id, amount);
        self
    }

    pub fn set_holding(&mut self, account: Address, asset_id: AssetId, amount: Amount) {
        self.holdings.insert((account, asset_id), amount);
    }

    pub fn len(&self) -> usize {
        self.holdings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.holdings.is_empty()
    }
}

impl LedgerView for LedgerSnapshot {
    fn holding(&self, account: &Address, asset_id: AssetId) -> Option<Amount> {
        self.holdings.get(&(*account, asset_id)).copied()
    }
}

impl From<Vec<HoldingEntry>> for LedgerSnapshot {
    fn from(entries: Vec<HoldingEntry>) -> Self {
        let holdings = entries
            .into_iter()
            .map(|e| ((e.account, e.asset_id), e.amount))
            .collect();
        Self { holdings }
    }
}

impl From<LedgerSnapshot> for Vec<HoldingEntry> {
    fn from(snapshot: LedgerSnapshot) -> Self {
        snapshot
            .holdings
            .into_iter()
            .map(|((account, asset_id), amount)| HoldingEntry {
                account,
                asset_id,
                amount,
            })
            .collect()
    }
}
