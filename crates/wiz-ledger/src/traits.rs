use wiz_gate::{InnerTransfer, SignatureValidator};
use wiz_types::{
    Address, Amount, AppArg, AppId, AssetId, GlobalState, LedgerSnapshot, StateSchema,
    TransactionGroup,
};

use crate::config::LedgerConfig;
use crate::error::LedgerError;
use crate::records::{AssetParams, AssetRoles, ApplicationRecord, GroupReceipt};

/// Write boundary of the ledger.
///
/// Every method is atomic: on error nothing it touched is changed.
pub trait LedgerWriter: Send + Sync {
    /// Credit native units to `account`, creating it if needed. Returns the
    /// new balance.
    fn fund(&self, account: &Address, amount: Amount) -> Result<Amount, LedgerError>;

    fn create_asset(&self, creator: &Address, params: AssetParams)
        -> Result<AssetId, LedgerError>;

    fn destroy_asset(&self, sender: &Address, asset_id: AssetId) -> Result<(), LedgerError>;

    fn update_asset(
        &self,
        sender: &Address,
        asset_id: AssetId,
        roles: AssetRoles,
    ) -> Result<(), LedgerError>;

    /// Register `account` to `asset_id`.
    fn opt_in_asset(&self, account: &Address, asset_id: AssetId) -> Result<(), LedgerError>;

    /// Create an application. Its creating call runs through the approval
    /// validator like any other call.
    fn deploy_application(
        &self,
        sender: &Address,
        args: Vec<AppArg>,
        schema: StateSchema,
    ) -> Result<AppId, LedgerError>;

    fn submit_group(&self, group: &TransactionGroup) -> Result<GroupReceipt, LedgerError>;

    /// Apply a group authorized by a delegated signing template.
    fn submit_delegated_group(
        &self,
        group: &TransactionGroup,
        validator: &SignatureValidator,
    ) -> Result<GroupReceipt, LedgerError>;
}

/// Read boundary of the ledger.
pub trait LedgerReader: Send + Sync {
    fn config(&self) -> &LedgerConfig;

    fn asset_holding(
        &self,
        account: &Address,
        asset_id: AssetId,
    ) -> Result<Option<Amount>, LedgerError>;

    fn balance(&self, account: &Address) -> Result<Amount, LedgerError>;

    fn asset_params(&self, asset_id: AssetId) -> Result<AssetParams, LedgerError>;

    /// Sum of every holding of `asset_id`.
    fn asset_supply(&self, asset_id: AssetId) -> Result<Amount, LedgerError>;

    fn global_state(&self, app_id: AppId) -> Result<Option<GlobalState>, LedgerError>;

    fn application(&self, app_id: AppId) -> Result<ApplicationRecord, LedgerError>;

    /// Detached copy of every holding.
    fn snapshot(&self) -> Result<LedgerSnapshot, LedgerError>;
}

/// Executes transfers an application emits, as the application.
pub trait TransferEmitter {
    fn emit(&mut self, app: &Address, transfer: &InnerTransfer) -> Result<(), LedgerError>;
}
