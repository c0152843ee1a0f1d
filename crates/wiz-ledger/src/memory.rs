use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use wiz_gate::{ApprovalValidator, Decision, InnerTransfer, SignatureValidator, StateChange};
use wiz_types::{
    Address, Amount, AppArg, AppId, ApplicationCall, AssetId, AssetTransfer, GlobalState,
    LedgerSnapshot, LedgerView, Payment, StateSchema, Transaction, TransactionGroup,
};

use crate::config::LedgerConfig;
use crate::error::LedgerError;
use crate::records::{
    AccountRecord, ApplicationRecord, AssetParams, AssetRecord, AssetRoles, GroupReceipt,
};
use crate::traits::{LedgerReader, LedgerWriter, TransferEmitter};

/// In-memory ledger for tests, local demos, and embedding.
///
/// Every write takes the lock once, works on a scratch copy of the state and
/// swaps it in only on success, so a group is applied entirely or not at
/// all. Holding the write lock across evaluation and application means the
/// holding a validator reads cannot change before its decision is applied.
pub struct InMemoryLedger {
    config: LedgerConfig,
    validator: ApprovalValidator,
    inner: RwLock<LedgerState>,
}

#[derive(Clone, Debug, Default)]
struct LedgerState {
    accounts: BTreeMap<Address, AccountRecord>,
    assets: BTreeMap<AssetId, AssetRecord>,
    applications: BTreeMap<AppId, ApplicationRecord>,
    // Assets and applications share one id sequence.
    last_id: u64,
}

impl InMemoryLedger {
    pub fn new(config: LedgerConfig) -> Self {
        Self {
            validator: ApprovalValidator::new(config.terms.clone()),
            config,
            inner: RwLock::new(LedgerState::default()),
        }
    }

    /// The validator application calls are dispatched to.
    pub fn validator(&self) -> &ApprovalValidator {
        &self.validator
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, LedgerState>, LedgerError> {
        self.inner.read().map_err(|_| LedgerError::LockPoisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, LedgerState>, LedgerError> {
        self.inner.write().map_err(|_| LedgerError::LockPoisoned)
    }

    /// Run `op` on a scratch copy and commit it if `op` succeeds.
    fn transact<T>(
        &self,
        op: impl FnOnce(&mut Batch<'_>) -> Result<T, LedgerError>,
    ) -> Result<T, LedgerError> {
        let mut state = self.write()?;
        let mut batch = Batch::new(&self.config, &state);
        match op(&mut batch) {
            Ok(value) => {
                *state = batch.state;
                Ok(value)
            }
            Err(err) => {
                tracing::warn!(error = %err, "ledger write rolled back");
                Err(err)
            }
        }
    }

    fn apply_group(
        &self,
        group: &TransactionGroup,
        schema: StateSchema,
    ) -> Result<GroupReceipt, LedgerError> {
        check_group_size(group)?;
        let mut receipt = GroupReceipt {
            group_id: hex::encode(group.group_id()?),
            applied: 0,
            inner_transfers: Vec::new(),
            created_application: None,
        };

        self.transact(|batch| {
            for (index, tx) in group.iter().enumerate() {
                match tx {
                    Transaction::Payment(payment) => batch.apply_payment(payment)?,
                    Transaction::AssetTransfer(transfer) => batch.apply_asset_transfer(transfer)?,
                    Transaction::ApplicationCall(call) => {
                        let outcome =
                            batch.apply_call(&self.validator, group, index, call, schema)?;
                        receipt.inner_transfers.extend(outcome.transfers);
                        if outcome.created.is_some() {
                            receipt.created_application = outcome.created;
                        }
                    }
                }
                receipt.applied += 1;
            }
            Ok(())
        })?;

        tracing::info!(
            group = %receipt.group_id,
            applied = receipt.applied,
            emitted = receipt.inner_transfers.len(),
            "group committed"
        );
        Ok(receipt)
    }
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new(LedgerConfig::default())
    }
}

fn check_group_size(group: &TransactionGroup) -> Result<(), LedgerError> {
    if group.is_empty() || group.len() > TransactionGroup::MAX_SIZE {
        return Err(LedgerError::InvalidGroup(format!(
            "group size {} outside 1..={}",
            group.len(),
            TransactionGroup::MAX_SIZE
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// LedgerState
// ---------------------------------------------------------------------------

impl LedgerState {
    fn next_id(&mut self) -> Result<u64, LedgerError> {
        self.last_id = self.last_id.checked_add(1).ok_or(LedgerError::Overflow)?;
        Ok(self.last_id)
    }

    fn account(&self, address: &Address) -> Result<&AccountRecord, LedgerError> {
        self.accounts
            .get(address)
            .ok_or(LedgerError::UnknownAccount(*address))
    }

    fn account_mut(&mut self, address: &Address) -> Result<&mut AccountRecord, LedgerError> {
        self.accounts
            .get_mut(address)
            .ok_or(LedgerError::UnknownAccount(*address))
    }

    fn asset(&self, asset_id: AssetId) -> Result<&AssetRecord, LedgerError> {
        self.assets
            .get(&asset_id)
            .ok_or(LedgerError::UnknownAsset(asset_id))
    }

    fn application(&self, app_id: AppId) -> Result<&ApplicationRecord, LedgerError> {
        self.applications
            .get(&app_id)
            .ok_or(LedgerError::UnknownApplication(app_id))
    }

    fn holding_of(&self, account: &Address, asset_id: AssetId) -> Option<Amount> {
        self.accounts
            .get(account)
            .and_then(|record| record.holdings.get(&asset_id).copied())
    }

    fn holding_mut(
        &mut self,
        account: &Address,
        asset_id: AssetId,
    ) -> Result<&mut Amount, LedgerError> {
        self.accounts
            .get_mut(account)
            .and_then(|record| record.holdings.get_mut(&asset_id))
            .ok_or(LedgerError::NotRegistered {
                account: *account,
                asset_id,
            })
    }

    fn credit(&mut self, address: &Address, amount: Amount) -> Result<(), LedgerError> {
        let account = self.accounts.entry(*address).or_default();
        account.balance = account
            .balance
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;
        Ok(())
    }

    fn debit(&mut self, address: &Address, amount: Amount) -> Result<(), LedgerError> {
        let account = self.account_mut(address)?;
        if account.balance < amount {
            return Err(LedgerError::InsufficientFunds {
                account: *address,
                needed: amount,
                available: account.balance,
            });
        }
        account.balance -= amount;
        Ok(())
    }

    /// Move asset units between two registered accounts.
    fn move_units(
        &mut self,
        from: &Address,
        to: &Address,
        asset_id: AssetId,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        let available = self.holding_of(from, asset_id).ok_or(LedgerError::NotRegistered {
            account: *from,
            asset_id,
        })?;
        if self.holding_of(to, asset_id).is_none() {
            return Err(LedgerError::NotRegistered {
                account: *to,
                asset_id,
            });
        }
        if available < amount {
            return Err(LedgerError::InsufficientFunds {
                account: *from,
                needed: amount,
                available,
            });
        }
        if from == to {
            return Ok(());
        }

        *self.holding_mut(from, asset_id)? -= amount;
        let target = self.holding_mut(to, asset_id)?;
        *target = target.checked_add(amount).ok_or(LedgerError::Overflow)?;
        Ok(())
    }
}

impl LedgerView for LedgerState {
    fn holding(&self, account: &Address, asset_id: AssetId) -> Option<Amount> {
        self.holding_of(account, asset_id)
    }
}

// ---------------------------------------------------------------------------
// Batch: a scratch copy being modified
// ---------------------------------------------------------------------------

struct Batch<'a> {
    config: &'a LedgerConfig,
    state: LedgerState,
    delegated: Option<DelegatedIssue>,
}

/// The single contract-account transfer a signature-approved join may carry:
/// one unit of the tracked asset to the payer.
#[derive(Clone, Copy, Debug)]
struct DelegatedIssue {
    contract: Address,
    asset_id: AssetId,
    member: Address,
}

impl DelegatedIssue {
    fn covers(&self, transfer: &AssetTransfer) -> bool {
        transfer.sender == self.contract
            && transfer.receiver == self.member
            && transfer.asset_id == self.asset_id
            && transfer.amount == 1
            && transfer.revocation_target.is_none()
            && transfer.close_to.is_none()
    }
}

/// Effects of one approved application call.
struct CallOutcome {
    transfers: Vec<InnerTransfer>,
    created: Option<AppId>,
}

impl<'a> Batch<'a> {
    fn new(config: &'a LedgerConfig, state: &LedgerState) -> Self {
        Self {
            config,
            state: state.clone(),
            delegated: None,
        }
    }

    fn is_application_account(&self, address: &Address) -> bool {
        self.state
            .applications
            .values()
            .any(|app| app.address == *address)
    }

    /// Application accounts have no key; only their own emitted transfers
    /// move their funds.
    fn check_spender(&self, spender: &Address) -> Result<(), LedgerError> {
        if self.is_application_account(spender) {
            return Err(LedgerError::Unauthorized(*spender));
        }
        Ok(())
    }

    fn check_min_balance(&self, address: &Address) -> Result<(), LedgerError> {
        let account = self.state.account(address)?;
        let required = self.config.min_balance(account.holdings.len());
        if account.balance < required {
            return Err(LedgerError::BelowMinimumBalance {
                account: *address,
                required,
            });
        }
        Ok(())
    }

    fn register(&mut self, account: &Address, asset_id: AssetId) -> Result<(), LedgerError> {
        self.state.asset(asset_id)?;
        let record = self.state.account_mut(account)?;
        if record.holdings.contains_key(&asset_id) {
            return Ok(());
        }
        record.holdings.insert(asset_id, 0);
        self.check_min_balance(account)
    }

    fn apply_payment(&mut self, payment: &Payment) -> Result<(), LedgerError> {
        self.check_spender(&payment.sender)?;
        if payment.fee < self.config.min_fee {
            return Err(LedgerError::FeeTooLow {
                fee: payment.fee,
                min_fee: self.config.min_fee,
            });
        }
        let total = payment
            .amount
            .checked_add(payment.fee)
            .ok_or(LedgerError::Overflow)?;
        self.state.debit(&payment.sender, total)?;
        self.state.credit(&payment.receiver, payment.amount)?;

        match payment.close_remainder_to {
            Some(close_to) => self.close_account(&payment.sender, &close_to)?,
            None => self.check_min_balance(&payment.sender)?,
        }
        self.check_min_balance(&payment.receiver)
    }

    /// Remove `account`, sending its remaining balance to `to`.
    fn close_account(&mut self, account: &Address, to: &Address) -> Result<(), LedgerError> {
        if account == to {
            return Err(LedgerError::InvalidGroup(
                "an account cannot close to itself".into(),
            ));
        }
        let record = self.state.account(account)?;
        if !record.holdings.is_empty() {
            return Err(LedgerError::InvalidAssetOperation(format!(
                "{account} still has {} asset registrations",
                record.holdings.len()
            )));
        }
        let remainder = record.balance;
        self.state.accounts.remove(account);
        self.state.credit(to, remainder)?;
        self.check_min_balance(to)
    }

    fn apply_asset_transfer(&mut self, transfer: &AssetTransfer) -> Result<(), LedgerError> {
        let asset = self.state.asset(transfer.asset_id)?.clone();
        let source = match transfer.revocation_target {
            Some(target) if transfer.sender == asset.params.clawback => target,
            Some(_) => return Err(LedgerError::Unauthorized(transfer.sender)),
            None => transfer.sender,
        };
        match self.delegated {
            Some(issue) if issue.covers(transfer) => self.delegated = None,
            _ => {
                self.check_spender(&transfer.sender)?;
                self.check_spender(&source)?;
            }
        }

        if transfer.is_opt_in() {
            return self.register(&transfer.sender, transfer.asset_id);
        }
        self.state
            .move_units(&source, &transfer.receiver, transfer.asset_id, transfer.amount)?;

        if let Some(close_to) = transfer.close_to {
            if transfer.revocation_target.is_some() {
                return Err(LedgerError::InvalidAssetOperation(
                    "a clawback cannot close out a holding".into(),
                ));
            }
            if source == asset.creator {
                return Err(LedgerError::InvalidAssetOperation(format!(
                    "the creator of {} cannot close out of it",
                    asset.id
                )));
            }
            let remainder = self.state.holding_of(&source, asset.id).unwrap_or(0);
            self.state.move_units(&source, &close_to, asset.id, remainder)?;
            self.state.account_mut(&source)?.holdings.remove(&asset.id);
        }
        Ok(())
    }

    fn apply_call(
        &mut self,
        validator: &ApprovalValidator,
        group: &TransactionGroup,
        index: usize,
        call: &ApplicationCall,
        schema: StateSchema,
    ) -> Result<CallOutcome, LedgerError> {
        let (global, app_address) = if call.app_id.is_creation() {
            if !schema.fits(&GlobalState::SCHEMA) {
                return Err(LedgerError::SchemaTooSmall);
            }
            (None, None)
        } else {
            let app = self.state.application(call.app_id)?;
            (app.state.clone(), Some(app.address))
        };

        let (change, transfers) =
            match validator.evaluate(global.as_ref(), group, index, &self.state) {
                Decision::Reject { cause } => return Err(LedgerError::Rejected(cause)),
                Decision::Approve {
                    new_state,
                    emitted_transfers,
                } => (new_state, emitted_transfers),
            };
        if transfers.len() > 1 {
            return Err(LedgerError::InvalidGroup(format!(
                "{} emitted {} transfers in one call",
                call.app_id,
                transfers.len()
            )));
        }

        let mut created = None;
        let app_address = match change {
            Some(StateChange::Create(state)) => {
                let id = AppId(self.state.next_id()?);
                let address = Address::for_application(id);
                self.state.applications.insert(
                    id,
                    ApplicationRecord {
                        id,
                        creator: call.sender,
                        address,
                        schema,
                        state: Some(state),
                    },
                );
                created = Some(id);
                address
            }
            Some(StateChange::Destroy) => {
                self.state.applications.remove(&call.app_id);
                app_address.ok_or(LedgerError::UnknownApplication(call.app_id))?
            }
            None => app_address.ok_or(LedgerError::UnknownApplication(call.app_id))?,
        };

        for transfer in &transfers {
            self.emit(&app_address, transfer)?;
        }
        Ok(CallOutcome { transfers, created })
    }
}

impl TransferEmitter for Batch<'_> {
    fn emit(&mut self, app: &Address, transfer: &InnerTransfer) -> Result<(), LedgerError> {
        let receiver = transfer.receiver(app);
        tracing::debug!(app = %app, transfer = %transfer, "emitting inner transfer");
        if receiver == *app && transfer.amount == 0 {
            return self.register(app, transfer.asset_id);
        }
        self.state.asset(transfer.asset_id)?;
        self.state
            .move_units(app, &receiver, transfer.asset_id, transfer.amount)
    }
}

// ---------------------------------------------------------------------------
// Trait implementations
// ---------------------------------------------------------------------------

impl LedgerWriter for InMemoryLedger {
    fn fund(&self, account: &Address, amount: Amount) -> Result<Amount, LedgerError> {
        self.transact(|batch| {
            batch.state.credit(account, amount)?;
            Ok(batch.state.account(account)?.balance)
        })
    }

    fn create_asset(
        &self,
        creator: &Address,
        params: AssetParams,
    ) -> Result<AssetId, LedgerError> {
        if params.total == 0 {
            return Err(LedgerError::InvalidAssetOperation(
                "total supply must be positive".into(),
            ));
        }
        let id = self.transact(|batch| {
            let id = AssetId(batch.state.next_id()?);
            batch
                .state
                .account_mut(creator)?
                .holdings
                .insert(id, params.total);
            batch.check_min_balance(creator)?;
            batch.state.assets.insert(
                id,
                AssetRecord {
                    id,
                    creator: *creator,
                    params,
                },
            );
            Ok(id)
        })?;
        tracing::info!(asset = %id, creator = %creator, "asset created");
        Ok(id)
    }

    fn destroy_asset(&self, sender: &Address, asset_id: AssetId) -> Result<(), LedgerError> {
        self.transact(|batch| {
            let asset = batch.state.asset(asset_id)?.clone();
            if *sender != asset.params.manager {
                return Err(LedgerError::Unauthorized(*sender));
            }
            let held = batch.state.holding_of(&asset.creator, asset_id).unwrap_or(0);
            if held != asset.params.total {
                return Err(LedgerError::InvalidAssetOperation(format!(
                    "creator holds {held} of {} units of {asset_id}",
                    asset.params.total
                )));
            }
            // With the whole supply back at the creator every other holding is zero.
            for account in batch.state.accounts.values_mut() {
                account.holdings.remove(&asset_id);
            }
            batch.state.assets.remove(&asset_id);
            Ok(())
        })?;
        tracing::info!(asset = %asset_id, "asset destroyed");
        Ok(())
    }

    fn update_asset(
        &self,
        sender: &Address,
        asset_id: AssetId,
        roles: AssetRoles,
    ) -> Result<(), LedgerError> {
        self.transact(|batch| {
            let asset = batch
                .state
                .assets
                .get_mut(&asset_id)
                .ok_or(LedgerError::UnknownAsset(asset_id))?;
            if *sender != asset.params.manager {
                return Err(LedgerError::Unauthorized(*sender));
            }
            asset.params.manager = roles.manager;
            asset.params.reserve = roles.reserve;
            asset.params.freeze = roles.freeze;
            asset.params.clawback = roles.clawback;
            Ok(())
        })
    }

    fn opt_in_asset(&self, account: &Address, asset_id: AssetId) -> Result<(), LedgerError> {
        self.submit_group(&TransactionGroup::single(AssetTransfer::opt_in(
            *account, asset_id,
        )))
        .map(|_| ())
    }

    fn deploy_application(
        &self,
        sender: &Address,
        args: Vec<AppArg>,
        schema: StateSchema,
    ) -> Result<AppId, LedgerError> {
        let call = ApplicationCall::new(*sender, AppId::CREATION, args);
        let receipt = self.apply_group(&TransactionGroup::single(call), schema)?;
        let app_id = receipt.created_application.ok_or_else(|| {
            LedgerError::InvalidGroup("creating call did not create an application".into())
        })?;
        tracing::info!(app = %app_id, creator = %sender, "application deployed");
        Ok(app_id)
    }

    fn submit_group(&self, group: &TransactionGroup) -> Result<GroupReceipt, LedgerError> {
        self.apply_group(group, StateSchema::default())
    }

    fn submit_delegated_group(
        &self,
        group: &TransactionGroup,
        validator: &SignatureValidator,
    ) -> Result<GroupReceipt, LedgerError> {
        check_group_size(group)?;
        let mut receipt = GroupReceipt {
            group_id: hex::encode(group.group_id()?),
            applied: 0,
            inner_transfers: Vec::new(),
            created_application: None,
        };

        self.transact(|batch| {
            let accounts = group
                .application_call(0)
                .map(|call| call.referenced_accounts.as_slice())
                .unwrap_or(&[]);
            if let Some(cause) = validator.evaluate(group, accounts, &batch.state).cause() {
                return Err(LedgerError::Rejected(cause));
            }
            let template = validator.template();
            batch.delegated = group.payment(1).ok().map(|payment| DelegatedIssue {
                contract: template.contract_address,
                asset_id: template.asset_id,
                member: payment.sender,
            });
            // The application is not invoked on this path.
            for tx in group {
                match tx {
                    Transaction::Payment(payment) => batch.apply_payment(payment)?,
                    Transaction::AssetTransfer(transfer) => batch.apply_asset_transfer(transfer)?,
                    Transaction::ApplicationCall(_) => continue,
                }
                receipt.applied += 1;
            }
            Ok(())
        })?;

        tracing::info!(
            group = %receipt.group_id,
            applied = receipt.applied,
            "delegated group committed"
        );
        Ok(receipt)
    }
}

impl LedgerReader for InMemoryLedger {
    fn config(&self) -> &LedgerConfig {
        &self.config
    }

    fn asset_holding(
        &self,
        account: &Address,
        asset_id: AssetId,
    ) -> Result<Option<Amount>, LedgerError> {
        Ok(self.read()?.holding_of(account, asset_id))
    }

    fn balance(&self, account: &Address) -> Result<Amount, LedgerError> {
        Ok(self.read()?.account(account)?.balance)
    }

    fn asset_params(&self, asset_id: AssetId) -> Result<AssetParams, LedgerError> {
        Ok(self.read()?.asset(asset_id)?.params.clone())
    }

    fn asset_supply(&self, asset_id: AssetId) -> Result<Amount, LedgerError> {
        let state = self.read()?;
        state.asset(asset_id)?;
        state
            .accounts
            .values()
            .filter_map(|account| account.holdings.get(&asset_id))
            .try_fold(0u64, |sum, amount| sum.checked_add(*amount))
            .ok_or(LedgerError::Overflow)
    }

    fn global_state(&self, app_id: AppId) -> Result<Option<GlobalState>, LedgerError> {
        Ok(self.read()?.application(app_id)?.state.clone())
    }

    fn application(&self, app_id: AppId) -> Result<ApplicationRecord, LedgerError> {
        Ok(self.read()?.application(app_id)?.clone())
    }

    fn snapshot(&self) -> Result<LedgerSnapshot, LedgerError> {
        let state = self.read()?;
        let mut snapshot = LedgerSnapshot::new();
        for (address, account) in &state.accounts {
            for (asset_id, amount) in &account.holdings {
                snapshot.set_holding(*address, *asset_id, *amount);
            }
        }
        Ok(snapshot)
    }
}
