use wiz_gate::{
    MembershipTerms, SignatureTemplate, SignatureValidator, OPT_IN_WIZCOIN, RELINQUISH_WIZCOINS,
};
use wiz_types::{
    Address, Amount, AppArg, AppId, ApplicationCall, AssetId, AssetTransfer, GlobalState,
    OnCompletion, Payment, TransactionGroup,
};

use crate::error::LedgerError;
use crate::records::{AssetParams, AssetRoles, GroupReceipt};
use crate::traits::{LedgerReader, LedgerWriter};

/// A deployed membership contract together with its token pool.
///
/// `deploy` runs the full setup sequence; the other methods build and submit
/// the groups members and the owner send afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MembershipDeployment {
    pub owner: Address,
    pub asset_id: AssetId,
    pub app_id: AppId,
    /// The contract's own account. It holds the unissued tokens.
    pub contract: Address,
}

impl MembershipDeployment {
    /// Create the token, deploy the contract, and move the supply into it.
    ///
    /// Steps, each its own group:
    /// 1. `owner` creates the asset holding every role.
    /// 2. The contract is deployed with the asset id as its only argument.
    /// 3. `owner` funds the contract with the minimum balance of an account
    ///    holding one asset.
    /// 4. `owner` has the contract register itself to the asset.
    /// 5. `owner` sends the whole supply to the contract.
    /// 6. The asset reserve is pointed at the contract.
    pub fn deploy<L>(ledger: &L, owner: Address, total_supply: Amount) -> Result<Self, LedgerError>
    where
        L: LedgerReader + LedgerWriter,
    {
        let asset_id = ledger.create_asset(&owner, AssetParams::membership(owner, total_supply))?;
        let app_id = ledger.deploy_application(
            &owner,
            vec![AppArg::from_u64(asset_id.get())],
            GlobalState::SCHEMA,
        )?;
        let contract = ledger.application(app_id)?.address;
        let deployment = Self {
            owner,
            asset_id,
            app_id,
            contract,
        };

        let config = ledger.config();
        ledger.submit_group(&TransactionGroup::single(Payment::new(
            owner,
            contract,
            config.min_balance(1),
            config.min_fee,
        )))?;
        ledger.submit_group(&TransactionGroup::single(
            ApplicationCall::new(owner, app_id, [OPT_IN_WIZCOIN.to_vec()]).with_assets([asset_id]),
        ))?;
        ledger.submit_group(&TransactionGroup::single(AssetTransfer::new(
            owner,
            contract,
            asset_id,
            total_supply,
        )))?;

        let roles = AssetRoles {
            reserve: contract,
            ..ledger.asset_params(asset_id)?.roles()
        };
        ledger.update_asset(&owner, asset_id, roles)?;

        tracing::info!(
            app = %app_id,
            asset = %asset_id,
            contract = %contract,
            supply = total_supply,
            "membership contract deployed"
        );
        Ok(deployment)
    }

    /// The two-element join group: the `join_wizcoin` call naming `member`,
    /// followed by the registration payment to the contract.
    pub fn join_group(&self, member: Address, terms: &MembershipTerms) -> TransactionGroup {
        TransactionGroup::new(vec![
            ApplicationCall::new(member, self.app_id, ["join_wizcoin"])
                .with_accounts([member])
                .with_assets([self.asset_id])
                .into(),
            Payment::new(
                member,
                self.contract,
                terms.registration_amount,
                terms.join_fee_floor,
            )
            .into(),
        ])
    }

    /// Register `member` to the token so it can receive one.
    pub fn register<L: LedgerWriter>(&self, ledger: &L, member: &Address) -> Result<(), LedgerError> {
        ledger.opt_in_asset(member, self.asset_id)
    }

    pub fn join<L>(&self, ledger: &L, member: Address) -> Result<GroupReceipt, LedgerError>
    where
        L: LedgerReader + LedgerWriter,
    {
        let group = self.join_group(member, &ledger.config().terms);
        ledger.submit_group(&group)
    }

    /// Close `member`'s holding, returning any token to the owner.
    pub fn leave<L: LedgerWriter>(
        &self,
        ledger: &L,
        member: Address,
    ) -> Result<GroupReceipt, LedgerError> {
        let mut close = AssetTransfer::new(member, self.owner, self.asset_id, 0);
        close.close_to = Some(self.owner);
        ledger.submit_group(&TransactionGroup::single(close))
    }

    /// Return every unissued token to the owner.
    pub fn relinquish<L: LedgerWriter>(&self, ledger: &L) -> Result<GroupReceipt, LedgerError> {
        ledger.submit_group(&TransactionGroup::single(
            ApplicationCall::new(self.owner, self.app_id, [RELINQUISH_WIZCOINS.to_vec()])
                .with_accounts([self.contract])
                .with_assets([self.asset_id]),
        ))
    }

    /// Reclaim the reserve, delete the contract, and destroy the token.
    ///
    /// Fails, changing nothing, while any member still holds a token.
    pub fn teardown<L>(self, ledger: &L) -> Result<(), LedgerError>
    where
        L: LedgerReader + LedgerWriter,
    {
        let issued = self.issued(ledger)?;
        if issued > 0 {
            return Err(LedgerError::InvalidAssetOperation(format!(
                "{issued} tokens of {} are still held by members",
                self.asset_id
            )));
        }

        self.relinquish(ledger)?;
        ledger.submit_group(&TransactionGroup::single(
            ApplicationCall::new(self.owner, self.app_id, Vec::<AppArg>::new())
                .with_completion(OnCompletion::DeleteApplication),
        ))?;
        ledger.destroy_asset(&self.owner, self.asset_id)?;
        tracing::info!(app = %self.app_id, asset = %self.asset_id, "membership contract torn down");
        Ok(())
    }

    /// Tokens held outside the contract and the owner.
    pub fn issued<L: LedgerReader>(&self, ledger: &L) -> Result<Amount, LedgerError> {
        let total = ledger.asset_params(self.asset_id)?.total;
        let in_contract = ledger.asset_holding(&self.contract, self.asset_id)?.unwrap_or(0);
        let with_owner = ledger.asset_holding(&self.owner, self.asset_id)?.unwrap_or(0);
        Ok(total.saturating_sub(in_contract).saturating_sub(with_owner))
    }

    /// Template for the delegated signing path, with the contract account as
    /// the payment receiver.
    pub fn signature_template(&self) -> SignatureTemplate {
        SignatureTemplate {
            manager: self.owner,
            asset_id: self.asset_id,
            contract_address: self.contract,
        }
    }

    pub fn signature_validator(&self, terms: &MembershipTerms) -> SignatureValidator {
        SignatureValidator::with_terms(self.signature_template(), terms.clone())
    }

    /// Join group for the delegated path: the call and payment, plus the
    /// transfer that actually moves the token out of the contract account.
    pub fn delegated_join_group(
        &self,
        member: Address,
        terms: &MembershipTerms,
    ) -> TransactionGroup {
        TransactionGroup::new(vec![
            ApplicationCall::new(member, self.app_id, ["join_wizcoin"])
                .with_accounts([member])
                .into(),
            Payment::new(
                member,
                self.contract,
                terms.registration_amount,
                terms.signature_fee_ceiling,
            )
            .into(),
            AssetTransfer::new(self.contract, member, self.asset_id, 1).into(),
        ])
    }
}

#[cfg(test)]
mod tests {
    use wiz_gate::RejectCause;

    use super::*;
    use crate::memory::InMemoryLedger;

    fn setup(supply: Amount) -> (InMemoryLedger, MembershipDeployment) {
        let ledger = InMemoryLedger::default();
        let owner = Address::labeled("owner");
        ledger.fund(&owner, 10_000_000).unwrap();
        let deployment = MembershipDeployment::deploy(&ledger, owner, supply).unwrap();
        (ledger, deployment)
    }

    fn member(ledger: &InMemoryLedger, deployment: &MembershipDeployment, name: &str) -> Address {
        let address = Address::labeled(name);
        ledger.fund(&address, 100_000_000).unwrap();
        deployment.register(ledger, &address).unwrap();
        address
    }

    #[test]
    fn deploy_moves_supply_into_contract() {
        let (ledger, d) = setup(400);
        assert_eq!(ledger.asset_holding(&d.contract, d.asset_id).unwrap(), Some(400));
        assert_eq!(ledger.asset_holding(&d.owner, d.asset_id).unwrap(), Some(0));
        assert_eq!(ledger.balance(&d.contract).unwrap(), 200_000);
        assert_eq!(ledger.asset_params(d.asset_id).unwrap().reserve, d.contract);
        assert_eq!(
            ledger.global_state(d.app_id).unwrap(),
            Some(GlobalState::new(d.owner, d.asset_id))
        );
    }

    #[test]
    fn join_issues_one_token_and_collects_payment() {
        let (ledger, d) = setup(400);
        let alice = member(&ledger, &d, "alice");

        let receipt = d.join(&ledger, alice).unwrap();
        assert_eq!(receipt.applied, 2);
        assert_eq!(receipt.inner_transfers.len(), 1);
        assert_eq!(ledger.asset_holding(&alice, d.asset_id).unwrap(), Some(1));
        assert_eq!(ledger.asset_holding(&d.contract, d.asset_id).unwrap(), Some(399));
        assert_eq!(ledger.balance(&d.contract).unwrap(), 50_200_000);
        assert_eq!(ledger.balance(&alice).unwrap(), 100_000_000 - 50_002_000);
    }

    #[test]
    fn second_join_is_already_member() {
        let (ledger, d) = setup(400);
        let alice = member(&ledger, &d, "alice");
        d.join(&ledger, alice).unwrap();
        let err = d.join(&ledger, alice).unwrap_err();
        assert_eq!(err.reject_cause(), Some(RejectCause::AlreadyMember));
        assert_eq!(ledger.balance(&alice).unwrap(), 100_000_000 - 50_002_000);
    }

    #[test]
    fn unregistered_member_is_rejected() {
        let (ledger, d) = setup(400);
        let bob = Address::labeled("bob");
        ledger.fund(&bob, 100_000_000).unwrap();
        let err = d.join(&ledger, bob).unwrap_err();
        assert_eq!(err.reject_cause(), Some(RejectCause::HoldingUndefined));
    }

    #[test]
    fn relinquish_returns_reserve_to_owner() {
        let (ledger, d) = setup(400);
        let alice = member(&ledger, &d, "alice");
        d.join(&ledger, alice).unwrap();

        let receipt = d.relinquish(&ledger).unwrap();
        assert_eq!(receipt.inner_transfers[0].amount, 399);
        assert_eq!(ledger.asset_holding(&d.contract, d.asset_id).unwrap(), Some(0));
        assert_eq!(ledger.asset_holding(&d.owner, d.asset_id).unwrap(), Some(399));
    }

    #[test]
    fn teardown_waits_for_members_to_leave() {
        let (ledger, d) = setup(400);
        let alice = member(&ledger, &d, "alice");
        d.join(&ledger, alice).unwrap();

        assert!(matches!(
            d.clone().teardown(&ledger),
            Err(LedgerError::InvalidAssetOperation(_))
        ));
        assert!(ledger.global_state(d.app_id).unwrap().is_some());
        assert_eq!(d.issued(&ledger).unwrap(), 1);

        d.leave(&ledger, alice).unwrap();
        assert_eq!(ledger.asset_holding(&alice, d.asset_id).unwrap(), None);
        let (app, asset) = (d.app_id, d.asset_id);
        d.teardown(&ledger).unwrap();
        assert!(ledger.application(app).is_err());
        assert!(ledger.asset_params(asset).is_err());
    }

    #[test]
    fn delegated_join_moves_token_without_the_contract() {
        let (ledger, d) = setup(400);
        let alice = member(&ledger, &d, "alice");
        let terms = ledger.config().terms.clone();
        let validator = d.signature_validator(&terms);

        let receipt = ledger
            .submit_delegated_group(&d.delegated_join_group(alice, &terms), &validator)
            .unwrap();
        assert_eq!(receipt.applied, 2);
        assert!(receipt.inner_transfers.is_empty());
        assert_eq!(ledger.asset_holding(&alice, d.asset_id).unwrap(), Some(1));

        let err = ledger
            .submit_delegated_group(&d.delegated_join_group(alice, &terms), &validator)
            .unwrap_err();
        assert_eq!(err.reject_cause(), Some(RejectCause::AlreadyMember));
    }

    #[test]
    fn delegated_path_rejects_contract_fee() {
        let (ledger, d) = setup(400);
        let alice = member(&ledger, &d, "alice");
        let terms = ledger.config().terms.clone();
        let err = ledger
            .submit_delegated_group(&d.join_group(alice, &terms), &d.signature_validator(&terms))
            .unwrap_err();
        assert_eq!(err.reject_cause(), Some(RejectCause::PaymentMismatch));
    }

    #[test]
    fn delegated_group_moves_only_one_token() {
        let (ledger, d) = setup(400);
        let alice = member(&ledger, &d, "alice");
        let terms = ledger.config().terms.clone();
        let validator = d.signature_validator(&terms);

        let mut txs = d.delegated_join_group(alice, &terms).transactions().to_vec();
        txs.push(AssetTransfer::new(d.contract, alice, d.asset_id, 1).into());
        let err = ledger
            .submit_delegated_group(&TransactionGroup::new(txs), &validator)
            .unwrap_err();
        assert_eq!(err, LedgerError::Unauthorized(d.contract));

        let mut txs = d.delegated_join_group(alice, &terms).transactions().to_vec();
        txs[2] = AssetTransfer::new(d.contract, alice, d.asset_id, 399).into();
        let err = ledger
            .submit_delegated_group(&TransactionGroup::new(txs), &validator)
            .unwrap_err();
        assert_eq!(err, LedgerError::Unauthorized(d.contract));
        assert_eq!(ledger.asset_holding(&alice, d.asset_id).unwrap(), Some(0));
    }
}
