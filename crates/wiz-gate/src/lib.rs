//! Approval logic for WizCoin membership.
//!
//! Every transaction group that touches the membership contract is decided
//! here. The [`ApprovalValidator`] is the persistent contract: it dispatches
//! the calling transaction to one [`Operation`], checks it against the stored
//! [`wiz_types::GlobalState`] and a read-only ledger view, and returns a
//! [`Decision`] carrying any state change and emitted transfers. The
//! [`SignatureValidator`] is the stateless companion for the delegated
//! signing template and knows only the join rule.
//!
//! # Quick Start
//!
//! ```rust
//! use wiz_gate::{ApprovalValidator, InnerTransfer};
//! use wiz_types::{
//!     Address, AppId, ApplicationCall, AssetId, GlobalState, LedgerSnapshot, Payment,
//!     TransactionGroup,
//! };
//!
//! let app = AppId(1);
//! let member = Address::labeled("member");
//! let state = GlobalState::new(Address::labeled("manager"), AssetId(42));
//! let view = LedgerSnapshot::new().with_holding(member, AssetId(42), 0);
//!
//! let group = TransactionGroup::new(vec![
//!     ApplicationCall::new(member, app, ["join_wizcoin"])
//!         .with_accounts([member])
//!         .into(),
//!     Payment::new(member, Address::for_application(app), 50_000_000, 2000).into(),
//! ]);
//!
//! let decision = ApprovalValidator::default().evaluate(Some(&state), &group, 0, &view);
//! assert_eq!(decision.transfers(), &[InnerTransfer::to_account(AssetId(42), member, 1)]);
//! ```

pub mod config;
pub mod contract;
pub mod decision;
pub mod error;
pub mod operation;
pub mod signature;

// Re-exports for convenience.
pub use config::MembershipTerms;
pub use contract::ApprovalValidator;
pub use decision::{Decision, InnerTransfer, RejectCause, StateChange, TransferTarget};
pub use error::GateError;
pub use operation::{Operation, JOIN_WIZCOIN, OPT_IN_WIZCOIN, RELINQUISH_WIZCOINS};
pub use signature::{SignatureTemplate, SignatureValidator};

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use wiz_types::{
        Address, AppArg, AppId, ApplicationCall, AssetId, GlobalState, LedgerSnapshot,
        LedgerView, OnCompletion, Payment, TransactionGroup,
    };

    use super::*;

    const APP: AppId = AppId(1);
    const ASSET: AssetId = AssetId(42);

    fn manager() -> Address {
        Address::labeled("M")
    }

    fn contract() -> Address {
        Address::for_application(APP)
    }

    fn join_group(member: Address, amount: u64, fee: u64) -> TransactionGroup {
        TransactionGroup::new(vec![
            ApplicationCall::new(member, APP, ["join_wizcoin"])
                .with_accounts([member])
                .with_assets([ASSET])
                .into(),
            Payment::new(member, contract(), amount, fee).into(),
        ])
    }

    /// Apply an approved decision's transfers to a snapshot, the way the
    /// ledger would.
    fn apply(view: &mut LedgerSnapshot, decision: &Decision) {
        for transfer in decision.transfers() {
            let to = transfer.receiver(&contract());
            let from_balance = view.holding(&contract(), transfer.asset_id).unwrap_or(0);
            if to == contract() {
                view.set_holding(to, transfer.asset_id, from_balance);
                continue;
            }
            let to_balance = view.holding(&to, transfer.asset_id).unwrap_or(0);
            view.set_holding(contract(), transfer.asset_id, from_balance - transfer.amount);
            view.set_holding(to, transfer.asset_id, to_balance + transfer.amount);
        }
    }

    // -----------------------------------------------------------------------
    // 1. End-to-end: initialize, opt in, join, join again
    // -----------------------------------------------------------------------
    #[test]
    fn membership_lifecycle() {
        let validator = ApprovalValidator::default();
        let mut view = LedgerSnapshot::new();

        let create = ApplicationCall::new(manager(), AppId::CREATION, [AppArg::from_u64(42)]);
        let decision = validator.evaluate(None, &TransactionGroup::single(create), 0, &view);
        let Some(StateChange::Create(state)) = decision.state_change().cloned() else {
            panic!("initialize must create state, got {decision}");
        };
        assert_eq!(state, GlobalState::new(manager(), ASSET));

        let opt_in = ApplicationCall::new(manager(), APP, ["opt_in_wizcoin"]);
        let decision = validator.evaluate(Some(&state), &TransactionGroup::single(opt_in), 0, &view);
        assert!(decision.is_approved());
        apply(&mut view, &decision);
        assert_eq!(view.holding(&contract(), ASSET), Some(0));
        view.set_holding(contract(), ASSET, 400);

        let a = Address::labeled("A");
        view.set_holding(a, ASSET, 0);
        let group = join_group(a, 50_000_000, 2000);
        let decision = validator.evaluate(Some(&state), &group, 0, &view);
        assert_eq!(decision.transfers(), &[InnerTransfer::to_account(ASSET, a, 1)]);
        apply(&mut view, &decision);
        assert_eq!(view.holding(&a, ASSET), Some(1));
        assert_eq!(view.holding(&contract(), ASSET), Some(399));

        let again = validator.evaluate(Some(&state), &group, 0, &view);
        assert_eq!(again.cause(), Some(RejectCause::AlreadyMember));
    }

    // -----------------------------------------------------------------------
    // 2. Opt in then relinquish returns the whole reserve
    // -----------------------------------------------------------------------
    #[test]
    fn opt_in_then_relinquish_round_trip() {
        let validator = ApprovalValidator::default();
        let state = GlobalState::new(manager(), ASSET);
        let mut view = LedgerSnapshot::new().with_holding(manager(), ASSET, 0);

        let opt_in = ApplicationCall::new(manager(), APP, ["opt_in_wizcoin"]);
        let decision = validator.evaluate(Some(&state), &TransactionGroup::single(opt_in), 0, &view);
        apply(&mut view, &decision);
        view.set_holding(contract(), ASSET, 250);

        let relinquish = ApplicationCall::new(manager(), APP, ["relinquish_wizcoins"])
            .with_accounts([contract()]);
        let decision =
            validator.evaluate(Some(&state), &TransactionGroup::single(relinquish), 0, &view);
        assert_eq!(decision.transfers()[0].amount, 250);
        apply(&mut view, &decision);
        assert_eq!(view.holding(&contract(), ASSET), Some(0));
        assert_eq!(view.holding(&manager(), ASSET), Some(250));
    }

    // -----------------------------------------------------------------------
    // 3. Multisig payers are ordinary addresses
    // -----------------------------------------------------------------------
    #[test]
    fn multisig_account_joins_like_any_other() {
        let owners = [Address::labeled("user3"), Address::labeled("user4")];
        let multisig = Address::multisig(1, 2, &owners);
        let view = LedgerSnapshot::new().with_holding(multisig, ASSET, 0);
        let state = GlobalState::new(manager(), ASSET);

        let decision = ApprovalValidator::default().evaluate(
            Some(&state),
            &join_group(multisig, 50_000_000, 2000),
            0,
            &view,
        );
        assert_eq!(
            decision.transfers(),
            &[InnerTransfer::to_account(ASSET, multisig, 1)]
        );
    }

    // -----------------------------------------------------------------------
    // 4. The two validators disagree on fees and unregistered holdings
    // -----------------------------------------------------------------------
    #[test]
    fn validator_asymmetries_are_preserved() {
        let member = Address::labeled("member");
        let state = GlobalState::new(manager(), ASSET);
        let signature = SignatureValidator::new(SignatureTemplate {
            manager: manager(),
            asset_id: ASSET,
            contract_address: contract(),
        });
        let contract_path = ApprovalValidator::default();
        let unregistered = LedgerSnapshot::new();

        let cheap = join_group(member, 50_000_000, 1000);
        assert!(signature.evaluate(&cheap, &[member], &unregistered).is_approved());
        assert_eq!(
            contract_path
                .evaluate(Some(&state), &cheap, 0, &unregistered)
                .cause(),
            Some(RejectCause::PaymentMismatch)
        );

        let subsidized = join_group(member, 50_000_000, 2000);
        assert_eq!(
            contract_path
                .evaluate(Some(&state), &subsidized, 0, &unregistered)
                .cause(),
            Some(RejectCause::HoldingUndefined)
        );
    }

    // -----------------------------------------------------------------------
    // 5. Manager-only operations reject strangers whatever the arguments
    // -----------------------------------------------------------------------
    proptest! {
        #[test]
        fn non_manager_admin_calls_are_unauthorized(
            seed in any::<u64>(),
            op in 0usize..4,
            extra_args in 0usize..3,
            with_account in any::<bool>(),
        ) {
            let stranger = Address::labeled(format!("stranger-{seed}"));
            prop_assume!(stranger != manager());

            let mut args: Vec<AppArg> = Vec::new();
            let completion = match op {
                0 => { args.push("opt_in_wizcoin".into()); OnCompletion::NoOp }
                1 => { args.push("relinquish_wizcoins".into()); OnCompletion::NoOp }
                2 => OnCompletion::DeleteApplication,
                _ => OnCompletion::UpdateApplication,
            };
            args.extend((0..extra_args).map(|i| AppArg::from_u64(i as u64)));

            let mut call = ApplicationCall::new(stranger, APP, args).with_completion(completion);
            if with_account {
                call = call.with_accounts([contract()]);
            }
            let view = LedgerSnapshot::new().with_holding(contract(), ASSET, 10);
            let state = GlobalState::new(manager(), ASSET);
            let decision = ApprovalValidator::default()
                .evaluate(Some(&state), &TransactionGroup::single(call), 0, &view);
            prop_assert_eq!(decision.cause(), Some(RejectCause::UnauthorizedCaller));
        }

        #[test]
        fn only_the_exact_registration_amount_passes(amount in 0u64..100_000_000) {
            let member = Address::labeled("member");
            let view = LedgerSnapshot::new().with_holding(member, ASSET, 0);
            let state = GlobalState::new(manager(), ASSET);
            let decision = ApprovalValidator::default()
                .evaluate(Some(&state), &join_group(member, amount, 2000), 0, &view);
            if amount == 50_000_000 {
                prop_assert!(decision.is_approved());
            } else {
                prop_assert_eq!(decision.cause(), Some(RejectCause::PaymentMismatch));
            }
        }

        #[test]
        fn join_never_issues_to_a_holder(holding in 1u64..1000) {
            let member = Address::labeled("member");
            let view = LedgerSnapshot::new().with_holding(member, ASSET, holding);
            let state = GlobalState::new(manager(), ASSET);
            let decision = ApprovalValidator::default()
                .evaluate(Some(&state), &join_group(member, 50_000_000, 2000), 0, &view);
            prop_assert_eq!(decision.cause(), Some(RejectCause::AlreadyMember));
        }
    }
}
