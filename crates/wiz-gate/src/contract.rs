use wiz_types::{ApplicationCall, AssetId, GlobalState, LedgerView, TransactionGroup};

use crate::config::MembershipTerms;
use crate::decision::{Decision, InnerTransfer, RejectCause, StateChange};
use crate::operation::Operation;

/// The persistent membership contract.
///
/// Pure function of `(state, group, view)`: the validator reads nothing
/// else and changes nothing itself. State changes and transfers come back
/// inside the [`Decision`] for the ledger to apply atomically with the rest
/// of the group.
#[derive(Clone, Debug, Default)]
pub struct ApprovalValidator {
    terms: MembershipTerms,
}

impl ApprovalValidator {
    pub fn new(terms: MembershipTerms) -> Self {
        Self { terms }
    }

    pub fn terms(&self) -> &MembershipTerms {
        &self.terms
    }

    /// Evaluate the application call at `caller_index` of `group`.
    ///
    /// `state` is `None` before the creating call and after deletion.
    pub fn evaluate(
        &self,
        state: Option<&GlobalState>,
        group: &TransactionGroup,
        caller_index: usize,
        view: &dyn LedgerView,
    ) -> Decision {
        let Ok(call) = group.application_call(caller_index) else {
            tracing::debug!(caller_index, "caller is not an application call");
            return Decision::reject(RejectCause::GroupShapeMismatch);
        };

        let operation = Operation::classify(call);
        let decision = Decision::from(self.dispatch(operation, state, group, call, view));
        tracing::debug!(
            operation = %operation,
            app = %call.app_id,
            sender = %call.sender,
            decision = %decision,
            "application call evaluated"
        );
        decision
    }

    fn dispatch(
        &self,
        operation: Operation,
        state: Option<&GlobalState>,
        group: &TransactionGroup,
        call: &ApplicationCall,
        view: &dyn LedgerView,
    ) -> Result<Decision, RejectCause> {
        let state = match (operation, state) {
            (Operation::Initialize, _) => return Self::initialize(call),
            (_, None) => return Err(RejectCause::UnknownOperation),
            (_, Some(state)) => state,
        };
        // Authorization comes before any argument check.
        if operation.requires_manager() {
            Self::require_manager(state, call)?;
        }

        match operation {
            Operation::Initialize => Self::initialize(call),
            Operation::DeleteApplication => Ok(Decision::approve_with_state(StateChange::Destroy)),
            Operation::UpdateApplication => Ok(Decision::approve()),
            // No per-account local state is kept.
            Operation::OptIn | Operation::CloseOut => Ok(Decision::approve()),
            Operation::OptInContract => Self::opt_in_contract(state, call),
            Operation::JoinMembership => self.join(state, group, call, view),
            Operation::RelinquishReserve => Self::relinquish(state, call, view),
            Operation::Unknown => Err(RejectCause::UnknownOperation),
        }
    }

    fn require_manager(state: &GlobalState, call: &ApplicationCall) -> Result<(), RejectCause> {
        if state.is_manager(&call.sender) {
            Ok(())
        } else {
            Err(RejectCause::UnauthorizedCaller)
        }
    }

    fn require_single_arg(call: &ApplicationCall) -> Result<(), RejectCause> {
        if call.args.len() == 1 {
            Ok(())
        } else {
            Err(RejectCause::ArgumentCountMismatch)
        }
    }

    /// The creator becomes the manager; the single argument names the asset.
    fn initialize(call: &ApplicationCall) -> Result<Decision, RejectCause> {
        Self::require_single_arg(call)?;
        let asset_id = call.args[0]
            .to_u64()
            .map_err(|_| RejectCause::InvalidArgument)?;
        Ok(Decision::approve_with_state(StateChange::Create(
            GlobalState::new(call.sender, AssetId(asset_id)),
        )))
    }

    fn opt_in_contract(
        state: &GlobalState,
        call: &ApplicationCall,
    ) -> Result<Decision, RejectCause> {
        Self::require_single_arg(call)?;
        Ok(Decision::approve_with_transfer(InnerTransfer::registration(
            state.tracked_asset_id,
        )))
    }

    /// Send the contract's whole remaining holding back to the manager.
    fn relinquish(
        state: &GlobalState,
        call: &ApplicationCall,
        view: &dyn LedgerView,
    ) -> Result<Decision, RejectCause> {
        Self::require_single_arg(call)?;

        let own_address = view.application_address(call.app_id);
        match call.referenced_accounts.as_slice() {
            [named] if *named == own_address => {}
            _ => return Err(RejectCause::ArgumentCountMismatch),
        }

        let remaining = view
            .holding(&own_address, state.tracked_asset_id)
            .ok_or(RejectCause::HoldingUndefined)?;

        Ok(Decision::approve_with_transfer(InnerTransfer::to_account(
            state.tracked_asset_id,
            state.manager,
            remaining,
        )))
    }

    /// Issue one token to the payer of a valid registration payment.
    ///
    /// Checks run in a fixed order and the first failure decides the cause.
    fn join(
        &self,
        state: &GlobalState,
        group: &TransactionGroup,
        call: &ApplicationCall,
        view: &dyn LedgerView,
    ) -> Result<Decision, RejectCause> {
        if group.len() != 2 {
            return Err(RejectCause::GroupShapeMismatch);
        }
        Self::require_single_arg(call)?;
        if call.referenced_accounts.len() != 1 {
            return Err(RejectCause::ArgumentCountMismatch);
        }

        let (_, payment) = group
            .join_pair()
            .map_err(|_| RejectCause::GroupShapeMismatch)?;

        if !self.terms.covers_issuance_fee(payment.fee)
            || !self.terms.is_registration_amount(payment.amount)
            || payment.receiver != view.application_address(call.app_id)
            || call.referenced_accounts[0] != payment.sender
        {
            return Err(RejectCause::PaymentMismatch);
        }

        let holding = view
            .holding(&payment.sender, state.tracked_asset_id)
            .ok_or(RejectCause::HoldingUndefined)?;
        if holding != 0 {
            return Err(RejectCause::AlreadyMember);
        }

        Ok(Decision::approve_with_transfer(InnerTransfer::to_account(
            state.tracked_asset_id,
            payment.sender,
            1,
        )))
    }
}
