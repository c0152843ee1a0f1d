use serde::{Deserialize, Serialize};
use wiz_types::{Address, AssetId, LedgerView, OnCompletion, TransactionGroup};

use crate::config::MembershipTerms;
use crate::decision::{Decision, RejectCause};
use crate::operation::JOIN_WIZCOIN;

/// Parameters fixed when the delegated signing template is authorized.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureTemplate {
    pub manager: Address,
    pub asset_id: AssetId,
    /// Account the registration payment must be sent to.
    pub contract_address: Address,
}

/// Stateless validator for the delegated signing path.
///
/// It knows only the join rule. Unlike [`crate::ApprovalValidator`] it caps
/// the payment fee instead of requiring a subsidy, reads an unregistered
/// holding as zero, and never emits transfers: the token moves through the
/// group's own transactions.
#[derive(Clone, Debug)]
pub struct SignatureValidator {
    template: SignatureTemplate,
    terms: MembershipTerms,
}

impl SignatureValidator {
    pub fn new(template: SignatureTemplate) -> Self {
        Self::with_terms(template, MembershipTerms::default())
    }

    pub fn with_terms(template: SignatureTemplate, terms: MembershipTerms) -> Self {
        Self { template, terms }
    }

    pub fn template(&self) -> &SignatureTemplate {
        &self.template
    }

    /// Decide whether `group` is a valid join under this template.
    ///
    /// `referenced_accounts` are the accounts named by the group's
    /// application call; the first one must be the payer.
    pub fn evaluate(
        &self,
        group: &TransactionGroup,
        referenced_accounts: &[Address],
        view: &dyn LedgerView,
    ) -> Decision {
        let decision = Decision::from(self.check_join(group, referenced_accounts, view));
        tracing::debug!(
            asset = %self.template.asset_id,
            decision = %decision,
            "delegated join evaluated"
        );
        decision
    }

    fn check_join(
        &self,
        group: &TransactionGroup,
        referenced_accounts: &[Address],
        view: &dyn LedgerView,
    ) -> Result<Decision, RejectCause> {
        let call = group
            .application_call(0)
            .map_err(|_| RejectCause::GroupShapeMismatch)?;
        if call.on_completion != OnCompletion::NoOp
            || call.first_arg().map(|a| a.as_bytes()) != Some(JOIN_WIZCOIN)
        {
            return Err(RejectCause::UnknownOperation);
        }
        if call.args.len() != 1 {
            return Err(RejectCause::ArgumentCountMismatch);
        }

        let payment = group
            .payment(1)
            .map_err(|_| RejectCause::GroupShapeMismatch)?;
        if !self.terms.within_signature_fee(payment.fee)
            || !self.terms.is_registration_amount(payment.amount)
            || payment.receiver != self.template.contract_address
        {
            return Err(RejectCause::PaymentMismatch);
        }

        let named = referenced_accounts
            .first()
            .ok_or(RejectCause::ArgumentCountMismatch)?;
        if *named != payment.sender {
            return Err(RejectCause::PaymentMismatch);
        }

        // Plain comparison: "never registered" reads as zero here.
        let holding = view
            .holding(&payment.sender, self.template.asset_id)
            .unwrap_or(0);
        if holding != 0 {
            return Err(RejectCause::AlreadyMember);
        }

        Ok(Decision::approve())
    }
}

#[cfg(test)]
mod tests {
    use wiz_types::{AppId, ApplicationCall, AssetTransfer, LedgerSnapshot, Payment};

    use super::*;

    const ASSET: AssetId = AssetId(42);

    fn member() -> Address {
        Address::labeled("member")
    }

    fn contract() -> Address {
        Address::for_application(AppId(7))
    }

    fn validator() -> SignatureValidator {
        SignatureValidator::new(SignatureTemplate {
            manager: Address::labeled("manager"),
            asset_id: ASSET,
            contract_address: contract(),
        })
    }

    fn group_with(payment: Payment) -> TransactionGroup {
        TransactionGroup::new(vec![
            ApplicationCall::new(payment.sender, AppId(7), ["join_wizcoin"])
                .with_accounts([payment.sender])
                .into(),
            payment.into(),
        ])
    }

    fn eval(group: &TransactionGroup, view: &LedgerSnapshot) -> Decision {
        validator().evaluate(group, &[member()], view)
    }

    #[test]
    fn approves_without_emitting() {
        let group = group_with(Payment::new(member(), contract(), 50_000_000, 1000));
        let view = LedgerSnapshot::new().with_holding(member(), ASSET, 0);
        assert_eq!(eval(&group, &view), Decision::approve());
    }

    #[test]
    fn fee_ceiling_is_inclusive() {
        let view = LedgerSnapshot::new().with_holding(member(), ASSET, 0);
        let at = group_with(Payment::new(member(), contract(), 50_000_000, 1000));
        assert!(eval(&at, &view).is_approved());
        let over = group_with(Payment::new(member(), contract(), 50_000_000, 1001));
        assert_eq!(eval(&over, &view).cause(), Some(RejectCause::PaymentMismatch));
    }

    #[test]
    fn amount_must_be_exact() {
        let view = LedgerSnapshot::new().with_holding(member(), ASSET, 0);
        for amount in [49_999_999, 50_000_001] {
            let group = group_with(Payment::new(member(), contract(), amount, 1000));
            assert_eq!(eval(&group, &view).cause(), Some(RejectCause::PaymentMismatch));
        }
    }

    #[test]
    fn payment_must_reach_the_template_contract() {
        let elsewhere = Address::for_application(AppId(8));
        let group = group_with(Payment::new(member(), elsewhere, 50_000_000, 1000));
        assert_eq!(
            eval(&group, &LedgerSnapshot::new()).cause(),
            Some(RejectCause::PaymentMismatch)
        );
    }

    #[test]
    fn extra_arguments_are_rejected() {
        let group = TransactionGroup::new(vec![
            ApplicationCall::new(member(), AppId(7), ["join_wizcoin", "x"])
                .with_accounts([member()])
                .into(),
            Payment::new(member(), contract(), 50_000_000, 1000).into(),
        ]);
        assert_eq!(
            eval(&group, &LedgerSnapshot::new()).cause(),
            Some(RejectCause::ArgumentCountMismatch)
        );
    }

    #[test]
    fn join_must_be_a_noop_call() {
        let group = TransactionGroup::new(vec![
            ApplicationCall::new(member(), AppId(7), ["join_wizcoin"])
                .with_accounts([member()])
                .with_completion(OnCompletion::OptIn)
                .into(),
            Payment::new(member(), contract(), 50_000_000, 1000).into(),
        ]);
        assert_eq!(
            eval(&group, &LedgerSnapshot::new()).cause(),
            Some(RejectCause::UnknownOperation)
        );
    }

    #[test]
    fn contract_path_fee_is_too_high_here() {
        let group = group_with(Payment::new(member(), contract(), 50_000_000, 2000));
        assert_eq!(
            eval(&group, &LedgerSnapshot::new()).cause(),
            Some(RejectCause::PaymentMismatch)
        );
    }

    #[test]
    fn unregistered_holding_reads_as_zero() {
        let group = group_with(Payment::new(member(), contract(), 50_000_000, 1000));
        assert!(eval(&group, &LedgerSnapshot::new()).is_approved());
    }

    #[test]
    fn existing_member_is_rejected() {
        let group = group_with(Payment::new(member(), contract(), 50_000_000, 1000));
        let view = LedgerSnapshot::new().with_holding(member(), ASSET, 1);
        assert_eq!(eval(&group, &view).cause(), Some(RejectCause::AlreadyMember));
    }

    #[test]
    fn group_size_is_not_checked() {
        let mut txs = group_with(Payment::new(member(), contract(), 50_000_000, 1000))
            .transactions()
            .to_vec();
        txs.push(AssetTransfer::new(contract(), member(), ASSET, 1).into());
        let view = LedgerSnapshot::new().with_holding(member(), ASSET, 0);
        assert!(eval(&TransactionGroup::new(txs), &view).is_approved());
    }

    #[test]
    fn other_operations_are_unknown() {
        let group = TransactionGroup::new(vec![
            ApplicationCall::new(member(), AppId(7), ["relinquish_wizcoins"]).into(),
            Payment::new(member(), contract(), 50_000_000, 1000).into(),
        ]);
        assert_eq!(
            eval(&group, &LedgerSnapshot::new()).cause(),
            Some(RejectCause::UnknownOperation)
        );
    }

    #[test]
    fn payer_must_be_named() {
        let group = group_with(Payment::new(member(), contract(), 50_000_000, 1000));
        let decision = validator().evaluate(&group, &[], &LedgerSnapshot::new());
        assert_eq!(decision.cause(), Some(RejectCause::ArgumentCountMismatch));
        let decision =
            validator().evaluate(&group, &[Address::labeled("other")], &LedgerSnapshot::new());
        assert_eq!(decision.cause(), Some(RejectCause::PaymentMismatch));
    }

    #[test]
    fn missing_payment_is_a_shape_error() {
        let group = TransactionGroup::single(
            ApplicationCall::new(member(), AppId(7), ["join_wizcoin"]).with_accounts([member()]),
        );
        assert_eq!(
            eval(&group, &LedgerSnapshot::new()).cause(),
            Some(RejectCause::GroupShapeMismatch)
        );
    }

    #[test]
    fn template_reads_from_json() {
        let json = serde_json::json!({
            "manager": Address::labeled("manager").to_hex(),
            "asset_id": 42,
            "contract_address": contract().to_hex(),
        });
        let template: SignatureTemplate = serde_json::from_value(json).unwrap();
        assert_eq!(template, validator().template().clone());
    }
}
