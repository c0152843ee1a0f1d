use serde::{Deserialize, Serialize};
use wiz_types::Amount;

use crate::error::GateError;

/// The business rule both validators share: what a join must pay.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MembershipTerms {
    /// Exact registration payment, in native units.
    pub registration_amount: Amount,
    /// Smallest fee a single transaction may carry.
    pub min_fee: Amount,
    /// Fee the contract path requires on the payment: it also covers the
    /// fee of the issuance transfer the contract emits.
    pub join_fee_floor: Amount,
    /// Largest fee the delegated signature path lets the payment carry.
    pub signature_fee_ceiling: Amount,
}

impl Default for MembershipTerms {
    fn default() -> Self {
        Self {
            registration_amount: 50_000_000,
            min_fee: 1000,
            join_fee_floor: 2000,
            signature_fee_ceiling: 1000,
        }
    }
}

impl MembershipTerms {
    /// Parse terms from TOML and validate them. Missing keys take defaults.
    pub fn from_toml_str(input: &str) -> Result<Self, GateError> {
        let terms: Self = toml::from_str(input)?;
        terms.validate()?;
        Ok(terms)
    }

    /// Check that the terms can be satisfied at all.
    pub fn validate(&self) -> Result<(), GateError> {
        if self.registration_amount == 0 {
            return Err(GateError::InvalidTerms(
                "registration amount must be positive".into(),
            ));
        }
        if self.join_fee_floor < self.min_fee.saturating_mul(2) {
            return Err(GateError::InvalidTerms(format!(
                "join fee floor {} cannot cover the payment and the issuance transfer at minimum fee {}",
                self.join_fee_floor, self.min_fee
            )));
        }
        if self.signature_fee_ceiling < self.min_fee {
            return Err(GateError::InvalidTerms(format!(
                "signature fee ceiling {} is below the minimum fee {}",
                self.signature_fee_ceiling, self.min_fee
            )));
        }
        Ok(())
    }

    /// Exact-match check on the registration payment.
    pub fn is_registration_amount(&self, amount: Amount) -> bool {
        amount == self.registration_amount
    }

    /// Contract path: the payment fee must fund the emitted transfer too.
    pub fn covers_issuance_fee(&self, fee: Amount) -> bool {
        fee >= self.join_fee_floor
    }

    /// Signature path: nothing is emitted, so no subsidy is allowed.
    pub fn within_signature_fee(&self, fee: Amount) -> bool {
        fee <= self.signature_fee_ceiling
    }
}
