use serde::{Deserialize, Serialize};
use wiz_gate::MembershipTerms;
use wiz_types::Amount;

use crate::error::LedgerError;

/// Ledger parameters.
///
/// ```toml
/// min_fee = 1000
/// base_min_balance = 100000
///
/// [terms]
/// registration_amount = 50000000
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Smallest fee a payment may carry.
    pub min_fee: Amount,
    /// Minimum balance of an account with no asset registrations; each
    /// registration adds the same amount again.
    pub base_min_balance: Amount,
    /// Terms the ledger's approval validator enforces.
    pub terms: MembershipTerms,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            min_fee: 1000,
            base_min_balance: 100_000,
            terms: MembershipTerms::default(),
        }
    }
}

impl LedgerConfig {
    /// Parse a configuration from TOML. Missing keys take defaults.
    pub fn from_toml_str(input: &str) -> Result<Self, LedgerError> {
        let config: Self = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), LedgerError> {
        self.terms.validate()?;
        if self.min_fee != self.terms.min_fee {
            return Err(LedgerError::Config(format!(
                "ledger minimum fee {} disagrees with the membership terms ({})",
                self.min_fee, self.terms.min_fee
            )));
        }
        Ok(())
    }

    /// Minimum balance of an account registered to `assets` assets.
    pub fn min_balance(&self, assets: usize) -> Amount {
        let slots = (assets as u64).saturating_add(1);
        self.base_min_balance.saturating_mul(slots)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn min_balance_grows_per_registration() {
        let config = LedgerConfig::default();
        assert_eq!(config.min_balance(0), 100_000);
        assert_eq!(config.min_balance(1), 200_000);
        assert_eq!(config.min_balance(3), 400_000);
    }

    #[test]
    fn nested_terms_from_toml() {
        let config = LedgerConfig::from_toml_str(
            "base_min_balance = 50000\n\n[terms]\nregistration_amount = 1000000\n",
        )
        .unwrap();
        assert_eq!(config.base_min_balance, 50_000);
        assert_eq!(config.min_fee, 1000);
        assert_eq!(config.terms.registration_amount, 1_000_000);
        assert_eq!(config.terms.join_fee_floor, 2000);
    }

    #[test]
    fn fee_mismatch_is_rejected() {
        let err = LedgerConfig::from_toml_str("min_fee = 500\n").unwrap_err();
        assert!(matches!(err, LedgerError::Config(_)));
    }

    #[test]
    fn invalid_terms_surface_as_config_errors() {
        let err = LedgerConfig::from_toml_str("[terms]\nregistration_amount = 0\n").unwrap_err();
        assert!(err.to_string().contains("registration amount"));
    }
}
