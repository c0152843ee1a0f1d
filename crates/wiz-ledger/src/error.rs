use wiz_gate::{GateError, RejectCause};
use wiz_types::{Address, Amount, AppId, AssetId, TypeError};

/// Errors produced by ledger operations.
///
/// Any error raised while a group is being applied discards the whole group.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("rejected by validator: {0}")]
    Rejected(RejectCause),

    #[error("insufficient funds in {account}: needed {needed}, available {available}")]
    InsufficientFunds {
        account: Address,
        needed: Amount,
        available: Amount,
    },

    #[error("{account} would fall below its minimum balance of {required}")]
    BelowMinimumBalance { account: Address, required: Amount },

    #[error("fee {fee} is below the minimum fee {min_fee}")]
    FeeTooLow { fee: Amount, min_fee: Amount },

    #[error("{account} is not registered to {asset_id}")]
    NotRegistered { account: Address, asset_id: AssetId },

    #[error("unknown asset {0}")]
    UnknownAsset(AssetId),

    #[error("unknown application {0}")]
    UnknownApplication(AppId),

    #[error("unknown account {0}")]
    UnknownAccount(Address),

    #[error("invalid asset operation: {0}")]
    InvalidAssetOperation(String),

    #[error("{0} is not authorized for this operation")]
    Unauthorized(Address),

    #[error("state schema cannot hold the application's global state")]
    SchemaTooSmall,

    #[error("invalid group: {0}")]
    InvalidGroup(String),

    #[error("ledger lock poisoned")]
    LockPoisoned,

    #[error("arithmetic overflow")]
    Overflow,

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Type(#[from] TypeError),
}

impl LedgerError {
    /// The validator's cause, when the group was rejected by a decision.
    pub fn reject_cause(&self) -> Option<RejectCause> {
        match self {
            Self::Rejected(cause) => Some(*cause),
            _ => None,
        }
    }
}

impl From<RejectCause> for LedgerError {
    fn from(cause: RejectCause) -> Self {
        Self::Rejected(cause)
    }
}

impl From<GateError> for LedgerError {
    fn from(err: GateError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<toml::de::Error> for LedgerError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(err.to_string())
    }
}
