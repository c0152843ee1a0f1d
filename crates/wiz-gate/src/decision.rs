use std::fmt;

use serde::{Deserialize, Serialize};
use wiz_types::{Address, Amount, AssetId, GlobalState};

// ---------------------------------------------------------------------------
// RejectCause
// ---------------------------------------------------------------------------

/// Why a group was rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, thiserror::Error)]
pub enum RejectCause {
    /// Wrong number of arguments or referenced accounts.
    #[error("argument count mismatch")]
    ArgumentCountMismatch,
    /// The caller is not the manager.
    #[error("caller is not the manager")]
    UnauthorizedCaller,
    /// Wrong group size or transaction kinds.
    #[error("group shape mismatch")]
    GroupShapeMismatch,
    /// Wrong payment amount, fee, receiver, or payer binding.
    #[error("payment mismatch")]
    PaymentMismatch,
    /// The account already holds a membership token.
    #[error("account is already a member")]
    AlreadyMember,
    /// A holding the operation needs is not registered.
    #[error("asset holding is undefined")]
    HoldingUndefined,
    /// No operation matches the call.
    #[error("unknown operation")]
    UnknownOperation,
    /// An argument does not decode to the expected value.
    #[error("invalid argument encoding")]
    InvalidArgument,
}

// ---------------------------------------------------------------------------
// Effects
// ---------------------------------------------------------------------------

/// Where an emitted transfer goes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransferTarget {
    /// The application's own account.
    SelfAccount,
    /// Any other account.
    Account(Address),
}

/// An asset transfer the application wants executed from its own account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InnerTransfer {
    pub asset_id: AssetId,
    pub to: TransferTarget,
    pub amount: Amount,
}

impl InnerTransfer {
    /// Zero-amount transfer to self: registers the application to the asset.
    pub fn registration(asset_id: AssetId) -> Self {
        Self {
            asset_id,
            to: TransferTarget::SelfAccount,
            amount: 0,
        }
    }

    /// Transfer of `amount` units to `account`.
    pub fn to_account(asset_id: AssetId, account: Address, amount: Amount) -> Self {
        Self {
            asset_id,
            to: TransferTarget::Account(account),
            amount,
        }
    }

    /// Resolve the receiver against the application's address.
    pub fn receiver(&self, app_address: &Address) -> Address {
        match self.to {
            TransferTarget::SelfAccount => *app_address,
            TransferTarget::Account(account) => account,
        }
    }
}

impl fmt::Display for InnerTransfer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to {
            TransferTarget::SelfAccount => {
                write!(f, "{} x{} -> self", self.asset_id, self.amount)
            }
            TransferTarget::Account(account) => {
                write!(f, "{} x{} -> {account}", self.asset_id, self.amount)
            }
        }
    }
}

/// Change to the persisted global state requested by an approval.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StateChange {
    /// The creating call stores the initial state.
    Create(GlobalState),
    /// The application is being deleted; its state goes with it.
    Destroy,
}

// ---------------------------------------------------------------------------
// Decision
// ---------------------------------------------------------------------------

/// Outcome of evaluating a group.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    /// Apply the group, plus these effects.
    Approve {
        new_state: Option<StateChange>,
        emitted_transfers: Vec<InnerTransfer>,
    },
    /// Discard the group.
    Reject { cause: RejectCause },
}

impl Decision {
    /// Approval without effects.
    pub fn approve() -> Self {
        Self::Approve {
            new_state: None,
            emitted_transfers: Vec::new(),
        }
    }

    /// Approval that emits a single transfer.
    pub fn approve_with_transfer(transfer: InnerTransfer) -> Self {
        Self::Approve {
            new_state: None,
            emitted_transfers: vec![transfer],
        }
    }

    /// Approval that changes the global state.
    pub fn approve_with_state(change: StateChange) -> Self {
        Self::Approve {
            new_state: Some(change),
            emitted_transfers: Vec::new(),
        }
    }

    pub fn reject(cause: RejectCause) -> Self {
        Self::Reject { cause }
    }

    /// Returns `true` if the decision is `Approve`.
    pub fn is_approved(&self) -> bool {
        matches!(self, Self::Approve { .. })
    }

    /// Returns `true` if the decision is `Reject`.
    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Reject { .. })
    }

    /// The rejection cause, if rejected.
    pub fn cause(&self) -> Option<RejectCause> {
        match self {
            Self::Reject { cause } => Some(*cause),
            Self::Approve { .. } => None,
        }
    }

    /// Emitted transfers (empty when rejected).
    pub fn transfers(&self) -> &[InnerTransfer] {
        match self {
            Self::Approve {
                emitted_transfers, ..
            } => emitted_transfers,
            Self::Reject { .. } => &[],
        }
    }

    /// Requested state change, if any.
    pub fn state_change(&self) -> Option<&StateChange> {
        match self {
            Self::Approve { new_state, .. } => new_state.as_ref(),
            Self::Reject { .. } => None,
        }
    }
}

impl From<Result<Decision, RejectCause>> for Decision {
    fn from(result: Result<Decision, RejectCause>) -> Self {
        result.unwrap_or_else(Decision::reject)
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Approve {
                emitted_transfers, ..
            } if emitted_transfers.is_empty() => write!(f, "Approve"),
            Self::Approve {
                emitted_transfers, ..
            } => {
                write!(f, "Approve [")?;
                for (i, t) in emitted_transfers.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{t}")?;
                }
                write!(f, "]")
            }
            Self::Reject { cause } => write!(f, "Reject: {cause}"),
        }
    }
}
