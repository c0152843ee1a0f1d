use std::fmt;

use wiz_types::{ApplicationCall, OnCompletion};

/// First argument selecting the contract's opt-in to the tracked asset.
pub const OPT_IN_WIZCOIN: &[u8] = b"opt_in_wizcoin";
/// First argument selecting a membership join.
pub const JOIN_WIZCOIN: &[u8] = b"join_wizcoin";
/// First argument selecting the reclaim of unissued tokens.
pub const RELINQUISH_WIZCOINS: &[u8] = b"relinquish_wizcoins";

/// Every operation the membership contract understands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    /// The creating call (application id 0).
    Initialize,
    DeleteApplication,
    UpdateApplication,
    /// Account-level opt-in to the application. No local state is kept.
    OptIn,
    CloseOut,
    /// The contract registers itself to the tracked asset.
    OptInContract,
    /// Issue one membership token against a registration payment.
    JoinMembership,
    /// Return every unissued token to the manager.
    RelinquishReserve,
    /// Nothing matched.
    Unknown,
}

impl Operation {
    /// Select the operation for an application call.
    ///
    /// The creation id wins over everything, then the completion type, then
    /// the first argument of a NoOp call.
    pub fn classify(call: &ApplicationCall) -> Self {
        if call.app_id.is_creation() {
            return Self::Initialize;
        }
        match call.on_completion {
            OnCompletion::DeleteApplication => Self::DeleteApplication,
            OnCompletion::UpdateApplication => Self::UpdateApplication,
            OnCompletion::OptIn => Self::OptIn,
            OnCompletion::CloseOut => Self::CloseOut,
            OnCompletion::NoOp => match call.first_arg().map(|a| a.as_bytes()) {
                Some(OPT_IN_WIZCOIN) => Self::OptInContract,
                Some(JOIN_WIZCOIN) => Self::JoinMembership,
                Some(RELINQUISH_WIZCOINS) => Self::RelinquishReserve,
                _ => Self::Unknown,
            },
        }
    }

    /// Returns `true` for operations only the manager may perform.
    pub fn requires_manager(self) -> bool {
        matches!(
            self,
            Self::DeleteApplication
                | Self::UpdateApplication
                | Self::OptInContract
                | Self::RelinquishReserve
        )
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Initialize => "initialize",
            Self::DeleteApplication => "delete_application",
            Self::UpdateApplication => "update_application",
            Self::OptIn => "opt_in",
            Self::CloseOut => "close_out",
            Self::OptInContract => "opt_in_wizcoin",
            Self::JoinMembership => "join_wizcoin",
            Self::RelinquishReserve => "relinquish_wizcoins",
            Self::Unknown => "unknown",
        };
        write!(f, "{name}")
    }
}

#[cfg(test)]
mod tests {
    use wiz_types::{Address, AppArg, AppId};

    use super::*;

    fn call(app_id: u64, args: &[&str]) -> ApplicationCall {
        ApplicationCall::new(Address::labeled("caller"), AppId(app_id), args.iter().copied())
    }

    #[test]
    fn creation_beats_everything() {
        let c = call(0, &["join_wizcoin"]).with_completion(OnCompletion::DeleteApplication);
        assert_eq!(Operation::classify(&c), Operation::Initialize);
    }

    #[test]
    fn completion_beats_arguments() {
        let c = call(1, &["join_wizcoin"]).with_completion(OnCompletion::OptIn);
        assert_eq!(Operation::classify(&c), Operation::OptIn);
        let c = call(1, &[]).with_completion(OnCompletion::UpdateApplication);
        assert_eq!(Operation::classify(&c), Operation::UpdateApplication);
    }

    #[test]
    fn noop_dispatches_on_first_argument() {
        assert_eq!(
            Operation::classify(&call(1, &["opt_in_wizcoin"])),
            Operation::OptInContract
        );
        assert_eq!(
            Operation::classify(&call(1, &["join_wizcoin", "extra"])),
            Operation::JoinMembership
        );
        assert_eq!(
            Operation::classify(&call(1, &["relinquish_wizcoins"])),
            Operation::RelinquishReserve
        );
    }

    #[test]
    fn unmatched_calls_are_unknown() {
        assert_eq!(Operation::classify(&call(1, &[])), Operation::Unknown);
        assert_eq!(
            Operation::classify(&call(1, &["JOIN_WIZCOIN"])),
            Operation::Unknown
        );
        let numeric = ApplicationCall::new(Address::labeled("c"), AppId(1), [AppArg::from_u64(1)]);
        assert_eq!(Operation::classify(&numeric), Operation::Unknown);
    }

    #[test]
    fn manager_only_operations() {
        assert!(Operation::RelinquishReserve.requires_manager());
        assert!(Operation::DeleteApplication.requires_manager());
        assert!(Operation::UpdateApplication.requires_manager());
        assert!(Operation::OptInContract.requires_manager());
        assert!(!Operation::JoinMembership.requires_manager());
        assert!(!Operation::CloseOut.requires_manager());
    }
}
