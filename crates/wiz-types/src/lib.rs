//! Foundation types for WizCoin membership.
//!
//! This crate provides the account, asset, transaction and state types shared
//! by the validators and the ledger. Every other `wiz-*` crate depends on
//! `wiz-types`.
//!
//! # Key Types
//!
//! - [`Address`]: Fixed-size account identifier (single key, multisig, or application)
//! - [`AssetId`] / [`AppId`]: Integer identifiers for token pools and applications
//! - [`Transaction`] / [`TransactionGroup`]: Atomic, ordered batches submitted together
//! - [`GlobalState`]: The contract's persisted manager and tracked asset
//! - [`LedgerView`]: Read-only holding lookups handed to validators

pub mod address;
pub mod error;
pub mod ids;
pub mod state;
pub mod transaction;
pub mod view;

pub use address::Address;
pub use error::TypeError;
pub use ids::{Amount, AppId, AssetId};
pub use state::{GlobalState, StateSchema};
pub use transaction::{
    AppArg, ApplicationCall, AssetTransfer, OnCompletion, Payment, Transaction, TransactionGroup,
    TxKind,
};
pub use view::{HoldingEntry, LedgerSnapshot, LedgerView};
