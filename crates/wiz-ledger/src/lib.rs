//! In-memory ledger for WizCoin membership.
//!
//! The validators in `wiz-gate` only decide. This crate supplies the ledger
//! around them so the membership protocol can run end to end:
//! - `LedgerWriter` / `LedgerReader` trait boundaries
//! - `InMemoryLedger`, which applies each transaction group atomically and
//!   dispatches application calls to the approval validator
//! - `TransferEmitter`, the interface that executes a contract's emitted
//!   transfers inside the group that triggered them
//! - Native balances with minimum-balance rules, and the asset lifecycle
//! - `MembershipDeployment`, the setup, join, and teardown sequences

pub mod config;
pub mod deployment;
pub mod error;
pub mod memory;
pub mod records;
pub mod traits;

pub use config::LedgerConfig;
pub use deployment::MembershipDeployment;
pub use error::LedgerError;
pub use memory::InMemoryLedger;
pub use records::{
    AccountRecord, ApplicationRecord, AssetParams, AssetRecord, AssetRoles, GroupReceipt,
};
pub use traits::{LedgerReader, LedgerWriter, TransferEmitter};
