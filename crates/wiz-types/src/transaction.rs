use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::address::Address;
use crate::error::TypeError;
use crate::ids::{Amount, AppId, AssetId};

// ---------------------------------------------------------------------------
// Application arguments
// ---------------------------------------------------------------------------

/// A single application-call argument: an opaque byte string.
///
/// In JSON an argument is written as a plain string (UTF-8 bytes), an
/// integer (8-byte big-endian encoding) or `{"hex": "..."}` for arbitrary
/// bytes.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct AppArg(Vec<u8>);

impl AppArg {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Big-endian 8-byte encoding of an integer.
    pub fn from_u64(value: u64) -> Self {
        Self(value.to_be_bytes().to_vec())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Decode as a big-endian unsigned integer of at most 8 bytes.
    ///
    /// The empty argument decodes to zero.
    pub fn to_u64(&self) -> Result<u64, TypeError> {
        if self.0.len() > 8 {
            return Err(TypeError::IntegerTooWide(self.0.len()));
        }
        Ok(self.0.iter().fold(0u64, |acc, b| (acc << 8) | u64::from(*b)))
    }

    /// The argument as text, if it is printable UTF-8.
    pub fn as_text(&self) -> Option<&str> {
        std::str::from_utf8(&self.0)
            .ok()
            .filter(|s| !s.chars().any(char::is_control))
    }
}

impl fmt::Debug for AppArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_text() {
            Some(text) => write!(f, "AppArg({text:?})"),
            None => write!(f, "AppArg(0x{})", hex::encode(&self.0)),
        }
    }
}

impl From<&str> for AppArg {
    fn from(value: &str) -> Self {
        Self(value.as_bytes().to_vec())
    }
}

impl From<String> for AppArg {
    fn from(value: String) -> Self {
        Self(value.into_bytes())
    }
}

impl From<u64> for AppArg {
    fn from(value: u64) -> Self {
        Self::from_u64(value)
    }
}

impl From<Vec<u8>> for AppArg {
    fn from(value: Vec<u8>) -> Self {
        Self(value)
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum ArgRepr {
    Text(String),
    Int(u64),
    Hex { hex: String },
}

impl Serialize for AppArg {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.as_text() {
            Some(text) => serializer.serialize_str(text),
            None => ArgRepr::Hex {
                hex: hex::encode(&self.0),
            }
            .serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for AppArg {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match ArgRepr::deserialize(deserializer)? {
            ArgRepr::Text(text) => Ok(Self::from(text)),
            ArgRepr::Int(value) => Ok(Self::from_u64(value)),
            ArgRepr::Hex { hex } => hex::decode(&hex)
                .map(Self)
                .map_err(serde::de::Error::custom),
        }
    }
}

// ---------------------------------------------------------------------------
// Transactions
// ---------------------------------------------------------------------------

/// How an application call finishes, beyond running the approval logic.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnCompletion {
    /// Plain call; the operation is selected by the first argument.
    #[default]
    NoOp,
    OptIn,
    CloseOut,
    UpdateApplication,
    DeleteApplication,
}

impl fmt::Display for OnCompletion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoOp => write!(f, "NoOp"),
            Self::OptIn => write!(f, "OptIn"),
            Self::CloseOut => write!(f, "CloseOut"),
            Self::UpdateApplication => write!(f, "UpdateApplication"),
            Self::DeleteApplication => write!(f, "DeleteApplication"),
        }
    }
}

/// Native-unit payment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub sender: Address,
    pub receiver: Address,
    pub amount: Amount,
    pub fee: Amount,
    /// Send whatever remains after this payment here and close the sender.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub close_remainder_to: Option<Address>,
}

impl Payment {
    pub fn new(sender: Address, receiver: Address, amount: Amount, fee: Amount) -> Self {
        Self {
            sender,
            receiver,
            amount,
            fee,
            close_remainder_to: None,
        }
    }
}

/// Transfer of asset units.
///
/// A zero-amount transfer from an account to itself registers (opts in) the
/// account to the asset.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetTransfer {
    pub sender: Address,
    pub receiver: Address,
    pub asset_id: AssetId,
    pub amount: Amount,
    /// Account to take the units from when the sender acts as clawback.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revocation_target: Option<Address>,
    /// Move the remaining holding here and remove the sender's registration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub close_to: Option<Address>,
}

impl AssetTransfer {
    pub fn new(sender: Address, receiver: Address, asset_id: AssetId, amount: Amount) -> Self {
        Self {
            sender,
            receiver,
            asset_id,
            amount,
            revocation_target: None,
            close_to: None,
        }
    }

    /// The zero-amount self transfer that registers `account` to `asset_id`.
    pub fn opt_in(account: Address, asset_id: AssetId) -> Self {
        Self::new(account, account, asset_id, 0)
    }

    /// Returns `true` if this transfer is a registration.
    pub fn is_opt_in(&self) -> bool {
        self.sender == self.receiver
            && self.amount == 0
            && self.revocation_target.is_none()
            && self.close_to.is_none()
    }
}

/// Call into a deployed (or to-be-created) application.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationCall {
    pub sender: Address,
    pub app_id: AppId,
    #[serde(default)]
    pub args: Vec<AppArg>,
    #[serde(default)]
    pub referenced_accounts: Vec<Address>,
    #[serde(default)]
    pub foreign_assets: Vec<AssetId>,
    #[serde(default)]
    pub on_completion: OnCompletion,
}

impl ApplicationCall {
    /// A NoOp call with the given arguments.
    pub fn new<I, A>(sender: Address, app_id: AppId, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<AppArg>,
    {
        Self {
            sender,
            app_id,
            args: args.into_iter().map(Into::into).collect(),
            referenced_accounts: Vec::new(),
            foreign_assets: Vec::new(),
            on_completion: OnCompletion::NoOp,
        }
    }

    pub fn with_accounts(mut self, accounts: impl IntoIterator<Item = Address>) -> Self {
        self.referenced_accounts = accounts.into_iter().collect();
        self
    }

    pub fn with_assets(mut self, assets: impl IntoIterator<Item = AssetId>) -> Self {
        self.foreign_assets = assets.into_iter().collect();
        self
    }

    pub fn with_completion(mut self, on_completion: OnCompletion) -> Self {
        self.on_completion = on_completion;
        self
    }

    /// The first argument, which selects the operation of a NoOp call.
    pub fn first_arg(&self) -> Option<&AppArg> {
        self.args.first()
    }
}

/// Discriminant of a [`Transaction`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TxKind {
    Payment,
    AssetTransfer,
    ApplicationCall,
}

impl fmt::Display for TxKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Payment => write!(f, "Payment"),
            Self::AssetTransfer => write!(f, "AssetTransfer"),
            Self::ApplicationCall => write!(f, "ApplicationCall"),
        }
    }
}

/// One transaction of a group.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Transaction {
    Payment(Payment),
    AssetTransfer(AssetTransfer),
    ApplicationCall(ApplicationCall),
}

impl Transaction {
    pub fn kind(&self) -> TxKind {
        match self {
            Self::Payment(_) => TxKind::Payment,
            Self::AssetTransfer(_) => TxKind::AssetTransfer,
            Self::ApplicationCall(_) => TxKind::ApplicationCall,
        }
    }

    pub fn sender(&self) -> &Address {
        match self {
            Self::Payment(p) => &p.sender,
            Self::AssetTransfer(t) => &t.sender,
            Self::ApplicationCall(c) => &c.sender,
        }
    }

    pub fn as_payment(&self) -> Option<&Payment> {
        match self {
            Self::Payment(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_application_call(&self) -> Option<&ApplicationCall> {
        match self {
            Self::ApplicationCall(c) => Some(c),
            _ => None,
        }
    }
}

impl From<Payment> for Transaction {
    fn from(p: Payment) -> Self {
        Self::Payment(p)
    }
}

impl From<AssetTransfer> for Transaction {
    fn from(t: AssetTransfer) -> Self {
        Self::AssetTransfer(t)
    }
}

impl From<ApplicationCall> for Transaction {
    fn from(c: ApplicationCall) -> Self {
        Self::ApplicationCall(c)
    }
}

// ---------------------------------------------------------------------------
// TransactionGroup
// ---------------------------------------------------------------------------

/// Ordered batch of transactions that commits atomically.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionGroup {
    transactions: Vec<Transaction>,
}

impl TransactionGroup {
    /// Largest group the ledger accepts.
    pub const MAX_SIZE: usize = 16;

    pub fn new(transactions: Vec<Transaction>) -> Self {
        Self { transactions }
    }

    /// A group holding a single transaction.
    pub fn single(transaction: impl Into<Transaction>) -> Self {
        Self::new(vec![transaction.into()])
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Transaction> {
        self.transactions.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Transaction> {
        self.transactions.iter()
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// The application call at `index`.
    pub fn application_call(&self, index: usize) -> Result<&ApplicationCall, TypeError> {
        let tx = self
            .get(index)
            .ok_or(TypeError::MissingTransaction(index))?;
        tx.as_application_call()
            .ok_or(TypeError::UnexpectedKind {
                index,
                expected: TxKind::ApplicationCall,
                found: tx.kind(),
            })
    }

    /// The payment at `index`.
    pub fn payment(&self, index: usize) -> Result<&Payment, TypeError> {
        let tx = self
            .get(index)
            .ok_or(TypeError::MissingTransaction(index))?;
        tx.as_payment().ok_or(TypeError::UnexpectedKind {
            index,
            expected: TxKind::Payment,
            found: tx.kind(),
        })
    }

    /// The `(application call, payment)` pair of a membership join.
    ///
    /// Checks the group length and both transaction kinds before handing out
    /// any field.
    pub fn join_pair(&self) -> Result<(&ApplicationCall, &Payment), TypeError> {
        if self.len() != 2 {
            return Err(TypeError::GroupSize {
                expected: 2,
                actual: self.len(),
            });
        }
        Ok((self.application_call(0)?, self.payment(1)?))
    }

    /// BLAKE3 identifier of the group's canonical JSON encoding.
    pub fn group_id(&self) -> Result<[u8; 32], TypeError> {
        let encoded = serde_json::to_vec(self)
            .map_err(|e| TypeError::Serialization(e.to_string()))?;
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"wiz-group-v1:");
        hasher.update(&encoded);
        Ok(*hasher.finalize().as_bytes())
    }
}

impl From<Vec<Transaction>> for TransactionGroup {
    fn from(transactions: Vec<Transaction>) -> Self {
        Self::new(transactions)
    }
}

impl<'a> IntoIterator for &'a TransactionGroup {
    type Item = &'a Transaction;
    type IntoIter = std::slice::Iter<'a, Transaction>;

    fn into_iter(self) -> Self::IntoIter {
        self.transactions.iter()
    }
}
