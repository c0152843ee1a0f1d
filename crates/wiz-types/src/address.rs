use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::ids::AppId;

/// Fixed-size account identifier.
///
/// An `Address` may stand for a single-key account, a multi-signature
/// account, or the account owned by an application. Validators compare
/// addresses by value and never look behind them.
///
/// Serialized as a 64-character hex string.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address {
    bytes: [u8; 32],
}

impl Address {
    /// Derive a single-key account address from a name.
    pub fn labeled(label: impl AsRef<str>) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"wiz-address-v1:label:");
        hasher.update(label.as_ref().as_bytes());
        Self {
            bytes: *hasher.finalize().as_bytes(),
        }
    }

    /// The account controlled by an application.
    ///
    /// Transfers the application emits are sent from this address, and
    /// registration payments must be addressed to it.
    pub fn for_application(app_id: AppId) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"wiz-app-account-v1:");
        hasher.update(&app_id.get().to_be_bytes());
        Self {
            bytes: *hasher.finalize().as_bytes(),
        }
    }

    /// The address of a multi-signature account.
    ///
    /// Derived from the version, the signing threshold and the ordered owner
    /// list, so the same owners in a different order form a different
    /// account. Collecting signatures and enforcing the threshold is the
    /// signing collaborator's job; the address itself is all the ledger and
    /// validators ever see.
    pub fn multisig(version: u8, threshold: u8, owners: &[Address]) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"wiz-multisig-v1:");
        hasher.update(&[version, threshold]);
        for owner in owners {
            hasher.update(&owner.bytes);
        }
        Self {
            bytes: *hasher.finalize().as_bytes(),
        }
    }

    /// The raw 32 bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.bytes
    }

    /// Full hex-encoded string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }

    /// Short identifier (first 8 hex characters).
    pub fn short_id(&self) -> String {
        format!("wz:{}", hex::encode(&self.bytes[..4]))
    }

    /// Parse from a hex string, with or without the `wz:` prefix.
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        let s = s.strip_prefix("wz:").unwrap_or(s);
        let bytes = hex::decode(s).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        if bytes.len() != 32 {
            return Err(TypeError::InvalidLength {
                expected: 32,
                actual: bytes.len(),
            });
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self { bytes: arr })
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.short_id())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.short_id())
    }
}

impl TryFrom<String> for Address {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value)
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.to_hex()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_derive_deterministically() {
        assert_eq!(Address::labeled("alice"), Address::labeled("alice"));
        assert_ne!(Address::labeled("alice"), Address::labeled("bob"));
    }

    #[test]
    fn application_addresses_are_distinct_per_app() {
        assert_ne!(
            Address::for_application(AppId(1)),
            Address::for_application(AppId(2))
        );
        assert_eq!(
            Address::for_application(AppId(5)),
            Address::for_application(AppId(5))
        );
    }

    #[test]
    fn multisig_depends_on_owner_order_and_threshold() {
        let a = Address::labeled("user3");
        let b = Address::labeled("user4");
        let ab = Address::multisig(1, 2, &[a, b]);
        assert_eq!(ab, Address::multisig(1, 2, &[a, b]));
        assert_ne!(ab, Address::multisig(1, 2, &[b, a]));
        assert_ne!(ab, Address::multisig(1, 1, &[a, b]));
        assert_ne!(ab, a);
    }

    #[test]
    fn short_id_format() {
        let short = Address::labeled("manager").short_id();
        assert!(short.starts_with("wz:"));
        assert_eq!(short.len(), 11);
    }

    #[test]
    fn hex_roundtrip_with_prefix() {
        let address = Address::labeled("owner");
        let prefixed = format!("wz:{}", address.to_hex());
        assert_eq!(Address::from_hex(&prefixed).unwrap(), address);
    }

    #[test]
    fn from_hex_rejects_wrong_length() {
        let err = Address::from_hex("abcd").unwrap_err();
        assert_eq!(
            err,
            TypeError::InvalidLength {
                expected: 32,
                actual: 2
            }
        );
    }

    #[test]
    fn serializes_as_hex_string() {
        let address = Address::labeled("owner");
        let json = serde_json::to_string(&address).unwrap();
        assert_eq!(json, format!("\"{}\"", address.to_hex()));
        let parsed: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, address);
    }
}
