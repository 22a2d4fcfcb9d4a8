use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::TypeError;

/// Material used to derive an [`AccountId`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountMaterial {
    /// A human-readable wallet label (used by the CLI and in tests).
    Label(String),
    /// A raw 32-byte public key.
    PublicKey([u8; 32]),
    /// A ledger-internal service account, e.g. the marketplace escrow.
    Service(String),
}

/// Identity of an account holding tokens and native currency.
///
/// An `AccountId` is derived deterministically from [`AccountMaterial`]
/// using BLAKE3, so the same label always names the same account. It is
/// serialized as a hex string so it can key JSON maps.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AccountId {
    hash: [u8; 32],
}

impl AccountId {
    /// Derive an `AccountId` from account material.
    pub fn derive(material: &AccountMaterial) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"rush-account-v1:");
        match material {
            AccountMaterial::Label(label) => {
                hasher.update(b"label:");
                hasher.update(label.as_bytes());
            }
            AccountMaterial::PublicKey(pk) => {
                hasher.update(b"pubkey:");
                hasher.update(pk);
            }
            AccountMaterial::Service(name) => {
                hasher.update(b"service:");
                hasher.update(name.as_bytes());
            }
        }
        Self {
            hash: *hasher.finalize().as_bytes(),
        }
    }

    /// Shorthand for `derive(&AccountMaterial::Label(..))`.
    pub fn from_label(label: &str) -> Self {
        Self::derive(&AccountMaterial::Label(label.to_string()))
    }

    /// Shorthand for `derive(&AccountMaterial::Service(..))`.
    pub fn service(name: &str) -> Self {
        Self::derive(&AccountMaterial::Service(name.to_string()))
    }

    /// Create a random account for tests and demos.
    pub fn ephemeral() -> Self {
        let mut bytes = [0u8; 32];
        rand::Rng::fill(&mut rand::thread_rng(), &mut bytes);
        Self::derive(&AccountMaterial::PublicKey(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.hash
    }

    /// Full hex-encoded string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.hash)
    }

    /// Short identifier (first 8 hex characters).
    pub fn short_id(&self) -> String {
        format!("acct:{}", hex::encode(&self.hash[..4]))
    }

    /// Parse from a hex string (64 hex characters, optional `acct:` prefix).
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        let s = s.strip_prefix("acct:").unwrap_or(s);
        let bytes = hex::decode(s).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        if bytes.len() != 32 {
            return Err(TypeError::InvalidLength {
                expected: 32,
                actual: bytes.len(),
            });
        }
        let mut hash = [0u8; 32];
        hash.copy_from_slice(&bytes);
        Ok(Self { hash })
    }

    pub fn from_raw(hash: [u8; 32]) -> Self {
        Self { hash }
    }
}

impl fmt::Debug for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccountId({})", self.short_id())
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.short_id())
    }
}

impl FromStr for AccountId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for AccountId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for AccountId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn derive_is_deterministic() {
        assert_eq!(AccountId::from_label("alice"), AccountId::from_label("alice"));
    }

    #[test]
    fn labels_and_services_do_not_collide() {
        assert_ne!(AccountId::from_label("market"), AccountId::service("market"));
        assert_ne!(AccountId::from_label("alice"), AccountId::from_label("bob"));
    }

    #[test]
    fn ephemeral_ids_are_unique() {
        assert_ne!(AccountId::ephemeral(), AccountId::ephemeral());
    }

    #[test]
    fn short_id_format() {
        let short = AccountId::from_label("alice").short_id();
        assert!(short.starts_with("acct:"));
        assert_eq!(short.len(), 13);
    }

    #[test]
    fn hex_parse_accepts_prefix() {
        let id = AccountId::from_label("carol");
        let prefixed = format!("acct:{}", id.to_hex());
        assert_eq!(AccountId::from_hex(&prefixed).unwrap(), id);
        assert_eq!(id.to_hex().parse::<AccountId>().unwrap(), id);
    }

    #[test]
    fn rejects_wrong_length() {
        let err = AccountId::from_hex("abcd").unwrap_err();
        assert_eq!(err, TypeError::InvalidLength { expected: 32, actual: 2 });
    }

    #[test]
    fn serializes_as_map_key() {
        let mut balances = BTreeMap::new();
        balances.insert(AccountId::from_label("dave"), 42u64);
        let json = serde_json::to_string(&balances).unwrap();
        let back: BTreeMap<AccountId, u64> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, balances);
    }
}
