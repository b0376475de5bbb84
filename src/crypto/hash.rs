use sha3::{Digest, Keccak256};

use crate::models::address::ADDRESS_LENGTH;

const SALT_TAG_LABEL: u8 = b'u';
const SALT_TAG_ID: u8 = b'i';

/// Computes the Keccak-256 digest of the given bytes.
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Salt used to derive a child address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Salt {
    Label(String),
    Id(i64),
}

impl Salt {
    /// Canonical byte form: a one-byte tag followed by the UTF-8 label or the decimal id.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        match self {
            Salt::Label(label) => {
                let mut out = Vec::with_capacity(label.len() + 1);
                out.push(SALT_TAG_LABEL);
                out.extend_from_slice(label.as_bytes());
                out
            }
            Salt::Id(id) => {
                let digits = id.to_string();
                let mut out = Vec::with_capacity(digits.len() + 1);
                out.push(SALT_TAG_ID);
                out.extend_from_slice(digits.as_bytes());
                out
            }
        }
    }
}

impl From<&str> for Salt {
    fn from(label: &str) -> Self {
        Salt::Label(label.to_string())
    }
}

impl From<String> for Salt {
    fn from(label: String) -> Self {
        Salt::Label(label)
    }
}

impl From<i64> for Salt {
    fn from(id: i64) -> Self {
        Salt::Id(id)
    }
}

/// Derives child address bytes: the trailing 20 bytes of keccak256(parent || salt).
pub fn derive_address_bytes(parent: &[u8; ADDRESS_LENGTH], salt: &Salt) -> [u8; ADDRESS_LENGTH] {
    let salt_bytes = salt.canonical_bytes();
    let mut preimage = Vec::with_capacity(ADDRESS_LENGTH + salt_bytes.len());
    preimage.extend_from_slice(parent);
    preimage.extend_from_slice(&salt_bytes);

    let digest = keccak256(&preimage);
    let mut out = [0u8; ADDRESS_LENGTH];
    out.copy_from_slice(&digest[digest.len() - ADDRESS_LENGTH..]);
    out
}
