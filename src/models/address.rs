use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::crypto::hash::{derive_address_bytes, Salt};
use crate::error::AppError;

pub const ADDRESS_LENGTH: usize = 20;

/// Fixed-width on-chain account address.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address([u8; ADDRESS_LENGTH]);

impl Address {
    pub const fn new(bytes: [u8; ADDRESS_LENGTH]) -> Self {
        Self(bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        let bytes: [u8; ADDRESS_LENGTH] = bytes.try_into().ok()?;
        Some(Self::new(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_LENGTH] {
        &self.0
    }

    /// Derives a child address. Never touches fetched state.
    pub fn derive(&self, salt: impl Into<Salt>) -> Address {
        Address::new(derive_address_bytes(self.as_bytes(), &salt.into()))
    }
}

impl FromStr for Address {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);

        if digits.len() != ADDRESS_LENGTH * 2 {
            return Err(AppError::MalformedAddress(format!(
                "expected {} hex digits, got {:?}",
                ADDRESS_LENGTH * 2,
                s
            )));
        }

        let bytes = hex::decode(digits)
            .map_err(|e| AppError::MalformedAddress(format!("{:?}: {}", s, e)))?;
        Address::from_slice(&bytes)
            .ok_or_else(|| AppError::MalformedAddress(format!("{:?}: wrong length", s)))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const AVATAR: &str = "0xAaAaAaAaAaAaAaAaAaAaAaAaAaAaAaAaAaAaAaAa";

    #[test]
    fn parse_is_case_insensitive_and_prefix_optional() {
        let upper: Address = AVATAR.parse().unwrap();
        let lower: Address = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa".parse().unwrap();
        assert_eq!(upper, lower);
        assert_eq!(upper.to_string(), "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa");
    }

    #[test]
    fn parse_rejects_non_hex_and_wrong_length() {
        assert!(matches!(
            "not-hex".parse::<Address>(),
            Err(AppError::MalformedAddress(_))
        ));
        assert!(matches!(
            "0xzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzz".parse::<Address>(),
            Err(AppError::MalformedAddress(_))
        ));
        assert!(matches!(
            "0xaaaa".parse::<Address>(),
            Err(AppError::MalformedAddress(_))
        ));
    }

    #[test]
    fn derive_distinguishes_salts_actually_used() {
        let avatar: Address = AVATAR.parse().unwrap();
        let derived = [
            avatar.derive("inventory"),
            avatar.derive("itemslot-Arena"),
            avatar.derive("runeslot-Arena"),
            avatar.derive(1_i64),
            avatar.derive(2_i64),
            avatar.derive(3_i64),
        ];
        for (i, a) in derived.iter().enumerate() {
            for b in derived.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
            assert_ne!(*a, avatar);
        }
    }

    #[test]
    fn derive_is_repeatable() {
        let avatar: Address = AVATAR.parse().unwrap();
        assert_eq!(avatar.derive("inventory"), avatar.derive("inventory"));
        assert_eq!(avatar.derive(7_i64), avatar.derive(7_i64));
    }

    #[test]
    fn serde_uses_hex_text() {
        let avatar: Address = AVATAR.parse().unwrap();
        let json = serde_json::to_string(&avatar).unwrap();
        assert_eq!(json, "\"0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa\"");
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, avatar);
    }
}
