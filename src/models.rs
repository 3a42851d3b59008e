// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Domain Types
//!
//! Newtypes shared across the retrieval pipeline and the API layer.
//!
//! ## Identity and Addressing
//!
//! - [`UserAddress`] wraps the caller's wallet-style address. Lookups are
//!   case-insensitive, so construction goes through [`UserAddress::normalize`]
//!   which trims and lowercases the raw value.
//! - [`ContentHash`] wraps one IPFS content identifier. The core performs no
//!   format validation beyond non-emptiness; the gateway is the authority on
//!   whether a hash resolves.
//!
//! ## Key Material
//!
//! [`UserKey`] holds a user's 256-bit AES decryption key. It is read-only to
//! the pipeline, derives neither `Serialize` nor `Deserialize`, and its
//! `Debug` output redacts the bytes so key material cannot leak through logs.

use std::fmt;

// =============================================================================
// User Address
// =============================================================================

/// Normalized caller address used for directory lookups.
///
/// Addresses arrive in mixed case from clients; the directory stores and
/// matches the lowercase form.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UserAddress(String);

impl UserAddress {
    /// Trim and lowercase a raw address. Returns `None` for blank input.
    pub fn normalize(value: &str) -> Option<Self> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_lowercase()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for UserAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UserAddress({})", self.0)
    }
}

// =============================================================================
// Content Hash
// =============================================================================

/// Identifier of one immutable blob on the content-addressed storage network.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ContentHash(String);

impl ContentHash {
    /// Accept any non-blank string as a hash. Returns `None` for blank input.
    pub fn parse(value: &str) -> Option<Self> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({})", self.0)
    }
}

// =============================================================================
// User Key
// =============================================================================

/// Error parsing a directory key into a [`UserKey`].
#[derive(Debug, thiserror::Error)]
pub enum UserKeyError {
    #[error("user key is not valid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    #[error("user key must be {expected} bytes, got {actual}")]
    WrongLength { expected: usize, actual: usize },
}

/// Per-user AES-256 decryption key.
///
/// The directory stores keys hex-encoded; this type holds the decoded bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct UserKey([u8; 32]);

impl UserKey {
    /// Key length in bytes (AES-256).
    pub const LEN: usize = 32;

    /// Decode a hex-encoded key from the user directory.
    pub fn from_hex(value: &str) -> Result<Self, UserKeyError> {
        let bytes = hex::decode(value.trim())?;
        let actual = bytes.len();
        let key: [u8; Self::LEN] = bytes
            .try_into()
            .map_err(|_| UserKeyError::WrongLength {
                expected: Self::LEN,
                actual,
            })?;
        Ok(Self(key))
    }

    pub fn as_bytes(&self) -> &[u8; Self::LEN] {
        &self.0
    }
}

impl fmt::Debug for UserKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Key material must never reach logs.
        write!(f, "UserKey(..)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_lowercases_and_trims() {
        let addr = UserAddress::normalize("  0xAbCd12EF  ").expect("address parses");
        assert_eq!(addr.as_str(), "0xabcd12ef");
    }

    #[test]
    fn normalize_rejects_blank_input() {
        assert!(UserAddress::normalize("").is_none());
        assert!(UserAddress::normalize("   ").is_none());
    }

    #[test]
    fn content_hash_accepts_any_non_blank_string() {
        let hash = ContentHash::parse(" QmYwAPJzv5CZsnA625s3Xf2nemtYgPpHdWEz79ojWnPbdG ")
            .expect("hash parses");
        assert_eq!(hash.as_str(), "QmYwAPJzv5CZsnA625s3Xf2nemtYgPpHdWEz79ojWnPbdG");

        assert!(ContentHash::parse("").is_none());
        assert!(ContentHash::parse("\t ").is_none());
    }

    #[test]
    fn user_key_decodes_64_hex_chars() {
        let hex_key = "00".repeat(32);
        let key = UserKey::from_hex(&hex_key).expect("key parses");
        assert_eq!(key.as_bytes(), &[0u8; 32]);
    }

    #[test]
    fn user_key_rejects_wrong_length() {
        let err = UserKey::from_hex("deadbeef").unwrap_err();
        assert!(matches!(
            err,
            UserKeyError::WrongLength {
                expected: 32,
                actual: 4
            }
        ));
    }

    #[test]
    fn user_key_rejects_non_hex() {
        let err = UserKey::from_hex(&"zz".repeat(32)).unwrap_err();
        assert!(matches!(err, UserKeyError::InvalidHex(_)));
    }

    #[test]
    fn user_key_debug_redacts_bytes() {
        let key = UserKey::from_hex(&"ab".repeat(32)).expect("key parses");
        assert_eq!(format!("{key:?}"), "UserKey(..)");
    }
}
