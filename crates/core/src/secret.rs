// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Opaque tunnel secrets. For `mtproto`, spec.md §3 invariant I6 requires
//! exactly 32 raw bytes, represented on the wire/in config as 64 lowercase
//! hex characters.

use serde::{Deserialize, Serialize};

/// Opaque secret bytes. MTProto requires exactly 32 bytes (I6); other kinds
/// may carry shorter or empty secrets.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Secret(#[serde(with = "hex_bytes")] Vec<u8>);

impl Secret {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn from_hex(s: &str) -> Result<Self, SecretError> {
        if s.len() % 2 != 0 {
            return Err(SecretError::OddLength(s.len()));
        }
        if !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(SecretError::NotHex);
        }
        let bytes = hex::decode(s).map_err(|_| SecretError::NotHex)?;
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Validates the MTProto-specific constraint (I6): exactly 32 raw bytes,
    /// i.e. 64 hex characters.
    pub fn validate_mtproto(&self) -> Result<(), SecretError> {
        if self.0.len() != 32 {
            return Err(SecretError::WrongLength(self.0.len()));
        }
        Ok(())
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Secret({} bytes, redacted)", self.0.len())
    }
}

mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(&s).map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum SecretError {
    #[error("secret hex string has odd length {0}")]
    OddLength(usize),
    #[error("secret is not valid hex")]
    NotHex,
    #[error("secret must be 32 bytes (64 hex chars), got {0} bytes")]
    WrongLength(usize),
}

#[cfg(test)]
#[path = "secret_tests.rs"]
mod tests;
