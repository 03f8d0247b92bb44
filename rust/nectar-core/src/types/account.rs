// Account - Minimal account identifiers
use serde::{Deserialize, Serialize};
use std::fmt;

/// AccountId = 32 opaque bytes (public key or contract address)
/// Principle: No identity, just keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AccountId([u8; 32]);

impl AccountId {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        AccountId(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Derives a deterministic account for a system component (auction, treasury...)
    pub fn derived(label: &str) -> Self {
        AccountId(*blake3::hash(label.as_bytes()).as_bytes())
    }

    /// Parses a 32-byte hex string, with or without 0x prefix
    pub fn from_hex(s: &str) -> Result<Self, AccountError> {
        let hex_str = s.trim().strip_prefix("0x").unwrap_or(s.trim());
        let bytes = hex::decode(hex_str).map_err(|e| AccountError::InvalidHex(e.to_string()))?;

        if bytes.len() != 32 {
            return Err(AccountError::InvalidLength(bytes.len()));
        }

        let mut out = [0u8; 32];
        out.copy_from_slice(&bytes);
        Ok(AccountId(out))
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "0x{}", hex::encode(&self.0[..8]))
    }
}

impl From<[u8; 32]> for AccountId {
    fn from(bytes: [u8; 32]) -> Self {
        AccountId(bytes)
    }
}

/// Account identifier errors
#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error("Invalid hex: {0}")]
    InvalidHex(String),

    #[error("Invalid account length: {0} bytes (expected 32)")]
    InvalidLength(usize),
}
