// Primitives Nectar - Fundamental types
// Principle: Minimal, integer-only, auditable
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unix timestamp in seconds, supplied by the host
pub type Timestamp = u64;

/// Duration in seconds
pub type Duration = u64;

/// Token amount in base units (u128 = room for 10^20 whole tokens at 18 decimals)
pub type Balance = u128;

/// Auction epoch index
pub type EpochNumber = u64;

/// Monetary constants
pub const UNIT: Balance = 1_000_000_000_000_000_000; // 10^18
pub const MILLIUNIT: Balance = 1_000_000_000_000_000; // 10^15
pub const MICROUNIT: Balance = 1_000_000_000_000; // 10^12

/// Name of the role that administers every allocation role
pub const GOVERNOR_ROLE: &str = "GOVERNOR";

/// Role identifier = blake3 digest of the role name
///
/// Every allocation bucket is keyed by the role allowed to mint from it, so a
/// bucket id and its minting role are the same value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RoleId([u8; 32]);

impl RoleId {
    pub fn named(name: &str) -> Self {
        RoleId(*blake3::hash(name.as_bytes()).as_bytes())
    }

    /// Role allowed to grant roles, edit caps and replace curves
    pub fn governor() -> Self {
        Self::named(GOVERNOR_ROLE)
    }

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        RoleId(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for RoleId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "role:{}", hex::encode(&self.0[..6]))
    }
}

/// Denomination (token id) a bucket mints into
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DenominationId(pub u32);

impl DenominationId {
    /// Fungible governance token
    pub const BASE: DenominationId = DenominationId(0);
}

impl fmt::Display for DenominationId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "denom:{}", self.0)
    }
}
