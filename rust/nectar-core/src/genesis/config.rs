// Chain configuration - JSON form of the genesis spec
use super::spec::{GenesisAuction, GenesisBucket, GenesisGrant, GenesisSpec};
use crate::auction::AuctionError;
use crate::emission::EmissionCurveParams;
use crate::ledger::LedgerError;
use crate::types::{AccountError, AccountId, Balance, DenominationId, Duration, Timestamp};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// On-disk chain configuration; accounts are hex strings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainConfig {
    /// Genesis time (Unix seconds)
    pub genesis_time: Timestamp,

    /// Governor account (hex)
    pub governor: String,

    pub buckets: Vec<BucketConfig>,

    #[serde(default)]
    pub auctions: Vec<AuctionConfig>,

    #[serde(default)]
    pub grants: Vec<GrantConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketConfig {
    pub name: String,

    #[serde(default)]
    pub denomination: u32,

    /// Cap in base units
    pub cap: Balance,

    pub curve: EmissionCurveParams,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuctionConfig {
    pub name: String,

    /// Bucket name
    pub bucket: String,

    /// Window length in seconds
    pub window: Duration,

    pub start: Timestamp,

    /// Receiver of unclaimed budget (hex)
    #[serde(default)]
    pub beneficiary: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantConfig {
    pub role: String,

    /// Account (hex)
    pub account: String,
}

impl ChainConfig {
    pub fn mainnet() -> Self {
        Self::from_spec(&GenesisSpec::mainnet())
    }

    pub fn from_spec(spec: &GenesisSpec) -> Self {
        Self {
            genesis_time: spec.timestamp,
            governor: spec.governor.to_hex(),
            buckets: spec
                .buckets
                .iter()
                .map(|b| BucketConfig {
                    name: b.name.clone(),
                    denomination: b.denomination.0,
                    cap: b.cap,
                    curve: b.curve,
                })
                .collect(),
            auctions: spec
                .auctions
                .iter()
                .map(|a| AuctionConfig {
                    name: a.name.clone(),
                    bucket: a.bucket.clone(),
                    window: a.window,
                    start: a.start,
                    beneficiary: a.beneficiary.map(|acc| acc.to_hex()),
                })
                .collect(),
            grants: spec
                .grants
                .iter()
                .map(|g| GrantConfig {
                    role: g.role.clone(),
                    account: g.account.to_hex(),
                })
                .collect(),
        }
    }

    /// Parses accounts and produces the typed spec
    pub fn to_spec(&self) -> Result<GenesisSpec, ConfigError> {
        let buckets = self
            .buckets
            .iter()
            .map(|b| GenesisBucket {
                name: b.name.clone(),
                denomination: DenominationId(b.denomination),
                cap: b.cap,
                curve: b.curve,
            })
            .collect();

        let auctions = self
            .auctions
            .iter()
            .map(|a| -> Result<GenesisAuction, ConfigError> {
                Ok(GenesisAuction {
                    name: a.name.clone(),
                    bucket: a.bucket.clone(),
                    window: a.window,
                    start: a.start,
                    beneficiary: a.beneficiary.as_deref().map(AccountId::from_hex).transpose()?,
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        let grants = self
            .grants
            .iter()
            .map(|g| -> Result<GenesisGrant, ConfigError> {
                Ok(GenesisGrant {
                    role: g.role.clone(),
                    account: AccountId::from_hex(&g.account)?,
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        Ok(GenesisSpec {
            timestamp: self.genesis_time,
            governor: AccountId::from_hex(&self.governor)?,
            buckets,
            auctions,
            grants,
        })
    }

    /// Loads from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Saves to a JSON file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self::mainnet()
    }
}

/// Configuration and genesis errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid account: {0}")]
    InvalidAccount(#[from] AccountError),

    #[error("Unknown bucket: {0}")]
    UnknownBucket(String),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Auction error: {0}")]
    Auction(#[from] AuctionError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_mainnet_config() {
        let config = ChainConfig::mainnet();
        assert_eq!(config.buckets.len(), 5);
        assert_eq!(config.auctions[0].name, "weekly");
        assert_eq!(config.to_spec().unwrap(), GenesisSpec::mainnet());
    }

    #[test]
    fn test_file_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("chain.json");

        let config = ChainConfig::default();
        config.to_file(&path).unwrap();
        assert_eq!(ChainConfig::from_file(&path).unwrap(), config);
    }

    #[test]
    fn test_minimal_json() {
        let json = r#"{
            "genesis_time": 0,
            "governor": "0909090909090909090909090909090909090909090909090909090909090909",
            "buckets": [{
                "name": "RESERVED_ALLOCATION",
                "cap": 1000,
                "curve": {
                    "start": 0,
                    "ramp_duration": 0,
                    "ramp_steepness": 1,
                    "plateau_duration": 0,
                    "decay_duration": 0,
                    "decay_steepness": 1
                }
            }]
        }"#;

        let config: ChainConfig = serde_json::from_str(json).unwrap();
        let spec = config.to_spec().unwrap();
        assert_eq!(spec.governor, AccountId::from_bytes([9; 32]));
        assert_eq!(spec.buckets[0].denomination, DenominationId::BASE);
        assert!(spec.auctions.is_empty());
    }

    #[test]
    fn test_bad_governor() {
        let mut config = ChainConfig::mainnet();
        config.governor = "zz".to_string();
        assert!(matches!(config.to_spec(), Err(ConfigError::InvalidAccount(_))));
    }
}
