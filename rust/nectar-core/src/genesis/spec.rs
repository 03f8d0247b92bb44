// Genesis spec - Default allocation table and state builder
use super::config::ConfigError;
use crate::auction::{Auction, DEFAULT_WINDOW};
use crate::emission::EmissionCurveParams;
use crate::storage::NectarState;
use crate::types::*;
use serde::{Deserialize, Serialize};
use tracing::info;

pub const ANON_ALLOCATION: &str = "ANON_ALLOCATION";
pub const AUCTION22_ALLOCATION: &str = "AUCTION22_ALLOCATION";
pub const RECM_ALLOCATION: &str = "RECM_ALLOCATION";
pub const RESERVED_ALLOCATION: &str = "RESERVED_ALLOCATION";
pub const RESERVE_ALLOCATION: &str = "RESERVE_ALLOCATION";

/// Fixed genesis timestamp: 2026-01-01 00:00:00 UTC
pub const GENESIS_TIMESTAMP: Timestamp = 1_767_225_600;

const WEEK: Duration = 7 * 86_400;

/// One bucket created at genesis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisBucket {
    pub name: String,
    pub denomination: DenominationId,
    pub cap: Balance,
    pub curve: EmissionCurveParams,
}

/// One auction created at genesis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisAuction {
    pub name: String,
    /// Name of the bucket it mints from
    pub bucket: String,
    pub window: Duration,
    pub start: Timestamp,
    pub beneficiary: Option<AccountId>,
}

/// Role granted at genesis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisGrant {
    pub role: String,
    pub account: AccountId,
}

/// Genesis specification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisSpec {
    pub timestamp: Timestamp,
    pub governor: AccountId,
    pub buckets: Vec<GenesisBucket>,
    pub auctions: Vec<GenesisAuction>,
    pub grants: Vec<GenesisGrant>,
}

impl GenesisSpec {
    /// Production allocation table
    ///
    /// Five buckets in the base denomination; the weekly auction mints from
    /// `AUCTION22_ALLOCATION` and forwards unclaimed budget to the treasury.
    pub fn mainnet() -> Self {
        let start = GENESIS_TIMESTAMP;
        let governor = AccountId::derived("nectar:governor");
        let treasury = AccountId::derived("nectar:treasury");

        let bucket = |name: &str, cap: Balance, curve: EmissionCurveParams| GenesisBucket {
            name: name.to_string(),
            denomination: DenominationId::BASE,
            cap,
            curve,
        };

        let buckets = vec![
            // Half-year quadratic ease-in, one year flat, three years of quadratic ease-out
            bucket(
                ANON_ALLOCATION,
                10_000_000 * UNIT,
                curve(start, 26 * WEEK, 2, 52 * WEEK, 156 * WEEK, 2),
            ),
            bucket(
                AUCTION22_ALLOCATION,
                5_000_000 * UNIT,
                curve(start, 4 * WEEK, 3, 52 * WEEK, 52 * WEEK, 3),
            ),
            bucket(
                RECM_ALLOCATION,
                20_000_000 * UNIT,
                curve(start, 13 * WEEK, 1, 104 * WEEK, 104 * WEEK, 1),
            ),
            bucket(RESERVED_ALLOCATION, 1_000_000 * UNIT, EmissionCurveParams::immediate(start)),
            // Linear over four years
            bucket(
                RESERVE_ALLOCATION,
                14_000_000 * UNIT,
                curve(start, 0, 1, 208 * WEEK, 0, 1),
            ),
        ];

        Self {
            timestamp: start,
            governor,
            buckets,
            auctions: vec![GenesisAuction {
                name: "weekly".to_string(),
                bucket: AUCTION22_ALLOCATION.to_string(),
                window: DEFAULT_WINDOW,
                start,
                beneficiary: Some(treasury),
            }],
            grants: vec![GenesisGrant {
                role: RESERVED_ALLOCATION.to_string(),
                account: treasury,
            }],
        }
    }

    /// Sum of every genesis bucket cap
    pub fn total_cap(&self) -> Balance {
        self.buckets.iter().fold(0, |acc: Balance, b| acc.saturating_add(b.cap))
    }
}

impl Default for GenesisSpec {
    fn default() -> Self {
        Self::mainnet()
    }
}

fn curve(
    start: Timestamp,
    ramp: Duration,
    ramp_steepness: u32,
    plateau: Duration,
    decay: Duration,
    decay_steepness: u32,
) -> EmissionCurveParams {
    EmissionCurveParams {
        start,
        ramp_duration: ramp,
        ramp_steepness,
        plateau_duration: plateau,
        decay_duration: decay,
        decay_steepness,
    }
}

/// Builds the initial state from a spec
pub struct GenesisBuilder {
    spec: GenesisSpec,
}

impl GenesisBuilder {
    pub fn new(spec: GenesisSpec) -> Self {
        Self { spec }
    }

    /// Registers buckets, creates auctions with their mint role, applies grants
    pub fn build(self) -> Result<NectarState, ConfigError> {
        let spec = self.spec;
        let governor = spec.governor;
        let mut state = NectarState::new(governor, spec.timestamp);

        for bucket in &spec.buckets {
            state.ledger.register_bucket(
                &governor,
                &bucket.name,
                bucket.denomination,
                bucket.cap,
                bucket.curve,
            )?;
        }

        for entry in &spec.auctions {
            let bucket = state
                .ledger
                .allocations()
                .bucket_by_name(&entry.bucket)
                .map(|b| b.id)
                .ok_or_else(|| ConfigError::UnknownBucket(entry.bucket.clone()))?;

            let auction = Auction::new(&entry.name, bucket, entry.window, entry.start, entry.beneficiary)?;
            state.ledger.grant_role(&governor, bucket, auction.account())?;
            state.add_auction(auction)?;
        }

        for grant in &spec.grants {
            state.ledger.grant_role(&governor, RoleId::named(&grant.role), grant.account)?;
        }

        info!(
            "Genesis built: {} buckets, {} auctions, total cap {}",
            state.ledger.allocations().bucket_count(),
            state.auctions.len(),
            state.ledger.supply().total_cap()
        );
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mainnet_spec() {
        let spec = GenesisSpec::mainnet();
        assert_eq!(spec.buckets.len(), 5);
        assert_eq!(spec.total_cap(), 50_000_000 * UNIT);
        for bucket in &spec.buckets {
            assert!(bucket.curve.validate().is_ok(), "{} curve invalid", bucket.name);
        }
    }

    #[test]
    fn test_build_mainnet() {
        let state = GenesisBuilder::new(GenesisSpec::mainnet()).build().unwrap();
        let auction = state.auction("weekly").unwrap();
        let bucket = RoleId::named(AUCTION22_ALLOCATION);

        assert_eq!(auction.bucket(), bucket);
        assert!(state.ledger.roles().has_role(&auction.account(), bucket));
        assert_eq!(state.ledger.supply().total_cap(), 50_000_000 * UNIT);
        assert_eq!(state.ledger.total_supply(), 0);

        // Reserved allocation is ungated from genesis
        let reserved = RoleId::named(RESERVED_ALLOCATION);
        assert_eq!(state.ledger.available(reserved, GENESIS_TIMESTAMP).unwrap(), 1_000_000 * UNIT);
    }

    #[test]
    fn test_anon_saturates_within_schedule() {
        let spec = GenesisSpec::mainnet();
        let anon = spec.buckets.iter().find(|b| b.name == ANON_ALLOCATION).unwrap();
        let end = GENESIS_TIMESTAMP + (26 + 4 * 52) * WEEK;
        assert_eq!(anon.curve.unlocked_at(anon.cap, end), anon.cap);
    }

    #[test]
    fn test_unknown_auction_bucket() {
        let mut spec = GenesisSpec::mainnet();
        spec.auctions[0].bucket = "MISSING".to_string();
        let result = GenesisBuilder::new(spec).build();
        assert!(matches!(result, Err(ConfigError::UnknownBucket(name)) if name == "MISSING"));
    }
}
