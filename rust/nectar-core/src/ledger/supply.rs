// Supply - Read-only aggregates over the allocation buckets
use super::allocation::AllocationLedger;
use crate::types::{Balance, DenominationId, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Borrowed view over every bucket plus the circulating supply
#[derive(Debug, Clone, Copy)]
pub struct TokenSupply<'a> {
    allocations: &'a AllocationLedger,
    circulating: Balance,
}

impl<'a> TokenSupply<'a> {
    pub fn new(allocations: &'a AllocationLedger, circulating: Balance) -> Self {
        Self { allocations, circulating }
    }

    /// Sum of bucket caps in `denomination`
    pub fn cap_per_denomination(&self, denomination: DenominationId) -> Balance {
        self.allocations
            .buckets()
            .filter(|b| b.denomination == Some(denomination))
            .fold(0, |acc: Balance, b| acc.saturating_add(b.cap))
    }

    /// Sum of bucket mints in `denomination`
    pub fn minted_per_denomination(&self, denomination: DenominationId) -> Balance {
        self.allocations
            .buckets()
            .filter(|b| b.denomination == Some(denomination))
            .fold(0, |acc: Balance, b| acc.saturating_add(b.minted))
    }

    pub fn total_cap(&self) -> Balance {
        self.allocations.total_cap()
    }

    pub fn total_minted(&self) -> Balance {
        self.allocations.total_minted()
    }

    pub fn circulating(&self) -> Balance {
        self.circulating
    }

    /// Denominations in use, with their total caps
    pub fn denominations(&self) -> BTreeMap<DenominationId, Balance> {
        let mut caps = BTreeMap::new();
        for bucket in self.allocations.buckets() {
            if let Some(denomination) = bucket.denomination {
                let entry: &mut Balance = caps.entry(denomination).or_default();
                *entry = entry.saturating_add(bucket.cap);
            }
        }
        caps
    }

    /// Snapshot of every bucket at `now`
    pub fn report(&self, now: Timestamp) -> SupplyReport {
        let buckets = self
            .allocations
            .buckets()
            .map(|b| BucketReport {
                name: b.name.clone(),
                denomination: b.denomination,
                cap: b.cap,
                minted: b.minted,
                unlocked: b.unlocked_at(now),
                available: b.available(now),
                phase: format!("{:?}", b.curve.phase_at(now)),
            })
            .collect();

        SupplyReport {
            at: now,
            total_cap: self.total_cap(),
            total_minted: self.total_minted(),
            circulating: self.circulating,
            buckets,
        }
    }
}

/// Serializable supply summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplyReport {
    pub at: Timestamp,
    pub total_cap: Balance,
    pub total_minted: Balance,
    pub circulating: Balance,
    pub buckets: Vec<BucketReport>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketReport {
    pub name: String,
    pub denomination: Option<DenominationId>,
    pub cap: Balance,
    pub minted: Balance,
    pub unlocked: Balance,
    pub available: Balance,
    pub phase: String,
}
