// Allocation ledger - Curve-gated minting from capped buckets
// Principle: Every minted unit belongs to exactly one bucket and never
// exceeds what that bucket's curve had unlocked when it was minted
use crate::contracts::{BalanceError, BalanceLedger, RoleError, RoleRegistry};
use crate::emission::{CurveError, EmissionCurveParams};
use crate::types::{AccountId, Balance, DenominationId, RoleId, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Narrow contract the auction relies on
///
/// Covers curve-gated minting plus the balance moves needed to pay out what
/// was minted. Nothing here exposes bucket internals.
pub trait AllocationSource {
    /// Units of `bucket` mintable at `now`
    fn available(&self, bucket: RoleId, now: Timestamp) -> Result<Balance, LedgerError>;

    fn mint(
        &mut self,
        caller: &AccountId,
        to: &AccountId,
        bucket: RoleId,
        amount: Balance,
        now: Timestamp,
    ) -> Result<(), LedgerError>;

    fn balance_of(&self, account: &AccountId) -> Balance;

    fn transfer(
        &mut self,
        from: &AccountId,
        to: &AccountId,
        amount: Balance,
        now: Timestamp,
    ) -> Result<(), LedgerError>;
}

/// One capped pool of mintable units
///
/// Invariants: `minted <= cap`, `minted` never decreases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationBucket {
    /// Bucket id, also the role allowed to mint from it
    pub id: RoleId,

    /// Human readable label
    pub name: String,

    /// Set by the first allocation
    pub denomination: Option<DenominationId>,

    /// Maximum units ever mintable
    pub cap: Balance,

    /// Units minted so far
    pub minted: Balance,

    /// Unlock schedule
    pub curve: EmissionCurveParams,
}

impl AllocationBucket {
    /// Empty bucket; ungated until a curve is set
    pub fn new(id: RoleId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            denomination: None,
            cap: 0,
            minted: 0,
            curve: EmissionCurveParams::immediate(0),
        }
    }

    /// min(curve.unlocked_at(now), cap)
    pub fn unlocked_at(&self, now: Timestamp) -> Balance {
        self.curve.unlocked_at(self.cap, now).min(self.cap)
    }

    /// Mintable units at `now`, never negative
    pub fn available(&self, now: Timestamp) -> Balance {
        self.unlocked_at(now).saturating_sub(self.minted)
    }

    /// Units the cap still allows regardless of the curve
    pub fn remaining(&self) -> Balance {
        self.cap.saturating_sub(self.minted)
    }
}

/// Owns every allocation bucket
///
/// Roles and balances are passed in by the caller; the ledger keeps no
/// reference to either.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AllocationLedger {
    buckets: BTreeMap<RoleId, AllocationBucket>,
}

impl AllocationLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bucket(&self, id: RoleId) -> Option<&AllocationBucket> {
        self.buckets.get(&id)
    }

    pub fn bucket_by_name(&self, name: &str) -> Option<&AllocationBucket> {
        self.buckets.values().find(|b| b.name == name)
    }

    pub fn buckets(&self) -> impl Iterator<Item = &AllocationBucket> {
        self.buckets.values()
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Creates a named bucket with its initial cap and curve (governor only)
    pub fn register_bucket(
        &mut self,
        roles: &RoleRegistry,
        caller: &AccountId,
        name: &str,
        denomination: DenominationId,
        cap: Balance,
        curve: EmissionCurveParams,
    ) -> Result<RoleId, LedgerError> {
        let id = RoleId::named(name);
        roles.ensure_role(caller, roles.admin_of(id))?;

        if self.buckets.contains_key(&id) {
            return Err(LedgerError::BucketExists(name.to_string()));
        }
        curve.validate()?;
        self.checked_total_cap(0, cap)?;

        let mut bucket = AllocationBucket::new(id, name);
        bucket.denomination = Some(denomination);
        bucket.cap = cap;
        bucket.curve = curve;
        self.buckets.insert(id, bucket);

        info!("Registered bucket {} ({}) cap={} {}", name, id, cap, denomination);
        Ok(id)
    }

    /// Replaces a bucket's curve; `minted` is untouched
    pub fn set_curve(
        &mut self,
        roles: &RoleRegistry,
        caller: &AccountId,
        bucket: RoleId,
        params: EmissionCurveParams,
    ) -> Result<(), LedgerError> {
        if let Err(e) = roles.ensure_role(caller, roles.admin_of(bucket)) {
            warn!("set_curve on {} rejected: {}", bucket, e);
            return Err(e.into());
        }
        params.validate()?;

        let entry = self
            .buckets
            .entry(bucket)
            .or_insert_with(|| AllocationBucket::new(bucket, bucket.to_string()));
        entry.curve = params;

        info!(
            "Curve for {} set: start={} ramp={}s/{} plateau={}s decay={}s/{}",
            entry.name,
            params.start,
            params.ramp_duration,
            params.ramp_steepness,
            params.plateau_duration,
            params.decay_duration,
            params.decay_steepness
        );
        Ok(())
    }

    /// Sets a bucket's cap, creating the bucket on its first allocation
    pub fn allocate(
        &mut self,
        roles: &RoleRegistry,
        caller: &AccountId,
        bucket: RoleId,
        denomination: DenominationId,
        new_cap: Balance,
    ) -> Result<(), LedgerError> {
        if let Err(e) = roles.ensure_role(caller, roles.admin_of(bucket)) {
            warn!("allocate on {} rejected: {}", bucket, e);
            return Err(e.into());
        }

        let (old_cap, minted, current_denomination) = match self.buckets.get(&bucket) {
            Some(b) => (b.cap, b.minted, b.denomination),
            None => (0, 0, None),
        };

        if new_cap < minted {
            warn!("allocate on {} rejected: cap {} below minted {}", bucket, new_cap, minted);
            return Err(LedgerError::CapBelowMinted { cap: new_cap, minted });
        }
        if let Some(expected) = current_denomination {
            if expected != denomination {
                return Err(LedgerError::DenominationMismatch { expected, got: denomination });
            }
        }
        self.checked_total_cap(old_cap, new_cap)?;

        let entry = self
            .buckets
            .entry(bucket)
            .or_insert_with(|| AllocationBucket::new(bucket, bucket.to_string()));
        entry.denomination = Some(denomination);
        entry.cap = new_cap;

        info!("Allocated {}: cap {} -> {} ({})", entry.name, old_cap, new_cap, denomination);
        Ok(())
    }

    /// min(curve.unlocked_at(now), cap) - minted
    pub fn available(&self, bucket: RoleId, now: Timestamp) -> Result<Balance, LedgerError> {
        let b = self.buckets.get(&bucket).ok_or(LedgerError::UnknownBucket(bucket))?;
        let available = b.available(now);
        debug!("Available in {} at {}: {}", b.name, now, available);
        Ok(available)
    }

    /// Mints `amount` from `bucket` to `to`
    ///
    /// Role check first, then the curve/cap check; on any failure neither the
    /// bucket nor the balances change.
    pub fn mint<B: BalanceLedger>(
        &mut self,
        roles: &RoleRegistry,
        balances: &mut B,
        caller: &AccountId,
        to: &AccountId,
        bucket: RoleId,
        amount: Balance,
        now: Timestamp,
    ) -> Result<(), LedgerError> {
        if let Err(e) = roles.ensure_role(caller, bucket) {
            warn!("mint from {} rejected: {}", bucket, e);
            return Err(e.into());
        }

        let b = self.buckets.get_mut(&bucket).ok_or(LedgerError::UnknownBucket(bucket))?;
        let available = b.available(now);
        if amount > available {
            warn!("mint from {} rejected: {} exceeds available {}", b.name, amount, available);
            return Err(LedgerError::ExceedsAvailable { requested: amount, available });
        }

        // available <= cap - minted, so this stays within cap
        let minted = b.minted.checked_add(amount).ok_or(LedgerError::Overflow)?;
        balances.issue(to, amount, now)?;
        b.minted = minted;

        info!("Minted {} from {} to {} (minted {}/{})", amount, b.name, to, b.minted, b.cap);
        Ok(())
    }

    /// Sum of all caps
    pub fn total_cap(&self) -> Balance {
        self.buckets.values().fold(0, |acc: Balance, b| acc.saturating_add(b.cap))
    }

    /// Sum of all minted units
    pub fn total_minted(&self) -> Balance {
        self.buckets.values().fold(0, |acc: Balance, b| acc.saturating_add(b.minted))
    }

    /// Total cap after replacing `old_cap` with `new_cap`, if it fits
    fn checked_total_cap(&self, old_cap: Balance, new_cap: Balance) -> Result<Balance, LedgerError> {
        self.total_cap()
            .checked_sub(old_cap)
            .and_then(|rest| rest.checked_add(new_cap))
            .ok_or(LedgerError::Overflow)
    }
}

/// Allocation ledger errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("Unauthorized: {actor} lacks {role}")]
    Unauthorized { actor: AccountId, role: RoleId },

    #[error("Cannot revoke the last governor")]
    LastGovernor,

    #[error("Cap {cap} is below minted {minted}")]
    CapBelowMinted { cap: Balance, minted: Balance },

    #[error("Mint of {requested} exceeds available {available}")]
    ExceedsAvailable { requested: Balance, available: Balance },

    #[error("Unknown bucket {0}")]
    UnknownBucket(RoleId),

    #[error("Bucket already exists: {0}")]
    BucketExists(String),

    #[error("Denomination mismatch: bucket uses {expected}, got {got}")]
    DenominationMismatch { expected: DenominationId, got: DenominationId },

    #[error("Invalid curve: {0}")]
    InvalidCurve(#[from] CurveError),

    #[error("Balance error: {0}")]
    Balance(#[from] BalanceError),

    #[error("Arithmetic overflow")]
    Overflow,
}

impl From<RoleError> for LedgerError {
    fn from(e: RoleError) -> Self {
        match e {
            RoleError::Unauthorized { actor, role } => LedgerError::Unauthorized { actor, role },
            RoleError::LastGovernor => LedgerError::LastGovernor,
        }
    }
}
