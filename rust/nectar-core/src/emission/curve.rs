// Emission curve - Cumulative unlock schedule for one allocation bucket
// Principle: pure, monotone, saturating
//
// Three phases, each expressed as a cumulative weight in WAD-seconds:
//
//   ramp     rate(t) = (t / R)^k_r          weight = R / (k_r + 1) * (t / R)^(k_r + 1)
//   plateau  rate(t) = 1                    weight = t
//   decay    rate(s) = (1 - s / D)^k_d      weight = D / (k_d + 1) * (1 - (1 - s / D)^(k_d + 1))
//
// unlocked(t) = cap * weight(t) / total_weight, with the full cap released
// exactly when the decay phase closes.

use super::math::{mul_div_floor, pow_wad, WAD};
use crate::types::{Balance, Duration, Timestamp};
use serde::{Deserialize, Serialize};

/// Upper bound on steepness exponents
pub const MAX_STEEPNESS: u32 = 64;

/// Upper bound on ramp + plateau + decay (~100 years)
pub const MAX_CURVE_DURATION: Duration = 100 * 365 * 86_400;

/// Curve parameters for one activation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmissionCurveParams {
    /// Schedule start
    pub start: Timestamp,

    /// Ease-in phase length
    pub ramp_duration: Duration,

    /// Exponent of the ramp unlock rate (>= 1)
    pub ramp_steepness: u32,

    /// Constant maximal-rate phase length
    pub plateau_duration: Duration,

    /// Ease-out phase length
    pub decay_duration: Duration,

    /// Exponent of the decay unlock rate (>= 1)
    pub decay_steepness: u32,
}

/// Active phase at a given time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CurvePhase {
    NotStarted,
    Ramp,
    Plateau,
    Decay,
    Complete,
}

impl EmissionCurveParams {
    pub fn new(
        start: Timestamp,
        ramp_duration: Duration,
        ramp_steepness: u32,
        plateau_duration: Duration,
        decay_duration: Duration,
        decay_steepness: u32,
    ) -> Result<Self, CurveError> {
        let params = Self {
            start,
            ramp_duration,
            ramp_steepness,
            plateau_duration,
            decay_duration,
            decay_steepness,
        };
        params.validate()?;
        Ok(params)
    }

    /// Curve that unlocks everything at `start`
    pub fn immediate(start: Timestamp) -> Self {
        Self {
            start,
            ramp_duration: 0,
            ramp_steepness: 1,
            plateau_duration: 0,
            decay_duration: 0,
            decay_steepness: 1,
        }
    }

    pub fn validate(&self) -> Result<(), CurveError> {
        for steepness in [self.ramp_steepness, self.decay_steepness] {
            if steepness == 0 || steepness > MAX_STEEPNESS {
                return Err(CurveError::InvalidSteepness(steepness));
            }
        }

        let total = self
            .ramp_duration
            .checked_add(self.plateau_duration)
            .and_then(|d| d.checked_add(self.decay_duration))
            .ok_or(CurveError::DurationTooLong(Duration::MAX))?;

        if total > MAX_CURVE_DURATION {
            return Err(CurveError::DurationTooLong(total));
        }

        if self.start.checked_add(total).is_none() {
            return Err(CurveError::EndOverflow);
        }

        Ok(())
    }

    /// Sum of the three phase lengths
    pub fn total_duration(&self) -> Duration {
        self.ramp_duration
            .saturating_add(self.plateau_duration)
            .saturating_add(self.decay_duration)
    }

    /// Instant from which the full cap is unlocked
    pub fn end(&self) -> Timestamp {
        self.start.saturating_add(self.total_duration())
    }

    pub fn phase_at(&self, now: Timestamp) -> CurvePhase {
        if now >= self.end() {
            return CurvePhase::Complete;
        }
        if now < self.start {
            return CurvePhase::NotStarted;
        }

        let t = now - self.start;
        if t < self.ramp_duration {
            CurvePhase::Ramp
        } else if t < self.ramp_duration + self.plateau_duration {
            CurvePhase::Plateau
        } else {
            CurvePhase::Decay
        }
    }

    /// Cumulative units of `cap` unlocked at `now`
    pub fn unlocked_at(&self, cap: Balance, now: Timestamp) -> Balance {
        if now >= self.end() {
            return cap;
        }
        if now < self.start || cap == 0 {
            return 0;
        }

        let total = self.total_weight();
        if total == 0 {
            return cap;
        }

        let weight = self.weight_at(now - self.start).min(total);
        // weight <= total, so the quotient never exceeds cap
        let unlocked = mul_div_floor(cap, weight, total).unwrap_or(0);

        // The last unit is only released when decay closes
        unlocked.min(cap - 1)
    }

    /// Samples `points + 1` evenly spaced instants from start to end
    pub fn schedule(&self, cap: Balance, points: u32) -> Vec<(Timestamp, Balance)> {
        let points = points.max(1) as u64;
        let span = self.total_duration();

        (0..=points)
            .map(|i| {
                let offset = (span as u128 * i as u128 / points as u128) as u64;
                let at = self.start.saturating_add(offset);
                (at, self.unlocked_at(cap, at))
            })
            .collect()
    }

    fn ramp_weight(&self) -> u128 {
        self.ramp_duration as u128 * WAD / (self.ramp_steepness as u128 + 1)
    }

    fn plateau_weight(&self) -> u128 {
        self.plateau_duration as u128 * WAD
    }

    fn decay_weight(&self) -> u128 {
        self.decay_duration as u128 * WAD / (self.decay_steepness as u128 + 1)
    }

    fn total_weight(&self) -> u128 {
        self.ramp_weight() + self.plateau_weight() + self.decay_weight()
    }

    /// Cumulative weight after `t` seconds of schedule
    fn weight_at(&self, t: Duration) -> u128 {
        let ramp = self.ramp_duration;
        if t < ramp {
            let x = t as u128 * WAD / ramp as u128;
            let curve = pow_wad(x, self.ramp_steepness + 1);
            return ramp as u128 * curve / (self.ramp_steepness as u128 + 1);
        }

        let plateau_end = ramp + self.plateau_duration;
        if t < plateau_end {
            return self.ramp_weight() + (t - ramp) as u128 * WAD;
        }

        let decay = self.decay_duration;
        let s = t - plateau_end;
        if s >= decay {
            return self.total_weight();
        }

        let y = s as u128 * WAD / decay as u128;
        let remaining = pow_wad(WAD - y, self.decay_steepness + 1);
        let decayed = decay as u128 * (WAD - remaining) / (self.decay_steepness as u128 + 1);

        self.ramp_weight() + self.plateau_weight() + decayed
    }
}

/// Curve parameter errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CurveError {
    #[error("Invalid steepness {0} (expected 1 to 64)")]
    InvalidSteepness(u32),

    #[error("Curve duration too long: {0}s")]
    DurationTooLong(Duration),

    #[error("Curve end overflows the timestamp range")]
    EndOverflow,
}
