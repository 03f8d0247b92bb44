// Epoch - Fixed-length auction windows
use crate::types::{Duration, EpochNumber, Timestamp};
use serde::{Deserialize, Serialize};

/// One week, the production auction window
pub const DEFAULT_WINDOW: Duration = 7 * 86_400;

/// Window layout of one auction
///
/// Epoch `n` covers `[start + n * window, start + (n + 1) * window)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpochSchedule {
    /// Start of epoch 0
    pub start: Timestamp,

    /// Window length in seconds (> 0)
    pub window: Duration,
}

impl EpochSchedule {
    /// None when `window` is zero
    pub fn new(start: Timestamp, window: Duration) -> Option<Self> {
        if window == 0 {
            return None;
        }
        Some(Self { start, window })
    }

    /// Epoch containing `now`, None before the first window
    pub fn epoch_at(&self, now: Timestamp) -> Option<EpochNumber> {
        if now < self.start {
            return None;
        }
        Some((now - self.start) / self.window)
    }

    pub fn window_start(&self, epoch: EpochNumber) -> Option<Timestamp> {
        epoch
            .checked_mul(self.window)
            .and_then(|offset| self.start.checked_add(offset))
    }

    pub fn window_end(&self, epoch: EpochNumber) -> Option<Timestamp> {
        self.window_start(epoch)
            .and_then(|start| start.checked_add(self.window))
    }

    /// Whether `now` falls inside epoch `epoch`
    pub fn contains(&self, epoch: EpochNumber, now: Timestamp) -> bool {
        self.epoch_at(now) == Some(epoch)
    }

    /// Whether deposits into `epoch` are over at `now`
    pub fn is_closed(&self, epoch: EpochNumber, now: Timestamp) -> bool {
        match self.window_end(epoch) {
            Some(end) => now >= end,
            None => false,
        }
    }

    /// Seconds until epoch `epoch` closes, zero once closed
    pub fn remaining(&self, epoch: EpochNumber, now: Timestamp) -> Duration {
        self.window_end(epoch)
            .map(|end| end.saturating_sub(now))
            .unwrap_or(Duration::MAX)
    }
}
