// Checkpoints - Balance history for vote-weight lookups
// Principle: Notified synchronously, never queried by the core
use crate::types::{AccountId, Balance, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Receives every balance change in the same step as the change itself
pub trait BalanceObserver {
    fn on_balance_changed(
        &mut self,
        account: &AccountId,
        old_balance: Balance,
        new_balance: Balance,
        now: Timestamp,
    );
}

/// Balance from `from` onwards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub from: Timestamp,
    pub votes: Balance,
}

/// Per-account checkpoint history
///
/// Delegation is not modelled: an account's votes are its own balance.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VoteCheckpoints {
    history: HashMap<AccountId, Vec<Checkpoint>>,
}

impl VoteCheckpoints {
    pub fn new() -> Self {
        Self::default()
    }

    /// Votes held at `at`
    pub fn votes_at(&self, account: &AccountId, at: Timestamp) -> Balance {
        let Some(history) = self.history.get(account) else {
            return 0;
        };

        // Index of the first checkpoint strictly after `at`
        let idx = history.partition_point(|cp| cp.from <= at);
        if idx == 0 {
            0
        } else {
            history[idx - 1].votes
        }
    }

    pub fn current_votes(&self, account: &AccountId) -> Balance {
        self.history
            .get(account)
            .and_then(|h| h.last())
            .map(|cp| cp.votes)
            .unwrap_or(0)
    }

    pub fn num_checkpoints(&self, account: &AccountId) -> usize {
        self.history.get(account).map(|h| h.len()).unwrap_or(0)
    }
}

impl BalanceObserver for VoteCheckpoints {
    fn on_balance_changed(
        &mut self,
        account: &AccountId,
        old_balance: Balance,
        new_balance: Balance,
        now: Timestamp,
    ) {
        if old_balance == new_balance {
            return;
        }

        let history = self.history.entry(*account).or_default();
        match history.last_mut() {
            // Same timestamp: the later change wins
            Some(last) if last.from == now => last.votes = new_balance,
            _ => history.push(Checkpoint { from: now, votes: new_balance }),
        }
    }
}
