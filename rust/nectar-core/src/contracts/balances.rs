// Balances - Holder balances and circulating supply
// Principle: Every change is atomic and reported to the checkpoint observer
use super::checkpoints::{BalanceObserver, VoteCheckpoints};
use crate::types::{AccountId, Balance, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Balance/transfer collaborator consumed by minting and auction payouts
pub trait BalanceLedger {
    fn balance_of(&self, account: &AccountId) -> Balance;

    /// Circulating supply (everything ever issued)
    fn total_supply(&self) -> Balance;

    fn credit(&mut self, account: &AccountId, amount: Balance, now: Timestamp) -> Result<(), BalanceError>;

    fn debit(&mut self, account: &AccountId, amount: Balance, now: Timestamp) -> Result<(), BalanceError>;

    /// Credits newly created units and grows the circulating supply
    fn issue(&mut self, account: &AccountId, amount: Balance, now: Timestamp) -> Result<(), BalanceError>;

    fn transfer(
        &mut self,
        from: &AccountId,
        to: &AccountId,
        amount: Balance,
        now: Timestamp,
    ) -> Result<(), BalanceError> {
        let available = self.balance_of(from);
        if available < amount {
            return Err(BalanceError::InsufficientBalance { requested: amount, available });
        }
        if from == to {
            return Ok(());
        }

        // Balances sum to total_supply, so the credit leg cannot overflow
        self.debit(from, amount, now)?;
        self.credit(to, amount, now)
    }
}

/// In-memory balance store
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Balances<O = VoteCheckpoints> {
    accounts: HashMap<AccountId, Balance>,
    total_supply: Balance,
    observer: O,
}

impl<O: BalanceObserver + Default> Balances<O> {
    pub fn new() -> Self {
        Self {
            accounts: HashMap::new(),
            total_supply: 0,
            observer: O::default(),
        }
    }
}

impl<O: BalanceObserver> Balances<O> {
    pub fn observer(&self) -> &O {
        &self.observer
    }

    fn set_balance(&mut self, account: &AccountId, old: Balance, new: Balance, now: Timestamp) {
        if new == 0 {
            self.accounts.remove(account);
        } else {
            self.accounts.insert(*account, new);
        }
        self.observer.on_balance_changed(account, old, new, now);
        debug!("Balance of {}: {} -> {}", account, old, new);
    }
}

impl<O: BalanceObserver> BalanceLedger for Balances<O> {
    fn balance_of(&self, account: &AccountId) -> Balance {
        self.accounts.get(account).copied().unwrap_or(0)
    }

    fn total_supply(&self) -> Balance {
        self.total_supply
    }

    fn credit(&mut self, account: &AccountId, amount: Balance, now: Timestamp) -> Result<(), BalanceError> {
        let old = self.balance_of(account);
        let new = old.checked_add(amount).ok_or(BalanceError::Overflow)?;
        self.set_balance(account, old, new, now);
        Ok(())
    }

    fn debit(&mut self, account: &AccountId, amount: Balance, now: Timestamp) -> Result<(), BalanceError> {
        let old = self.balance_of(account);
        let new = old
            .checked_sub(amount)
            .ok_or(BalanceError::InsufficientBalance { requested: amount, available: old })?;
        self.set_balance(account, old, new, now);
        Ok(())
    }

    fn issue(&mut self, account: &AccountId, amount: Balance, now: Timestamp) -> Result<(), BalanceError> {
        let supply = self.total_supply.checked_add(amount).ok_or(BalanceError::Overflow)?;
        self.credit(account, amount, now)?;
        self.total_supply = supply;
        Ok(())
    }
}

/// Balance errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BalanceError {
    #[error("Insufficient balance: requested {requested}, available {available}")]
    InsufficientBalance { requested: Balance, available: Balance },

    #[error("Balance overflow")]
    Overflow,
}
