// Auction - Epoch-windowed proportional claims on one allocation bucket
// Principle: Each epoch's budget is fixed once, split pro rata, and no
// account is ever paid twice for the same epoch
//
// Deposits are bookkeeping of base-currency value received by the host; the
// auction never holds the base currency itself.

pub mod epoch;

pub use epoch::{EpochSchedule, DEFAULT_WINDOW};

use crate::contracts::BalanceError;
use crate::emission::mul_div_floor;
use crate::ledger::{AllocationSource, LedgerError};
use crate::types::{AccountId, Balance, Duration, EpochNumber, RoleId, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Where an epoch's undistributed units ended up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RemainderDisposition {
    /// Zero-deposit epoch: budget minted straight to the beneficiary
    RoutedToBeneficiary { account: AccountId, amount: Balance },

    /// Zero-deposit epoch without beneficiary: budget never minted
    Unminted { amount: Balance },

    /// Rounding dust moved to the beneficiary after the last claim
    Swept { account: AccountId, amount: Balance },

    /// Rounding dust left in the auction's holding balance
    Retained { amount: Balance },
}

/// Deposits and settlement state of one window
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuctionEpoch {
    pub index: EpochNumber,
    pub window_start: Timestamp,
    pub window_end: Timestamp,
    pub deposits: BTreeMap<AccountId, Balance>,
    pub total_deposited: Balance,
    pub settled: bool,
    /// Fixed at settlement
    pub budget: Balance,
    /// Amount paid per account; presence marks the claim as done
    pub claims: BTreeMap<AccountId, Balance>,
    pub distributed: Balance,
    pub disposition: Option<RemainderDisposition>,
}

impl AuctionEpoch {
    pub fn new(index: EpochNumber, window_start: Timestamp, window_end: Timestamp) -> Self {
        Self {
            index,
            window_start,
            window_end,
            deposits: BTreeMap::new(),
            total_deposited: 0,
            settled: false,
            budget: 0,
            claims: BTreeMap::new(),
            distributed: 0,
            disposition: None,
        }
    }

    pub fn deposit_of(&self, account: &AccountId) -> Balance {
        self.deposits.get(account).copied().unwrap_or(0)
    }

    pub fn claimed(&self, account: &AccountId) -> Option<Balance> {
        self.claims.get(account).copied()
    }

    /// floor(deposit * budget / total_deposited)
    pub fn share_of(&self, account: &AccountId) -> Balance {
        let deposit = self.deposit_of(account);
        if deposit == 0 || self.total_deposited == 0 {
            return 0;
        }
        // deposit <= total, so the share never exceeds the budget
        mul_div_floor(deposit, self.budget, self.total_deposited).unwrap_or(0)
    }

    pub fn depositors(&self) -> usize {
        self.deposits.len()
    }

    /// Budget not yet paid out to depositors
    pub fn undistributed(&self) -> Balance {
        self.budget.saturating_sub(self.distributed)
    }

    pub fn all_claimed(&self) -> bool {
        self.claims.len() == self.deposits.len()
    }
}

/// Result of a settlement attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SettleOutcome {
    WindowNotClosed { closes_at: Timestamp },
    Settled { budget: Balance },
    ZeroDeposits { budget: Balance, routed_to: Option<AccountId> },
    AlreadySettled { budget: Balance },
}

/// Result of a claim attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClaimOutcome {
    /// Window still open; nothing paid, nothing recorded
    WindowOpen { closes_at: Timestamp },
    NoDeposit,
    Paid(Balance),
    /// Earlier claim already paid this amount
    AlreadyClaimed(Balance),
}

impl ClaimOutcome {
    /// Amount attributable to the claimant
    pub fn amount(&self) -> Balance {
        match self {
            ClaimOutcome::Paid(amount) | ClaimOutcome::AlreadyClaimed(amount) => *amount,
            _ => 0,
        }
    }
}

/// Observable state of one epoch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EpochStatus {
    Open {
        closes_at: Timestamp,
        total_deposited: Balance,
        depositors: usize,
    },
    Closed {
        total_deposited: Balance,
        depositors: usize,
        projected_budget: Balance,
    },
    Settled {
        budget: Balance,
        total_deposited: Balance,
        distributed: Balance,
        disposition: Option<RemainderDisposition>,
    },
}

/// Proportional claim auction over one allocation bucket
///
/// The auction mints through its own holding account, which must hold the
/// bucket's role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Auction {
    name: String,
    bucket: RoleId,
    schedule: EpochSchedule,
    beneficiary: Option<AccountId>,
    account: AccountId,
    epochs: BTreeMap<EpochNumber, AuctionEpoch>,
}

impl Auction {
    pub fn new(
        name: &str,
        bucket: RoleId,
        window: Duration,
        start: Timestamp,
        beneficiary: Option<AccountId>,
    ) -> Result<Self, AuctionError> {
        let schedule = EpochSchedule::new(start, window).ok_or(AuctionError::InvalidWindow)?;
        let account = Self::holding_account(name);

        info!(
            "Auction {} created: bucket={} window={}s start={} holding={}",
            name, bucket, window, start, account
        );
        Ok(Self {
            name: name.to_string(),
            bucket,
            schedule,
            beneficiary,
            account,
            epochs: BTreeMap::new(),
        })
    }

    /// Holding account for the auction named `name`
    pub fn holding_account(name: &str) -> AccountId {
        AccountId::derived(&format!("auction:{}", name))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bucket(&self) -> RoleId {
        self.bucket
    }

    pub fn schedule(&self) -> &EpochSchedule {
        &self.schedule
    }

    pub fn beneficiary(&self) -> Option<AccountId> {
        self.beneficiary
    }

    pub fn account(&self) -> AccountId {
        self.account
    }

    pub fn epoch(&self, index: EpochNumber) -> Option<&AuctionEpoch> {
        self.epochs.get(&index)
    }

    pub fn epochs(&self) -> impl Iterator<Item = &AuctionEpoch> {
        self.epochs.values()
    }

    pub fn current_epoch(&self, now: Timestamp) -> Option<EpochNumber> {
        self.schedule.epoch_at(now)
    }

    /// Records a deposit in the epoch containing `now`
    pub fn deposit(
        &mut self,
        account: &AccountId,
        amount: Balance,
        now: Timestamp,
    ) -> Result<EpochNumber, AuctionError> {
        let epoch = self
            .schedule
            .epoch_at(now)
            .ok_or(AuctionError::NotStarted { start: self.schedule.start })?;
        self.deposit_into(account, epoch, amount, now)?;
        Ok(epoch)
    }

    /// Records a deposit in `epoch`, which must be the open one
    pub fn deposit_into(
        &mut self,
        account: &AccountId,
        epoch: EpochNumber,
        amount: Balance,
        now: Timestamp,
    ) -> Result<(), AuctionError> {
        if amount == 0 {
            return Err(AuctionError::ZeroAmount);
        }
        let current = self
            .schedule
            .epoch_at(now)
            .ok_or(AuctionError::NotStarted { start: self.schedule.start })?;
        if epoch < current {
            warn!("Deposit into closed epoch {} of {} rejected", epoch, self.name);
            return Err(AuctionError::EpochClosed(epoch));
        }
        if epoch > current {
            return Err(AuctionError::UnknownEpoch(epoch));
        }

        let (window_start, window_end) = self.window(epoch)?;
        let record = self
            .epochs
            .entry(epoch)
            .or_insert_with(|| AuctionEpoch::new(epoch, window_start, window_end));

        let total = record
            .total_deposited
            .checked_add(amount)
            .ok_or(AuctionError::Overflow)?;
        let deposit = record
            .deposit_of(account)
            .checked_add(amount)
            .ok_or(AuctionError::Overflow)?;
        record.deposits.insert(*account, deposit);
        record.total_deposited = total;

        info!(
            "Deposit of {} by {} into {} epoch {} (total {})",
            amount, account, self.name, epoch, total
        );
        Ok(())
    }

    /// Fixes the budget of a closed epoch and mints it
    ///
    /// Earlier closed epochs holding deposits are settled first, in index
    /// order, so each budget is what unlocked up to its own window end.
    /// Budget and the settled flag change together; if minting fails the
    /// epoch stays unsettled.
    pub fn settle<L: AllocationSource>(
        &mut self,
        ledger: &mut L,
        epoch: EpochNumber,
        now: Timestamp,
    ) -> Result<SettleOutcome, AuctionError> {
        let (_, window_end) = self.window(epoch)?;
        if now < window_end {
            return Ok(SettleOutcome::WindowNotClosed { closes_at: window_end });
        }
        if let Some(record) = self.epochs.get(&epoch) {
            if record.settled {
                return Ok(SettleOutcome::AlreadySettled { budget: record.budget });
            }
        }

        // Earlier windows end before this one, so they are closed too
        for earlier in self.pending_before(epoch) {
            debug!("Settling {} epoch {} ahead of epoch {}", self.name, earlier, epoch);
            self.settle_epoch(ledger, earlier, now)?;
        }
        self.settle_epoch(ledger, epoch, now)
    }

    fn settle_epoch<L: AllocationSource>(
        &mut self,
        ledger: &mut L,
        epoch: EpochNumber,
        now: Timestamp,
    ) -> Result<SettleOutcome, AuctionError> {
        let (window_start, window_end) = self.window(epoch)?;
        let budget = self.projected_budget(ledger, epoch)?;
        let total = self.epochs.get(&epoch).map(|r| r.total_deposited).unwrap_or(0);

        let (outcome, disposition) = if total == 0 {
            match self.beneficiary {
                Some(beneficiary) => {
                    if budget > 0 {
                        self.mint(ledger, &beneficiary, budget, now)?;
                    }
                    (
                        SettleOutcome::ZeroDeposits { budget, routed_to: Some(beneficiary) },
                        Some(RemainderDisposition::RoutedToBeneficiary { account: beneficiary, amount: budget }),
                    )
                }
                None => (
                    SettleOutcome::ZeroDeposits { budget, routed_to: None },
                    Some(RemainderDisposition::Unminted { amount: budget }),
                ),
            }
        } else {
            if budget > 0 {
                let holding = self.account;
                self.mint(ledger, &holding, budget, now)?;
            }
            (SettleOutcome::Settled { budget }, None)
        };

        let record = self
            .epochs
            .entry(epoch)
            .or_insert_with(|| AuctionEpoch::new(epoch, window_start, window_end));
        record.settled = true;
        record.budget = budget;
        record.disposition = disposition;

        info!(
            "Settled {} epoch {}: budget={} deposits={}",
            self.name, epoch, budget, total
        );
        Ok(outcome)
    }

    /// Pays `account` its share of `epoch`, settling it first if needed
    pub fn claim<L: AllocationSource>(
        &mut self,
        ledger: &mut L,
        account: &AccountId,
        epoch: EpochNumber,
        now: Timestamp,
    ) -> Result<ClaimOutcome, AuctionError> {
        let (_, window_end) = self.window(epoch)?;
        if now < window_end {
            debug!("Claim on {} epoch {} before close at {}", self.name, epoch, window_end);
            return Ok(ClaimOutcome::WindowOpen { closes_at: window_end });
        }
        if let Some(paid) = self.epochs.get(&epoch).and_then(|r| r.claimed(account)) {
            return Ok(ClaimOutcome::AlreadyClaimed(paid));
        }

        self.settle(ledger, epoch, now)?;

        let holding = self.account;
        let beneficiary = self.beneficiary;
        let record = self
            .epochs
            .get_mut(&epoch)
            .ok_or(AuctionError::UnknownEpoch(epoch))?;
        if record.deposit_of(account) == 0 {
            return Ok(ClaimOutcome::NoDeposit);
        }

        let share = record.share_of(account);
        let distributed = record.distributed.checked_add(share).ok_or(AuctionError::Overflow)?;
        let is_last = record.claims.len() + 1 == record.deposits.len();
        let remainder = record.budget.saturating_sub(distributed);
        let sweep = match beneficiary {
            Some(to) if is_last && remainder > 0 => Some((to, remainder)),
            _ => None,
        };

        let needed = share.saturating_add(sweep.map(|(_, amount)| amount).unwrap_or(0));
        let held = ledger.balance_of(&holding);
        if held < needed {
            warn!("Auction {} holds {} but owes {}", self.name, held, needed);
            return Err(LedgerError::Balance(BalanceError::InsufficientBalance {
                requested: needed,
                available: held,
            })
            .into());
        }

        if share > 0 {
            ledger.transfer(&holding, account, share, now)?;
        }
        if let Some((to, amount)) = sweep {
            ledger.transfer(&holding, &to, amount, now)?;
        }

        record.claims.insert(*account, share);
        record.distributed = distributed;
        if is_last {
            record.disposition = Some(match sweep {
                Some((account, amount)) => RemainderDisposition::Swept { account, amount },
                None => RemainderDisposition::Retained { amount: remainder },
            });
        }

        info!("Claim on {} epoch {}: {} paid {}", self.name, epoch, account, share);
        Ok(ClaimOutcome::Paid(share))
    }

    /// Claims every closed epoch `account` deposited into
    pub fn claim_all<L: AllocationSource>(
        &mut self,
        ledger: &mut L,
        account: &AccountId,
        now: Timestamp,
    ) -> Result<Vec<(EpochNumber, ClaimOutcome)>, AuctionError> {
        let pending: Vec<EpochNumber> = self
            .epochs
            .values()
            .filter(|r| r.deposits.contains_key(account) && now >= r.window_end)
            .map(|r| r.index)
            .collect();

        let mut outcomes = Vec::with_capacity(pending.len());
        for epoch in pending {
            let outcome = self.claim(ledger, account, epoch, now)?;
            outcomes.push((epoch, outcome));
        }
        Ok(outcomes)
    }

    /// Budget of `epoch`: fixed once settled, projected while closed, zero while open
    pub fn auction_supply<L: AllocationSource>(
        &self,
        ledger: &L,
        epoch: EpochNumber,
        now: Timestamp,
    ) -> Result<Balance, AuctionError> {
        let (_, window_end) = self.window(epoch)?;
        if now < window_end {
            return Ok(0);
        }
        match self.epochs.get(&epoch) {
            Some(record) if record.settled => Ok(record.budget),
            _ => self.projected_budget(ledger, epoch),
        }
    }

    pub fn epoch_status<L: AllocationSource>(
        &self,
        ledger: &L,
        epoch: EpochNumber,
        now: Timestamp,
    ) -> Result<EpochStatus, AuctionError> {
        let (_, window_end) = self.window(epoch)?;
        let record = self.epochs.get(&epoch);
        let total_deposited = record.map(|r| r.total_deposited).unwrap_or(0);
        let depositors = record.map(|r| r.depositors()).unwrap_or(0);

        if now < window_end {
            return Ok(EpochStatus::Open { closes_at: window_end, total_deposited, depositors });
        }

        match record {
            Some(r) if r.settled => Ok(EpochStatus::Settled {
                budget: r.budget,
                total_deposited,
                distributed: r.distributed,
                disposition: r.disposition,
            }),
            _ => Ok(EpochStatus::Closed {
                total_deposited,
                depositors,
                projected_budget: self.projected_budget(ledger, epoch)?,
            }),
        }
    }

    fn window(&self, epoch: EpochNumber) -> Result<(Timestamp, Timestamp), AuctionError> {
        match (self.schedule.window_start(epoch), self.schedule.window_end(epoch)) {
            (Some(start), Some(end)) => Ok((start, end)),
            _ => Err(AuctionError::UnknownEpoch(epoch)),
        }
    }

    /// Unsettled epochs before `epoch` that hold deposits, ascending
    fn pending_before(&self, epoch: EpochNumber) -> Vec<EpochNumber> {
        self.epochs
            .range(..epoch)
            .filter(|(_, r)| !r.settled && r.total_deposited > 0)
            .map(|(index, _)| *index)
            .collect()
    }

    /// Budget `epoch` would get if settled now
    ///
    /// available at window end, less what pending earlier epochs take first.
    fn projected_budget<L: AllocationSource>(
        &self,
        ledger: &L,
        epoch: EpochNumber,
    ) -> Result<Balance, AuctionError> {
        let mut reserved: Balance = 0;
        for earlier in self.pending_before(epoch) {
            let (_, end) = self.window(earlier)?;
            let budget = ledger.available(self.bucket, end)?.saturating_sub(reserved);
            reserved = reserved.checked_add(budget).ok_or(AuctionError::Overflow)?;
        }

        let (_, window_end) = self.window(epoch)?;
        Ok(ledger.available(self.bucket, window_end)?.saturating_sub(reserved))
    }

    fn mint<L: AllocationSource>(
        &self,
        ledger: &mut L,
        to: &AccountId,
        amount: Balance,
        now: Timestamp,
    ) -> Result<(), AuctionError> {
        if let Err(e) = ledger.mint(&self.account, to, self.bucket, amount, now) {
            warn!("Auction {} failed to mint {}: {}", self.name, amount, e);
            return Err(e.into());
        }
        Ok(())
    }
}

/// Auction errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuctionError {
    #[error("Auction window must be longer than zero")]
    InvalidWindow,

    #[error("Auction starts at {start}")]
    NotStarted { start: Timestamp },

    #[error("Deposit amount must be non-zero")]
    ZeroAmount,

    #[error("Epoch {0} is closed")]
    EpochClosed(EpochNumber),

    #[error("Unknown epoch {0}")]
    UnknownEpoch(EpochNumber),

    #[error("Auction already exists: {0}")]
    Duplicate(String),

    #[error("Arithmetic overflow")]
    Overflow,

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),
}
