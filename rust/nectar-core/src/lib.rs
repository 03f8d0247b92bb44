// Nectar - Curve-gated allocation ledger and proportional claim auction
// Principle: Minting follows the schedule, every bucket stays under its cap

pub mod auction;
pub mod cli;
pub mod clock;
pub mod contracts;
pub mod emission;
pub mod genesis;
pub mod ledger;
pub mod storage;
pub mod types;

#[cfg(test)]
mod tests;

pub use auction::{Auction, AuctionError, ClaimOutcome, EpochStatus, SettleOutcome};
pub use emission::{CurveError, EmissionCurveParams};
pub use ledger::{AllocationLedger, AllocationSource, LedgerError, TokenLedger, TokenSupply};
pub use types::{AccountId, Balance, DenominationId, RoleId, Timestamp, UNIT};
