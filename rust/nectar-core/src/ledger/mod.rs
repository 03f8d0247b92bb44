// Ledger - Allocation buckets, supply views and the owning token ledger

pub mod allocation;
pub mod supply;
pub mod token;

pub use allocation::{AllocationBucket, AllocationLedger, AllocationSource, LedgerError};
pub use supply::{BucketReport, SupplyReport, TokenSupply};
pub use token::TokenLedger;
