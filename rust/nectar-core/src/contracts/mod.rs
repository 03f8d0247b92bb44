// Contracts - Collaborators the allocation core calls into
// Principle: Conventional bookkeeping, kept out of the decision logic

pub mod balances;
pub mod checkpoints;
pub mod roles;

pub use balances::{BalanceError, BalanceLedger, Balances};
pub use checkpoints::{BalanceObserver, Checkpoint, VoteCheckpoints};
pub use roles::{RoleError, RoleRegistry};
