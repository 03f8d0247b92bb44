// Storage - Persistence of the ledger and auctions
// Principle: One snapshot file, rewritten whole after every command

pub mod snapshot;
pub mod state;

pub use snapshot::{SnapshotError, StateSnapshot, SNAPSHOT_VERSION};
pub use state::NectarState;
