// Fundamental Nectar types
// Principle: Minimal, auditable, durable

pub mod primitives;
pub mod account;

pub use primitives::*;
pub use account::*;
