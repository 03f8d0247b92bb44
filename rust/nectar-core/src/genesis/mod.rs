// Genesis - Initial allocation table and chain configuration
pub mod config;
pub mod spec;

pub use config::{ChainConfig, ConfigError};
pub use spec::{GenesisBuilder, GenesisSpec, GENESIS_TIMESTAMP};
