// CLI Configuration - Resolve global flags and parse user input
use crate::cli::Cli;
use crate::clock::{Clock, SystemClock};
use crate::types::{AccountError, AccountId, Balance, Timestamp, UNIT};
use std::path::PathBuf;

/// Digits after the decimal point of one token
const DECIMALS: usize = 18;

/// Output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Settings shared by every command
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// Snapshot file
    pub state_path: PathBuf,

    /// Evaluation time
    pub now: Timestamp,

    pub format: OutputFormat,
}

impl CliConfig {
    pub fn from_cli(cli: &Cli) -> Result<Self, CliConfigError> {
        Self::resolve(cli, &SystemClock)
    }

    /// `--at` wins over the clock
    pub fn resolve<C: Clock>(cli: &Cli, clock: &C) -> Result<Self, CliConfigError> {
        let format = match cli.format.as_str() {
            "text" => OutputFormat::Text,
            "json" => OutputFormat::Json,
            other => return Err(CliConfigError::InvalidFormat(other.to_string())),
        };

        Ok(Self {
            state_path: cli.state.clone().unwrap_or_else(default_state_path),
            now: cli.at.unwrap_or_else(|| clock.now()),
            format,
        })
    }
}

/// `<data dir>/nectar/state.bin`
pub fn default_state_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("nectar")
        .join("state.bin")
}

/// Hex account, or `@label` for a derived one
pub fn parse_account(s: &str) -> Result<AccountId, CliConfigError> {
    match s.strip_prefix('@') {
        Some(label) if !label.is_empty() => Ok(AccountId::derived(label)),
        Some(_) => Err(CliConfigError::InvalidAccount(s.to_string())),
        None => Ok(AccountId::from_hex(s)?),
    }
}

/// Whole tokens with up to 18 decimals, e.g. `1`, `0.25`, `1_000`
pub fn parse_amount(s: &str) -> Result<Balance, CliConfigError> {
    let invalid = || CliConfigError::InvalidAmount(s.to_string());
    let cleaned: String = s.trim().chars().filter(|c| *c != '_').collect();

    let (whole, fraction) = match cleaned.split_once('.') {
        Some((w, f)) => (w, f),
        None => (cleaned.as_str(), ""),
    };
    if whole.is_empty() && fraction.is_empty() {
        return Err(invalid());
    }
    if fraction.len() > DECIMALS || !fraction.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }

    let whole: Balance = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| invalid())?
    };
    let fraction: Balance = if fraction.is_empty() {
        0
    } else {
        let padded = format!("{:0<width$}", fraction, width = DECIMALS);
        padded.parse().map_err(|_| invalid())?
    };

    whole
        .checked_mul(UNIT)
        .and_then(|units| units.checked_add(fraction))
        .ok_or_else(invalid)
}

/// Base units rendered as tokens, trailing zeros trimmed
pub fn format_amount(amount: Balance) -> String {
    let whole = amount / UNIT;
    let fraction = amount % UNIT;
    if fraction == 0 {
        return whole.to_string();
    }

    let digits = format!("{:0>width$}", fraction, width = DECIMALS);
    format!("{}.{}", whole, digits.trim_end_matches('0'))
}

#[derive(Debug, thiserror::Error)]
pub enum CliConfigError {
    #[error("Invalid output format: {0} (expected text or json)")]
    InvalidFormat(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid account: {0}")]
    InvalidAccount(String),

    #[error("Invalid account hex: {0}")]
    AccountHex(#[from] AccountError),
}
