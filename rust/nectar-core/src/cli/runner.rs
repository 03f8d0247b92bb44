// Runner - Executes one CLI command against the state snapshot
use crate::auction::{AuctionError, ClaimOutcome, EpochStatus, RemainderDisposition};
use crate::cli::config::{format_amount, parse_account, parse_amount, CliConfig, CliConfigError, OutputFormat};
use crate::cli::{
    AllocateCmd, ClaimCmd, Commands, CurveCmd, DepositCmd, EpochCmd, GrantCmd, InitCmd, MintCmd,
    SetCurveCmd, TransferCmd,
};
use crate::emission::EmissionCurveParams;
use crate::genesis::{ChainConfig, ConfigError, GenesisBuilder, GenesisSpec};
use crate::ledger::{LedgerError, SupplyReport};
use crate::storage::{NectarState, SnapshotError, StateSnapshot};
use crate::types::{Balance, DenominationId, EpochNumber, RoleId, Timestamp};
use serde::Serialize;
use tracing::info;

/// Runs `command`, saving the state afterwards when it changed
pub fn run(command: Commands, config: &CliConfig) -> Result<(), RunnerError> {
    let now = config.now;

    match command {
        Commands::Init(cmd) => init(&cmd, config),

        Commands::Status => {
            let state = load(config)?;
            status(&state, config)
        }

        Commands::Curve(cmd) => {
            let state = load(config)?;
            curve(&state, &cmd, config)
        }

        Commands::Epoch(cmd) => {
            let state = load(config)?;
            epoch(&state, &cmd, config)
        }

        Commands::Grant(cmd) => mutate(config, |state| grant(state, &cmd)),

        Commands::Allocate(cmd) => mutate(config, |state| allocate(state, &cmd)),

        Commands::SetCurve(cmd) => mutate(config, |state| set_curve(state, &cmd, now)),

        Commands::Mint(cmd) => mutate(config, |state| mint(state, &cmd, now)),

        Commands::Transfer(cmd) => mutate(config, |state| transfer(state, &cmd, now)),

        Commands::Deposit(cmd) => mutate(config, |state| deposit(state, &cmd, now)),

        Commands::Claim(cmd) => mutate(config, |state| claim(state, &cmd, now)),
    }
}

fn load(config: &CliConfig) -> Result<NectarState, RunnerError> {
    Ok(StateSnapshot::load(&config.state_path)?.state)
}

/// Load, apply, save; nothing is written if `op` fails
fn mutate<F>(config: &CliConfig, op: F) -> Result<(), RunnerError>
where
    F: FnOnce(&mut NectarState) -> Result<String, RunnerError>,
{
    let mut state = load(config)?;
    let message = op(&mut state)?;
    StateSnapshot::new(state).save(&config.state_path)?;
    println!("{}", message);
    Ok(())
}

fn init(cmd: &InitCmd, config: &CliConfig) -> Result<(), RunnerError> {
    if config.state_path.exists() && !cmd.force {
        return Err(RunnerError::StateExists(config.state_path.display().to_string()));
    }

    let spec = match &cmd.config {
        Some(path) => {
            info!("Loading chain config from {}", path.display());
            ChainConfig::from_file(path)?.to_spec()?
        }
        None => GenesisSpec::mainnet(),
    };

    let state = GenesisBuilder::new(spec).build()?;
    let buckets = state.ledger.allocations().bucket_count();
    let auctions = state.auctions.len();
    StateSnapshot::new(state).save(&config.state_path)?;

    println!(
        "Initialised {} ({} buckets, {} auctions)",
        config.state_path.display(),
        buckets,
        auctions
    );
    Ok(())
}

fn bucket_id(state: &NectarState, name: &str) -> Result<RoleId, RunnerError> {
    let id = RoleId::named(name);
    state
        .ledger
        .bucket(id)
        .map(|_| id)
        .ok_or_else(|| RunnerError::UnknownBucket(name.to_string()))
}

#[derive(Debug, Serialize)]
struct StatusReport {
    supply: SupplyReport,
    auctions: Vec<AuctionSummary>,
}

#[derive(Debug, Serialize)]
struct AuctionSummary {
    name: String,
    bucket: String,
    window: u64,
    current_epoch: Option<EpochNumber>,
    holding: Balance,
}

fn status(state: &NectarState, config: &CliConfig) -> Result<(), RunnerError> {
    let now = config.now;
    let supply = state.ledger.supply().report(now);
    let auctions: Vec<AuctionSummary> = state
        .auctions
        .values()
        .map(|a| AuctionSummary {
            name: a.name().to_string(),
            bucket: state
                .ledger
                .bucket(a.bucket())
                .map(|b| b.name.clone())
                .unwrap_or_else(|| a.bucket().to_string()),
            window: a.schedule().window,
            current_epoch: a.current_epoch(now),
            holding: state.ledger.balance_of(&a.account()),
        })
        .collect();

    if config.format == OutputFormat::Json {
        let report = StatusReport { supply, auctions };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("At {}", now);
    println!(
        "Total cap {}  minted {}  circulating {}",
        format_amount(supply.total_cap),
        format_amount(supply.total_minted),
        format_amount(supply.circulating)
    );
    println!();
    println!(
        "{:<22} {:>10} {:>18} {:>18} {:>18} {:>18}",
        "bucket", "phase", "cap", "minted", "unlocked", "available"
    );
    for b in &supply.buckets {
        println!(
            "{:<22} {:>10} {:>18} {:>18} {:>18} {:>18}",
            b.name,
            b.phase,
            format_amount(b.cap),
            format_amount(b.minted),
            format_amount(b.unlocked),
            format_amount(b.available)
        );
    }

    if !auctions.is_empty() {
        println!();
        for a in &auctions {
            let epoch = a
                .current_epoch
                .map(|e| e.to_string())
                .unwrap_or_else(|| "not started".to_string());
            println!(
                "auction {} on {}: window {}s, epoch {}, holding {}",
                a.name,
                a.bucket,
                a.window,
                epoch,
                format_amount(a.holding)
            );
        }
    }
    Ok(())
}

#[derive(Debug, Serialize)]
struct CurvePoint {
    at: Timestamp,
    phase: String,
    unlocked: Balance,
}

fn curve(state: &NectarState, cmd: &CurveCmd, config: &CliConfig) -> Result<(), RunnerError> {
    let id = bucket_id(state, &cmd.bucket)?;
    let bucket = state
        .ledger
        .bucket(id)
        .ok_or_else(|| RunnerError::UnknownBucket(cmd.bucket.clone()))?;

    let points: Vec<CurvePoint> = bucket
        .curve
        .schedule(bucket.cap, cmd.points)
        .into_iter()
        .map(|(at, unlocked)| CurvePoint {
            at,
            phase: format!("{:?}", bucket.curve.phase_at(at)),
            unlocked,
        })
        .collect();

    if config.format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&points)?);
        return Ok(());
    }

    println!(
        "{} cap {} ({:?} now, available {})",
        bucket.name,
        format_amount(bucket.cap),
        bucket.curve.phase_at(config.now),
        format_amount(bucket.available(config.now))
    );
    for p in &points {
        println!("{:>12} {:>10} {:>26}", p.at, p.phase, format_amount(p.unlocked));
    }
    Ok(())
}

#[derive(Debug, Serialize)]
struct EpochReport {
    auction: String,
    epoch: EpochNumber,
    window_start: Option<Timestamp>,
    window_end: Option<Timestamp>,
    status: EpochStatus,
}

fn epoch(state: &NectarState, cmd: &EpochCmd, config: &CliConfig) -> Result<(), RunnerError> {
    let now = config.now;
    let auction = state
        .auction(&cmd.auction)
        .ok_or_else(|| RunnerError::UnknownAuction(cmd.auction.clone()))?;

    let index = match cmd.epoch.or_else(|| auction.current_epoch(now)) {
        Some(index) => index,
        None => {
            return Err(AuctionError::NotStarted { start: auction.schedule().start }.into());
        }
    };
    let status = auction.epoch_status(&state.ledger, index, now)?;

    let report = EpochReport {
        auction: auction.name().to_string(),
        epoch: index,
        window_start: auction.schedule().window_start(index),
        window_end: auction.schedule().window_end(index),
        status,
    };

    if config.format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("auction {} epoch {}", report.auction, report.epoch);
    match status {
        EpochStatus::Open { closes_at, total_deposited, depositors } => {
            println!(
                "open until {}: {} deposited by {} accounts",
                closes_at,
                format_amount(total_deposited),
                depositors
            );
        }
        EpochStatus::Closed { total_deposited, depositors, projected_budget } => {
            println!(
                "closed, unsettled: {} deposited by {} accounts, budget {}",
                format_amount(total_deposited),
                depositors,
                format_amount(projected_budget)
            );
        }
        EpochStatus::Settled { budget, total_deposited, distributed, disposition } => {
            println!(
                "settled: budget {}, deposited {}, distributed {}",
                format_amount(budget),
                format_amount(total_deposited),
                format_amount(distributed)
            );
            if let Some(d) = disposition {
                println!("remainder: {}", describe_disposition(&d));
            }
        }
    }
    Ok(())
}

fn describe_disposition(d: &RemainderDisposition) -> String {
    match d {
        RemainderDisposition::RoutedToBeneficiary { account, amount } => {
            format!("{} routed to {}", format_amount(*amount), account)
        }
        RemainderDisposition::Unminted { amount } => format!("{} left unminted", format_amount(*amount)),
        RemainderDisposition::Swept { account, amount } => {
            format!("{} swept to {}", format_amount(*amount), account)
        }
        RemainderDisposition::Retained { amount } => format!("{} retained", format_amount(*amount)),
    }
}

fn grant(state: &mut NectarState, cmd: &GrantCmd) -> Result<String, RunnerError> {
    let caller = parse_account(&cmd.caller)?;
    let account = parse_account(&cmd.account)?;
    let role = RoleId::named(&cmd.role);

    if cmd.revoke {
        let changed = state.ledger.revoke_role(&caller, role, &account)?;
        Ok(if changed {
            format!("Revoked {} from {}", cmd.role, account)
        } else {
            format!("{} did not hold {}", account, cmd.role)
        })
    } else {
        let changed = state.ledger.grant_role(&caller, role, account)?;
        Ok(if changed {
            format!("Granted {} to {}", cmd.role, account)
        } else {
            format!("{} already holds {}", account, cmd.role)
        })
    }
}

fn allocate(state: &mut NectarState, cmd: &AllocateCmd) -> Result<String, RunnerError> {
    let caller = parse_account(&cmd.caller)?;
    let cap = parse_amount(&cmd.cap)?;
    let bucket = RoleId::named(&cmd.bucket);
    let denomination = DenominationId(cmd.denomination);

    // New buckets keep their name; they stay ungated until a curve is set
    if state.ledger.bucket(bucket).is_none() {
        state.ledger.register_bucket(
            &caller,
            &cmd.bucket,
            denomination,
            cap,
            EmissionCurveParams::immediate(0),
        )?;
    } else {
        state.ledger.allocate(&caller, bucket, denomination, cap)?;
    }
    Ok(format!("{} cap set to {}", cmd.bucket, format_amount(cap)))
}

fn set_curve(state: &mut NectarState, cmd: &SetCurveCmd, now: Timestamp) -> Result<String, RunnerError> {
    let caller = parse_account(&cmd.caller)?;
    let params = EmissionCurveParams::new(
        cmd.start.unwrap_or(now),
        cmd.ramp,
        cmd.ramp_steepness,
        cmd.plateau,
        cmd.decay,
        cmd.decay_steepness,
    )
    .map_err(LedgerError::from)?;

    state.ledger.set_curve(&caller, RoleId::named(&cmd.bucket), params)?;
    Ok(format!(
        "{} curve set: start {}, fully unlocked at {}",
        cmd.bucket,
        params.start,
        params.end()
    ))
}

fn mint(state: &mut NectarState, cmd: &MintCmd, now: Timestamp) -> Result<String, RunnerError> {
    let caller = parse_account(&cmd.caller)?;
    let to = parse_account(&cmd.to)?;
    let amount = parse_amount(&cmd.amount)?;
    let bucket = bucket_id(state, &cmd.bucket)?;

    state.ledger.mint(&caller, &to, bucket, amount, now)?;
    Ok(format!("Minted {} from {} to {}", format_amount(amount), cmd.bucket, to))
}

fn transfer(state: &mut NectarState, cmd: &TransferCmd, now: Timestamp) -> Result<String, RunnerError> {
    let from = parse_account(&cmd.from)?;
    let to = parse_account(&cmd.to)?;
    let amount = parse_amount(&cmd.amount)?;

    state.ledger.transfer(&from, &to, amount, now)?;
    Ok(format!("Transferred {} from {} to {}", format_amount(amount), from, to))
}

fn deposit(state: &mut NectarState, cmd: &DepositCmd, now: Timestamp) -> Result<String, RunnerError> {
    let account = parse_account(&cmd.account)?;
    let amount = parse_amount(&cmd.amount)?;
    let auction = state
        .auctions
        .get_mut(&cmd.auction)
        .ok_or_else(|| RunnerError::UnknownAuction(cmd.auction.clone()))?;

    let epoch = auction.deposit(&account, amount, now)?;
    Ok(format!(
        "Deposited {} by {} into {} epoch {}",
        format_amount(amount),
        account,
        cmd.auction,
        epoch
    ))
}

fn claim(state: &mut NectarState, cmd: &ClaimCmd, now: Timestamp) -> Result<String, RunnerError> {
    let account = parse_account(&cmd.account)?;
    let (auction, ledger) = state
        .auction_mut(&cmd.auction)
        .ok_or_else(|| RunnerError::UnknownAuction(cmd.auction.clone()))?;

    let outcomes = match cmd.epoch {
        Some(epoch) => vec![(epoch, auction.claim(ledger, &account, epoch, now)?)],
        None => auction.claim_all(ledger, &account, now)?,
    };

    if outcomes.is_empty() {
        return Ok(format!("Nothing to claim for {}", account));
    }

    let lines: Vec<String> = outcomes
        .iter()
        .map(|(epoch, outcome)| match outcome {
            ClaimOutcome::WindowOpen { closes_at } => {
                format!("epoch {}: window open until {}", epoch, closes_at)
            }
            ClaimOutcome::NoDeposit => format!("epoch {}: no deposit", epoch),
            ClaimOutcome::Paid(amount) => format!("epoch {}: paid {}", epoch, format_amount(*amount)),
            ClaimOutcome::AlreadyClaimed(amount) => {
                format!("epoch {}: already claimed {}", epoch, format_amount(*amount))
            }
        })
        .collect();
    Ok(lines.join("\n"))
}

/// Errors surfaced by the runner
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    #[error("State already exists at {0} (use --force to overwrite)")]
    StateExists(String),

    #[error("Unknown bucket: {0}")]
    UnknownBucket(String),

    #[error("Unknown auction: {0}")]
    UnknownAuction(String),

    #[error("Invalid argument: {0}")]
    Args(#[from] CliConfigError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Auction error: {0}")]
    Auction(#[from] AuctionError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use crate::genesis::GENESIS_TIMESTAMP;
    use crate::types::{AccountId, UNIT};
    use clap::Parser;
    use tempfile::TempDir;

    fn run_args(dir: &TempDir, args: &[&str]) -> Result<(), RunnerError> {
        let state = dir.path().join("state.bin");
        let state = state.to_str().unwrap();
        let mut argv = vec!["nectar", "--state", state];
        argv.extend_from_slice(args);

        let cli = Cli::parse_from(argv);
        let config = CliConfig::from_cli(&cli)?;
        run(cli.command, &config)
    }

    fn load_state(dir: &TempDir) -> NectarState {
        StateSnapshot::load(dir.path().join("state.bin")).unwrap().state
    }

    #[test]
    fn test_init_refuses_overwrite() {
        let dir = TempDir::new().unwrap();
        run_args(&dir, &["init"]).unwrap();
        assert!(matches!(run_args(&dir, &["init"]), Err(RunnerError::StateExists(_))));
        run_args(&dir, &["init", "--force"]).unwrap();
    }

    #[test]
    fn test_mint_and_transfer_persist() {
        let dir = TempDir::new().unwrap();
        let at = GENESIS_TIMESTAMP.to_string();
        run_args(&dir, &["init"]).unwrap();

        // Treasury holds the reserved allocation role at genesis
        run_args(
            &dir,
            &["--at", &at, "mint", "--caller", "@nectar:treasury", "RESERVED_ALLOCATION", "@alice", "2.5"],
        )
        .unwrap();
        run_args(&dir, &["--at", &at, "transfer", "@alice", "@bob", "0.5"]).unwrap();

        let state = load_state(&dir);
        assert_eq!(state.ledger.balance_of(&AccountId::derived("alice")), 2 * UNIT);
        assert_eq!(state.ledger.balance_of(&AccountId::derived("bob")), UNIT / 2);
    }

    #[test]
    fn test_failed_command_leaves_state() {
        let dir = TempDir::new().unwrap();
        run_args(&dir, &["init"]).unwrap();

        let result = run_args(&dir, &["mint", "--caller", "@mallory", "RESERVED_ALLOCATION", "@mallory", "1"]);
        assert!(matches!(result, Err(RunnerError::Ledger(LedgerError::Unauthorized { .. }))));
        assert_eq!(load_state(&dir).ledger.total_supply(), 0);
    }

    #[test]
    fn test_deposit_and_claim() {
        let dir = TempDir::new().unwrap();
        run_args(&dir, &["init"]).unwrap();

        let open = (GENESIS_TIMESTAMP + 86_400).to_string();
        let closed = (GENESIS_TIMESTAMP + 8 * 86_400).to_string();
        run_args(&dir, &["--at", &open, "deposit", "@alice", "1"]).unwrap();
        run_args(&dir, &["--at", &closed, "claim", "@alice"]).unwrap();

        let state = load_state(&dir);
        let auction = state.auction("weekly").unwrap();
        let paid = state.ledger.balance_of(&AccountId::derived("alice"));
        assert!(paid > 0);
        assert_eq!(auction.epoch(0).unwrap().budget, paid);
    }

    #[test]
    fn test_read_commands() {
        let dir = TempDir::new().unwrap();
        run_args(&dir, &["init"]).unwrap();
        let at = (GENESIS_TIMESTAMP + 86_400).to_string();

        run_args(&dir, &["--at", &at, "status"]).unwrap();
        run_args(&dir, &["--at", &at, "--format", "json", "status"]).unwrap();
        run_args(&dir, &["--at", &at, "curve", "ANON_ALLOCATION", "--points", "4"]).unwrap();
        run_args(&dir, &["--at", &at, "epoch"]).unwrap();
        assert!(matches!(
            run_args(&dir, &["curve", "MISSING"]),
            Err(RunnerError::UnknownBucket(_))
        ));
    }

    #[test]
    fn test_governance_commands() {
        let dir = TempDir::new().unwrap();
        run_args(&dir, &["init"]).unwrap();
        let at = GENESIS_TIMESTAMP.to_string();

        run_args(&dir, &["grant", "--caller", "@nectar:governor", "RECM_ALLOCATION", "@ops"]).unwrap();
        run_args(
            &dir,
            &["--at", &at, "set-curve", "--caller", "@nectar:governor", "RECM_ALLOCATION", "--plateau", "100"],
        )
        .unwrap();
        run_args(&dir, &["allocate", "--caller", "@nectar:governor", "RECM_ALLOCATION", "10"]).unwrap();

        let state = load_state(&dir);
        let bucket = state.ledger.bucket(RoleId::named("RECM_ALLOCATION")).unwrap();
        assert_eq!(bucket.cap, 10 * UNIT);
        assert_eq!(bucket.curve.end(), GENESIS_TIMESTAMP + 100);
        assert!(state.ledger.roles().has_role(&AccountId::derived("ops"), bucket.id));
    }

    #[test]
    fn test_allocate_new_bucket_by_name() {
        let dir = TempDir::new().unwrap();
        run_args(&dir, &["init"]).unwrap();

        run_args(&dir, &["allocate", "--caller", "@nectar:governor", "PARTNER_ALLOCATION", "5", "--denomination", "1"])
            .unwrap();
        run_args(&dir, &["grant", "--caller", "@nectar:governor", "PARTNER_ALLOCATION", "@ops"]).unwrap();
        run_args(&dir, &["mint", "--caller", "@ops", "PARTNER_ALLOCATION", "@ops", "5"]).unwrap();

        let state = load_state(&dir);
        let supply = state.ledger.supply();
        assert_eq!(supply.cap_per_denomination(DenominationId(1)), 5 * UNIT);
        assert_eq!(state.ledger.allocations().bucket_by_name("PARTNER_ALLOCATION").unwrap().minted, 5 * UNIT);
    }
}
