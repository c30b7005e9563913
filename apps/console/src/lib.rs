//! # Vendo Console Library
//!
//! Terminal front end for one vending machine.
//!
//! ## Module Organization
//! ```text
//! vendo_console/
//! ├── lib.rs          ◄─── You are here (startup & run)
//! ├── settings.rs     ◄─── vendo.toml + VENDO_* environment
//! ├── state.rs        ◄─── Machine behind the session lock
//! ├── interactor.rs   ◄─── Prompt/read/show boundary
//! ├── table.rs        ◄─── Product, coin and sales tables
//! ├── session/
//! │   ├── mod.rs      ◄─── Role loop
//! │   ├── customer.rs ◄─── One purchase
//! │   └── vendor.rs   ◄─── Vendor menu
//! └── error.rs        ◄─── Session error type
//! ```
//!
//! ## Output Streams
//! Prompts and tables go to stdout; logs go to stderr so they never land
//! in the middle of a customer prompt.

pub mod error;
pub mod interactor;
pub mod session;
pub mod settings;
pub mod state;
pub mod table;

use anyhow::{bail, Context};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use interactor::ConsoleInteractor;
use settings::Settings;
use state::MachineState;
use vendo_core::Denominations;
use vendo_db::{Database, DbConfig};

/// Command line options.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct CliArgs {
    /// `--config <path>`
    pub config: Option<PathBuf>,
    /// `--db <path>`, wins over settings and environment.
    pub database: Option<PathBuf>,
    /// `--help`
    pub help: bool,
}

impl CliArgs {
    /// Parses arguments after the program name.
    pub fn parse(args: impl IntoIterator<Item = String>) -> anyhow::Result<Self> {
        let mut parsed = CliArgs::default();
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" | "-c" => {
                    let value = args.next().context("--config needs a path")?;
                    parsed.config = Some(PathBuf::from(value));
                }
                "--db" | "-d" => {
                    let value = args.next().context("--db needs a path")?;
                    parsed.database = Some(PathBuf::from(value));
                }
                "--help" | "-h" => parsed.help = true,
                other => bail!("Unknown argument: {}", other),
            }
        }

        Ok(parsed)
    }
}

const USAGE: &str = "\
Usage: vendo [OPTIONS]

Options:
  -c, --config <PATH>  Settings file (default: vendo.toml in the config directory)
  -d, --db <PATH>      Database file (default: vendo.db in the data directory)
  -h, --help           Show this help message

Environment:
  VENDO_DB_PATH, VENDO_DENOMINATIONS, VENDO_RESERVE, VENDO_SLOT_LIMIT, RUST_LOG";

/// Runs the console machine until `exit` or end of input.
///
/// ## Startup Sequence
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  1. Tracing ─────── EnvFilter from RUST_LOG, default                    │
/// │                      info,vendo=debug,sqlx=warn, written to stderr       │
/// │  2. Settings ────── defaults → vendo.toml → VENDO_* → --db              │
/// │  3. Database ────── SQLite, WAL, migrations                             │
/// │  4. Machine ─────── till + slots loaded into memory                     │
/// │  5. Role loop ───── customer / vendor / exit                            │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub async fn run() -> anyhow::Result<()> {
    let args = CliArgs::parse(std::env::args().skip(1))?;
    if args.help {
        println!("{}", USAGE);
        return Ok(());
    }

    init_tracing();
    info!("Starting vending machine");

    let mut settings = Settings::load(args.config).context("loading settings")?;
    if let Some(path) = args.database {
        settings.database.path = Some(path);
    }

    warn_if_not_canonical(&settings.machine.denominations);

    let db_path = settings.database_path()?;
    info!(path = %db_path.display(), "Database path determined");

    let db = Database::new(DbConfig::new(db_path))
        .await
        .context("opening database")?;
    let state = MachineState::load(db, settings.machine)
        .await
        .context("loading machine state")?;

    let mut io = ConsoleInteractor::new();
    session::run_roles(&state, &mut io).await;

    state.db().close().await;
    info!("Vending machine stopped");
    Ok(())
}

/// Greedy change stays in use either way; this only tells the operator.
/// Returns whether the set was confirmed canonical.
fn warn_if_not_canonical(denominations: &Denominations) -> bool {
    match denominations.is_canonical() {
        Some(true) => true,
        Some(false) => {
            warn!(
                ?denominations,
                "Denominations are not canonical; greedy change may use more coins than necessary"
            );
            false
        }
        None => {
            warn!(?denominations, "Greedy optimality not checked for this coin set");
            false
        }
    }
}

/// Logging to stderr, filtered by `RUST_LOG`.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,vendo=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_parse_args() {
        let parsed = CliArgs::parse(args(&["--config", "m.toml", "-d", "m.db"])).unwrap();
        assert_eq!(parsed.config, Some(PathBuf::from("m.toml")));
        assert_eq!(parsed.database, Some(PathBuf::from("m.db")));
        assert!(!parsed.help);

        assert!(CliArgs::parse(args(&["-h"])).unwrap().help);
        assert_eq!(CliArgs::parse(Vec::new()).unwrap(), CliArgs::default());
    }

    #[test]
    fn test_parse_args_errors() {
        assert!(CliArgs::parse(args(&["--db"])).is_err());
        assert!(CliArgs::parse(args(&["--verbose"])).is_err());
    }

    #[test]
    fn test_startup_canonical_check() {
        assert!(warn_if_not_canonical(&Denominations::default()));
        assert!(!warn_if_not_canonical(&Denominations::new([20, 50]).unwrap()));
        // Too wide to search; startup carries on
        assert!(!warn_if_not_canonical(&Denominations::new([7, 3_000_000_000]).unwrap()));
    }
}
