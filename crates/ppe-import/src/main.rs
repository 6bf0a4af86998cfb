mod logging;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Args, Parser, Subcommand};
use ppe_import_core::{
    config::{ConfigStore, ImportSettings, DEFAULT_CONFIG_PATH},
    credential::{self, CredentialGuard},
    ingestion, ImportError,
};
use tracing::{error, info, warn};

use crate::logging::{RunLog, DEFAULT_LOG_DIR};

#[derive(Parser, Debug)]
#[command(author, version, about = "Loads PPE issue CSV exports into Postgres", long_about = None)]
struct Cli {
    /// Configuration file holding CSV_FILE_PATH and the JDBC_* settings
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
    /// Directory that receives one log file per run
    #[arg(long, global = true, default_value = DEFAULT_LOG_DIR)]
    log_dir: PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Import every file in the configured source directory
    Run(RunArgs),
    /// Encrypt JDBC_PASSWORD in the configuration file without importing
    ProtectConfig,
    /// Print a new base64 key for PPE_IMPORT_KEY
    Keygen,
}

#[derive(Args, Debug, Default)]
struct RunArgs {
    /// Decode every row but do not connect to the database
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    if let Command::Keygen = cli.command {
        println!("{}", credential::generate_key());
        return Ok(ExitCode::SUCCESS);
    }

    let run_log = RunLog::create(&cli.log_dir, Local::now())?;
    info!(log = %run_log.path().display(), "Starting PPE import");

    let outcome = match cli.command {
        Command::Run(args) => handle_run(&cli.config, args).await,
        Command::ProtectConfig => handle_protect_config(&cli.config),
        // handled before the log is opened
        Command::Keygen => Ok(()),
    };

    match outcome {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(err) => {
            log_failure(&err);
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Row data errors go to `ERROR`; everything else is a warning.
fn log_failure(err: &ImportError) {
    let kind = err.kind();
    if kind.is_severe() {
        error!(kind = %kind, "Error inserting records: {err}");
    } else {
        warn!(kind = %kind, "{err}");
    }
}

async fn handle_run(config_path: &Path, args: RunArgs) -> Result<(), ImportError> {
    let mut store = load_store(config_path);
    let guard = CredentialGuard::from_env()?;
    let password = credential::unlock_stored_password(&mut store, &guard)?;
    let settings = ImportSettings::from_store(&store)?;

    if args.dry_run {
        info!("Dry run: no records will be written");
    }
    ingestion::run_import(&settings, &password, args.dry_run).await?;
    Ok(())
}

fn handle_protect_config(config_path: &Path) -> Result<(), ImportError> {
    let mut store = load_store(config_path);
    let guard = CredentialGuard::from_env()?;
    credential::unlock_stored_password(&mut store, &guard)?;
    Ok(())
}

/// A missing or unreadable file is reported and treated as empty; the
/// required-key checks that follow then fail the run.
fn load_store(config_path: &Path) -> ConfigStore {
    match ConfigStore::load(config_path)
        .with_context(|| format!("reading {}", config_path.display()))
    {
        Ok(store) => store,
        Err(err) => {
            warn!("Could not read configuration: {err:#}");
            ConfigStore::empty(config_path)
        }
    }
}
