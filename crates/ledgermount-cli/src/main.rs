//! LedgerMount CLI
//!
//! Command-line interface for ledgermount - host records mounted onto a
//! file-backed accounting ledger.

use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use ledgermount_core::{clear_connection_resolver, Config};

mod commands;
mod output;
mod session;

use output::{Output, OutputFormat};
use session::Session;

#[derive(Parser)]
#[command(name = "ledgermount")]
#[command(about = "LedgerMount - bind host records to accounting records")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Use a specific config file
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show status (data files, declarations, record counts)
    Status,
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
    /// List declared mounts
    Mounts {
        /// Only mounts of this host type
        host_type: Option<String>,
    },
    /// Manage host records
    Record {
        #[command(subcommand)]
        command: RecordCommands,
    },
    /// Fetch the remote record behind a mount
    Fetch {
        /// Host record ID
        id: String,
        /// Mount name
        mount: String,
        /// Bypass the mount cache
        #[arg(long)]
        reload: bool,
    },
    /// Push host attributes to the remote record (creating it if needed)
    Push {
        /// Host record ID
        id: String,
        /// Mount name
        mount: String,
    },
    /// Pull remote attributes into the host record
    Pull {
        /// Host record ID
        id: String,
        /// Mount name
        mount: String,
    },
    /// Inspect the ledger
    Ledger {
        #[command(subcommand)]
        command: LedgerCommands,
    },
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (data_dir, sandbox_mode, log_file)
        key: String,
        /// Configuration value
        value: String,
    },
}

#[derive(Subcommand)]
enum RecordCommands {
    /// Create or update a host record
    Put {
        /// Record ID
        id: String,
        /// Host type (selects the declared mounts)
        host_type: String,
        /// Attributes as key=value
        #[arg(value_name = "KEY=VALUE")]
        attributes: Vec<String>,
    },
    /// Show a host record
    Show {
        /// Record ID
        id: String,
    },
    /// List host records
    #[command(alias = "ls")]
    List,
}

#[derive(Subcommand)]
enum LedgerCommands {
    /// List remote records
    #[command(alias = "ls")]
    List {
        /// Only records of this remote type
        remote_type: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));
    let config_path = cli.config.as_ref();

    // Config commands work without opening the data files
    if let Commands::Config { command } = &cli.command {
        return match command.clone() {
            Some(ConfigCommands::Show) | None => commands::config::show(config_path, &output),
            Some(ConfigCommands::Set { key, value }) => {
                commands::config::set(key, value, config_path, &output)
            }
        };
    }

    let config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;
    init_logging(&config);
    let session = Session::from_config(config)?;

    let result = match cli.command {
        Commands::Config { .. } => unreachable!(), // Handled above
        Commands::Status => commands::status::show(&session, config_path, &output),
        Commands::Mounts { host_type } => {
            commands::mounts::list(&session.config, host_type, &output)
        }
        Commands::Record { command } => handle_record_command(command, &session, &output),
        Commands::Fetch { id, mount, reload } => {
            commands::sync::fetch(&session, id, mount, reload, &output)
        }
        Commands::Push { id, mount } => commands::sync::push(&session, id, mount, &output),
        Commands::Pull { id, mount } => commands::sync::pull(&session, id, mount, &output),
        Commands::Ledger {
            command: LedgerCommands::List { remote_type },
        } => commands::ledger::list(&session, remote_type, &output),
    };

    clear_connection_resolver();
    result
}

fn handle_record_command(command: RecordCommands, session: &Session, output: &Output) -> Result<()> {
    match command {
        RecordCommands::Put {
            id,
            host_type,
            attributes,
        } => commands::record::put(session, id, host_type, attributes, output),
        RecordCommands::Show { id } => commands::record::show(session, id, output),
        RecordCommands::List => commands::record::list(session, output),
    }
}

/// Initialize file logging
///
/// Only initializes if LEDGERMOUNT_LOG environment variable is set.
/// Logs to file (config.log_file or default {data_dir}/ledgermount.log).
fn init_logging(config: &Config) {
    let Ok(log_level) = std::env::var("LEDGERMOUNT_LOG") else {
        return;
    };

    let log_path = config.log_path();

    let log_file = match File::create(&log_path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Warning: Could not create log file {:?}: {}", log_path, e);
            return;
        }
    };

    let env_filter = EnvFilter::new(format!(
        "ledgermount_core={},ledgermount_cli={}",
        log_level, log_level
    ));

    // Ignore error if already initialized
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(log_file)
        .try_init();

    info!("Logging initialized to {:?}", log_path);
}
