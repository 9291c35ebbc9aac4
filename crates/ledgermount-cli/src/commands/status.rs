//! Status command handler

use std::path::PathBuf;

use anyhow::Result;

use ledgermount_core::Config;

use crate::output::{Output, OutputFormat};
use crate::session::Session;

/// Show status information
pub fn show(session: &Session, config_path: Option<&PathBuf>, output: &Output) -> Result<()> {
    let config = &session.config;
    let config_file = config_path
        .cloned()
        .unwrap_or_else(Config::config_file_path);
    let ledger_records = session.book().record_count();
    let host_records = session.store().len();

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "config_file": config_file,
                    "data_dir": config.data_dir,
                    "sandbox_mode": config.sandbox_mode,
                    "counts": {
                        "remote_types": config.remote_types.len(),
                        "mounts": config.mounts.len(),
                        "ledger_records": ledger_records,
                        "host_records": host_records
                    }
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", config.data_dir.display());
        }
        OutputFormat::Human => {
            println!("LedgerMount Status");
            println!("==================");
            println!();
            println!("Ledger:");
            println!(
                "  Mode:     {}",
                if config.sandbox_mode {
                    "sandbox"
                } else {
                    "live"
                }
            );
            println!("  Location: {}", config.ledger_path().display());
            println!();
            println!("Declarations:");
            println!("  Remote types: {}", config.remote_types.len());
            println!("  Mounts:       {}", config.mounts.len());
            println!();
            println!("Contents:");
            println!("  Ledger records: {}", ledger_records);
            println!("  Host records:   {}", host_records);
            println!();
            println!("Config file: {}", config_file.display());
        }
    }

    Ok(())
}
