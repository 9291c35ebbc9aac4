//! Mounts command handler

use anyhow::Result;

use ledgermount_core::Config;

use crate::output::{Output, OutputFormat};

/// List declared mounts, optionally for one host type
pub fn list(config: &Config, host_type: Option<String>, output: &Output) -> Result<()> {
    let mounts: Vec<_> = config
        .mounts
        .iter()
        .filter(|m| host_type.as_deref().map_or(true, |t| m.host_type == t))
        .collect();

    match output.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&mounts)?);
        }
        OutputFormat::Quiet => {
            for mount in &mounts {
                println!("{}.{}", mount.host_type, mount.name);
            }
        }
        OutputFormat::Human => {
            if mounts.is_empty() {
                println!("No mounts declared.");
                return Ok(());
            }
            for mount in &mounts {
                println!("{}.{} -> {}", mount.host_type, mount.name, mount.remote_type);
                println!("  external id:  {}", mount.external_id_field);
                println!(
                    "  connection:   {}",
                    mount
                        .connection_method
                        .as_deref()
                        .unwrap_or("(global resolver)")
                );
                if mount.sync_on_save {
                    println!("  sync on save: yes");
                }
            }
            println!("\n{} mount(s)", mounts.len());
        }
    }

    Ok(())
}
