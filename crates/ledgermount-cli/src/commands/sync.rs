//! Mount command handlers: fetch, push, pull

use anyhow::{anyhow, Context, Result};

use ledgermount_core::{HostRecord, MountExt};

use crate::output::Output;
use crate::session::Session;

/// Fetch the remote record behind a mount
pub fn fetch(
    session: &Session,
    id: String,
    mount: String,
    reload: bool,
    output: &Output,
) -> Result<()> {
    let mut record = session.record(&id)?;
    let config = session.mount(&record, &mount)?;

    let remote = record
        .mount_get(&mount, reload)
        .with_context(|| format!("Failed to fetch {} for {}", mount, id))?;

    match remote {
        Some(remote) => {
            let fields = session.remote_fields(config.remote_type(), &remote);
            output.print_remote(config.remote_type(), remote.id().as_deref(), &fields);
        }
        None => {
            output.message(&format!("No remote record for {} on {}", mount, id));
        }
    }

    Ok(())
}

/// Push host attributes to the remote record
pub fn push(session: &Session, id: String, mount: String, output: &Output) -> Result<()> {
    let mut record = session.record(&id)?;
    session.mount(&record, &mount)?;

    let outcome = record
        .sync_to(&mount)
        .with_context(|| format!("Failed to push {} for {}", mount, id))?;

    if outcome.as_ref().is_some_and(|o| o.is_saved()) {
        record.save().map_err(|e| anyhow!(e))?;
    }
    session.save()?;

    output.print_sync_outcome(&mount, outcome.as_ref());
    Ok(())
}

/// Pull remote attributes into the host record
pub fn pull(session: &Session, id: String, mount: String, output: &Output) -> Result<()> {
    let mut record = session.record(&id)?;
    session.mount(&record, &mount)?;

    let pulled = record
        .sync_from(&mount)
        .with_context(|| format!("Failed to pull {} for {}", mount, id))?
        .is_some();

    if !pulled {
        output.message(&format!("No remote record for {} on {}", mount, id));
        return Ok(());
    }

    session.save()?;
    output.print_record(record.id(), record.host_type(), record.attributes());
    Ok(())
}
