//! Mount runtime
//!
//! The four per-mount operations, addressed by mount name:
//!
//! - [`MountExt::mount_get`]: fetch the remote counterpart, with caching
//! - [`MountExt::mount_set`]: assign (or clear) the remote counterpart
//! - [`MountExt::sync_to`]: push host attributes out, creating the remote
//!   record when none exists yet
//! - [`MountExt::sync_from`]: pull remote attributes into the host and save it
//!
//! Undeclared mounts, missing external ids and unresolvable connections are
//! not errors: the operation yields `Ok(None)` and touches nothing. Errors
//! raised by adapters or by the host record come back unchanged inside
//! [`MountError`].
//!
//! A mount on a host record moves between `Unloaded`, `LoadedPresent` and
//! `LoadedAbsent` (see [`crate::MountState`]). Only `LoadedPresent` satisfies
//! a non-reloading get; a mount known to be absent is fetched again.

use tracing::{debug, trace};

use crate::connection;
use crate::error::{MountError, Result};
use crate::host::Mountable;
use crate::remote::RecordRef;
use crate::value::FieldValue;

/// Result of an outward sync that reached the remote service
#[derive(Debug, Clone)]
pub enum SyncOutcome {
    /// The remote record was saved and its id written back to the host
    Saved {
        record: RecordRef,
        /// Whether the record was created by this sync
        created: bool,
    },
    /// The remote service rejected the record; host and cache are untouched
    Rejected {
        record: RecordRef,
        created: bool,
        /// Adapter-reported reasons, possibly empty
        reasons: Vec<String>,
    },
}

impl SyncOutcome {
    /// The remote record, saved or not
    pub fn record(&self) -> &RecordRef {
        match self {
            SyncOutcome::Saved { record, .. } | SyncOutcome::Rejected { record, .. } => record,
        }
    }

    /// Consume the outcome, keeping the remote record
    pub fn into_record(self) -> RecordRef {
        match self {
            SyncOutcome::Saved { record, .. } | SyncOutcome::Rejected { record, .. } => record,
        }
    }

    /// Whether the remote save succeeded
    pub fn is_saved(&self) -> bool {
        matches!(self, SyncOutcome::Saved { .. })
    }

    /// Whether the create path was taken
    pub fn created(&self) -> bool {
        match self {
            SyncOutcome::Saved { created, .. } | SyncOutcome::Rejected { created, .. } => *created,
        }
    }

    /// Rejection reasons (empty when saved)
    pub fn reasons(&self) -> &[String] {
        match self {
            SyncOutcome::Saved { .. } => &[],
            SyncOutcome::Rejected { reasons, .. } => reasons,
        }
    }
}

/// Mount operations available on every [`Mountable`] host
pub trait MountExt: Mountable {
    /// Get the remote record for `mount`
    ///
    /// Returns the cached record unless `reload` is set. Otherwise fetches by
    /// the external id through the resolved connection and caches the result,
    /// present or absent. Yields `None` without caching when the mount is
    /// undeclared, the external id is blank, or no connection resolves.
    fn mount_get(&mut self, mount: &str, reload: bool) -> Result<Option<RecordRef>> {
        if !reload {
            if let Some(record) = self.mount_cache().cached(mount) {
                trace!(mount, "Mount cache hit");
                return Ok(Some(record));
            }
        }

        let Some(config) = self.mount_registry().lookup(mount) else {
            return Ok(None);
        };

        let Some(external_id) = self
            .attribute(config.external_id_field())
            .and_then(|value| value.to_id())
        else {
            return Ok(None);
        };

        let Some(connection) = connection::resolve(&*self, &config) else {
            return Ok(None);
        };

        debug!(
            mount,
            remote_type = config.remote_type(),
            external_id = %external_id,
            "Fetching remote record"
        );
        let record = config
            .adapter()
            .fetch_by_id(&external_id, &connection)
            .map_err(MountError::Remote)?;

        self.mount_cache_mut().store(mount, record.clone());
        Ok(record)
    }

    /// Assign the remote record for `mount`
    ///
    /// `None` marks the mount as known absent and leaves the external id
    /// alone. A record is always cached; when the mount is declared and the
    /// record has an id, the id is written to the external id field.
    fn mount_set(&mut self, mount: &str, record: Option<RecordRef>) -> Result<()> {
        let Some(record) = record else {
            self.mount_cache_mut().clear(mount);
            return Ok(());
        };

        if let Some(config) = self.mount_registry().lookup(mount) {
            if let Some(id) = non_blank(record.id()) {
                self.write_attribute(config.external_id_field(), FieldValue::Text(id))
                    .map_err(MountError::Host)?;
            }
        }

        self.mount_cache_mut().store(mount, Some(record));
        Ok(())
    }

    /// Push host attributes to the remote record, creating it if needed
    ///
    /// Fields the remote record has no writer for are skipped. On a
    /// successful save the remote id is written back to the host and the
    /// record is cached. Yields `None` when the mount is undeclared or no
    /// connection resolves. The remote record stays locked while the outward
    /// mapper runs.
    fn sync_to(&mut self, mount: &str) -> Result<Option<SyncOutcome>> {
        let Some(config) = self.mount_registry().lookup(mount) else {
            return Ok(None);
        };

        let Some(connection) = connection::resolve(&*self, &config) else {
            return Ok(None);
        };

        let (record, created) = match self.mount_get(mount, false)? {
            Some(record) => (record, false),
            None => {
                debug!(mount, remote_type = config.remote_type(), "Creating remote record");
                let record = config
                    .adapter()
                    .create(&connection)
                    .map_err(MountError::Remote)?;
                (record, true)
            }
        };

        let (saved, reasons) = {
            let mut remote = record.lock();
            let attributes = config.map_to_remote(&*self, &*remote);

            for (field, value) in attributes {
                if remote.has_writer(&field) {
                    remote.set(&field, value).map_err(MountError::Remote)?;
                } else {
                    trace!(mount, field = %field, "Skipping field without remote writer");
                }
            }

            let saved = remote.save().map_err(MountError::Remote)?;
            let reasons = if saved { Vec::new() } else { remote.errors() };
            (saved, reasons)
        };

        if !saved {
            debug!(mount, reasons = ?reasons, "Remote record rejected");
            return Ok(Some(SyncOutcome::Rejected {
                record,
                created,
                reasons,
            }));
        }

        if let Some(id) = non_blank(record.id()) {
            self.write_attribute(config.external_id_field(), FieldValue::Text(id))
                .map_err(MountError::Host)?;
        }
        self.mount_cache_mut().store(mount, Some(record.clone()));

        debug!(mount, created, "Remote record saved");
        Ok(Some(SyncOutcome::Saved { record, created }))
    }

    /// Pull remote attributes into the host record and save it
    ///
    /// Yields `None` when the mount is undeclared or there is no remote
    /// record to read from; nothing is created in this direction.
    fn sync_from(&mut self, mount: &str) -> Result<Option<&mut Self>> {
        let Some(config) = self.mount_registry().lookup(mount) else {
            return Ok(None);
        };

        let Some(record) = self.mount_get(mount, false)? else {
            return Ok(None);
        };

        let attributes = {
            let remote = record.lock();
            config.map_from_remote(&*self, &*remote)
        };

        debug!(mount, fields = attributes.len(), "Applying remote attributes");
        self.assign_attributes(attributes)
            .map_err(MountError::Host)?;
        self.save().map_err(MountError::Host)?;

        Ok(Some(self))
    }

    /// Run an outward sync for every mount flagged `sync_on_save`
    ///
    /// Never called implicitly; hosts invoke it after their own save.
    /// Mounts are visited in name order.
    fn sync_on_save(&mut self) -> Result<Vec<(String, Option<SyncOutcome>)>> {
        let mounts: Vec<String> = self
            .mount_registry()
            .iter()
            .filter(|config| config.sync_on_save())
            .map(|config| config.name().to_string())
            .collect();

        let mut outcomes = Vec::with_capacity(mounts.len());
        for mount in mounts {
            let outcome = self.sync_to(&mount)?;
            outcomes.push((mount, outcome));
        }
        Ok(outcomes)
    }
}

impl<H: Mountable> MountExt for H {}

fn non_blank(id: Option<String>) -> Option<String> {
    id.filter(|id| !id.trim().is_empty())
}
