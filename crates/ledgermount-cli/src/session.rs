//! Loaded CLI state
//!
//! A [`Session`] ties the configuration to the files it points at: the ledger
//! book, the host record store, and the mount registries built from the
//! declared mounts. Opening a session installs the global connection
//! resolver, so every mount without a connection method talks to the ledger.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::{bail, Context, Result};
use tracing::debug;

use ledgermount_core::{
    build_registries, ledger_adapters, set_connection_resolver, Attributes, Config, ConnectionRef,
    DocumentRecord, DocumentStore, FieldValue, LedgerBook, LedgerConnection, MountConfig,
    MountRegistry, RecordRef, RecordSchema,
};

pub struct Session {
    pub config: Config,
    book: Arc<Mutex<LedgerBook>>,
    store: Arc<Mutex<DocumentStore>>,
    registries: BTreeMap<String, Arc<MountRegistry<DocumentRecord>>>,
}

impl Session {
    /// Load the data files named by `config`
    pub fn from_config(config: Config) -> Result<Self> {
        let book = LedgerBook::load(&config.ledger_path())?;
        let store = DocumentStore::load(&config.records_path())?;

        let adapters = ledger_adapters(&config.remote_types);
        let registries = build_registries::<DocumentRecord>(&config.mounts, &adapters)
            .context("Invalid mount declaration")?
            .into_iter()
            .map(|(host_type, registry)| (host_type, Arc::new(registry)))
            .collect();

        let session = Self {
            book: Arc::new(Mutex::new(book)),
            store: Arc::new(Mutex::new(store)),
            registries,
            config,
        };

        let connection = session.connection();
        set_connection_resolver(move |_, _| Some(connection.clone()));
        debug!(
            sandbox = session.config.sandbox_mode,
            "Installed ledger connection resolver"
        );

        Ok(session)
    }

    /// A connection to this session's ledger book
    pub fn connection(&self) -> ConnectionRef {
        Arc::new(LedgerConnection::new(self.book.clone()).with_sandbox(self.config.sandbox_mode))
    }

    pub fn book(&self) -> MutexGuard<'_, LedgerBook> {
        self.book.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn store(&self) -> MutexGuard<'_, DocumentStore> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registry for a host type (empty when nothing is declared)
    pub fn registry(&self, host_type: &str) -> Arc<MountRegistry<DocumentRecord>> {
        self.registries
            .get(host_type)
            .cloned()
            .unwrap_or_default()
    }

    /// Load a host record by id
    pub fn record(&self, id: &str) -> Result<DocumentRecord> {
        let host_type = match self.store().get(id) {
            Some(stored) => stored.host_type.clone(),
            None => bail!("Record not found: {}", id),
        };

        DocumentRecord::from_store(&self.store, id, self.registry(&host_type))
            .with_context(|| format!("Record not found: {}", id))
    }

    /// Create a new host record bound to the store
    pub fn new_record(&self, id: &str, host_type: &str, attributes: Attributes) -> DocumentRecord {
        DocumentRecord::new(id, host_type, self.registry(host_type))
            .with_attributes(attributes)
            .with_store(self.store.clone())
    }

    /// Look up a declared mount, failing with the list of declared names
    pub fn mount(
        &self,
        record: &DocumentRecord,
        mount: &str,
    ) -> Result<Arc<MountConfig<DocumentRecord>>> {
        let registry = self.registry(record.host_type());
        match registry.lookup(mount) {
            Some(config) => Ok(config),
            None => {
                let declared: Vec<&str> = registry.names().collect();
                bail!(
                    "Unknown mount '{}' for host type '{}'\nDeclared mounts: {}",
                    mount,
                    record.host_type(),
                    if declared.is_empty() {
                        "(none)".to_string()
                    } else {
                        declared.join(", ")
                    }
                );
            }
        }
    }

    /// Schema for a remote type
    pub fn schema(&self, remote_type: &str) -> Option<&RecordSchema> {
        self.config
            .remote_types
            .iter()
            .find(|schema| schema.name == remote_type)
    }

    /// Readable fields of a remote record, following its schema
    pub fn remote_fields(&self, remote_type: &str, record: &RecordRef) -> Attributes {
        let mut fields: Attributes = self
            .schema(remote_type)
            .map(|schema| {
                schema
                    .fields
                    .iter()
                    .map(|field| (field.clone(), record.get(field).unwrap_or(FieldValue::Null)))
                    .collect()
            })
            .unwrap_or_default();

        if let Some(updated) = record.get(ledgermount_core::ledger::UPDATED_FIELD) {
            fields.insert(ledgermount_core::ledger::UPDATED_FIELD.to_string(), updated);
        }
        fields
    }

    /// Write the ledger book and record store back to disk
    pub fn save(&self) -> Result<()> {
        self.book().save(&self.config.ledger_path())?;
        self.store().save(&self.config.records_path())?;
        debug!("Saved ledger and records");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgermount_core::{HostRecord, MountDeclaration, MountExt};
    use tempfile::TempDir;

    fn config(temp_dir: &TempDir) -> Config {
        let toml = r#"
            [[remote_types]]
            name = "xero.contact"
            fields = ["Name", "EmailAddress"]
            required = ["Name"]

            [[mounts]]
            host_type = "customer"
            name = "accounting_contact"
            remote_type = "xero.contact"
            external_id_field = "accounting_contact_id"
            sync_on_save = true

            [mounts.to_remote]
            Name = "name"
            EmailAddress = "email"

            [mounts.from_remote]
            name = "Name"
        "#;
        let mut config: Config = toml::from_str(toml).unwrap();
        config.data_dir = temp_dir.path().to_path_buf();
        config
    }

    fn attrs(pairs: &[(&str, &str)]) -> Attributes {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), FieldValue::from(*v)))
            .collect()
    }

    // One test drives the whole flow, since opening a session replaces the
    // process-wide resolver.
    #[test]
    fn test_session_push_save_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let session = Session::from_config(config(&temp_dir)).unwrap();

        let mut jane = session.new_record(
            "cust-1",
            "customer",
            attrs(&[("name", "Jane Doe"), ("email", "jane@example.com")]),
        );
        assert!(session.mount(&jane, "accounting_contact").is_ok());
        let err = session.mount(&jane, "accounting_invoice").unwrap_err();
        assert!(err.to_string().contains("accounting_contact"));

        let outcome = jane.sync_to("accounting_contact").unwrap().unwrap();
        assert!(outcome.is_saved());
        jane.save().unwrap();

        let fields = session.remote_fields("xero.contact", outcome.record());
        assert_eq!(fields.get("Name"), Some(&FieldValue::from("Jane Doe")));
        assert!(fields.contains_key(ledgermount_core::ledger::UPDATED_FIELD));

        session.save().unwrap();
        drop(session);

        let session = Session::from_config(config(&temp_dir)).unwrap();
        assert_eq!(session.book().record_count(), 1);

        let mut reloaded = session.record("cust-1").unwrap();
        let remote_id = reloaded.attribute("accounting_contact_id").unwrap();
        assert_eq!(Some(remote_id.to_string()), outcome.record().id());

        let remote = reloaded.mount_get("accounting_contact", false).unwrap().unwrap();
        assert_eq!(remote.get("EmailAddress"), Some(FieldValue::from("jane@example.com")));

        assert!(session.record("cust-404").is_err());
    }

    #[test]
    fn test_unknown_remote_type_in_config() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = config(&temp_dir);
        config.mounts.push(MountDeclaration {
            host_type: "order".to_string(),
            name: "accounting_invoice".to_string(),
            remote_type: "xero.invoice".to_string(),
            external_id_field: "accounting_invoice_id".to_string(),
            connection_method: None,
            sync_on_save: false,
            to_remote: BTreeMap::new(),
            from_remote: BTreeMap::new(),
        });

        let err = Session::from_config(config).err().unwrap();
        assert!(format!("{:#}", err).contains("xero.invoice"));
    }
}
