//! Generic host records
//!
//! [`DocumentRecord`] is a host record made of plain attributes, for
//! applications (and the CLI) that have no typed model of their own. All
//! records of one host type share a [`MountRegistry`]. Saved records go to a
//! [`DocumentStore`], a JSON file of records keyed by id.
//!
//! Storage location: `{data_dir}/records.json` (see [`crate::Config::records_path`])

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::cache::MountCache;
use crate::error::BoxError;
use crate::host::{HostRecord, Mountable};
use crate::ledger::atomic_write;
use crate::registry::MountRegistry;
use crate::remote::ConnectionRef;
use crate::value::{Attributes, FieldValue};

/// A persisted host record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDocument {
    pub host_type: String,
    #[serde(default)]
    pub attributes: Attributes,
    pub updated_at: DateTime<Utc>,
}

/// Host records by id
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct DocumentStore {
    #[serde(default)]
    records: BTreeMap<String, StoredDocument>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a store from disk; a missing file yields an empty store
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let json = fs::read_to_string(path)
            .with_context(|| format!("Failed to read records from {:?}", path))?;
        serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse records from {:?}", path))
    }

    /// Save the store to disk using atomic write
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_vec_pretty(self).context("Failed to serialize records")?;
        atomic_write(path, &json).with_context(|| format!("Failed to save records to {:?}", path))
    }

    pub fn get(&self, id: &str) -> Option<&StoredDocument> {
        self.records.get(id)
    }

    pub fn put(&mut self, id: &str, document: StoredDocument) {
        self.records.insert(id.to_string(), document);
    }

    /// All records, sorted by id
    pub fn iter(&self) -> impl Iterator<Item = (&str, &StoredDocument)> {
        self.records.iter().map(|(id, doc)| (id.as_str(), doc))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Host record backed by an attribute map
pub struct DocumentRecord {
    id: String,
    host_type: String,
    attributes: Attributes,
    cache: MountCache,
    registry: Arc<MountRegistry<DocumentRecord>>,
    connections: BTreeMap<String, ConnectionRef>,
    store: Option<Arc<Mutex<DocumentStore>>>,
}

impl DocumentRecord {
    /// Create an empty record
    pub fn new(
        id: impl Into<String>,
        host_type: impl Into<String>,
        registry: Arc<MountRegistry<DocumentRecord>>,
    ) -> Self {
        Self {
            id: id.into(),
            host_type: host_type.into(),
            attributes: Attributes::new(),
            cache: MountCache::new(),
            registry,
            connections: BTreeMap::new(),
            store: None,
        }
    }

    /// Load a record from a store, bound to that store for saves
    pub fn from_store(
        store: &Arc<Mutex<DocumentStore>>,
        id: &str,
        registry: Arc<MountRegistry<DocumentRecord>>,
    ) -> Option<Self> {
        let stored = store
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()?;

        Some(
            Self::new(id, stored.host_type, registry)
                .with_attributes(stored.attributes)
                .with_store(store.clone()),
        )
    }

    pub fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.attributes = attributes;
        self
    }

    /// Persist saves into `store`
    pub fn with_store(mut self, store: Arc<Mutex<DocumentStore>>) -> Self {
        self.store = Some(store);
        self
    }

    /// Answer `connection_for(method)` with `connection`
    pub fn with_connection(mut self, method: impl Into<String>, connection: ConnectionRef) -> Self {
        self.connections.insert(method.into(), connection);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn host_type(&self) -> &str {
        &self.host_type
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }
}

impl HostRecord for DocumentRecord {
    fn attribute(&self, field: &str) -> Option<FieldValue> {
        self.attributes.get(field).cloned()
    }

    fn write_attribute(&mut self, field: &str, value: FieldValue) -> std::result::Result<(), BoxError> {
        self.attributes.insert(field.to_string(), value);
        Ok(())
    }

    fn save(&mut self) -> std::result::Result<(), BoxError> {
        let Some(ref store) = self.store else {
            return Ok(());
        };

        trace!(id = %self.id, host_type = %self.host_type, "Saving document record");
        store.lock().unwrap_or_else(PoisonError::into_inner).put(
            &self.id,
            StoredDocument {
                host_type: self.host_type.clone(),
                attributes: self.attributes.clone(),
                updated_at: Utc::now(),
            },
        );
        Ok(())
    }

    fn connection_for(&self, method: &str) -> Option<ConnectionRef> {
        self.connections.get(method).cloned()
    }

    fn mount_cache(&self) -> &MountCache {
        &self.cache
    }

    fn mount_cache_mut(&mut self) -> &mut MountCache {
        &mut self.cache
    }

    fn record_type(&self) -> &str {
        &self.host_type
    }
}

impl Mountable for DocumentRecord {
    fn mount_registry(&self) -> &MountRegistry<Self> {
        &self.registry
    }
}

impl std::fmt::Debug for DocumentRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentRecord")
            .field("id", &self.id)
            .field("host_type", &self.host_type)
            .field("attributes", &self.attributes)
            .field("mounts", &self.registry.len())
            .finish()
    }
}
