//! File-backed reference ledger
//!
//! A small stand-in for an accounting service: remote records live in a
//! [`LedgerBook`] keyed by remote type and id, persisted as JSON. Each remote
//! type is described by a [`RecordSchema`], the closed set of fields its
//! records accept. Fields outside the schema have no writer, which is what
//! lets one mapper serve several remote shapes.
//!
//! Storage location: `{data_dir}/ledger.json` (see [`crate::Config::ledger_path`])

use std::any::Any;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::error::BoxError;
use crate::remote::{AdapterRegistry, Connection, ConnectionRef, RecordRef, RemoteAdapter, RemoteRecord};
use crate::value::{Attributes, FieldValue};

/// Read-only field carrying the last save time
pub const UPDATED_FIELD: &str = "updated_date_utc";

/// Field set of one remote type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSchema {
    /// Remote type identifier (e.g. "xero.contact")
    pub name: String,
    /// Writable fields
    pub fields: Vec<String>,
    /// Fields that must be non-blank for a save to succeed
    #[serde(default)]
    pub required: Vec<String>,
}

impl RecordSchema {
    /// Create a schema with no required fields
    pub fn new(name: impl Into<String>, fields: &[&str]) -> Self {
        Self {
            name: name.into(),
            fields: fields.iter().map(|f| f.to_string()).collect(),
            required: Vec::new(),
        }
    }

    /// Mark fields as required
    pub fn with_required(mut self, required: &[&str]) -> Self {
        self.required = required.iter().map(|f| f.to_string()).collect();
        self
    }

    /// Whether `field` is writable
    pub fn has_field(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f == field)
    }
}

/// A persisted remote record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub fields: Attributes,
    pub updated_date_utc: DateTime<Utc>,
    /// Written over a sandbox connection; only sandbox connections see it
    #[serde(default)]
    pub sandbox: bool,
}

/// All remote records, by remote type then id
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct LedgerBook {
    #[serde(default)]
    records: BTreeMap<String, BTreeMap<String, StoredRecord>>,
}

impl LedgerBook {
    /// Create an empty book
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a book from disk; a missing file yields an empty book
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let json = fs::read_to_string(path)
            .with_context(|| format!("Failed to read ledger from {:?}", path))?;
        serde_json::from_str(&json).with_context(|| format!("Failed to parse ledger from {:?}", path))
    }

    /// Save the book to disk using atomic write
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_vec_pretty(self).context("Failed to serialize ledger")?;
        atomic_write(path, &json).with_context(|| format!("Failed to save ledger to {:?}", path))
    }

    /// Look up a record
    pub fn get(&self, remote_type: &str, id: &str) -> Option<&StoredRecord> {
        self.records.get(remote_type).and_then(|records| records.get(id))
    }

    /// Insert or replace a record
    pub fn put(&mut self, remote_type: &str, id: &str, record: StoredRecord) {
        self.records
            .entry(remote_type.to_string())
            .or_default()
            .insert(id.to_string(), record);
    }

    /// Records of one remote type, sorted by id
    pub fn list(&self, remote_type: &str) -> Vec<(&str, &StoredRecord)> {
        self.records
            .get(remote_type)
            .map(|records| records.iter().map(|(id, r)| (id.as_str(), r)).collect())
            .unwrap_or_default()
    }

    /// Remote types with at least one record
    pub fn remote_types(&self) -> Vec<&str> {
        self.records.keys().map(String::as_str).collect()
    }

    /// Total number of records
    pub fn record_count(&self) -> usize {
        self.records.values().map(BTreeMap::len).sum()
    }
}

/// Connection to a ledger book
#[derive(Debug, Clone)]
pub struct LedgerConnection {
    book: Arc<Mutex<LedgerBook>>,
    sandbox: bool,
}

impl LedgerConnection {
    /// Connect to a shared book
    pub fn new(book: Arc<Mutex<LedgerBook>>) -> Self {
        Self {
            book,
            sandbox: false,
        }
    }

    /// Mark the connection as a sandbox connection
    pub fn with_sandbox(mut self, sandbox: bool) -> Self {
        self.sandbox = sandbox;
        self
    }

    /// Whether this is a sandbox connection
    pub fn is_sandbox(&self) -> bool {
        self.sandbox
    }

    /// Lock the underlying book
    pub fn book(&self) -> MutexGuard<'_, LedgerBook> {
        lock_book(&self.book)
    }
}

impl Connection for LedgerConnection {
    fn provider(&self) -> &str {
        "ledger"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Adapter serving one remote type from a ledger book
#[derive(Debug, Clone)]
pub struct SchemaAdapter {
    schema: Arc<RecordSchema>,
}

impl SchemaAdapter {
    pub fn new(schema: RecordSchema) -> Self {
        Self {
            schema: Arc::new(schema),
        }
    }

    pub fn schema(&self) -> &RecordSchema {
        &self.schema
    }
}

impl RemoteAdapter for SchemaAdapter {
    fn remote_type(&self) -> &str {
        &self.schema.name
    }

    fn fetch_by_id(&self, id: &str, connection: &ConnectionRef) -> Result<Option<RecordRef>, BoxError> {
        let Some(ledger) = connection.as_any().downcast_ref::<LedgerConnection>() else {
            debug!(
                provider = connection.provider(),
                "Ignoring non-ledger connection"
            );
            return Ok(None);
        };

        let Some(stored) = ledger.book().get(&self.schema.name, id).cloned() else {
            return Ok(None);
        };

        if stored.sandbox != ledger.is_sandbox() {
            debug!(
                remote_type = %self.schema.name,
                id,
                sandbox = ledger.is_sandbox(),
                "Record belongs to the other ledger environment"
            );
            return Ok(None);
        }

        Ok(Some(RecordRef::new(LedgerRecord {
            schema: self.schema.clone(),
            id: Some(id.to_string()),
            fields: stored.fields,
            updated_date_utc: Some(stored.updated_date_utc),
            sandbox: stored.sandbox,
            book: ledger.book.clone(),
            errors: Vec::new(),
        })))
    }

    fn create(&self, connection: &ConnectionRef) -> Result<RecordRef, BoxError> {
        let ledger = connection
            .as_any()
            .downcast_ref::<LedgerConnection>()
            .ok_or_else(|| {
                format!(
                    "Cannot create {} over a '{}' connection",
                    self.schema.name,
                    connection.provider()
                )
            })?;

        Ok(RecordRef::new(LedgerRecord {
            schema: self.schema.clone(),
            id: None,
            fields: Attributes::new(),
            updated_date_utc: None,
            sandbox: ledger.is_sandbox(),
            book: ledger.book.clone(),
            errors: Vec::new(),
        }))
    }
}

/// Register a [`SchemaAdapter`] for every schema
pub fn ledger_adapters(schemas: &[RecordSchema]) -> AdapterRegistry {
    let mut adapters = AdapterRegistry::new();
    for schema in schemas {
        adapters.register(Arc::new(SchemaAdapter::new(schema.clone())));
    }
    adapters
}

/// A remote record held in a ledger book
pub struct LedgerRecord {
    schema: Arc<RecordSchema>,
    id: Option<String>,
    fields: Attributes,
    updated_date_utc: Option<DateTime<Utc>>,
    sandbox: bool,
    book: Arc<Mutex<LedgerBook>>,
    errors: Vec<String>,
}

impl LedgerRecord {
    /// Remote type of the record
    pub fn remote_type(&self) -> &str {
        &self.schema.name
    }

    /// All field values
    pub fn fields(&self) -> &Attributes {
        &self.fields
    }
}

impl std::fmt::Debug for LedgerRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LedgerRecord")
            .field("remote_type", &self.schema.name)
            .field("id", &self.id)
            .field("fields", &self.fields)
            .field("updated_date_utc", &self.updated_date_utc)
            .field("sandbox", &self.sandbox)
            .finish()
    }
}

impl RemoteRecord for LedgerRecord {
    fn id(&self) -> Option<String> {
        self.id.clone()
    }

    fn get(&self, field: &str) -> Option<FieldValue> {
        if field == UPDATED_FIELD {
            return self
                .updated_date_utc
                .map(|t| FieldValue::Text(t.to_rfc3339_opts(SecondsFormat::Secs, true)));
        }
        self.fields.get(field).cloned()
    }

    fn has_writer(&self, field: &str) -> bool {
        self.schema.has_field(field)
    }

    fn set(&mut self, field: &str, value: FieldValue) -> Result<(), BoxError> {
        if !self.schema.has_field(field) {
            return Err(format!("{} has no field '{}'", self.schema.name, field).into());
        }
        self.fields.insert(field.to_string(), value);
        Ok(())
    }

    fn save(&mut self) -> Result<bool, BoxError> {
        self.errors = self
            .schema
            .required
            .iter()
            .filter(|field| self.fields.get(*field).map_or(true, FieldValue::is_blank))
            .map(|field| format!("{} is required", field))
            .collect();

        if !self.errors.is_empty() {
            return Ok(false);
        }

        let id = self
            .id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let now = Utc::now();

        lock_book(&self.book).put(
            &self.schema.name,
            &id,
            StoredRecord {
                fields: self.fields.clone(),
                updated_date_utc: now,
                sandbox: self.sandbox,
            },
        );

        self.id = Some(id);
        self.updated_date_utc = Some(now);
        Ok(true)
    }

    fn errors(&self) -> Vec<String> {
        self.errors.clone()
    }
}

fn lock_book(book: &Mutex<LedgerBook>) -> MutexGuard<'_, LedgerBook> {
    book.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Write data atomically (write to temp file, then rename)
pub(crate) fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {:?}", parent))?;
    }

    let temp_path = path.with_extension("tmp");

    let mut file = File::create(&temp_path)
        .with_context(|| format!("Failed to create temp file {:?}", temp_path))?;

    file.write_all(data)
        .with_context(|| format!("Failed to write to temp file {:?}", temp_path))?;

    file.sync_all()
        .with_context(|| format!("Failed to sync temp file {:?}", temp_path))?;

    fs::rename(&temp_path, path)
        .with_context(|| format!("Failed to rename {:?} to {:?}", temp_path, path))?;

    Ok(())
}
