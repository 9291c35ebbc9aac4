//! Remote side of a mount
//!
//! The core never talks to an accounting service itself. It goes through
//! three capabilities supplied by adapters:
//!
//! - [`Connection`]: an authenticated handle, opaque to the core
//! - [`RemoteAdapter`]: per remote type, fetches by id and creates new records
//! - [`RemoteRecord`]: the in-memory remote entity with a closed set of
//!   writable fields and a `save` that reports success or failure

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::BoxError;
use crate::value::FieldValue;

/// Authenticated handle for remote operations
///
/// Adapters downcast through [`Connection::as_any`] to their concrete
/// connection type and yield nothing when handed a foreign one.
pub trait Connection: Send + Sync + fmt::Debug {
    /// Name of the service this connection talks to (e.g. "xero")
    fn provider(&self) -> &str;

    /// Access the concrete connection for downcasting
    fn as_any(&self) -> &dyn Any;
}

/// Shared connection handle
pub type ConnectionRef = Arc<dyn Connection>;

/// In-memory representation of an external accounting entity
pub trait RemoteRecord: Send + fmt::Debug {
    /// Remote identifier, if the record has been persisted
    fn id(&self) -> Option<String>;

    /// Read a field
    fn get(&self, field: &str) -> Option<FieldValue>;

    /// Whether the record exposes a writer for `field`
    fn has_writer(&self, field: &str) -> bool;

    /// Write a field; only called when [`RemoteRecord::has_writer`] is true
    fn set(&mut self, field: &str, value: FieldValue) -> Result<(), BoxError>;

    /// Persist the record remotely
    ///
    /// `Ok(false)` means the service rejected the record; [`RemoteRecord::errors`]
    /// should explain why. `Err` is reserved for transport-level failures.
    fn save(&mut self) -> Result<bool, BoxError>;

    /// Validation messages from the last failed save
    fn errors(&self) -> Vec<String> {
        Vec::new()
    }
}

/// Shared handle to a remote record
///
/// The mount cache hands out clones of the same handle, so a record returned
/// by a getter and later updated by an outward sync is one object.
#[derive(Clone)]
pub struct RecordRef(Arc<Mutex<dyn RemoteRecord>>);

impl RecordRef {
    /// Wrap a remote record
    pub fn new<R: RemoteRecord + 'static>(record: R) -> Self {
        Self(Arc::new(Mutex::new(record)))
    }

    /// Lock the record for reading or writing
    pub fn lock(&self) -> MutexGuard<'_, dyn RemoteRecord + 'static> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Remote identifier of the record
    pub fn id(&self) -> Option<String> {
        self.lock().id()
    }

    /// Read a single field
    pub fn get(&self, field: &str) -> Option<FieldValue> {
        self.lock().get(field)
    }

    /// Check whether two handles point at the same record
    pub fn ptr_eq(&self, other: &RecordRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for RecordRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.try_lock() {
            Ok(record) => f.debug_tuple("RecordRef").field(&&*record).finish(),
            Err(_) => f.write_str("RecordRef(<locked>)"),
        }
    }
}

/// Per remote type operations
pub trait RemoteAdapter: Send + Sync {
    /// Identifier of the remote type this adapter serves (e.g. "xero.contact")
    fn remote_type(&self) -> &str;

    /// Fetch a record by id; `Ok(None)` when it does not exist
    fn fetch_by_id(&self, id: &str, connection: &ConnectionRef) -> Result<Option<RecordRef>, BoxError>;

    /// Build a new, unsaved record bound to `connection`
    fn create(&self, connection: &ConnectionRef) -> Result<RecordRef, BoxError>;
}

impl fmt::Debug for dyn RemoteAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RemoteAdapter({})", self.remote_type())
    }
}

/// Adapters keyed by remote type
///
/// Used to resolve declarative mounts, which name their remote type as a string.
#[derive(Default, Clone)]
pub struct AdapterRegistry {
    adapters: HashMap<String, Arc<dyn RemoteAdapter>>,
}

impl AdapterRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an adapter under its own remote type, replacing any previous one
    pub fn register(&mut self, adapter: Arc<dyn RemoteAdapter>) {
        self.adapters
            .insert(adapter.remote_type().to_string(), adapter);
    }

    /// Look up an adapter by remote type
    pub fn get(&self, remote_type: &str) -> Option<Arc<dyn RemoteAdapter>> {
        self.adapters.get(remote_type).cloned()
    }

    /// Registered remote types, sorted
    pub fn remote_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.adapters.keys().map(String::as_str).collect();
        types.sort_unstable();
        types
    }

    /// Number of registered adapters
    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    /// Whether no adapters are registered
    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}
