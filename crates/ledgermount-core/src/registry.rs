//! Mount registry
//!
//! Each host type carries a [`MountRegistry`] mapping mount names to their
//! [`MountConfig`]. Declaring a mount under an existing name replaces the
//! previous configuration as a whole. Registries are cheap to clone and
//! [`MountRegistry::derive`] gives a subtype its own copy, so declarations on
//! the subtype never leak back into the parent.
//!
//! ## Usage
//!
//! ```ignore
//! let mut registry = MountRegistry::new();
//! registry.declare(
//!     MountConfig::new(
//!         "accounting_contact",
//!         contact_adapter,
//!         "accounting_contact_id",
//!         mapper(|customer: &Customer, _| {
//!             Attributes::from([("given_name".to_string(), customer.first_name.clone().into())])
//!         }),
//!         mapper(|_, remote| {
//!             Attributes::from([("first_name".to_string(), remote.get("given_name").unwrap_or_default())])
//!         }),
//!     )
//!     .with_connection_method("xero_connection"),
//! );
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::remote::{RemoteAdapter, RemoteRecord};
use crate::value::Attributes;

/// Maps a host record and its remote counterpart to attributes
///
/// Used in both directions: outward mappers produce remote fields, inward
/// mappers produce host attributes.
///
/// The remote record is locked while a mapper runs. Read it only through the
/// `remote` argument; locking its [`crate::RecordRef`] again from inside the
/// mapper deadlocks.
pub type Mapper<H> = Arc<dyn Fn(&H, &dyn RemoteRecord) -> Attributes + Send + Sync>;

/// Wrap a closure as a [`Mapper`]
pub fn mapper<H, F>(f: F) -> Mapper<H>
where
    F: Fn(&H, &dyn RemoteRecord) -> Attributes + Send + Sync + 'static,
{
    Arc::new(f)
}

/// How a mount obtains its connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionStrategy {
    /// Ask the host record through [`crate::HostRecord::connection_for`]
    Method(String),
    /// Use the process-wide connection resolver
    Resolver,
}

/// Configuration of one mount on one host type
pub struct MountConfig<H> {
    name: String,
    adapter: Arc<dyn RemoteAdapter>,
    external_id_field: String,
    connection: ConnectionStrategy,
    to_remote: Mapper<H>,
    from_remote: Mapper<H>,
    sync_on_save: bool,
}

impl<H> MountConfig<H> {
    /// Create a mount that resolves its connection through the global resolver
    pub fn new(
        name: impl Into<String>,
        adapter: Arc<dyn RemoteAdapter>,
        external_id_field: impl Into<String>,
        to_remote: Mapper<H>,
        from_remote: Mapper<H>,
    ) -> Self {
        Self {
            name: name.into(),
            adapter,
            external_id_field: external_id_field.into(),
            connection: ConnectionStrategy::Resolver,
            to_remote,
            from_remote,
            sync_on_save: false,
        }
    }

    /// Resolve the connection through a named method on the host
    pub fn with_connection_method(mut self, method: impl Into<String>) -> Self {
        self.connection = ConnectionStrategy::Method(method.into());
        self
    }

    /// Mark the mount for outward sync after host saves
    pub fn with_sync_on_save(mut self, sync_on_save: bool) -> Self {
        self.sync_on_save = sync_on_save;
        self
    }

    /// Mount name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Identifier of the remote type
    pub fn remote_type(&self) -> &str {
        self.adapter.remote_type()
    }

    /// Adapter for the remote type
    pub fn adapter(&self) -> &Arc<dyn RemoteAdapter> {
        &self.adapter
    }

    /// Host attribute holding the remote identifier
    pub fn external_id_field(&self) -> &str {
        &self.external_id_field
    }

    /// Connection strategy
    pub fn connection_strategy(&self) -> &ConnectionStrategy {
        &self.connection
    }

    /// Connection method name, if the mount uses one
    pub fn connection_method(&self) -> Option<&str> {
        match &self.connection {
            ConnectionStrategy::Method(method) => Some(method),
            ConnectionStrategy::Resolver => None,
        }
    }

    /// Whether host saves should trigger an outward sync
    pub fn sync_on_save(&self) -> bool {
        self.sync_on_save
    }

    /// Attributes to push to the remote record
    pub fn map_to_remote(&self, host: &H, remote: &dyn RemoteRecord) -> Attributes {
        (self.to_remote)(host, remote)
    }

    /// Attributes to pull into the host record
    pub fn map_from_remote(&self, host: &H, remote: &dyn RemoteRecord) -> Attributes {
        (self.from_remote)(host, remote)
    }
}

impl<H> fmt::Debug for MountConfig<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MountConfig")
            .field("name", &self.name)
            .field("remote_type", &self.remote_type())
            .field("external_id_field", &self.external_id_field)
            .field("connection", &self.connection)
            .field("sync_on_save", &self.sync_on_save)
            .finish_non_exhaustive()
    }
}

/// Mounts declared on one host type, keyed by name
pub struct MountRegistry<H> {
    mounts: BTreeMap<String, Arc<MountConfig<H>>>,
}

impl<H> MountRegistry<H> {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            mounts: BTreeMap::new(),
        }
    }

    /// Declare a mount, replacing any previous mount with the same name
    ///
    /// Returns the replaced configuration, if any.
    pub fn declare(&mut self, config: MountConfig<H>) -> Option<Arc<MountConfig<H>>> {
        self.mounts.insert(config.name.clone(), Arc::new(config))
    }

    /// Look up a mount by name
    pub fn lookup(&self, name: &str) -> Option<Arc<MountConfig<H>>> {
        self.mounts.get(name).cloned()
    }

    /// Whether a mount is declared
    pub fn contains(&self, name: &str) -> bool {
        self.mounts.contains_key(name)
    }

    /// Derive the registry for a subtype
    ///
    /// The subtype starts with every mount of this registry; later
    /// declarations on either side stay local to that side.
    pub fn derive(&self) -> Self {
        self.clone()
    }

    /// Declared mount names, sorted
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.mounts.keys().map(String::as_str)
    }

    /// Declared mounts, sorted by name
    pub fn iter(&self) -> impl Iterator<Item = &Arc<MountConfig<H>>> {
        self.mounts.values()
    }

    /// Number of declared mounts
    pub fn len(&self) -> usize {
        self.mounts.len()
    }

    /// Whether no mounts are declared
    pub fn is_empty(&self) -> bool {
        self.mounts.is_empty()
    }
}

impl<H> Clone for MountRegistry<H> {
    fn clone(&self) -> Self {
        Self {
            mounts: self.mounts.clone(),
        }
    }
}

impl<H> Default for MountRegistry<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> fmt::Debug for MountRegistry<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.mounts.iter()).finish()
    }
}
