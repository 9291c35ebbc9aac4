//! Host side of a mount
//!
//! A host record is a record in the consuming application (a customer row, an
//! invoice row) that owns zero or more mounts. The core needs very little from
//! it: generic attribute access, its own save, an optional named connection
//! lookup, and a place to keep the mount cache.

use crate::cache::MountCache;
use crate::error::BoxError;
use crate::registry::MountRegistry;
use crate::remote::ConnectionRef;
use crate::value::{Attributes, FieldValue};

/// Capabilities the mount runtime needs from a host record
///
/// Object safe, so the global connection resolver can receive any host as
/// `&dyn HostRecord`.
pub trait HostRecord {
    /// Read an attribute by name
    fn attribute(&self, field: &str) -> Option<FieldValue>;

    /// Write an attribute by name
    fn write_attribute(&mut self, field: &str, value: FieldValue) -> Result<(), BoxError>;

    /// Assign several attributes at once
    fn assign_attributes(&mut self, attributes: Attributes) -> Result<(), BoxError> {
        for (field, value) in attributes {
            self.write_attribute(&field, value)?;
        }
        Ok(())
    }

    /// Persist the host record
    fn save(&mut self) -> Result<(), BoxError>;

    /// Resolve a connection through a named per-mount strategy
    ///
    /// Hosts that declare mounts with a connection method answer here for
    /// that method name. Unknown names yield `None`.
    fn connection_for(&self, _method: &str) -> Option<ConnectionRef> {
        None
    }

    /// The mount cache owned by this record
    fn mount_cache(&self) -> &MountCache;

    /// Mutable access to the mount cache
    fn mount_cache_mut(&mut self) -> &mut MountCache;

    /// Name of the host type, used in diagnostics
    fn record_type(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// A host type that declares mounts
pub trait Mountable: HostRecord + Sized {
    /// Mounts declared for this host type
    fn mount_registry(&self) -> &MountRegistry<Self>;
}
