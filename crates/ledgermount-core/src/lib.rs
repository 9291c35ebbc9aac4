//! LedgerMount Core Library
//!
//! This crate binds records in a host application to records in an
//! accounting service. A host type declares named mounts; each mount pairs
//! the host with one remote record type, keeps the remote id in a host
//! attribute, and moves attributes in either direction.
//!
//! # Architecture
//!
//! - **Registry**: per host type, mount name -> [`MountConfig`]
//! - **Connection resolution**: a host connection method, else the
//!   process-wide resolver
//! - **Runtime**: [`MountExt`] get / set / sync_to / sync_from over any
//!   [`Mountable`] host, with a per-record [`MountCache`]
//! - **Adapters**: [`RemoteAdapter`] implementations, one per remote type
//!
//! # Quick Start
//!
//! ```text
//! let mut registry = MountRegistry::new();
//! registry.declare(
//!     MountConfig::new("accounting_contact", adapter, "accounting_contact_id", to, from)
//!         .with_connection_method("xero_connection"),
//! );
//!
//! customer.sync_to("accounting_contact")?;
//! let contact = customer.mount_get("accounting_contact", false)?;
//! ```
//!
//! # Modules
//!
//! - `mount`: Mount operations (main entry point)
//! - `registry`: Mount configuration and per-host-type registries
//! - `connection`: Connection resolution and the global resolver
//! - `cache`: Per-record mount cache
//! - `declare`: Mounts declared in configuration
//! - `ledger`: File-backed reference ledger
//! - `document`: Generic attribute-map host records
//! - `config`: Application configuration

pub mod cache;
pub mod config;
pub mod connection;
pub mod declare;
pub mod document;
pub mod error;
pub mod fieldmap;
pub mod host;
pub mod ledger;
pub mod mount;
pub mod registry;
pub mod remote;
pub mod value;

pub use cache::{MountCache, MountState};
pub use config::Config;
pub use connection::{clear_connection_resolver, set_connection_resolver, ConnectionResolver};
pub use declare::{build_registries, MountDeclaration};
pub use document::{DocumentRecord, DocumentStore};
pub use error::{BoxError, MountError, Result};
pub use fieldmap::{field_map_from_remote, field_map_to_remote};
pub use host::{HostRecord, Mountable};
pub use ledger::{ledger_adapters, LedgerBook, LedgerConnection, LedgerRecord, RecordSchema, SchemaAdapter};
pub use mount::{MountExt, SyncOutcome};
pub use registry::{mapper, ConnectionStrategy, Mapper, MountConfig, MountRegistry};
pub use remote::{AdapterRegistry, Connection, ConnectionRef, RecordRef, RemoteAdapter, RemoteRecord};
pub use value::{Attributes, FieldValue};
