//! Mount error handling
//!
//! The mount runtime treats "not wired up" conditions (undeclared mount,
//! missing external id, unresolvable connection) as silent no-ops, so they
//! never show up here. What does show up is whatever the remote adapter or
//! the host record raised, passed through without rewording.

use thiserror::Error;

/// Boxed error raised by adapters and host records
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur during mount operations
#[derive(Error, Debug)]
pub enum MountError {
    /// Remote adapter failed to fetch, create, write or save a record
    #[error(transparent)]
    Remote(BoxError),

    /// Host record failed to write an attribute or persist itself
    #[error(transparent)]
    Host(BoxError),

    /// Declarative mount references a remote type with no registered adapter
    #[error("Unknown remote type '{0}'. Register an adapter for it before declaring the mount.")]
    UnknownRemoteType(String),
}

impl MountError {
    /// Check if the error came from the remote side
    pub fn is_remote(&self) -> bool {
        matches!(self, MountError::Remote(_))
    }

    /// Check if the error came from the host record
    pub fn is_host(&self) -> bool {
        matches!(self, MountError::Host(_))
    }
}

/// Result type for mount operations
pub type Result<T> = std::result::Result<T, MountError>;
