//! Connection resolution
//!
//! A mount finds its connection in one of two places, in this order:
//!
//! 1. The named connection method on the host, when the mount declares one
//! 2. The process-wide connection resolver, when one is installed
//!
//! Anything else yields no connection, and the mount operation becomes a
//! no-op. A mount with a connection method never falls through to the global
//! resolver, even when the method yields nothing.

use std::sync::{Arc, PoisonError, RwLock};

use tracing::trace;

use crate::host::HostRecord;
use crate::registry::{ConnectionStrategy, MountConfig};
use crate::remote::ConnectionRef;

/// Process-wide resolver: `(host, mount name) -> connection`
pub type ConnectionResolver = Arc<dyn Fn(&dyn HostRecord, &str) -> Option<ConnectionRef> + Send + Sync>;

static RESOLVER: RwLock<Option<ConnectionResolver>> = RwLock::new(None);

/// Install the process-wide connection resolver, replacing any previous one
pub fn set_connection_resolver<F>(resolver: F)
where
    F: Fn(&dyn HostRecord, &str) -> Option<ConnectionRef> + Send + Sync + 'static,
{
    let mut slot = RESOLVER.write().unwrap_or_else(PoisonError::into_inner);
    *slot = Some(Arc::new(resolver));
}

/// Remove the process-wide connection resolver
pub fn clear_connection_resolver() {
    let mut slot = RESOLVER.write().unwrap_or_else(PoisonError::into_inner);
    *slot = None;
}

/// The currently installed resolver, if any
pub fn connection_resolver() -> Option<ConnectionResolver> {
    RESOLVER
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

/// Resolve the connection for one mount on one host record
pub fn resolve<H: HostRecord>(host: &H, config: &MountConfig<H>) -> Option<ConnectionRef> {
    let connection = match config.connection_strategy() {
        ConnectionStrategy::Method(method) => host.connection_for(method),
        ConnectionStrategy::Resolver => {
            // Clone out of the lock so the resolver may itself touch the slot.
            let resolver = connection_resolver()?;
            resolver(host as &dyn HostRecord, config.name())
        }
    };

    trace!(
        mount = config.name(),
        host = host.record_type(),
        resolved = connection.is_some(),
        "Resolved mount connection"
    );
    connection
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::{Mutex, MutexGuard};

    use super::clear_connection_resolver;

    static RESOLVER_MUTEX: Mutex<()> = Mutex::new(());

    /// Serializes tests touching the global resolver and clears it on drop
    pub(crate) struct ResolverGuard<'a> {
        _lock: MutexGuard<'a, ()>,
    }

    impl ResolverGuard<'_> {
        pub(crate) fn new() -> Self {
            let lock = RESOLVER_MUTEX
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            clear_connection_resolver();
            Self { _lock: lock }
        }
    }

    impl Drop for ResolverGuard<'_> {
        fn drop(&mut self) {
            clear_connection_resolver();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::any::Any;
    use std::sync::Arc;

    use super::test_support::ResolverGuard;
    use super::*;
    use crate::cache::MountCache;
    use crate::error::BoxError;
    use crate::registry::mapper;
    use crate::remote::{Connection, RecordRef, RemoteAdapter};
    use crate::value::{Attributes, FieldValue};

    #[derive(Debug)]
    struct NamedConnection(&'static str);

    impl Connection for NamedConnection {
        fn provider(&self) -> &str {
            self.0
        }
        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    struct Host {
        connection: Option<ConnectionRef>,
        cache: MountCache,
    }

    impl HostRecord for Host {
        fn attribute(&self, _field: &str) -> Option<FieldValue> {
            None
        }
        fn write_attribute(&mut self, _field: &str, _value: FieldValue) -> Result<(), BoxError> {
            Ok(())
        }
        fn save(&mut self) -> Result<(), BoxError> {
            Ok(())
        }
        fn connection_for(&self, method: &str) -> Option<ConnectionRef> {
            if method == "xero_connection" {
                self.connection.clone()
            } else {
                None
            }
        }
        fn mount_cache(&self) -> &MountCache {
            &self.cache
        }
        fn mount_cache_mut(&mut self) -> &mut MountCache {
            &mut self.cache
        }
    }

    struct NullAdapter;

    impl RemoteAdapter for NullAdapter {
        fn remote_type(&self) -> &str {
            "xero.contact"
        }
        fn fetch_by_id(&self, _id: &str, _c: &ConnectionRef) -> Result<Option<RecordRef>, BoxError> {
            Ok(None)
        }
        fn create(&self, _c: &ConnectionRef) -> Result<RecordRef, BoxError> {
            Err("unsupported".into())
        }
    }

    fn config() -> MountConfig<Host> {
        MountConfig::new(
            "accounting_contact",
            Arc::new(NullAdapter),
            "accounting_contact_id",
            mapper(|_, _| Attributes::new()),
            mapper(|_, _| Attributes::new()),
        )
    }

    fn host(connection: Option<ConnectionRef>) -> Host {
        Host {
            connection,
            cache: MountCache::new(),
        }
    }

    #[test]
    fn test_method_strategy_uses_host() {
        let _guard = ResolverGuard::new();
        let host = host(Some(Arc::new(NamedConnection("method"))));
        let config = config().with_connection_method("xero_connection");

        let connection = resolve(&host, &config).unwrap();
        assert_eq!(connection.provider(), "method");
    }

    #[test]
    fn test_method_strategy_wins_over_resolver() {
        let _guard = ResolverGuard::new();
        set_connection_resolver(|_, _| Some(Arc::new(NamedConnection("global")) as ConnectionRef));

        let with_method = host(Some(Arc::new(NamedConnection("method"))));
        let config = config().with_connection_method("xero_connection");
        assert_eq!(resolve(&with_method, &config).unwrap().provider(), "method");

        // A method yielding nothing does not fall back to the resolver
        let without = host(None);
        assert!(resolve(&without, &config).is_none());
    }

    #[test]
    fn test_resolver_receives_mount_name() {
        let _guard = ResolverGuard::new();
        set_connection_resolver(|_, mount| {
            if mount == "accounting_contact" {
                Some(Arc::new(NamedConnection("global")) as ConnectionRef)
            } else {
                None
            }
        });

        let host = host(None);
        assert_eq!(resolve(&host, &config()).unwrap().provider(), "global");
    }

    #[test]
    fn test_no_strategy_no_resolver() {
        let _guard = ResolverGuard::new();
        let host = host(Some(Arc::new(NamedConnection("method"))));

        assert!(connection_resolver().is_none());
        assert!(resolve(&host, &config()).is_none());
    }
}
