//! Mappers built from rename tables
//!
//! Most mounts only copy values across under different names. These helpers
//! turn a table of names into a [`Mapper`] without writing a closure.

use std::collections::BTreeMap;

use crate::host::HostRecord;
use crate::registry::{mapper, Mapper};
use crate::remote::RemoteRecord;
use crate::value::{Attributes, FieldValue};

/// Outward mapper: remote field <- host attribute
///
/// Host attributes that are missing map to `Null`.
pub fn field_map_to_remote<H: HostRecord + 'static>(pairs: BTreeMap<String, String>) -> Mapper<H> {
    mapper(move |host: &H, _remote: &dyn RemoteRecord| {
        pairs
            .iter()
            .map(|(remote_field, host_field)| {
                let value = host.attribute(host_field).unwrap_or(FieldValue::Null);
                (remote_field.clone(), value)
            })
            .collect::<Attributes>()
    })
}

/// Inward mapper: host attribute <- remote field
///
/// Remote fields that are missing map to `Null`.
pub fn field_map_from_remote<H: HostRecord + 'static>(pairs: BTreeMap<String, String>) -> Mapper<H> {
    mapper(move |_host: &H, remote: &dyn RemoteRecord| {
        pairs
            .iter()
            .map(|(host_field, remote_field)| {
                let value = remote.get(remote_field).unwrap_or(FieldValue::Null);
                (host_field.clone(), value)
            })
            .collect::<Attributes>()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MountCache;
    use crate::error::BoxError;

    struct Host {
        attrs: Attributes,
        cache: MountCache,
    }

    impl HostRecord for Host {
        fn attribute(&self, field: &str) -> Option<FieldValue> {
            self.attrs.get(field).cloned()
        }
        fn write_attribute(&mut self, field: &str, value: FieldValue) -> Result<(), BoxError> {
            self.attrs.insert(field.to_string(), value);
            Ok(())
        }
        fn save(&mut self) -> Result<(), BoxError> {
            Ok(())
        }
        fn mount_cache(&self) -> &MountCache {
            &self.cache
        }
        fn mount_cache_mut(&mut self) -> &mut MountCache {
            &mut self.cache
        }
    }

    #[derive(Debug)]
    struct Remote(Attributes);

    impl RemoteRecord for Remote {
        fn id(&self) -> Option<String> {
            None
        }
        fn get(&self, field: &str) -> Option<FieldValue> {
            self.0.get(field).cloned()
        }
        fn has_writer(&self, _field: &str) -> bool {
            true
        }
        fn set(&mut self, field: &str, value: FieldValue) -> Result<(), BoxError> {
            self.0.insert(field.to_string(), value);
            Ok(())
        }
        fn save(&mut self) -> Result<bool, BoxError> {
            Ok(true)
        }
    }

    fn table(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(a, b)| (a.to_string(), b.to_string()))
            .collect()
    }

    #[test]
    fn test_to_remote_reads_host_attributes() {
        let mut attrs = Attributes::new();
        attrs.insert("first_name".to_string(), "Jane".into());
        let host = Host {
            attrs,
            cache: MountCache::new(),
        };

        let map = field_map_to_remote::<Host>(table(&[
            ("given_name", "first_name"),
            ("family_name", "last_name"),
        ]));
        let remote = Remote(Attributes::new());
        let out = map(&host, &remote as &dyn RemoteRecord);

        assert_eq!(out.get("given_name"), Some(&FieldValue::from("Jane")));
        assert_eq!(out.get("family_name"), Some(&FieldValue::Null));
    }

    #[test]
    fn test_from_remote_reads_remote_fields() {
        let host = Host {
            attrs: Attributes::new(),
            cache: MountCache::new(),
        };
        let mut remote = Attributes::new();
        remote.insert("EmailAddress".to_string(), "jane@example.com".into());

        let map = field_map_from_remote::<Host>(table(&[("email", "EmailAddress")]));
        let remote = Remote(remote);
        let out = map(&host, &remote as &dyn RemoteRecord);

        assert_eq!(out.len(), 1);
        assert_eq!(out.get("email"), Some(&FieldValue::from("jane@example.com")));
    }
}
