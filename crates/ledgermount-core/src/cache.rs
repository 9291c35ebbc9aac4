//! Per-instance mount cache
//!
//! Each host record owns one [`MountCache`]. For every mount name it tracks
//! whether the remote counterpart has never been looked at, was loaded, or is
//! known to be absent. The cache is process memory only and is never
//! persisted.

use std::collections::HashMap;

use crate::remote::RecordRef;

/// Load state of a single mount on a single host record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountState {
    /// Nothing fetched or assigned yet
    Unloaded,
    /// A remote record is cached
    LoadedPresent,
    /// Loaded, and there is no remote record
    LoadedAbsent,
}

#[derive(Debug, Clone)]
enum CacheEntry {
    Present(RecordRef),
    Absent,
}

/// Mount name to cached remote record
#[derive(Debug, Default, Clone)]
pub struct MountCache {
    entries: HashMap<String, CacheEntry>,
}

impl MountCache {
    /// Create an empty cache (every mount unloaded)
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state of a mount
    pub fn state(&self, mount: &str) -> MountState {
        match self.entries.get(mount) {
            None => MountState::Unloaded,
            Some(CacheEntry::Present(_)) => MountState::LoadedPresent,
            Some(CacheEntry::Absent) => MountState::LoadedAbsent,
        }
    }

    /// The cached record, only when one is loaded and present
    pub fn cached(&self, mount: &str) -> Option<RecordRef> {
        match self.entries.get(mount) {
            Some(CacheEntry::Present(record)) => Some(record.clone()),
            _ => None,
        }
    }

    /// Store a load result; `None` records the mount as known absent
    pub fn store(&mut self, mount: &str, record: Option<RecordRef>) {
        let entry = match record {
            Some(record) => CacheEntry::Present(record),
            None => CacheEntry::Absent,
        };
        self.entries.insert(mount.to_string(), entry);
    }

    /// Mark a mount as known absent
    pub fn clear(&mut self, mount: &str) {
        self.store(mount, None);
    }

    /// Number of mounts with a load result
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no mount has been loaded
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BoxError;
    use crate::remote::RemoteRecord;
    use crate::value::FieldValue;

    #[derive(Debug)]
    struct Fixed;

    impl RemoteRecord for Fixed {
        fn id(&self) -> Option<String> {
            Some("7".to_string())
        }
        fn get(&self, _field: &str) -> Option<FieldValue> {
            None
        }
        fn has_writer(&self, _field: &str) -> bool {
            false
        }
        fn set(&mut self, _field: &str, _value: FieldValue) -> Result<(), BoxError> {
            Ok(())
        }
        fn save(&mut self) -> Result<bool, BoxError> {
            Ok(true)
        }
    }

    #[test]
    fn test_new_cache_is_unloaded() {
        let cache = MountCache::new();
        assert!(cache.is_empty());
        assert_eq!(cache.state("contact"), MountState::Unloaded);
        assert!(cache.cached("contact").is_none());
    }

    #[test]
    fn test_store_present_and_absent() {
        let mut cache = MountCache::new();
        let record = RecordRef::new(Fixed);

        cache.store("contact", Some(record.clone()));
        assert_eq!(cache.state("contact"), MountState::LoadedPresent);
        assert!(cache.cached("contact").unwrap().ptr_eq(&record));

        cache.store("invoice", None);
        assert_eq!(cache.state("invoice"), MountState::LoadedAbsent);
        assert!(cache.cached("invoice").is_none());
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_clear_marks_absent() {
        let mut cache = MountCache::new();
        cache.store("contact", Some(RecordRef::new(Fixed)));

        cache.clear("contact");
        assert_eq!(cache.state("contact"), MountState::LoadedAbsent);
    }
}
