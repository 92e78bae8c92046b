use std::hash::Hash;
use derive_more::{Display, From, Into};
use zenith_core::collections::hashmap::HashMap;
use crate::resource::{ResourceHandle, ResourceId};

/// Tag of one state of a logical resource.
///
/// Every resource starts at [`Version::INITIAL`], meaning nothing inside the graph has
/// written it yet. Each write produces the next version.
#[derive(Debug, Display, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, From, Into)]
#[display("v{_0}")]
pub struct Version(u32);

impl Version {
    pub const INITIAL: Version = Version(0);

    #[inline]
    pub const fn new(version: u32) -> Self {
        Self(version)
    }

    #[inline]
    pub const fn get(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn is_initial(self) -> bool {
        self.0 == 0
    }

    #[inline]
    fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

/// Source of truth for the version each resource is at right now.
#[derive(Debug, Clone)]
pub struct ResourceVersionTracker<K = ResourceId> {
    versions: HashMap<K, Version>,
}

impl<K: Copy + Eq + Hash> Default for ResourceVersionTracker<K> {
    fn default() -> Self {
        Self {
            versions: HashMap::default(),
        }
    }
}

impl<K: Copy + Eq + Hash> ResourceVersionTracker<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance `resource` to its next version and return it.
    pub fn record_write(&mut self, resource: K) -> Version {
        let version = self.versions.entry(resource).or_insert(Version::INITIAL);
        *version = version.next();
        *version
    }

    /// Version last produced by [`record_write`](Self::record_write), or
    /// [`Version::INITIAL`] if the resource was never written.
    pub fn current_version(&self, resource: K) -> Version {
        self.versions
            .get(&resource)
            .copied()
            .unwrap_or(Version::INITIAL)
    }

    /// Whether some write produced exactly `version` of `resource`.
    pub fn is_produced(&self, resource: K, version: Version) -> bool {
        !version.is_initial() && version <= self.current_version(resource)
    }

    /// Number of distinct resources written at least once.
    pub fn written_count(&self) -> usize {
        self.versions.len()
    }

    pub fn clear(&mut self) {
        self.versions.clear();
    }
}

impl ResourceVersionTracker<ResourceId> {
    #[inline]
    pub fn producer_exists(&self, handle: ResourceHandle) -> bool {
        self.is_produced(handle.id(), handle.version())
    }
}
