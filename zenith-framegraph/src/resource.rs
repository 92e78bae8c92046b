use derive_more::{Display, From};
use crate::version::Version;

/// Identifier of a logical resource declared in a frame graph.
///
/// ## Safety
/// Only meaningful inside the graph that issued it. Should NOT be used across multiple frame graphs.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[display("#{_0}")]
pub struct ResourceId(pub(crate) u32);

impl ResourceId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Texture,
    Buffer,
    /// Owned outside the graph, e.g. a swapchain image.
    External,
}

/// A resource pinned to one of its versions. Equal only if both parts are equal.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
#[display("{id}@{version}")]
pub struct ResourceHandle {
    id: ResourceId,
    version: Version,
}

impl ResourceHandle {
    #[inline]
    pub fn new(id: ResourceId, version: Version) -> Self {
        Self { id, version }
    }

    #[inline]
    pub fn id(&self) -> ResourceId {
        self.id
    }

    #[inline]
    pub fn version(&self) -> Version {
        self.version
    }
}

/// How a pass asks for one of its inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, From)]
pub enum ReadRequest {
    /// Whatever version is current when the pass is registered.
    Current(ResourceId),
    /// An explicit version, possibly one produced later in the frame.
    Pinned(ResourceHandle),
}

impl ReadRequest {
    #[inline]
    pub fn resource(&self) -> ResourceId {
        match self {
            ReadRequest::Current(id) => *id,
            ReadRequest::Pinned(handle) => handle.id(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResourceEntry {
    name: String,
    kind: ResourceKind,
}

impl ResourceEntry {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }
}

/// Arena of the resources declared for one frame.
#[derive(Debug, Default, Clone)]
pub struct ResourceRegistry {
    entries: Vec<ResourceEntry>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn declare(&mut self, name: &str, kind: ResourceKind) -> ResourceId {
        let id = ResourceId(self.entries.len() as u32);
        self.entries.push(ResourceEntry {
            name: name.to_owned(),
            kind,
        });
        id
    }

    #[inline]
    pub fn get(&self, id: ResourceId) -> Option<&ResourceEntry> {
        self.entries.get(id.index())
    }

    #[inline]
    pub fn contains(&self, id: ResourceId) -> bool {
        id.index() < self.entries.len()
    }

    pub fn name(&self, id: ResourceId) -> &str {
        self.get(id)
            .map(ResourceEntry::name)
            .unwrap_or("<undeclared>")
    }

    pub fn iter(&self) -> impl Iterator<Item = (ResourceId, &ResourceEntry)> {
        self.entries
            .iter()
            .enumerate()
            .map(|(index, entry)| (ResourceId(index as u32), entry))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
