use derive_more::Display;
use zenith_core::collections::SmallVec;
use crate::resource::{ResourceHandle, ResourceId};
use crate::version::Version;

/// Handle to a pass registered in a [`PassDependencyGraph`](crate::PassDependencyGraph).
///
/// Only valid within the graph that created it, and only until that graph is reset.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[display("pass#{_0}")]
pub struct PassHandle(u32);

impl PassHandle {
    #[inline]
    pub(crate) fn new(index: u32) -> Self {
        Self(index)
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Which kind of queue a pass wants. Executors dispatch on this instead of on pass types.
#[derive(Debug, Display, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PassKind {
    #[default]
    Graphics,
    Compute,
    Transfer,
}

/// A caller-owned unit of work. The scheduler only uses it for naming and dispatch.
pub trait FramePass {
    fn name(&self) -> &str;

    fn kind(&self) -> PassKind {
        PassKind::Graphics
    }
}

impl<T: FramePass + ?Sized> FramePass for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn kind(&self) -> PassKind {
        (**self).kind()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassDesc {
    name: String,
    kind: PassKind,
}

impl PassDesc {
    pub fn new(name: impl Into<String>, kind: PassKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    pub fn graphics(name: impl Into<String>) -> Self {
        Self::new(name, PassKind::Graphics)
    }

    pub fn compute(name: impl Into<String>) -> Self {
        Self::new(name, PassKind::Compute)
    }

    pub fn transfer(name: impl Into<String>) -> Self {
        Self::new(name, PassKind::Transfer)
    }
}

impl FramePass for PassDesc {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> PassKind {
        self.kind
    }
}

pub type ResourceHandles = SmallVec<[ResourceHandle; 4]>;

pub struct PassNode<P> {
    pub(crate) inputs: ResourceHandles,
    pub(crate) outputs: ResourceHandles,
    pub(crate) pass: P,
}

impl<P: FramePass> PassNode<P> {
    pub fn name(&self) -> &str {
        self.pass.name()
    }

    pub fn kind(&self) -> PassKind {
        self.pass.kind()
    }

    pub fn pass(&self) -> &P {
        &self.pass
    }

    /// Inputs, each pinned to the version it reads. One resource may appear at several versions.
    pub fn inputs(&self) -> &[ResourceHandle] {
        &self.inputs
    }

    /// Outputs, each carrying the version this pass produces.
    pub fn outputs(&self) -> &[ResourceHandle] {
        &self.outputs
    }

    pub fn reads(&self, resource: ResourceId) -> bool {
        self.input_version(resource).is_some()
    }

    pub fn writes(&self, resource: ResourceId) -> bool {
        self.output_version(resource).is_some()
    }

    /// First version of `resource` this pass reads. See [`input_versions`](Self::input_versions)
    /// for passes reading several versions of one resource.
    pub fn input_version(&self, resource: ResourceId) -> Option<Version> {
        self.input_versions(resource).next()
    }

    pub fn input_versions(&self, resource: ResourceId) -> impl Iterator<Item = Version> + '_ {
        self.inputs
            .iter()
            .filter(move |handle| handle.id() == resource)
            .map(ResourceHandle::version)
    }

    pub fn output_version(&self, resource: ResourceId) -> Option<Version> {
        self.outputs
            .iter()
            .find(|handle| handle.id() == resource)
            .map(ResourceHandle::version)
    }
}

impl<P: FramePass> std::fmt::Debug for PassNode<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PassNode")
            .field("name", &self.name())
            .field("kind", &self.kind())
            .field("inputs", &self.inputs)
            .field("outputs", &self.outputs)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use zenith_core::collections::smallvec;
    use super::*;

    #[test]
    fn pass_desc_kinds() {
        assert_eq!(PassDesc::graphics("gbuffer").kind(), PassKind::Graphics);
        assert_eq!(PassDesc::compute("light_culling").kind(), PassKind::Compute);
        assert_eq!(PassDesc::transfer("upload").kind(), PassKind::Transfer);
        assert_eq!(PassDesc::transfer("upload").name(), "upload");
    }

    #[test]
    fn boxed_passes_forward() {
        let pass: Box<dyn FramePass> = Box::new(PassDesc::compute("bloom"));
        assert_eq!(pass.name(), "bloom");
        assert_eq!(pass.kind(), PassKind::Compute);
    }

    #[test]
    fn node_versions() {
        let hdr = ResourceId(0);
        let depth = ResourceId(1);
        let node = PassNode {
            inputs: smallvec![ResourceHandle::new(hdr, Version::new(1))],
            outputs: smallvec![ResourceHandle::new(hdr, Version::new(2))],
            pass: PassDesc::graphics("tonemap"),
        };

        assert!(node.reads(hdr));
        assert!(node.writes(hdr));
        assert!(!node.reads(depth));
        assert_eq!(node.input_version(hdr), Some(Version::new(1)));
        assert_eq!(node.output_version(hdr), Some(Version::new(2)));
        assert_eq!(PassHandle::new(3).to_string(), "pass#3");
    }
}
