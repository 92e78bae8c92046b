use zenith_core::collections::SmallVec;
use crate::error::Result;
use crate::graph::PassDependencyGraph;
use crate::node::{FramePass, PassHandle};
use crate::resource::{ReadRequest, ResourceHandle, ResourceId};

/// Collects the reads and writes of one pass, then registers it with [`finish`](Self::finish).
///
/// Nothing is resolved until `finish`, so the order of `read` and `write` calls does not matter.
#[must_use]
pub struct PassBuilder<'graph, P: FramePass> {
    graph: &'graph mut PassDependencyGraph<P>,
    pass: P,
    reads: SmallVec<[ReadRequest; 4]>,
    writes: SmallVec<[ResourceId; 4]>,
}

impl<'graph, P: FramePass> PassBuilder<'graph, P> {
    pub(crate) fn new(graph: &'graph mut PassDependencyGraph<P>, pass: P) -> Self {
        Self {
            graph,
            pass,
            reads: SmallVec::new(),
            writes: SmallVec::new(),
        }
    }

    /// Read whatever version of `resource` is current when the pass is registered.
    pub fn read(mut self, resource: ResourceId) -> Self {
        self.reads.push(ReadRequest::Current(resource));
        self
    }

    /// Read exactly `handle`, which may be produced by a pass registered later.
    pub fn read_version(mut self, handle: ResourceHandle) -> Self {
        self.reads.push(ReadRequest::Pinned(handle));
        self
    }

    pub fn write(mut self, resource: ResourceId) -> Self {
        self.writes.push(resource);
        self
    }

    /// Read the current version of `resource` and produce the next one.
    pub fn read_write(self, resource: ResourceId) -> Self {
        self.read(resource).write(resource)
    }

    pub fn finish(self) -> Result<PassHandle> {
        let PassBuilder { graph, pass, reads, writes } = self;
        graph.add_pass_with_requests(reads, writes, pass)
    }
}

#[cfg(test)]
mod tests {
    use crate::node::PassDesc;
    use crate::resource::ResourceKind;
    use crate::version::Version;
    use super::*;

    #[test]
    fn builder_matches_add_pass() {
        let mut graph = PassDependencyGraph::new();
        let depth = graph.declare_resource("depth", ResourceKind::Texture);
        let normal = graph.declare_resource("normal", ResourceKind::Texture);

        let prepass = graph
            .pass_builder(PassDesc::graphics("prepass"))
            .write(depth)
            .finish()
            .unwrap();
        let gbuffer = graph
            .pass_builder(PassDesc::graphics("gbuffer"))
            .write(normal)
            .read_write(depth)
            .finish()
            .unwrap();

        let node = graph.node(gbuffer).unwrap();
        assert_eq!(node.input_version(depth), Some(Version::new(1)));
        assert_eq!(node.output_version(depth), Some(Version::new(2)));
        assert_eq!(node.output_version(normal), Some(Version::new(1)));

        graph.construct_adj_list().unwrap();
        assert!(graph.is_adjacent_to(prepass, gbuffer));
    }

    #[test]
    fn pinned_reads_keep_their_version() {
        let mut graph = PassDependencyGraph::new();
        let history = graph.declare_resource("history", ResourceKind::Texture);

        let first = graph
            .pass_builder(PassDesc::compute("accumulate"))
            .write(history)
            .finish()
            .unwrap();
        graph
            .pass_builder(PassDesc::compute("overwrite"))
            .write(history)
            .finish()
            .unwrap();
        let reader = graph
            .pass_builder(PassDesc::compute("reproject"))
            .read_version(ResourceHandle::new(history, Version::new(1)))
            .finish()
            .unwrap();

        assert_eq!(graph.node(reader).unwrap().input_version(history), Some(Version::new(1)));

        graph.construct_adj_list().unwrap();
        assert!(graph.is_adjacent_to(first, reader));
        assert_eq!(graph.dependency_graph().edge_count(), 1);
    }
}
