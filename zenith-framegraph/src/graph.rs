use log::{debug, error, log_enabled, warn, Level};
use zenith_core::collections::SmallVec;
use crate::builder::PassBuilder;
use crate::config::FrameGraphConfig;
use crate::dag::{DependencyGraph, ExecutionLevel};
use crate::error::{FrameGraphError, Result};
use crate::node::{FramePass, PassHandle, PassNode, ResourceHandles};
use crate::resource::{ReadRequest, ResourceHandle, ResourceId, ResourceKind, ResourceRegistry};
use crate::schedule::FrameSchedule;
use crate::version::ResourceVersionTracker;

/// Lifecycle of a [`PassDependencyGraph`] within one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphState {
    Building,
    Linked,
    Scheduled,
    /// Linking failed. Only [`PassDependencyGraph::reset`] brings the graph back.
    Poisoned,
}

/// Turns "pass reads R, writes W" registrations into a dependency graph of passes.
///
/// Built from scratch every frame:
///
/// ```
/// use zenith_framegraph::{PassDependencyGraph, PassDesc, ResourceKind};
///
/// let mut graph = PassDependencyGraph::new();
/// let gbuffer = graph.declare_resource("gbuffer", ResourceKind::Texture);
/// let hdr = graph.declare_resource("hdr", ResourceKind::Texture);
///
/// let geometry = graph.add_pass([], [gbuffer], PassDesc::graphics("geometry")).unwrap();
/// let lighting = graph.add_pass([gbuffer], [hdr], PassDesc::compute("lighting")).unwrap();
///
/// graph.construct_adj_list().unwrap();
/// assert_eq!(graph.topological_sort(), vec![geometry, lighting]);
/// assert!(graph.is_adjacent_to(geometry, lighting));
/// ```
pub struct PassDependencyGraph<P> {
    config: FrameGraphConfig,
    resources: ResourceRegistry,
    versions: ResourceVersionTracker,
    nodes: Vec<PassNode<P>>,
    graph: DependencyGraph<PassHandle>,
    state: GraphState,
}

impl<P: FramePass> Default for PassDependencyGraph<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: FramePass> PassDependencyGraph<P> {
    pub fn new() -> Self {
        Self::with_config(FrameGraphConfig::default())
    }

    pub fn with_config(config: FrameGraphConfig) -> Self {
        Self {
            graph: DependencyGraph::with_cycle_check(config.cycle_check),
            config,
            resources: ResourceRegistry::new(),
            versions: ResourceVersionTracker::new(),
            nodes: Vec::new(),
            state: GraphState::Building,
        }
    }

    #[inline]
    pub fn config(&self) -> &FrameGraphConfig {
        &self.config
    }

    #[inline]
    pub fn state(&self) -> GraphState {
        self.state
    }

    #[must_use]
    #[track_caller]
    pub fn declare_resource(&mut self, name: &str, kind: ResourceKind) -> ResourceId {
        self.assert_building("declare_resource");
        self.resources.declare(name, kind)
    }

    #[must_use]
    #[track_caller]
    pub fn pass_builder(&mut self, pass: P) -> PassBuilder<'_, P> {
        self.assert_building("pass_builder");
        PassBuilder::new(self, pass)
    }

    /// Register a pass reading the current version of every `inputs` entry and producing a
    /// new version of every `outputs` entry.
    ///
    /// Inputs are resolved before the outputs are recorded, so a pass that reads and
    /// writes the same resource depends on the previous writer, never on itself.
    #[track_caller]
    pub fn add_pass<I, O>(&mut self, inputs: I, outputs: O, pass: P) -> Result<PassHandle>
    where
        I: IntoIterator<Item = ResourceId>,
        O: IntoIterator<Item = ResourceId>,
    {
        self.add_pass_with_requests(inputs.into_iter().map(ReadRequest::Current), outputs, pass)
    }

    /// Like [`add_pass`](Self::add_pass), with reads that may be pinned to explicit versions.
    #[track_caller]
    pub fn add_pass_with_requests<I, O>(&mut self, inputs: I, outputs: O, pass: P) -> Result<PassHandle>
    where
        I: IntoIterator<Item = ReadRequest>,
        O: IntoIterator<Item = ResourceId>,
    {
        self.assert_building("add_pass");

        let mut input_handles = ResourceHandles::new();
        for request in inputs {
            self.ensure_declared(&pass, request.resource())?;

            let handle = match request {
                ReadRequest::Current(id) => ResourceHandle::new(id, self.versions.current_version(id)),
                ReadRequest::Pinned(handle) => handle,
            };

            // distinct versions of one resource are distinct inputs
            if input_handles.contains(&handle) {
                warn!(
                    "Pass [{}] reads resource [{}] at {} multiple times!",
                    pass.name(),
                    self.resources.name(handle.id()),
                    handle.version()
                );
                continue;
            }
            input_handles.push(handle);
        }

        let mut output_ids = SmallVec::<[ResourceId; 4]>::new();
        for id in outputs {
            self.ensure_declared(&pass, id)?;

            if output_ids.contains(&id) {
                warn!("Pass [{}] writes resource [{}] multiple times!", pass.name(), self.resources.name(id));
                continue;
            }
            output_ids.push(id);
        }

        let output_handles = output_ids
            .into_iter()
            .map(|id| ResourceHandle::new(id, self.versions.record_write(id)))
            .collect::<ResourceHandles>();

        let handle = PassHandle::new(self.nodes.len() as u32);
        if log_enabled!(Level::Debug) {
            debug!(
                "Registered {handle} [{}] ({}) reads [{}] writes [{}]",
                pass.name(),
                pass.kind(),
                self.describe(&input_handles),
                self.describe(&output_handles),
            );
        }

        self.graph.add_node(handle);
        self.nodes.push(PassNode {
            inputs: input_handles,
            outputs: output_handles,
            pass,
        });

        Ok(handle)
    }

    /// Derive every dependency edge. Must be called exactly once, after the last pass.
    ///
    /// On error the graph is poisoned: scheduling queries panic until [`reset`](Self::reset).
    #[track_caller]
    pub fn construct_adj_list(&mut self) -> Result<()> {
        assert!(
            self.state == GraphState::Building,
            "`construct_adj_list` must be called exactly once per frame, but the graph is {:?}",
            self.state
        );

        if let Err(err) = self.validate_inputs().and_then(|_| self.link()) {
            error!("Frame graph rejected: {err}");
            self.state = GraphState::Poisoned;
            return Err(err);
        }

        self.state = GraphState::Linked;
        debug!("Linked {} pass(es) with {} dependency edge(s)", self.nodes.len(), self.graph.edge_count());
        Ok(())
    }

    #[track_caller]
    pub fn topological_sort(&self) -> Vec<PassHandle> {
        self.assert_schedulable("topological_sort");
        self.graph.topological_sort()
    }

    #[track_caller]
    pub fn parallel_execution_levels(&self) -> Vec<ExecutionLevel<PassHandle>> {
        self.assert_schedulable("parallel_execution_levels");
        self.graph.parallel_execution_levels()
    }

    #[track_caller]
    pub fn is_adjacent_to(&self, from: PassHandle, to: PassHandle) -> bool {
        self.assert_schedulable("is_adjacent_to");
        self.graph.is_adjacent_to(from, to)
    }

    #[track_caller]
    pub fn schedule(&mut self) -> FrameSchedule {
        self.assert_schedulable("schedule");

        let schedule = FrameSchedule::new(self.graph.topological_sort(), self.graph.parallel_execution_levels());
        self.state = GraphState::Scheduled;

        if self.config.log_schedule && log_enabled!(Level::Debug) {
            let names = |handles: &[PassHandle]| handles
                .iter()
                .map(|&handle| self.pass_name(handle))
                .collect::<Vec<_>>()
                .join(", ");

            debug!("Frame order: [{}]", names(schedule.order()));
            for (index, level) in schedule.levels().iter().enumerate() {
                debug!("Level {index}: [{}]", names(level.as_slice()));
            }
        }

        schedule
    }

    /// Drop every pass, resource and version to build the next frame, keeping allocations.
    pub fn reset(&mut self) {
        self.resources.clear();
        self.versions.clear();
        self.nodes.clear();
        self.graph.clear();
        self.state = GraphState::Building;
    }

    pub fn node(&self, handle: PassHandle) -> Option<&PassNode<P>> {
        self.nodes.get(handle.index())
    }

    pub fn pass(&self, handle: PassHandle) -> Option<&P> {
        self.node(handle).map(PassNode::pass)
    }

    pub fn pass_name(&self, handle: PassHandle) -> &str {
        self.node(handle)
            .map(PassNode::name)
            .unwrap_or("<unknown>")
    }

    pub fn nodes(&self) -> impl Iterator<Item = (PassHandle, &PassNode<P>)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (PassHandle::new(index as u32), node))
    }

    #[inline]
    pub fn pass_count(&self) -> usize {
        self.nodes.len()
    }

    /// The pass that produced this exact version, if any.
    pub fn producer_of(&self, handle: ResourceHandle) -> Option<PassHandle> {
        self.nodes()
            .find(|(_, node)| node.outputs.contains(&handle))
            .map(|(pass, _)| pass)
    }

    #[inline]
    pub fn resources(&self) -> &ResourceRegistry {
        &self.resources
    }

    #[inline]
    pub fn versions(&self) -> &ResourceVersionTracker {
        &self.versions
    }

    #[inline]
    pub fn dependency_graph(&self) -> &DependencyGraph<PassHandle> {
        &self.graph
    }

    fn ensure_declared(&self, pass: &P, resource: ResourceId) -> Result<()> {
        if self.resources.contains(resource) {
            Ok(())
        } else {
            Err(FrameGraphError::UnknownResource {
                pass: pass.name().to_owned(),
                resource,
            })
        }
    }

    fn validate_inputs(&self) -> Result<()> {
        for node in &self.nodes {
            for input in &node.inputs {
                if input.version().is_initial() {
                    if self.config.reject_unwritten_reads {
                        return Err(FrameGraphError::UnwrittenResourceRead {
                            pass: node.name().to_owned(),
                            resource: self.resources.name(input.id()).to_owned(),
                        });
                    }
                } else if !self.versions.producer_exists(*input) {
                    return Err(FrameGraphError::UnresolvedResourceVersion {
                        pass: node.name().to_owned(),
                        resource: self.resources.name(input.id()).to_owned(),
                        version: input.version(),
                    });
                }
            }
        }

        Ok(())
    }

    fn link(&mut self) -> Result<()> {
        for (producer_index, producer) in self.nodes.iter().enumerate() {
            for (consumer_index, consumer) in self.nodes.iter().enumerate() {
                for output in &producer.outputs {
                    for input in &consumer.inputs {
                        if output != input {
                            continue;
                        }

                        let from = PassHandle::new(producer_index as u32);
                        let to = PassHandle::new(consumer_index as u32);
                        if !self.graph.add_edge(from, to) {
                            return Err(FrameGraphError::CycleDetected {
                                from: producer.name().to_owned(),
                                to: consumer.name().to_owned(),
                            });
                        }
                    }
                }
            }
        }

        Ok(())
    }

    fn describe(&self, handles: &[ResourceHandle]) -> String {
        handles
            .iter()
            .map(|handle| format!("{}@{}", self.resources.name(handle.id()), handle.version()))
            .collect::<Vec<_>>()
            .join(", ")
    }

    #[track_caller]
    fn assert_building(&self, operation: &str) {
        assert!(
            self.state == GraphState::Building,
            "`{operation}` is only valid while the frame graph is building, but it is {:?}",
            self.state
        );
    }

    #[track_caller]
    fn assert_schedulable(&self, operation: &str) {
        match self.state {
            GraphState::Linked | GraphState::Scheduled => {}
            GraphState::Building => panic!("`{operation}` called before `construct_adj_list`"),
            GraphState::Poisoned => panic!("`{operation}` called on a frame graph that failed to link"),
        }
    }
}

impl<P: FramePass> std::fmt::Debug for PassDependencyGraph<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PassDependencyGraph")
            .field("state", &self.state)
            .field("nodes", &self.nodes)
            .field("resources", &self.resources)
            .finish()
    }
}
