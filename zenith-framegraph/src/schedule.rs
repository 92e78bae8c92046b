use crate::dag::ExecutionLevel;
use crate::graph::PassDependencyGraph;
use crate::node::{FramePass, PassHandle};

/// The scheduling result of one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameSchedule {
    order: Vec<PassHandle>,
    levels: Vec<ExecutionLevel<PassHandle>>,
}

impl FrameSchedule {
    pub(crate) fn new(order: Vec<PassHandle>, levels: Vec<ExecutionLevel<PassHandle>>) -> Self {
        Self { order, levels }
    }

    /// Single-queue submission order.
    #[inline]
    pub fn order(&self) -> &[PassHandle] {
        &self.order
    }

    /// Passes grouped by dependency depth. Passes sharing a level may run concurrently.
    #[inline]
    pub fn levels(&self) -> &[ExecutionLevel<PassHandle>] {
        &self.levels
    }

    pub fn level_of(&self, pass: PassHandle) -> Option<usize> {
        self.levels
            .iter()
            .position(|level| level.contains(&pass))
    }

    /// Size of the widest level.
    pub fn max_parallelism(&self) -> usize {
        self.levels
            .iter()
            .map(|level| level.len())
            .max()
            .unwrap_or(0)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Anything that turns a schedule into submitted work: a single-queue executor, a
/// multi-queue dispatcher, a debug visualizer.
///
/// Synchronization between passes of different levels or queues is up to the consumer.
pub trait ScheduleConsumer<P: FramePass> {
    fn consume(&mut self, graph: &PassDependencyGraph<P>, schedule: &FrameSchedule) -> anyhow::Result<()>;
}

#[cfg(test)]
mod tests {
    use crate::node::PassDesc;
    use crate::resource::ResourceKind;
    use super::*;

    #[derive(Default)]
    struct NameRecorder {
        submitted: Vec<String>,
    }

    impl ScheduleConsumer<PassDesc> for NameRecorder {
        fn consume(&mut self, graph: &PassDependencyGraph<PassDesc>, schedule: &FrameSchedule) -> anyhow::Result<()> {
            for &pass in schedule.order() {
                self.submitted.push(graph.pass_name(pass).to_owned());
            }
            Ok(())
        }
    }

    #[test]
    fn schedule_bundles_order_and_levels() {
        let mut graph = PassDependencyGraph::new();
        let shadow = graph.declare_resource("shadow", ResourceKind::Texture);
        let gbuffer = graph.declare_resource("gbuffer", ResourceKind::Texture);
        let hdr = graph.declare_resource("hdr", ResourceKind::Texture);

        let shadows = graph.add_pass([], [shadow], PassDesc::graphics("shadows")).unwrap();
        let geometry = graph.add_pass([], [gbuffer], PassDesc::graphics("geometry")).unwrap();
        let lighting = graph.add_pass([shadow, gbuffer], [hdr], PassDesc::compute("lighting")).unwrap();
        graph.construct_adj_list().unwrap();

        let schedule = graph.schedule();
        assert_eq!(schedule.order(), &[shadows, geometry, lighting]);
        assert_eq!(schedule.levels().len(), 2);
        assert_eq!(schedule.levels()[0].as_slice(), &[shadows, geometry]);
        assert_eq!(schedule.level_of(lighting), Some(1));
        assert_eq!(schedule.max_parallelism(), 2);
        assert_eq!(schedule.len(), 3);

        let mut recorder = NameRecorder::default();
        recorder.consume(&graph, &schedule).unwrap();
        assert_eq!(recorder.submitted, ["shadows", "geometry", "lighting"]);
    }

    #[test]
    fn empty_frame() {
        let mut graph = PassDependencyGraph::<PassDesc>::new();
        graph.construct_adj_list().unwrap();

        let schedule = graph.schedule();
        assert!(schedule.is_empty());
        assert_eq!(schedule.max_parallelism(), 0);
        assert_eq!(schedule.level_of(PassHandle::new(0)), None);
    }
}
