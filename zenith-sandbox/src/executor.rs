use anyhow::{bail, ensure};
use log::{debug, info};
use zenith_framegraph::{FramePass, FrameSchedule, PassDependencyGraph, PassHandle, PassKind, ScheduleConsumer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueKind {
    Graphics,
    AsyncCompute,
    Transfer,
}

impl From<PassKind> for QueueKind {
    fn from(kind: PassKind) -> Self {
        match kind {
            PassKind::Graphics => QueueKind::Graphics,
            PassKind::Compute => QueueKind::AsyncCompute,
            PassKind::Transfer => QueueKind::Transfer,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub queue: QueueKind,
    pub pass: String,
    /// Passes on other queues this submission has to wait for.
    pub waits: Vec<String>,
}

/// Stand-in for a GPU device. Only records what would have been submitted.
#[derive(Debug, Default)]
pub struct Device {
    submissions: Vec<Submission>,
}

impl Device {
    pub fn submit(&mut self, submission: Submission) {
        debug!("Submit [{}] on {:?} queue", submission.pass, submission.queue);
        self.submissions.push(submission);
    }

    pub fn submissions(&self) -> &[Submission] {
        &self.submissions
    }

    /// Drain the frame's submissions.
    pub fn present(&mut self) -> Vec<Submission> {
        std::mem::take(&mut self.submissions)
    }
}

/// Submits every pass on the graphics queue in topological order.
pub struct SerialExecutor<'device> {
    device: &'device mut Device,
}

impl<'device> SerialExecutor<'device> {
    pub fn new(device: &'device mut Device) -> Self {
        Self { device }
    }
}

impl<P: FramePass> ScheduleConsumer<P> for SerialExecutor<'_> {
    fn consume(&mut self, graph: &PassDependencyGraph<P>, schedule: &FrameSchedule) -> anyhow::Result<()> {
        for &pass in schedule.order() {
            self.device.submit(Submission {
                queue: QueueKind::Graphics,
                pass: graph.pass_name(pass).to_owned(),
                waits: Vec::new(),
            });
        }
        Ok(())
    }
}

/// Dispatches each level across queues by pass kind, inserting a wait whenever a direct
/// dependency ran on a different queue.
pub struct MultiQueueExecutor<'device> {
    device: &'device mut Device,
    cross_queue_waits: usize,
}

impl<'device> MultiQueueExecutor<'device> {
    pub fn new(device: &'device mut Device) -> Self {
        Self {
            device,
            cross_queue_waits: 0,
        }
    }

    pub fn cross_queue_waits(&self) -> usize {
        self.cross_queue_waits
    }

    fn queue_of<P: FramePass>(graph: &PassDependencyGraph<P>, pass: PassHandle) -> anyhow::Result<QueueKind> {
        match graph.pass(pass) {
            Some(pass) => Ok(pass.kind().into()),
            None => bail!("Schedule references {pass}, which is not part of the graph"),
        }
    }
}

impl<P: FramePass> ScheduleConsumer<P> for MultiQueueExecutor<'_> {
    fn consume(&mut self, graph: &PassDependencyGraph<P>, schedule: &FrameSchedule) -> anyhow::Result<()> {
        for (index, level) in schedule.levels().iter().enumerate() {
            for &pass in level {
                let queue = Self::queue_of(graph, pass)?;

                let mut waits = Vec::new();
                for dependency in graph.dependency_graph().predecessors(pass) {
                    ensure!(
                        schedule.level_of(dependency).is_some_and(|level| level < index),
                        "[{}] is scheduled before its dependency [{}]",
                        graph.pass_name(pass),
                        graph.pass_name(dependency)
                    );

                    if Self::queue_of(graph, dependency)? != queue {
                        waits.push(graph.pass_name(dependency).to_owned());
                    }
                }

                self.cross_queue_waits += waits.len();
                self.device.submit(Submission {
                    queue,
                    pass: graph.pass_name(pass).to_owned(),
                    waits,
                });
            }
        }

        info!("Dispatched {} level(s), {} cross queue wait(s)", schedule.levels().len(), self.cross_queue_waits);
        Ok(())
    }
}
