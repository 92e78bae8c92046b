//! Frame graph scheduling for Zenith.
//!
//! Passes declare which resources they read and write. The graph versions every write,
//! links each read to the pass that produced the version it saw, and hands out a
//! submission order together with levels of passes that may run concurrently.
//!
//! A graph lives for one frame: set up, [`PassDependencyGraph::construct_adj_list`], query,
//! then [`PassDependencyGraph::reset`].

mod builder;
mod config;
mod dag;
mod error;
mod graph;
mod node;
mod resource;
mod schedule;
mod version;

pub use builder::PassBuilder;
pub use config::{FrameGraphConfig, FrameGraphConfigBuilder};
pub use dag::{CycleCheckMode, DependencyGraph, ExecutionLevel};
pub use error::{FrameGraphError, Result};
pub use graph::{GraphState, PassDependencyGraph};
pub use node::{FramePass, PassDesc, PassHandle, PassKind, PassNode, ResourceHandles};
pub use resource::{ReadRequest, ResourceEntry, ResourceHandle, ResourceId, ResourceKind, ResourceRegistry};
pub use schedule::{FrameSchedule, ScheduleConsumer};
pub use version::{ResourceVersionTracker, Version};
