use derive_builder::Builder;
use crate::dag::CycleCheckMode;

/// Knobs of a [`PassDependencyGraph`](crate::PassDependencyGraph).
///
/// ```
/// use zenith_framegraph::{CycleCheckMode, FrameGraphConfig};
///
/// let config = FrameGraphConfig::builder()
///     .cycle_check(CycleCheckMode::Incremental)
///     .log_schedule(true)
///     .build()
///     .unwrap();
/// assert!(!config.reject_unwritten_reads);
/// ```
#[derive(Debug, Default, Clone, PartialEq, Eq, Builder)]
#[builder(default, setter(into))]
pub struct FrameGraphConfig {
    pub cycle_check: CycleCheckMode,
    /// Treat reads of a resource no pass has written yet as an error.
    pub reject_unwritten_reads: bool,
    /// Log the order and levels at `debug` level whenever a schedule is produced.
    pub log_schedule: bool,
}

impl FrameGraphConfig {
    #[inline]
    pub fn builder() -> FrameGraphConfigBuilder {
        FrameGraphConfigBuilder::default()
    }
}
