mod executor;

use anyhow::bail;
use log::{debug, info, log_enabled, warn, Level};
use zenith_framegraph::{
    CycleCheckMode, FrameGraphConfig, PassDependencyGraph, PassDesc, PassNode, ResourceId, ResourceKind,
    ScheduleConsumer,
};
use crate::executor::{Device, MultiQueueExecutor, SerialExecutor};

const FRAME_COUNT: u32 = 3;

fn parse_cycle_check() -> anyhow::Result<CycleCheckMode> {
    match std::env::args().nth(1).as_deref() {
        None | Some("full") => Ok(CycleCheckMode::Full),
        Some("incremental") => Ok(CycleCheckMode::Incremental),
        Some(other) => bail!("Unknown cycle check mode [{other}], expected `full` or `incremental`"),
    }
}

/// A deferred frame. Shadows are only re-rendered every other frame.
fn build_deferred_frame(graph: &mut PassDependencyGraph<PassDesc>, frame: u32) -> anyhow::Result<()> {
    let instances = graph.declare_resource("instances", ResourceKind::Buffer);
    let depth = graph.declare_resource("depth", ResourceKind::Texture);
    let gbuffer = graph.declare_resource("gbuffer", ResourceKind::Texture);
    let shadow = graph.declare_resource("shadow_atlas", ResourceKind::Texture);
    let lights = graph.declare_resource("light_list", ResourceKind::Buffer);
    let hdr = graph.declare_resource("hdr", ResourceKind::Texture);
    let bloom = graph.declare_resource("bloom", ResourceKind::Texture);
    let swapchain = graph.declare_resource("swapchain", ResourceKind::External);

    graph.add_pass([], [instances], PassDesc::transfer("upload_instances"))?;
    graph.add_pass([instances], [depth], PassDesc::graphics("depth_prepass"))?;
    graph
        .pass_builder(PassDesc::graphics("gbuffer"))
        .read(instances)
        .read_write(depth)
        .write(gbuffer)
        .finish()?;

    if frame % 2 == 0 {
        graph.add_pass([instances], [shadow], PassDesc::graphics("shadow_map"))?;
    }

    graph.add_pass([depth], [lights], PassDesc::compute("light_culling"))?;
    graph.add_pass([gbuffer, depth, shadow, lights], [hdr], PassDesc::compute("lighting"))?;
    graph.add_pass([hdr], [bloom], PassDesc::compute("bloom"))?;
    graph.add_pass([hdr, bloom], [swapchain], PassDesc::graphics("tonemap"))?;
    graph
        .pass_builder(PassDesc::graphics("ui"))
        .read_write(swapchain)
        .finish()?;

    Ok(())
}

/// Which passes touch each resource, then the producer behind every input.
fn log_frame_resources(graph: &PassDependencyGraph<PassDesc>) {
    if !log_enabled!(Level::Debug) {
        return;
    }

    let resources = graph.resources();
    debug!("{} of {} resource(s) written this frame", graph.versions().written_count(), resources.len());

    for (id, entry) in resources.iter() {
        let passes = |touches: fn(&PassNode<PassDesc>, ResourceId) -> bool| graph
            .nodes()
            .filter(|(_, node)| touches(node, id))
            .map(|(_, node)| node.name())
            .collect::<Vec<_>>()
            .join(", ");

        debug!(
            "{} ({}): written by [{}], read by [{}]",
            entry.name(),
            entry.kind(),
            passes(|node, id| node.writes(id)),
            passes(|node, id| node.reads(id)),
        );
    }

    for (_, node) in graph.nodes() {
        for input in node.inputs() {
            let resource = resources.name(input.id());
            match graph.producer_of(*input) {
                Some(producer) => debug!(
                    "[{}] -> [{}] through {resource}@{}",
                    graph.pass_name(producer),
                    node.name(),
                    input.version()
                ),
                None => debug!("[{}] reads {resource} from before the frame", node.name()),
            }
        }
    }
}

fn main() -> anyhow::Result<()> {
    zenith_core::log::initialize()?;

    let config = FrameGraphConfig::builder()
        .cycle_check(parse_cycle_check()?)
        .log_schedule(true)
        .build()?;
    info!("Scheduling {FRAME_COUNT} frame(s) with {:?} cycle checks", config.cycle_check);

    let mut device = Device::default();
    let mut graph = PassDependencyGraph::with_config(config);

    for frame in 0..FRAME_COUNT {
        build_deferred_frame(&mut graph, frame)?;
        if let Err(err) = graph.construct_adj_list() {
            warn!("Skipping frame {frame}: {err}");
            graph.reset();
            continue;
        }
        log_frame_resources(&graph);
        let schedule = graph.schedule();

        SerialExecutor::new(&mut device).consume(&graph, &schedule)?;
        let serial = device.present();

        let mut executor = MultiQueueExecutor::new(&mut device);
        executor.consume(&graph, &schedule)?;
        let waits = executor.cross_queue_waits();
        let parallel = device.present();

        if serial.len() != parallel.len() {
            warn!("Serial and multi queue execution submitted a different number of passes!");
        }
        info!(
            "Frame {frame}: {} pass(es) in {} level(s), widest level {}, {waits} cross queue wait(s)",
            schedule.len(),
            schedule.levels().len(),
            schedule.max_parallelism(),
        );

        graph.reset();
    }

    Ok(())
}
