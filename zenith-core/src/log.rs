pub use log::{trace, debug, info, warn, error, log_enabled, Level};

/// Install the global logger.
///
/// Without `RUST_LOG` the level is `Info` and the per-edge tracing of the frame graph is kept
/// at `Warn`. When `RUST_LOG` is set, its directives alone decide.
pub fn initialize() -> Result<(), log::SetLoggerError> {
    let filters = std::env::var(env_logger::DEFAULT_FILTER_ENV).ok();
    let mut builder = builder(filters.as_deref());
    if let Ok(style) = std::env::var(env_logger::DEFAULT_WRITE_STYLE_ENV) {
        builder.parse_write_style(&style);
    }
    builder.try_init()
}

/// Like [`initialize`], but safe to call from every test.
pub fn initialize_for_test() {
    let _ = env_logger::builder()
        .filter_level(log::LevelFilter::Debug)
        .is_test(true)
        .try_init();
}

fn builder(filters: Option<&str>) -> env_logger::Builder {
    let mut builder = env_logger::Builder::new();
    match filters {
        Some(filters) => {
            builder.parse_filters(filters);
        }
        None => {
            builder
                .filter_level(log::LevelFilter::Info)
                .filter_module("zenith_framegraph::dag", log::LevelFilter::Warn);
        }
    }
    builder
}

#[cfg(test)]
mod tests {
    use log::{Log, Metadata};
    use super::*;

    fn enabled(logger: &env_logger::Logger, target: &str, level: Level) -> bool {
        logger.enabled(&Metadata::builder().target(target).level(level).build())
    }

    #[test]
    fn defaults_quiet_edge_tracing() {
        let logger = builder(None).build();

        assert!(enabled(&logger, "zenith_sandbox", Level::Info));
        assert!(!enabled(&logger, "zenith_sandbox", Level::Debug));
        assert!(enabled(&logger, "zenith_framegraph::dag", Level::Warn));
        assert!(!enabled(&logger, "zenith_framegraph::dag", Level::Info));
    }

    #[test]
    fn env_filters_replace_the_defaults() {
        let logger = builder(Some("trace")).build();
        assert!(enabled(&logger, "zenith_framegraph::dag", Level::Trace));

        let logger = builder(Some("zenith_framegraph=debug")).build();
        assert!(enabled(&logger, "zenith_framegraph::graph", Level::Debug));
        assert!(enabled(&logger, "zenith_framegraph::dag", Level::Debug));
    }
}
