//! Logging initialization for instrumeta binaries
//!
//! Console output always goes to stderr so command output on stdout stays
//! machine readable. `logging.json` switches both console and file output to
//! JSON lines; `RUST_LOG` overrides the configured level.

use anyhow::Context;
use std::fs;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::RollingFileAppender;
use tracing_subscriber::{
    fmt, layer::Layered, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
    Registry,
};

use crate::config::LoggingConfig;

type FilteredRegistry = Layered<EnvFilter, Registry>;
type BoxedLayer = Box<dyn Layer<FilteredRegistry> + Send + Sync>;

/// Keeps the non-blocking file writer alive; hold it for the program duration.
pub struct LoggingGuard {
    _file_guard: Option<WorkerGuard>,
}

/// Initialize logging from `LoggingConfig`.
pub fn init_logging(config: &LoggingConfig) -> anyhow::Result<LoggingGuard> {
    let mut layers = vec![console_layer(config.json)];
    let mut file_guard = None;
    if config.file_enabled {
        let (layer, guard) = file_layer(config)?;
        layers.push(layer);
        file_guard = Some(guard);
    }

    tracing_subscriber::registry()
        .with(env_filter(&config.level))
        .with(layers)
        .try_init()
        .context("a global logger is already installed")?;

    tracing::info!(
        level = %config.level,
        json = config.json,
        file_enabled = config.file_enabled,
        "Logging initialized"
    );

    Ok(LoggingGuard {
        _file_guard: file_guard,
    })
}

/// Environment-only logging for tools that do not load a full `Config`.
pub fn init_simple_logging() {
    let _ = tracing_subscriber::registry()
        .with(env_filter("info"))
        .with(console_layer(false))
        .try_init();
}

fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives(level)))
}

/// Our crates at `level`, the HTTP stack only when it warns.
fn default_directives(level: &str) -> String {
    format!(
        "instrumeta={level},instrumeta_filter={level},instrumeta_cli={level},reqwest=warn,hyper=warn"
    )
}

fn console_layer(json: bool) -> BoxedLayer {
    if json {
        fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(false)
            .with_writer(std::io::stderr)
            .boxed()
    } else {
        fmt::layer()
            .with_target(true)
            .with_writer(std::io::stderr)
            .boxed()
    }
}

fn file_layer(config: &LoggingConfig) -> anyhow::Result<(BoxedLayer, WorkerGuard)> {
    fs::create_dir_all(&config.file_directory).with_context(|| {
        format!("create log directory '{}'", config.file_directory)
    })?;

    let appender = Rotation::parse(&config.file_rotation)
        .appender(&config.file_directory, &config.file_prefix);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let layer = if config.json {
        fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(false)
            .with_writer(writer)
            .boxed()
    } else {
        fmt::layer().with_ansi(false).with_writer(writer).boxed()
    };
    Ok((layer, guard))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rotation {
    Minutely,
    Hourly,
    Daily,
    Never,
}

impl Rotation {
    /// Unknown values rotate daily.
    fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "minutely" => Self::Minutely,
            "hourly" => Self::Hourly,
            "never" => Self::Never,
            _ => Self::Daily,
        }
    }

    fn appender(self, directory: &str, prefix: &str) -> RollingFileAppender {
        match self {
            Self::Minutely => tracing_appender::rolling::minutely(directory, prefix),
            Self::Hourly => tracing_appender::rolling::hourly(directory, prefix),
            Self::Daily => tracing_appender::rolling::daily(directory, prefix),
            Self::Never => tracing_appender::rolling::never(directory, format!("{}.log", prefix)),
        }
    }
}
