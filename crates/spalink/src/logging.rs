use clap::ValueEnum;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::filter::{Directive, EnvFilter};

/// Extra per-target directives, e.g. `spalink_frame::reassembler=trace`.
pub const LOG_ENV: &str = "SPALINK_LOG";

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_filter(self) -> LevelFilter {
        match self {
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

/// Frame diagnostics go to stderr so stdout stays machine-readable.
///
/// `--log-level` sets the default; `SPALINK_LOG` can raise or lower single
/// targets on top of it, and turns on target names in the output.
pub fn init_logging(format: LogFormat, level: LogLevel) {
    let overrides = std::env::var(LOG_ENV).ok();
    let filter = build_filter(level, overrides.as_deref());

    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_ansi(false)
        .with_target(overrides.is_some());

    match format {
        LogFormat::Text => {
            let _ = builder.try_init();
        }
        LogFormat::Json => {
            let _ = builder.json().try_init();
        }
    }
}

fn build_filter(level: LogLevel, overrides: Option<&str>) -> EnvFilter {
    let mut filter = EnvFilter::default().add_directive(level.as_filter().into());

    for raw in overrides
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|raw| !raw.is_empty())
    {
        match raw.parse::<Directive>() {
            Ok(directive) => filter = filter.add_directive(directive),
            // Subscriber is not installed yet.
            Err(err) => eprintln!("warning: ignoring {LOG_ENV} directive {raw:?}: {err}"),
        }
    }

    filter
}
