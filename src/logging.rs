use tracing::Level;
use tracing_subscriber::fmt::time::SystemTime;
use tracing_subscriber::{fmt, prelude::*, EnvFilter, Registry};

/// Log output style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Installs the global subscriber. `RUST_LOG` overrides `level`.
///
/// Logs go to stderr so the console form and one-shot predictions keep
/// stdout to themselves.
pub fn init_logging(level: Level, format: LogFormat) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("diabetes_risk={level},warn")));

    match format {
        LogFormat::Json => {
            let fmt_layer = fmt::layer()
                .json()
                .with_timer(SystemTime)
                .with_target(true)
                .with_writer(std::io::stderr);
            Registry::default().with(env_filter).with(fmt_layer).init();
        }
        LogFormat::Text => {
            let fmt_layer = fmt::layer()
                .with_timer(SystemTime)
                .with_target(false)
                .with_writer(std::io::stderr);
            Registry::default().with(env_filter).with(fmt_layer).init();
        }
    }
}
