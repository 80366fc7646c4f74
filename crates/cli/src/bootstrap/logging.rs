use ferrous_rproxy_domain::config::{LogFormat, LoggingConfig};
use tracing_subscriber::EnvFilter;

/// `RUST_LOG` wins over the configured level when set.
pub fn init_logging(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(&logging.level)));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    match logging.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}

/// The configured level for every workspace crate, `warn` for dependencies.
fn default_directives(level: &str) -> String {
    let mut directives: Vec<String> = WORKSPACE_TARGETS
        .iter()
        .map(|target| format!("{}={}", target, level))
        .collect();
    directives.push("warn".to_string());
    directives.join(",")
}

const WORKSPACE_TARGETS: [&str; 4] = [
    "ferrous_rproxy",
    "ferrous_rproxy_domain",
    "ferrous_rproxy_application",
    "ferrous_rproxy_infrastructure",
];
