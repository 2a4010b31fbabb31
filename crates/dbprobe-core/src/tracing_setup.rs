//! Tracing/logging initialization for dbprobe binaries.
//!
//! Logs go to stderr; stdout is reserved for check output.

use tracing_subscriber::filter::Directive;
use tracing_subscriber::EnvFilter;

/// Targets that `init_with_level` raises.
const DBPROBE_TARGETS: &[&str] = &[
    "dbprobe",
    "dbprobe_core",
    "dbprobe_mysql_sys",
    "dbprobe_tcp_latency",
];

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// `RUST_LOG` (or `info`), with every dbprobe crate set to `level`.
pub fn dbprobe_filter(level: tracing::Level) -> EnvFilter {
    DBPROBE_TARGETS.iter().fold(env_filter(), |filter, target| {
        match format!("{}={}", target, level.as_str().to_ascii_lowercase()).parse::<Directive>() {
            Ok(directive) => filter.add_directive(directive),
            Err(_) => filter,
        }
    })
}

/// Initialize tracing with environment-based filtering.
///
/// Uses the `RUST_LOG` environment variable to control log levels.
/// Defaults to `info` if not set.
pub fn init() {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

/// Initialize tracing with dbprobe's own crates at `level`.
///
/// Dependencies such as the MySQL client keep the `RUST_LOG` setting.
pub fn init_with_level(level: tracing::Level) {
    tracing_subscriber::fmt()
        .with_env_filter(dbprobe_filter(level))
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}
