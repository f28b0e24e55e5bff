//! Logging - tracing subscriber on stderr, stdout stays free for JSON output

use tracing_subscriber::{fmt, EnvFilter};

pub const LOG_JSON_VAR: &str = "PISWEEP_LOG_JSON";

/// `RUST_LOG` filter (default `info`); JSON lines when `PISWEEP_LOG_JSON=1`.
/// Safe to call more than once.
pub fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if json_enabled() {
        let _ = fmt::Subscriber::builder()
            .with_env_filter(env_filter)
            .json()
            .with_writer(std::io::stderr)
            .try_init();
    } else {
        let _ = fmt::Subscriber::builder()
            .with_env_filter(env_filter)
            .pretty()
            .with_writer(std::io::stderr)
            .try_init();
    }
}

fn json_enabled() -> bool {
    std::env::var(LOG_JSON_VAR).map(|value| value == "1").unwrap_or(false)
}
