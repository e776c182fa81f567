use std::io;
use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_FILTER: &str = "info,tower_http=info,axum=info";

/// Install the global tracing subscriber.
/// - Respects `RUST_LOG` if set
/// - `ACCOUNTS_LOG_FORMAT=json` switches to structured JSON lines
/// - Writes to stdout
pub fn init_logging() {
    let json = std::env::var("ACCOUNTS_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let builder = fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(io::stdout);

    // A second call (tests, embedding) keeps the first subscriber
    let _ = if json {
        builder.json().try_init()
    } else {
        builder.compact().try_init()
    };
}
