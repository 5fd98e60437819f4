//! Process-wide tracing setup.

use tracing_subscriber::EnvFilter;

/// Installs a stderr subscriber filtered by `directive`.
///
/// Falls back to `warn` if the directive does not parse. Calling this more
/// than once keeps the first subscriber.
pub fn init(directive: &str) {
    let filter = EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
