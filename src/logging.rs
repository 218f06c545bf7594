// Tracing subscriber setup

use tracing_subscriber::EnvFilter;

pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Install the global subscriber.
///
/// `LOG_LEVEL` takes any `EnvFilter` directive (`debug`, `sovereign_bridge_relay=trace,info`).
/// `LOG_FORMAT=json` switches to one JSON object per line. Calling this twice
/// is harmless; the second install is ignored.
pub fn init() {
    let level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string());
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    init_with(&level, json);
}

pub fn init_with(level: &str, json: bool) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);

    let result = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    if result.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}
