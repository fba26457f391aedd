//! Tracing setup for binaries and integration harnesses embedding the client.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the global tracing subscriber.
///
/// Respects `RUST_LOG`, defaulting to info level for the client crates when
/// it is unset. Call once at startup; a second call is a silent no-op so test
/// harnesses can install it from every test.
pub fn init() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "shopkit_client=info,shopkit_core=info".into());

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
