//! Development-time tracing for debugging the bot.
//!
//! # Separation of Concerns
//!
//! - **Tracing (this module)**: dev/ops diagnostics via `RUST_LOG`, output
//!   to stderr. Not persisted, not part of the bot's product output.
//!
//! - **Statistics (`io/stats`)**: product artifacts in the stats book.
//!   Always written, unaffected by `RUST_LOG`.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing subscriber.
///
/// Reads `RUST_LOG` env var. Defaults to `info` if unset, so the important
/// moves of a session are visible without configuration.
///
/// # Example
/// ```bash
/// RUST_LOG=cavebot=debug cargo run -- run
/// ```
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
