//! Log output setup
//!
//! Logs go to stderr so stdout carries only command output.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default filter when `RUST_LOG` is unset
fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        "merchantcache=debug"
    } else {
        "merchantcache=info"
    }
}

/// Installs the global tracing subscriber
///
/// `RUST_LOG` takes precedence over `verbose`. Calling this twice is harmless;
/// the second call leaves the first subscriber in place.
pub fn init(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbose)));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .try_init();
}
