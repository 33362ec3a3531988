//! Logging Module
//!
//! Structured logging to stderr for the relay binary.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize logging.
///
/// `debug` lowers the default filter to debug level, which includes the
/// API client's wire dumps. `RUST_LOG` overrides both defaults.
pub fn init(debug: bool) {
    let default_filter = if debug {
        "debug,hyper=warn,reqwest=warn"
    } else {
        "info,hyper=warn,reqwest=warn"
    };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr));

    let _ = tracing::subscriber::set_global_default(subscriber);
}
