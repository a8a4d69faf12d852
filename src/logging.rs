//! Logging setup for the binary.
//!
//! Events go to stderr so stdout carries only the report. `RUST_LOG`, when set,
//! takes precedence over the `-v` count.

use tracing::Level;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Default level for a `-v` count: 0 → info, 1 → debug, 2+ → trace.
pub fn level_for_verbosity(verbosity: u8) -> Level {
    match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

pub fn init_logging(verbosity: u8) {
    let level = level_for_verbosity(verbosity);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_string()));

    let subscriber = tracing_subscriber::registry().with(filter).with(
        fmt::layer()
            .compact()
            .with_target(false)
            .with_writer(std::io::stderr),
    );

    // Ignore error if a subscriber was already set (tests, embedding).
    let _ = tracing::subscriber::set_global_default(subscriber);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_raises_the_level() {
        assert_eq!(level_for_verbosity(0), Level::INFO);
        assert_eq!(level_for_verbosity(1), Level::DEBUG);
        assert_eq!(level_for_verbosity(5), Level::TRACE);
    }

    #[test]
    fn init_twice_does_not_panic() {
        init_logging(0);
        init_logging(2);
    }
}
