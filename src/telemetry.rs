//! Tracing subscriber setup.
//!
//! Controlled by:
//! - `GIT_STITCH_LOG` (falling back to `RUST_LOG`): an `EnvFilter` directive
//!   string. When unset the level comes from the `-v` count: `warn` by
//!   default, `info` with `-v`, `debug` with `-vv`, `trace` beyond.
//! - `GIT_STITCH_LOG_FORMAT=json`: JSON events instead of compact text.
//!
//! Diagnostics go to stderr. Command output (hashes, branch names) is printed
//! to stdout by the caller and never passes through here.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;

/// Environment variable holding the filter directives.
pub const LOG_ENV: &str = "GIT_STITCH_LOG";
/// Environment variable selecting the output format.
pub const LOG_FORMAT_ENV: &str = "GIT_STITCH_LOG_FORMAT";

/// Default filter directive for a `-v` count.
#[must_use]
pub const fn default_level(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

fn filter(verbosity: u8) -> EnvFilter {
    [LOG_ENV, "RUST_LOG"]
        .iter()
        .find_map(|var| {
            std::env::var(var)
                .ok()
                .filter(|v| !v.trim().is_empty())
                .and_then(|v| EnvFilter::try_new(v).ok())
        })
        .unwrap_or_else(|| EnvFilter::new(default_level(verbosity)))
}

/// Install the global subscriber. Calling it twice is a no-op.
pub fn init(verbosity: u8) {
    let json = std::env::var(LOG_FORMAT_ENV).is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    let registry = tracing_subscriber::registry().with(filter(verbosity));

    let result = if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .try_init()
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .compact()
                    .without_time()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .try_init()
    };
    if let Err(e) = result {
        tracing::debug!("tracing subscriber already installed: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_raises_level() {
        assert_eq!(default_level(0), "warn");
        assert_eq!(default_level(1), "info");
        assert_eq!(default_level(2), "debug");
        assert_eq!(default_level(9), "trace");
    }
}
