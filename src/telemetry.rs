//! Operator logging setup for the command-line front end.

use tracing_subscriber::EnvFilter;

/// Builds the log filter: `RUST_LOG` when set, otherwise `level` for this
/// crate and `warn` for dependencies.
#[must_use]
pub fn log_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("commentcast={level},warn")))
}

/// Installs the global `fmt` subscriber.
///
/// # Errors
///
/// Returns an error when a global subscriber is already installed.
pub fn init_tracing(level: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(level))
        .with_target(true)
        .with_thread_names(false)
        .try_init()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn fallback_filter_scopes_level_to_this_crate() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }

        assert_eq!(log_filter("debug").to_string(), "commentcast=debug,warn");
    }
}
