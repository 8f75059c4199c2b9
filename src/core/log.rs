//! Tracing setup for the binary.

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Filter used when `RUST_LOG` is unset: this crate at `debug` or `warn`,
/// and the chatty storage and HTTP dependencies held at `warn`.
fn default_directives(verbose: bool) -> String {
    let level = if verbose { "debug" } else { "warn" };
    format!(
        "warn,{}={level},reqwest=warn,hyper_util=warn,fjall=warn,lsm_tree=warn",
        env!("CARGO_CRATE_NAME")
    )
}

/// Installs the global subscriber. Events go to stderr so the tables printed
/// on stdout can be piped; `RUST_LOG` overrides `--verbose`.
pub fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(verbose)));

    let installed = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(verbose)
                .without_time(),
        )
        .with(filter)
        .try_init();
    if installed.is_err() {
        tracing::debug!("Logging already initialised");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directives_parse() {
        for verbose in [false, true] {
            let directives = default_directives(verbose);
            assert!(EnvFilter::try_new(&directives).is_ok(), "{directives}");
        }
        assert!(default_directives(true).contains("nomadvault=debug"));
        assert!(default_directives(false).contains("nomadvault=warn"));
    }

    #[test]
    fn test_init_twice_does_not_panic() {
        init_logging(false);
        init_logging(true);
    }
}
