use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Dependencies that log every request at `info`/`debug`.
const QUIET_TARGETS: [&str; 4] = ["hyper", "reqwest", "sqlx", "warp"];

/// Filter used when `RUST_LOG` is unset: the configured level for this
/// crate, `warn` for HTTP and database internals.
pub fn default_directives(log_level: &str) -> String {
    let level = match log_level.trim() {
        "" => "info",
        level => level,
    };

    let mut directives = vec![level.to_string()];
    directives.extend(QUIET_TARGETS.iter().map(|target| format!("{}=warn", target)));
    directives.join(",")
}

pub fn init_logging(log_level: &str) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(log_level)));

    let installed = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(false))
        .try_init();

    match installed {
        Ok(()) => tracing::info!("Logging initialized at level: {}", log_level),
        Err(e) => tracing::debug!("Logging already initialized: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directives_quiet_dependencies() {
        assert_eq!(
            default_directives("debug"),
            "debug,hyper=warn,reqwest=warn,sqlx=warn,warp=warn"
        );
        assert!(default_directives("  ").starts_with("info,"));
    }

    #[test]
    fn test_directives_parse_as_filter() {
        assert!(EnvFilter::try_new(default_directives("trace")).is_ok());
    }
}
