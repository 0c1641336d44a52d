use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "BRUSHWORK_LOG";
const DEFAULT_FILTER: &str = "info";

/// Installs the global fmt subscriber.
///
/// The filter comes from `BRUSHWORK_LOG`, then `RUST_LOG`, then `info`.
/// Calling this again after a subscriber is set does nothing.
pub fn init() {
    let filter = filter_from(
        std::env::var(LOG_ENV).ok().as_deref(),
        std::env::var("RUST_LOG").ok().as_deref(),
    );
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

fn filter_from(own: Option<&str>, rust_log: Option<&str>) -> EnvFilter {
    [own, rust_log]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|directives| !directives.is_empty())
        .find_map(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn own_variable_wins_over_rust_log() {
        let filter = filter_from(Some("debug"), Some("warn"));
        assert_eq!(filter.to_string(), "debug");
    }

    #[test]
    fn blank_or_missing_values_fall_back_to_info() {
        assert_eq!(filter_from(None, None).to_string(), "info");
        assert_eq!(filter_from(Some("  "), None).to_string(), "info");
        assert_eq!(filter_from(None, Some("trace")).to_string(), "trace");
    }

    #[test]
    fn repeated_init_is_harmless() {
        init();
        init();
    }
}
