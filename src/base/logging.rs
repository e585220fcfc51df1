use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

fn crate_target() -> String {
    env!("CARGO_PKG_NAME").replace('-', "_")
}

/// An explicit level scopes this crate to that level. Otherwise `rust_log`
/// is used as a full directive list, and `info` for this crate when it is
/// absent or does not parse.
pub fn build_filter(log_level: Option<LevelFilter>, rust_log: Option<&str>) -> EnvFilter {
    let target = crate_target();
    if let Some(level) = log_level {
        return EnvFilter::new(format!("{target}={level}"));
    }
    rust_log
        .filter(|directives| !directives.trim().is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(format!("{target}=info")))
}

/// Install the stderr subscriber used by the binary.
///
/// Output goes to stderr so command output on stdout stays
/// machine-readable.
pub fn enable_logging(log_level: Option<LevelFilter>) {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = build_filter(log_level, rust_log.as_deref());

    // A second init (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rust_log_directives_kept_whole() {
        let filter = build_filter(None, Some("sessiontap=debug,hyper=warn"));
        let shown = filter.to_string();
        assert!(shown.contains("sessiontap=debug"), "{shown}");
        assert!(shown.contains("hyper=warn"), "{shown}");
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::DEBUG));
    }

    #[test]
    fn test_explicit_level_wins() {
        let filter = build_filter(Some(LevelFilter::TRACE), Some("hyper=warn"));
        let shown = filter.to_string();
        assert!(shown.contains("sessiontap=trace"), "{shown}");
        assert!(!shown.contains("hyper"), "{shown}");
    }

    #[test]
    fn test_default_is_crate_info() {
        for rust_log in [None, Some(""), Some("sessiontap=loud")] {
            let shown = build_filter(None, rust_log).to_string();
            assert_eq!(shown, "sessiontap=info", "{rust_log:?}");
        }
    }
}
