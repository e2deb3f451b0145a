use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Initializes a global tracing subscriber writing to stderr. `RUST_LOG`
/// takes precedence over the configured level. Subsequent calls become
/// no-ops.
pub fn init_tracing(level: Level) {
    let env_filter = std::env::var("RUST_LOG")
        .map(EnvFilter::new)
        .unwrap_or_else(|_| EnvFilter::new(default_directives(level)));
    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn default_directives(level: Level) -> String {
    let level = level.as_str().to_ascii_lowercase();
    format!("warn,welcomebot={level}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_follows_configured_level() {
        assert_eq!(default_directives(Level::DEBUG), "warn,welcomebot=debug");
    }

    #[test]
    fn repeated_init_is_harmless() {
        init_tracing(Level::INFO);
        init_tracing(Level::TRACE);
    }
}
