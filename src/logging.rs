use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "match_predictor=info";

/// Installs the global subscriber. Logs go to stderr so a stdout channel
/// (the console binary) stays clean. Safe to call more than once.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
