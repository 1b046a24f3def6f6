use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Installs a compact fmt subscriber filtered by `RUST_LOG` (default
/// `info`) as the global default.
///
/// Returns `false` if a global subscriber was already installed, in which
/// case nothing changes.
pub fn init_tracing() -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .try_init()
        .is_ok()
}
