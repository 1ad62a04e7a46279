pub mod commands;
pub mod config;
pub mod db;
pub mod dosage;
pub mod export; // Medication-course PDF report
pub mod journal; // Pain entries and context notes
pub mod models;
pub mod reminders;
pub mod search;
pub mod timeline;
pub mod validation;
pub mod voice;
pub mod wizard; // Medication-course wizard

use tracing_subscriber::EnvFilter;

/// Installs the global tracing subscriber. `RUST_LOG` overrides the default
/// filter. Calling it twice is harmless; the second call is ignored.
pub fn init_tracing() {
    let installed = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .try_init()
        .is_ok();

    if installed {
        tracing::info!("{} core starting v{}", config::APP_NAME, config::APP_VERSION);
    }
}
