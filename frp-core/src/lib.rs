//! Core library for the frp CLI tool
//!
//! This crate provides client settings persistence, frpc configuration
//! rendering, and the supervisor that runs frpc and always cleans up after it.

pub mod error;

pub mod config;
pub mod tunnel;

/// Initialize logging infrastructure
///
/// Sets up tracing with systemd journal logging when running under systemd.
/// Otherwise logs to stderr. `default_level` applies unless `FRP_LOG` holds
/// an `EnvFilter` directive.
pub fn init_logging(default_level: tracing::Level) -> Result<(), Box<dyn std::error::Error>> {
    use tracing_subscriber::{
        filter::LevelFilter, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
    };

    let filter = EnvFilter::try_from_env("FRP_LOG").unwrap_or_else(|_| {
        EnvFilter::default().add_directive(LevelFilter::from_level(default_level).into())
    });

    // Try to use systemd journal logging if available
    #[cfg(target_os = "linux")]
    {
        if std::env::var("JOURNAL_STREAM").is_ok() {
            let journal_layer = tracing_journald::layer()?;
            tracing_subscriber::registry()
                .with(journal_layer)
                .with(filter)
                .try_init()?;
            return Ok(());
        }
    }

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init()?;

    Ok(())
}
