use eyre::{Result, WrapErr};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Installs the global tracing subscriber. Call once, at process start.
pub fn init_tracing(level: Level) -> Result<()> {
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)
        .wrap_err("Failed to install the tracing subscriber")?;
    Ok(())
}
