//! Relayer binary: loads the settings, starts the worker and the API, and
//! drains the queue on ctrl-c.

#![forbid(unsafe_code)]

use eyre::Result;
use relayer::Relayer;
use relayer_base::{load_settings, Settings};
use tracing::info;

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<()> {
    #[cfg(feature = "color-eyre")]
    color_eyre::install()?;

    // Logging is not initialised at this point, so, using `println!`
    println!("Relayer starting up...");

    let settings = load_settings::<Settings>()?;
    settings.validate()?;
    settings.tracing.start_tracing()?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        networks = ?settings.networks.keys().collect::<Vec<_>>(),
        default_network = %settings.default_network,
        "Loaded settings"
    );

    let relayer = Relayer::from_settings(&settings).await?;
    relayer.start()?;

    tokio::signal::ctrl_c().await?;
    info!("Shutting down, draining the execution queue");
    relayer.stop_later().await;
    info!(?relayer, "Stopped");
    Ok(())
}
