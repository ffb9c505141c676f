use anyhow::Context;
use settings::Settings;
use tokio_util::sync::CancellationToken;

use crate::adapter::stats::HeatingStatsPublisher;
use crate::heating::HeatingController;

mod adapter;
mod core;
mod heating;
pub mod port;
mod settings;

#[tokio::main(flavor = "multi_thread")]
pub async fn main() -> anyhow::Result<()> {
    let settings = Settings::new().context("Error reading configuration")?;

    settings
        .monitoring
        .init(settings.debug_logging)
        .map_err(|e| anyhow::anyhow!("Error initializing monitoring: {}", e))?;

    tracing::info!("Heating Manager {} starting", env!("CARGO_PKG_VERSION"));

    settings.heating.validate().context("Invalid heating configuration")?;
    settings.heating.log_summary();

    let ha_client = settings
        .homeassistant
        .new_client()
        .context("Error initializing Home Assistant REST client")?;

    let (mqtt_client, stats) = match &settings.mqtt {
        Some(mqtt) => {
            let client = mqtt.broker.new_client(&mqtt.stats.availability_topic());
            let stats = HeatingStatsPublisher::new(Some((client.sender(), mqtt.stats.clone())));
            (Some(client), stats)
        }
        None => {
            tracing::info!("MQTT not configured, stats are only exported as metrics");
            (None, HeatingStatsPublisher::new(None))
        }
    };

    let shutdown = CancellationToken::new();
    tokio::spawn(watch_shutdown_signals(shutdown.clone()));

    let controller = HeatingController::new(ha_client, stats, settings.heating);

    tracing::info!("Starting main loop");

    match mqtt_client {
        Some(mqtt) => {
            tokio::select!(
                _ = mqtt.run() => tracing::error!("MQTT event loop terminated"),
                _ = controller.run(shutdown) => {},
            );
        }
        None => controller.run(shutdown).await,
    }

    tracing::info!("Heating Manager stopped");
    Ok(())
}

async fn watch_shutdown_signals(shutdown: CancellationToken) {
    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!("Cannot listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                tracing::warn!("Cannot listen for Ctrl-C: {}", e);
                return;
            }
        }
        _ = terminate => {}
    }

    tracing::info!("Shutdown requested, finishing current cycle");
    shutdown.cancel();
}
