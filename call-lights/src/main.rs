mod calendar;
mod classifier;
mod config;
mod error;
mod lights;
mod scheduler;

use anyhow::{Context, Result};
use std::future::Future;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::calendar::{EventSource, GoogleCalendarFeed};
use crate::config::Settings;
use crate::lights::{HueBridge, LightController};
use crate::scheduler::{PollingScheduler, StopReason};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    dotenv::dotenv().ok();
    let settings = Settings::load();

    // Initialize tracing; the LOGGING toggle only silences per-cycle chatter
    let default_filter = config::default_log_filter(settings.as_ref().map_or(true, |s| s.logging));
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = settings.context("Failed to load configuration")?;

    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        tracing::debug!("TLS crypto provider already installed");
    }

    tracing::info!(
        "Starting call-lights (lights: {:?}, poll interval: {:?}, lead time: {:?})",
        settings.lights.lights,
        settings.schedule.poll_interval,
        settings.schedule.lead_time
    );

    let hub = calendar::google::authorized_calendar_hub(&settings.calendar)
        .await
        .context("No valid calendar session")?;
    let feed = GoogleCalendarFeed::new(hub, settings.calendar.calendar_id.clone());
    let source = EventSource::new(feed, &settings.calendar, &settings.schedule);

    let bridge = HueBridge::new(&settings.bridge).context("Failed to build bridge client")?;
    let lights = LightController::new(bridge, settings.lights.clone());

    let shutdown = shutdown_signal().context("Failed to install signal handlers")?;

    let mut scheduler = PollingScheduler::new(source, lights, &settings.schedule);
    match scheduler.run_until(shutdown).await {
        StopReason::Shutdown => {
            tracing::info!("call-lights stopped");
            Ok(())
        }
        StopReason::Aborted => anyhow::bail!("Polling loop aborted; lights were turned off"),
    }
}

/// Resolves on Ctrl-C or SIGTERM. Handlers are registered before returning
/// so a signal arriving during startup is not lost.
#[cfg(unix)]
fn shutdown_signal() -> std::io::Result<impl Future<Output = ()>> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;

    Ok(async move {
        tokio::select! {
            _ = interrupt.recv() => tracing::info!("Interrupt received, stopping..."),
            _ = terminate.recv() => tracing::info!("Termination signal received, stopping..."),
        }
    })
}

#[cfg(not(unix))]
fn shutdown_signal() -> std::io::Result<impl Future<Output = ()>> {
    Ok(async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => tracing::info!("Shutdown signal received, stopping..."),
            Err(e) => tracing::error!("Failed to listen for Ctrl-C: {}", e),
        }
    })
}
