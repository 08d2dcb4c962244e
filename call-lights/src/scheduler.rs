use chrono::{DateTime, TimeDelta, Utc};
use futures::FutureExt;
use shared::models::Mode;
use std::convert::Infallible;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::Duration;

use crate::calendar::{CalendarFeed, EventSource};
use crate::classifier;
use crate::config::ScheduleSettings;
use crate::lights::{Bridge, LightController};

/// Why the polling loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The shutdown future completed
    Shutdown,
    /// A cycle panicked
    Aborted,
}

/// Polls the calendar on a fixed cadence and keeps the lights in step.
///
/// Lifecycle: lights on, cycles until shutdown, lights off. The off
/// commands are sent exactly once whichever way the loop ends.
pub struct PollingScheduler<F, B> {
    source: EventSource<F>,
    lights: LightController<B>,
    poll_interval: Duration,
    lead_time: TimeDelta,
}

impl<F: CalendarFeed, B: Bridge> PollingScheduler<F, B> {
    pub fn new(source: EventSource<F>, lights: LightController<B>, schedule: &ScheduleSettings) -> Self {
        Self {
            source,
            lights,
            poll_interval: schedule.poll_interval,
            lead_time: schedule.lead_time,
        }
    }

    pub async fn run_until<S>(&mut self, shutdown: S) -> StopReason
    where
        S: Future<Output = ()>,
    {
        tracing::info!("Starting polling scheduler (interval: {:?})", self.poll_interval);
        self.lights.turn_on().await;

        // Dropping the polling future cancels any query or command in
        // flight, so the off commands below never race a cycle.
        let reason = {
            let running = AssertUnwindSafe(self.poll_forever()).catch_unwind();
            tokio::select! {
                outcome = running => match outcome {
                    Ok(never) => match never {},
                    Err(_) => {
                        tracing::error!("Polling loop panicked");
                        StopReason::Aborted
                    }
                },
                () = shutdown => StopReason::Shutdown,
            }
        };

        tracing::info!("Process terminating ({:?}). Lights off.", reason);
        self.lights.turn_off().await;
        reason
    }

    async fn poll_forever(&mut self) -> Infallible {
        loop {
            let mode = self.run_cycle(Utc::now()).await;
            tracing::debug!(
                "Mode {} applied; sleeping for {:?}",
                mode,
                self.poll_interval
            );
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// One query, classify, actuate pass
    pub async fn run_cycle(&mut self, now: DateTime<Utc>) -> Mode {
        let window = match self.source.next_relevant_window(now).await {
            Ok(window) => window,
            Err(e) => {
                tracing::error!("Calendar unavailable this cycle, assuming no event: {}", e);
                None
            }
        };

        let assessment = classifier::assess(window.as_ref(), now, self.lead_time);
        let mode = assessment.mode();

        tracing::debug!(
            now = %now,
            horizon = %(now + self.lead_time),
            window = ?window,
            starting_soon = assessment.starting_soon,
            in_progress = assessment.in_progress,
            "Evaluated calendar"
        );
        tracing::info!("Mode: {}", mode);

        self.lights.activate(mode).await;
        mode
    }
}
