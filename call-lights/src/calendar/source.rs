//! Picks the next relevant window out of the raw event feed.

use chrono::{DateTime, Utc};
use shared::models::{CalendarEntry, CalendarWindow};
use std::time::Duration;

use super::CalendarFeed;
use crate::config::{CalendarSettings, ScheduleSettings};
use crate::error::CalendarError;

/// Retries allowed after a transient failure
const MAX_RETRIES: u32 = 1;

pub struct EventSource<F> {
    feed: F,
    max_results: u32,
    retry_backoff: Duration,
}

impl<F: CalendarFeed> EventSource<F> {
    pub fn new(feed: F, calendar: &CalendarSettings, schedule: &ScheduleSettings) -> Self {
        Self {
            feed,
            max_results: calendar.max_results,
            retry_backoff: schedule.retry_backoff,
        }
    }

    /// Window of the earliest timed event at or after `now`, if any.
    ///
    /// A transient failure is retried once after the configured backoff; a
    /// second failure is returned to the caller.
    pub async fn next_relevant_window(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Option<CalendarWindow>, CalendarError> {
        tracing::debug!("Getting events after {}", now);
        let entries = self.fetch_with_retry(now).await?;

        if entries.is_empty() {
            tracing::debug!("No upcoming events found");
        }

        Ok(first_timed_window(&entries))
    }

    async fn fetch_with_retry(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<CalendarEntry>, CalendarError> {
        let mut retries = 0;

        loop {
            match self.feed.upcoming(now, self.max_results).await {
                Ok(entries) => return Ok(entries),
                Err(e) if e.is_transient() && retries < MAX_RETRIES => {
                    retries += 1;
                    tracing::warn!(
                        "{}; retrying in {:?} (attempt {} of {})",
                        e,
                        self.retry_backoff,
                        retries,
                        MAX_RETRIES
                    );
                    tokio::time::sleep(self.retry_backoff).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// First event with a time-of-day component; all-day events are skipped
pub fn first_timed_window(entries: &[CalendarEntry]) -> Option<CalendarWindow> {
    entries.iter().find_map(|entry| {
        if entry.is_all_day() {
            tracing::debug!("Skipping all-day event: {:?}", entry.summary);
        }
        entry.window()
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{Duration as TimeDelta, NaiveDate, TimeZone};
    use shared::models::EventTime;
    use std::collections::VecDeque;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// Feed answering from a script, then with an empty calendar
    #[derive(Clone, Default)]
    pub(crate) struct ScriptedFeed {
        replies: Arc<Mutex<VecDeque<Result<Vec<CalendarEntry>, CalendarError>>>>,
        calls: Arc<AtomicUsize>,
    }

    impl ScriptedFeed {
        pub(crate) fn new(
            replies: impl IntoIterator<Item = Result<Vec<CalendarEntry>, CalendarError>>,
        ) -> Self {
            Self {
                replies: Arc::new(Mutex::new(replies.into_iter().collect())),
                calls: Arc::default(),
            }
        }

        pub(crate) fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CalendarFeed for ScriptedFeed {
        async fn upcoming(
            &self,
            _time_min: DateTime<Utc>,
            _max_results: u32,
        ) -> Result<Vec<CalendarEntry>, CalendarError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(Vec::new()))
        }
    }

    pub(crate) fn timed_entry(start: DateTime<Utc>, end: DateTime<Utc>) -> CalendarEntry {
        CalendarEntry {
            summary: Some("Video call".to_string()),
            start: EventTime::Timed(start),
            end: EventTime::Timed(end),
        }
    }

    fn all_day_entry() -> CalendarEntry {
        let day = NaiveDate::from_ymd_opt(2024, 5, 6).unwrap();
        CalendarEntry {
            summary: Some("Holiday".to_string()),
            start: EventTime::AllDay(day),
            end: EventTime::AllDay(day.succ_opt().unwrap()),
        }
    }

    pub(crate) fn test_settings(backoff: Duration) -> (CalendarSettings, ScheduleSettings) {
        (
            CalendarSettings {
                calendar_id: "primary".to_string(),
                credentials_path: PathBuf::from("credentials.json"),
                token_cache_path: PathBuf::from("token_cache.json"),
                max_results: 10,
            },
            ScheduleSettings {
                poll_interval: Duration::from_secs(240),
                lead_time: TimeDelta::minutes(5),
                retry_backoff: backoff,
            },
        )
    }

    fn source(feed: ScriptedFeed) -> EventSource<ScriptedFeed> {
        let (calendar, schedule) = test_settings(Duration::from_secs(60));
        EventSource::new(feed, &calendar, &schedule)
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 6, 9, 0, 0).unwrap()
    }

    #[test]
    fn test_all_day_events_do_not_block_timed_ones() {
        let start = now() + TimeDelta::minutes(30);
        let end = start + TimeDelta::hours(1);
        let entries = vec![all_day_entry(), timed_entry(start, end)];

        assert_eq!(
            first_timed_window(&entries),
            Some(CalendarWindow::new(start, end))
        );
    }

    #[test]
    fn test_only_all_day_events_yield_nothing() {
        assert_eq!(first_timed_window(&[all_day_entry(), all_day_entry()]), None);
        assert_eq!(first_timed_window(&[]), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_connection_reset_retried_once() {
        let start = now() + TimeDelta::minutes(2);
        let end = start + TimeDelta::hours(1);
        let feed = ScriptedFeed::new([
            Err(CalendarError::Transient("connection reset by peer".into())),
            Ok(vec![timed_entry(start, end)]),
        ]);
        let source = source(feed.clone());

        let before = tokio::time::Instant::now();
        let window = source.next_relevant_window(now()).await.unwrap();

        assert_eq!(window, Some(CalendarWindow::new(start, end)));
        assert_eq!(feed.calls(), 2);
        assert!(before.elapsed() >= Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_transient_failure_surfaces() {
        let feed = ScriptedFeed::new([
            Err(CalendarError::Transient("reset".into())),
            Err(CalendarError::Transient("reset again".into())),
            Ok(Vec::new()),
        ]);
        let source = source(feed.clone());

        let err = source.next_relevant_window(now()).await.unwrap_err();

        assert!(err.is_transient());
        assert_eq!(feed.calls(), 2);
    }

    #[tokio::test]
    async fn test_query_error_not_retried() {
        let feed = ScriptedFeed::new([Err(CalendarError::Query("notFound".into()))]);
        let source = source(feed.clone());

        let err = source.next_relevant_window(now()).await.unwrap_err();

        assert!(!err.is_transient());
        assert_eq!(feed.calls(), 1);
    }
}
