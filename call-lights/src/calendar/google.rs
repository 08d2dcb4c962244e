//! Google Calendar implementation of the event feed.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use google_calendar3::api::{Event, EventDateTime, Scope};
use google_calendar3::hyper_rustls::HttpsConnector;
use google_calendar3::yup_oauth2::{InstalledFlowAuthenticator, InstalledFlowReturnMethod};
use google_calendar3::CalendarHub;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use shared::models::{CalendarEntry, EventTime};

use super::CalendarFeed;
use crate::config::CalendarSettings;
use crate::error::{CalendarError, CredentialError};

const CALENDAR_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/calendar.readonly";

pub type Hub = CalendarHub<HttpsConnector<HttpConnector>>;

/// Build a calendar hub with a usable OAuth session.
///
/// Runs the installed-application flow when the token cache is empty or can
/// no longer be refreshed, and asks for a token up front so that a broken
/// session fails here instead of inside the polling loop.
pub async fn authorized_calendar_hub(settings: &CalendarSettings) -> Result<Hub, CredentialError> {
    let secret = google_calendar3::yup_oauth2::read_application_secret(&settings.credentials_path)
        .await
        .map_err(CredentialError::Secret)?;

    let auth = InstalledFlowAuthenticator::builder(secret, InstalledFlowReturnMethod::HTTPRedirect)
        .persist_tokens_to_disk(settings.token_cache_path.clone())
        .build()
        .await
        .map_err(CredentialError::Authenticator)?;

    auth.token(&[CALENDAR_READONLY_SCOPE])
        .await
        .map_err(CredentialError::Token)?;

    tracing::info!(
        "Calendar session ready (token cache: {})",
        settings.token_cache_path.display()
    );

    let connector = google_calendar3::hyper_rustls::HttpsConnectorBuilder::new()
        .with_native_roots()
        .map_err(CredentialError::Tls)?
        .https_or_http()
        .enable_http1()
        .build();

    let client = Client::builder(TokioExecutor::new()).build(connector);
    Ok(CalendarHub::new(client, auth))
}

/// Upcoming events of a single calendar
pub struct GoogleCalendarFeed {
    hub: Hub,
    calendar_id: String,
}

impl GoogleCalendarFeed {
    pub fn new(hub: Hub, calendar_id: impl Into<String>) -> Self {
        Self {
            hub,
            calendar_id: calendar_id.into(),
        }
    }
}

#[async_trait]
impl CalendarFeed for GoogleCalendarFeed {
    async fn upcoming(
        &self,
        time_min: DateTime<Utc>,
        max_results: u32,
    ) -> Result<Vec<CalendarEntry>, CalendarError> {
        let (_, events) = self
            .hub
            .events()
            .list(&self.calendar_id)
            .time_min(time_min)
            .max_results(i32::try_from(max_results).unwrap_or(i32::MAX))
            .single_events(true)
            .order_by("startTime")
            .add_scope(Scope::Readonly)
            .doit()
            .await?;

        let items = events.items.unwrap_or_default();
        tracing::debug!("Calendar returned {} events", items.len());

        Ok(items.into_iter().filter_map(entry_from_event).collect())
    }
}

fn event_time(time: Option<EventDateTime>) -> Option<EventTime> {
    let time = time?;
    match (time.date_time, time.date) {
        (Some(at), _) => Some(EventTime::Timed(at)),
        (None, Some(day)) => Some(EventTime::AllDay(day)),
        (None, None) => None,
    }
}

/// Normalize a Google event, dropping records with no usable start or end
pub fn entry_from_event(event: Event) -> Option<CalendarEntry> {
    let start = event_time(event.start);
    let end = event_time(event.end);

    match (start, end) {
        (Some(start), Some(end)) => Some(CalendarEntry {
            summary: event.summary,
            start,
            end,
        }),
        _ => {
            tracing::warn!("Skipping malformed event {:?}", event.id);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};

    fn timed(at: DateTime<Utc>) -> Option<EventDateTime> {
        Some(EventDateTime {
            date_time: Some(at),
            ..Default::default()
        })
    }

    #[test]
    fn test_timed_event_normalized() {
        let start = Utc.with_ymd_and_hms(2024, 5, 6, 14, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 5, 6, 15, 0, 0).unwrap();
        let event = Event {
            summary: Some("Design review".to_string()),
            start: timed(start),
            end: timed(end),
            ..Default::default()
        };

        let entry = entry_from_event(event).expect("timed event should normalize");
        assert_eq!(entry.start, EventTime::Timed(start));
        assert_eq!(entry.end, EventTime::Timed(end));
        assert_eq!(entry.summary.as_deref(), Some("Design review"));
    }

    #[test]
    fn test_all_day_event_kept_as_all_day() {
        let day = NaiveDate::from_ymd_opt(2024, 5, 6).unwrap();
        let event = Event {
            start: Some(EventDateTime {
                date: Some(day),
                ..Default::default()
            }),
            end: Some(EventDateTime {
                date: day.succ_opt(),
                ..Default::default()
            }),
            ..Default::default()
        };

        let entry = entry_from_event(event).expect("all-day event should normalize");
        assert!(entry.is_all_day());
        assert_eq!(entry.window(), None);
    }

    #[test]
    fn test_event_without_times_dropped() {
        let event = Event {
            id: Some("broken".to_string()),
            ..Default::default()
        };
        assert!(entry_from_event(event).is_none());
    }
}
