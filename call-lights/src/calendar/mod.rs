//! Calendar side of the daemon: the raw event feed and the event source
//! that turns it into the next relevant window.

pub mod google;
pub mod source;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared::models::CalendarEntry;

use crate::error::CalendarError;

pub use google::GoogleCalendarFeed;
pub use source::EventSource;

/// Read-only query for upcoming events
#[async_trait]
pub trait CalendarFeed: Send + Sync {
    /// Events ending at or after `time_min`, ordered by start time
    async fn upcoming(
        &self,
        time_min: DateTime<Utc>,
        max_results: u32,
    ) -> Result<Vec<CalendarEntry>, CalendarError>;
}
