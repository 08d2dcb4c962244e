use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Light identifier as numbered by the bridge
pub type LightId = u32;

/// Active interval of a single timed calendar event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl CalendarWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }
}

/// Lighting mode derived from the calendar every cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// No call imminent or in progress
    Ambient,
    /// A call starts within the lead time or is running
    ActiveCall,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Ambient => f.write_str("ambient"),
            Mode::ActiveCall => f.write_str("active-call"),
        }
    }
}

/// Start or end of a calendar event as reported by the calendar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventTime {
    /// Event with a time-of-day component
    Timed(DateTime<Utc>),
    /// Whole-day event
    AllDay(NaiveDate),
}

impl EventTime {
    pub fn instant(&self) -> Option<DateTime<Utc>> {
        match self {
            EventTime::Timed(at) => Some(*at),
            EventTime::AllDay(_) => None,
        }
    }
}

/// Raw upcoming event as returned by the calendar collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEntry {
    pub summary: Option<String>,
    pub start: EventTime,
    pub end: EventTime,
}

impl CalendarEntry {
    pub fn is_all_day(&self) -> bool {
        matches!(self.start, EventTime::AllDay(_))
    }

    /// Normalized window, present only when both ends are timed
    pub fn window(&self) -> Option<CalendarWindow> {
        Some(CalendarWindow::new(self.start.instant()?, self.end.instant()?))
    }
}
