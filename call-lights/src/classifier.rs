//! Maps a calendar window to a lighting mode.
//!
//! Pure functions of `(window, now, lead_time)`: the result never depends on
//! the previous mode, so a restarted daemon lands on the same decision.

use chrono::{DateTime, TimeDelta, Utc};
use shared::models::{CalendarWindow, Mode};

/// The two conditions that put the lights into call mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Assessment {
    pub starting_soon: bool,
    pub in_progress: bool,
}

impl Assessment {
    pub fn mode(&self) -> Mode {
        if self.starting_soon || self.in_progress {
            Mode::ActiveCall
        } else {
            Mode::Ambient
        }
    }
}

pub fn assess(window: Option<&CalendarWindow>, now: DateTime<Utc>, lead_time: TimeDelta) -> Assessment {
    let Some(window) = window else {
        return Assessment::default();
    };

    let horizon = now + lead_time;

    Assessment {
        starting_soon: now < window.start && window.start < horizon,
        // An event starting exactly now counts as running
        in_progress: window.start <= now && now < window.end,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 6, 10, 0, 0).unwrap()
    }

    fn window(start_min: i64, end_min: i64) -> CalendarWindow {
        CalendarWindow::new(
            now() + TimeDelta::minutes(start_min),
            now() + TimeDelta::minutes(end_min),
        )
    }

    fn classify(window: Option<&CalendarWindow>, now: DateTime<Utc>, lead_time: TimeDelta) -> Mode {
        assess(window, now, lead_time).mode()
    }

    fn lead() -> TimeDelta {
        TimeDelta::minutes(5)
    }

    #[test]
    fn test_no_window_is_ambient() {
        for lead_min in [0, 1, 5, 60] {
            assert_eq!(
                classify(None, now(), TimeDelta::minutes(lead_min)),
                Mode::Ambient
            );
        }
    }

    #[test]
    fn test_event_within_lead_time_is_active() {
        let w = window(2, 62);
        assert_eq!(classify(Some(&w), now(), lead()), Mode::ActiveCall);
        assert_eq!(
            assess(Some(&w), now(), lead()),
            Assessment {
                starting_soon: true,
                in_progress: false
            }
        );
    }

    #[test]
    fn test_event_beyond_lead_time_is_ambient() {
        assert_eq!(classify(Some(&window(10, 70)), now(), lead()), Mode::Ambient);
    }

    #[test]
    fn test_running_event_is_active_regardless_of_lead() {
        let w = window(-30, 30);
        for lead_min in [0, 5, 120] {
            assert_eq!(
                classify(Some(&w), now(), TimeDelta::minutes(lead_min)),
                Mode::ActiveCall
            );
        }
    }

    #[test]
    fn test_finished_event_is_ambient() {
        assert_eq!(classify(Some(&window(-60, -1)), now(), lead()), Mode::Ambient);
        // end is exclusive
        assert_eq!(classify(Some(&window(-60, 0)), now(), lead()), Mode::Ambient);
    }

    #[test]
    fn test_lead_time_boundary_is_exclusive() {
        assert_eq!(classify(Some(&window(5, 65)), now(), lead()), Mode::Ambient);

        let just_inside = CalendarWindow::new(
            now() + lead() - TimeDelta::seconds(1),
            now() + TimeDelta::hours(1),
        );
        assert_eq!(classify(Some(&just_inside), now(), lead()), Mode::ActiveCall);
    }

    #[test]
    fn test_event_starting_now_is_in_progress() {
        let w = window(0, 30);
        let assessment = assess(Some(&w), now(), lead());
        assert!(assessment.in_progress);
        assert!(!assessment.starting_soon);
        assert_eq!(assessment.mode(), Mode::ActiveCall);
    }

    #[test]
    fn test_classification_ignores_history() {
        let w = window(2, 62);
        let first = classify(Some(&w), now(), lead());
        let _ = classify(None, now(), lead());
        assert_eq!(classify(Some(&w), now(), lead()), first);
    }
}
