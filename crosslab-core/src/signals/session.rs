use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::CrossEvent;

/// Events partitioned by whether they fall in the evaluation session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionSplit {
    /// Every detected event, oldest first.
    pub historical: Vec<CrossEvent>,
    /// Events whose bar falls on the evaluation date.
    pub current_session: Vec<CrossEvent>,
}

/// Split events into the full history and the subset on `session_date`.
pub fn split_session(events: &[CrossEvent], session_date: NaiveDate) -> SessionSplit {
    let current_session = events
        .iter()
        .filter(|e| e.timestamp.date() == session_date)
        .copied()
        .collect();
    SessionSplit {
        historical: events.to_vec(),
        current_session,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Direction;

    fn event(day: u32, hour: u32) -> CrossEvent {
        CrossEvent {
            timestamp: NaiveDate::from_ymd_opt(2025, 1, day)
                .unwrap()
                .and_hms_opt(hour, 0, 0)
                .unwrap(),
            price: 100.0,
            direction: Direction::Up,
            angle_degrees: 20.0,
            ema_fast: 100.0,
            ema_slow: 99.0,
        }
    }

    #[test]
    fn current_session_is_same_calendar_date() {
        let events = vec![event(2, 14), event(3, 9), event(3, 21)];
        let split = split_session(&events, NaiveDate::from_ymd_opt(2025, 1, 3).unwrap());
        assert_eq!(split.historical.len(), 3);
        assert_eq!(split.current_session.len(), 2);
        assert!(split
            .current_session
            .iter()
            .all(|e| e.timestamp.date().to_string() == "2025-01-03"));
    }

    #[test]
    fn no_events_today() {
        let split = split_session(&[event(2, 14)], NaiveDate::from_ymd_opt(2025, 1, 9).unwrap());
        assert!(split.current_session.is_empty());
    }
}
