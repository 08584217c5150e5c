use crate::domain::CrossEvent;

/// Merge event streams into one time-ordered stream, one event per timestamp.
///
/// Streams are concatenated in the order given, then stable-sorted by
/// timestamp. When two events share a timestamp, the one discovered first is
/// kept and the rest are dropped, whatever their direction.
pub fn merge_events<I>(streams: I) -> Vec<CrossEvent>
where
    I: IntoIterator,
    I::Item: IntoIterator<Item = CrossEvent>,
{
    let mut all: Vec<CrossEvent> = streams.into_iter().flatten().collect();
    all.sort_by_key(|e| e.timestamp);
    all.dedup_by_key(|e| e.timestamp);
    all
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Direction;
    use chrono::NaiveDate;

    fn event(minute: u32, direction: Direction) -> CrossEvent {
        CrossEvent {
            timestamp: NaiveDate::from_ymd_opt(2025, 1, 2)
                .unwrap()
                .and_hms_opt(9, minute, 0)
                .unwrap(),
            price: 100.0,
            direction,
            angle_degrees: 0.0,
            ema_fast: 0.0,
            ema_slow: 0.0,
        }
    }

    #[test]
    fn duplicate_timestamp_keeps_first_discovered() {
        let golden = vec![event(5, Direction::Up), event(30, Direction::Up)];
        let death = vec![event(5, Direction::Down), event(10, Direction::Down)];
        let merged = merge_events([golden, death]);
        assert_eq!(merged.len(), 3);
        assert_eq!(merged[0].direction, Direction::Up);
        assert_eq!(merged[1].timestamp.format("%M").to_string(), "10");
        assert_eq!(merged[2].timestamp.format("%M").to_string(), "30");
    }

    #[test]
    fn discovery_order_decides_not_direction() {
        let merged = merge_events([vec![event(5, Direction::Down)], vec![event(5, Direction::Up)]]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].direction, Direction::Down);
    }
}
