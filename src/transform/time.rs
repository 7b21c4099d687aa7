//! Time dimension rows and timestamp rounding.

use super::events::PlayEvent;
use crate::warehouse::TimeRow;
use chrono::{DateTime, Utc};

/// Convert milliseconds since the epoch to an instant, rounding up to the next
/// whole second when there is a sub-second part.
///
/// Returns `None` when the result falls outside the representable range.
pub fn ceil_to_second(ts_ms: i64) -> Option<DateTime<Utc>> {
    let mut secs = ts_ms.div_euclid(1000);
    if ts_ms.rem_euclid(1000) > 0 {
        secs = secs.checked_add(1)?;
    }
    DateTime::from_timestamp(secs, 0)
}

/// One time row per playback event, in event order.
///
/// Events sharing the same start time produce identical rows; whether those
/// are collapsed is up to the sink.
pub fn build_time_rows(events: &[PlayEvent]) -> Vec<TimeRow> {
    events
        .iter()
        .map(|e| TimeRow::from_start_time(e.start_time))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::events::ActivityEvent;
    use chrono::TimeZone;

    #[test]
    fn test_exact_second_is_unchanged() {
        assert_eq!(
            ceil_to_second(1541990258000),
            Some(Utc.timestamp_opt(1541990258, 0).unwrap())
        );
    }

    #[test]
    fn test_sub_second_rounds_up() {
        let next = Some(Utc.timestamp_opt(1541990259, 0).unwrap());
        assert_eq!(ceil_to_second(1541990258500), next);
        assert_eq!(ceil_to_second(1541990258001), next);
        assert_eq!(ceil_to_second(1541990258999), next);
    }

    #[test]
    fn test_negative_timestamps_round_towards_the_future() {
        assert_eq!(ceil_to_second(-1500), Some(Utc.timestamp_opt(-1, 0).unwrap()));
        assert_eq!(ceil_to_second(-1000), Some(Utc.timestamp_opt(-1, 0).unwrap()));
    }

    #[test]
    fn test_out_of_range_is_none() {
        assert_eq!(ceil_to_second(i64::MAX), None);
    }

    fn play_at(ts_ms: i64) -> PlayEvent {
        let event = ActivityEvent {
            action_type: Some("NextSong".to_string()),
            ts: Some(ts_ms),
            ..Default::default()
        };
        PlayEvent::try_from(event).unwrap()
    }

    #[test]
    fn test_one_row_per_event_without_dedup() {
        let events = vec![
            play_at(1541990258000),
            play_at(1541990258500),
            play_at(1541990258500),
        ];
        let rows = build_time_rows(&events);

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].start_time, Utc.timestamp_opt(1541990258, 0).unwrap());
        assert_eq!(rows[1].start_time, Utc.timestamp_opt(1541990259, 0).unwrap());
        assert_eq!(rows[1], rows[2]);
        assert_eq!(rows[0].weekday, "Monday");
    }
}
