//! User dimension rows.

use super::events::PlayEvent;
use crate::warehouse::UserRow;
use std::collections::HashSet;

/// One user row per distinct (user_id, first_name, last_name, gender, level)
/// tuple, in order of first occurrence.
///
/// Dedup is on the whole row: a user who switches level within the batch
/// yields one row per level.
pub fn build_user_rows(events: &[PlayEvent]) -> Vec<UserRow> {
    let mut seen = HashSet::new();
    events
        .iter()
        .map(|e| UserRow {
            user_id: e.event.user_id.clone(),
            first_name: e.event.first_name.clone(),
            last_name: e.event.last_name.clone(),
            gender: e.event.gender.clone(),
            level: e.event.level.clone(),
        })
        .filter(|row| seen.insert(row.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::events::ActivityEvent;

    fn play(user_id: &str, first_name: &str, level: &str, ts: i64) -> PlayEvent {
        PlayEvent::try_from(ActivityEvent {
            action_type: Some("NextSong".to_string()),
            ts: Some(ts),
            user_id: Some(user_id.to_string()),
            first_name: Some(first_name.to_string()),
            last_name: Some("Summers".to_string()),
            gender: Some("F".to_string()),
            level: Some(level.to_string()),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_exact_duplicates_are_removed() {
        let events = vec![
            play("8", "Kaylee", "free", 1000),
            play("8", "Kaylee", "free", 2000),
            play("10", "Sylvie", "free", 3000),
            play("8", "Kaylee", "free", 4000),
        ];

        let users = build_user_rows(&events);
        assert_eq!(users.len(), 2);
        assert_eq!(users[0].user_id.as_deref(), Some("8"));
        assert_eq!(users[1].user_id.as_deref(), Some("10"));
    }

    #[test]
    fn test_level_change_keeps_both_rows() {
        let events = vec![
            play("8", "Kaylee", "free", 1000),
            play("8", "Kaylee", "paid", 2000),
            play("8", "Kaylee", "free", 3000),
        ];

        let users = build_user_rows(&events);
        let levels: Vec<_> = users.iter().map(|u| u.level.as_deref()).collect();
        assert_eq!(levels, vec![Some("free"), Some("paid")]);
        assert!(users.iter().all(|u| u.user_id.as_deref() == Some("8")));
    }

    #[test]
    fn test_no_events_no_users() {
        assert!(build_user_rows(&[]).is_empty());
    }
}
