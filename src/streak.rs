use chrono::NaiveDate;

use crate::error::StorageError;
use crate::models::StreakRecord;
use crate::storage::Storage;

/// Counts `today` as a completion day. Same day: unchanged. Day after the last one: +1.
/// Anything else restarts at 1.
pub fn advance(streak: &StreakRecord, today: NaiveDate) -> StreakRecord {
    match streak.last_completed_date {
        Some(last) if last == today => streak.clone(),
        Some(last) if last.succ_opt() == Some(today) => StreakRecord {
            last_completed_date: Some(today),
            streak_count: streak.streak_count.saturating_add(1),
        },
        _ => StreakRecord {
            last_completed_date: Some(today),
            streak_count: 1,
        },
    }
}

/// Loads, advances and saves the streak. Unchanged streaks are not rewritten.
pub fn record_completion(
    storage: &Storage,
    today: NaiveDate,
) -> Result<StreakRecord, StorageError> {
    let current = storage.load_streak();
    let next = advance(&current, today);
    if next != current {
        storage.save_streak(&next)?;
        log::info!(
            "streak updated count={} last_completed_date={today}",
            next.streak_count
        );
    }
    Ok(next)
}
