use crate::error::StorageError;
use crate::models::StreakRecord;
use crate::storage::Storage;

pub const SEVEN_DAY_BADGE: &str = "Seven day streak badge";
const SEVEN_DAY_STREAK: u32 = 7;

/// Rewards the streak has just earned.
pub fn earned(streak: &StreakRecord) -> Vec<&'static str> {
    let mut earned = Vec::new();
    if streak.streak_count == SEVEN_DAY_STREAK {
        earned.push(SEVEN_DAY_BADGE);
    }
    earned
}

/// Appends `reward` unless already present. Returns whether it was new.
pub fn grant(rewards: &mut Vec<String>, reward: &str) -> bool {
    if rewards.iter().any(|existing| existing == reward) {
        return false;
    }
    rewards.push(reward.to_string());
    true
}

/// Grants and persists whatever `streak` has earned. Returns the newly granted rewards.
pub fn check_rewards(
    storage: &Storage,
    streak: &StreakRecord,
) -> Result<Vec<String>, StorageError> {
    let mut rewards = storage.load_rewards();
    let granted: Vec<String> = earned(streak)
        .into_iter()
        .filter(|reward| grant(&mut rewards, reward))
        .map(str::to_string)
        .collect();
    if !granted.is_empty() {
        storage.save_rewards(&rewards)?;
        log::info!("rewards granted {granted:?}");
    }
    Ok(granted)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn streak(count: u32) -> StreakRecord {
        StreakRecord {
            last_completed_date: chrono::NaiveDate::from_ymd_opt(2024, 1, 7),
            streak_count: count,
        }
    }

    #[test]
    fn badge_is_earned_exactly_at_seven() {
        assert!(earned(&streak(6)).is_empty());
        assert_eq!(earned(&streak(7)), vec![SEVEN_DAY_BADGE]);
        assert!(earned(&streak(8)).is_empty());
    }

    #[test]
    fn grant_never_duplicates() {
        let mut rewards = Vec::new();
        assert!(grant(&mut rewards, SEVEN_DAY_BADGE));
        assert!(!grant(&mut rewards, SEVEN_DAY_BADGE));
        assert_eq!(rewards, vec![SEVEN_DAY_BADGE]);
    }

    #[test]
    fn check_rewards_appends_once_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::new(dir.path().to_path_buf());
        storage.ensure_dirs().unwrap();
        storage.save_rewards(&["Early bird".to_string()]).unwrap();

        assert!(check_rewards(&storage, &streak(3)).unwrap().is_empty());
        assert_eq!(
            check_rewards(&storage, &streak(7)).unwrap(),
            vec![SEVEN_DAY_BADGE]
        );
        assert!(check_rewards(&storage, &streak(7)).unwrap().is_empty());
        assert_eq!(storage.load_rewards(), vec!["Early bird", SEVEN_DAY_BADGE]);
    }
}
