use chrono::{DateTime, Local, NaiveDate};
use serde::{Deserialize, Serialize};

/// Milliseconds, signed. Negative values mean the deadline has passed.
pub type Millis = i64;

pub const UNTITLED_TASK: &str = "Untitled task";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub name: String,
    pub description: String,
    pub priority: String,
    pub deadline: Option<NaiveDate>,
    pub completed: bool,
    /// Derived on every tick; `0` when completed or without a deadline.
    pub time_left: Millis,
    /// Derived on every tick.
    pub is_urgent: bool,
}

impl Task {
    pub fn new(
        name: String,
        description: String,
        priority: String,
        deadline: Option<NaiveDate>,
    ) -> Self {
        Self::with_id(new_task_id(), name, description, priority, deadline)
    }

    pub fn with_id(
        id: String,
        name: String,
        description: String,
        priority: String,
        deadline: Option<NaiveDate>,
    ) -> Self {
        Self {
            id,
            name,
            description,
            priority,
            deadline,
            completed: false,
            time_left: 0,
            is_urgent: false,
        }
    }

    pub fn priority_rank(&self) -> u8 {
        priority_rank(&self.priority)
    }
}

pub fn new_task_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// `high` > `medium` > `low` > anything else, compared case-insensitively.
pub fn priority_rank(priority: &str) -> u8 {
    match priority.trim().to_lowercase().as_str() {
        "high" => 3,
        "medium" => 2,
        "low" => 1,
        _ => 0,
    }
}

/// Accepts a calendar date (`2024-05-01`, what a date input submits) or an RFC 3339
/// timestamp, which is reduced to its local calendar date. Blank input means no deadline.
pub fn parse_deadline(raw: &str) -> Result<Option<NaiveDate>, chrono::ParseError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        Ok(date) => Ok(Some(date)),
        Err(_) => DateTime::parse_from_rfc3339(raw)
            .map(|dt| Some(dt.with_timezone(&Local).date_naive())),
    }
}

/// Persisted shape of a task. Every field is optional on read so that hand-edited or
/// older documents still load; `time_left` is written for reference only.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskRecord {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub deadline: Option<String>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_left: Option<Millis>,
}

impl From<&Task> for TaskRecord {
    fn from(task: &Task) -> Self {
        Self {
            id: Some(task.id.clone()),
            name: Some(task.name.clone()),
            description: Some(task.description.clone()),
            priority: Some(task.priority.clone()),
            deadline: Some(
                task.deadline
                    .map(|date| date.format("%Y-%m-%d").to_string())
                    .unwrap_or_default(),
            ),
            completed: task.completed,
            time_left: Some(task.time_left),
        }
    }
}

impl TaskRecord {
    /// Rebuilds a task with empty derived fields; the caller recomputes them.
    pub fn into_task(self) -> Task {
        let id = self
            .id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(new_task_id);
        let deadline = match self.deadline.as_deref().map(parse_deadline) {
            None => None,
            Some(Ok(date)) => date,
            Some(Err(error)) => {
                log::warn!("dropping unreadable deadline task_id={id} error={error}");
                None
            }
        };
        let mut task = Task::with_id(
            id,
            self.name
                .filter(|name| !name.trim().is_empty())
                .unwrap_or_else(|| UNTITLED_TASK.to_string()),
            self.description.unwrap_or_default(),
            self.priority.unwrap_or_default(),
            deadline,
        );
        task.completed = self.completed;
        task
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StreakRecord {
    pub last_completed_date: Option<NaiveDate>,
    pub streak_count: u32,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct Settings {
    #[serde(default = "default_urgency_window_minutes")]
    pub urgency_window_minutes: u32,
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            urgency_window_minutes: default_urgency_window_minutes(),
            tick_interval_ms: default_tick_interval_ms(),
        }
    }
}

impl Settings {
    pub fn urgency_window(&self) -> chrono::Duration {
        chrono::Duration::minutes(i64::from(self.urgency_window_minutes))
    }

    pub fn tick_interval(&self) -> std::time::Duration {
        // A zero period would make tokio's interval panic.
        std::time::Duration::from_millis(self.tick_interval_ms.max(1))
    }
}

fn default_urgency_window_minutes() -> u32 {
    24 * 60
}

fn default_tick_interval_ms() -> u64 {
    1000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_rank_is_case_insensitive_and_defaults_to_zero() {
        assert_eq!(priority_rank("High"), 3);
        assert_eq!(priority_rank(" medium "), 2);
        assert_eq!(priority_rank("LOW"), 1);
        assert_eq!(priority_rank(""), 0);
        assert_eq!(priority_rank("urgent"), 0);
    }

    #[test]
    fn new_task_starts_incomplete_with_fresh_id() {
        let a = Task::new("a".into(), String::new(), "low".into(), None);
        let b = Task::new("b".into(), String::new(), "low".into(), None);
        assert!(!a.completed);
        assert!(!a.is_urgent);
        assert_eq!(a.time_left, 0);
        assert_ne!(a.id, b.id);
        assert!(uuid::Uuid::parse_str(&a.id).is_ok());
    }

    #[test]
    fn parse_deadline_accepts_dates_and_rfc3339() {
        assert_eq!(parse_deadline("").unwrap(), None);
        assert_eq!(parse_deadline("   ").unwrap(), None);
        assert_eq!(
            parse_deadline("2024-05-01").unwrap(),
            NaiveDate::from_ymd_opt(2024, 5, 1)
        );
        let expected = DateTime::parse_from_rfc3339("2024-05-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Local)
            .date_naive();
        assert_eq!(
            parse_deadline("2024-05-01T12:00:00Z").unwrap(),
            Some(expected)
        );
        assert!(parse_deadline("next tuesday").is_err());
        assert!(parse_deadline("2024-13-40").is_err());
    }

    #[test]
    fn task_record_uses_camel_case_layout() {
        let mut task = Task::with_id(
            "t1".into(),
            "Pay rent".into(),
            "".into(),
            "High".into(),
            NaiveDate::from_ymd_opt(2024, 5, 1),
        );
        task.time_left = 42;
        task.is_urgent = true;
        let value = serde_json::to_value(TaskRecord::from(&task)).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "id": "t1",
                "name": "Pay rent",
                "description": "",
                "priority": "High",
                "deadline": "2024-05-01",
                "completed": false,
                "timeLeft": 42
            })
        );
    }

    #[test]
    fn task_record_fills_missing_fields_on_load() {
        let record: TaskRecord = serde_json::from_str(r#"{ "deadline": "soon" }"#).unwrap();
        let task = record.into_task();
        assert!(!task.id.is_empty());
        assert_eq!(task.name, UNTITLED_TASK);
        assert_eq!(task.description, "");
        assert_eq!(task.priority, "");
        assert_eq!(task.deadline, None);
        assert!(!task.completed);
    }

    #[test]
    fn task_record_ignores_persisted_derived_values() {
        let record: TaskRecord = serde_json::from_str(
            r#"{ "id": "x", "name": "n", "deadline": "", "completed": true, "timeLeft": 99999 }"#,
        )
        .unwrap();
        let task = record.into_task();
        assert_eq!(task.id, "x");
        assert!(task.completed);
        assert_eq!(task.time_left, 0);
        assert!(!task.is_urgent);
    }

    #[test]
    fn streak_record_serializes_with_iso_dates() {
        let record = StreakRecord {
            last_completed_date: NaiveDate::from_ymd_opt(2024, 1, 2),
            streak_count: 3,
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(
            value,
            serde_json::json!({ "lastCompletedDate": "2024-01-02", "streakCount": 3 })
        );
        let empty: StreakRecord =
            serde_json::from_str(r#"{ "lastCompletedDate": null, "streakCount": 0 }"#).unwrap();
        assert_eq!(empty, StreakRecord::default());
    }

    #[test]
    fn theme_toggles_and_serializes_lowercase() {
        assert_eq!(Theme::default(), Theme::Light);
        assert_eq!(Theme::Light.toggled(), Theme::Dark);
        assert_eq!(Theme::Dark.toggled(), Theme::Light);
        assert_eq!(serde_json::to_value(Theme::Dark).unwrap(), "dark");
    }

    #[test]
    fn settings_serde_applies_defaults_for_missing_fields() {
        let settings: Settings = serde_json::from_str("{}").expect("settings should deserialize");
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.urgency_window(), chrono::Duration::hours(24));
        assert_eq!(settings.tick_interval(), std::time::Duration::from_secs(1));

        let settings: Settings =
            serde_json::from_str(r#"{ "urgency_window_minutes": 180, "tick_interval_ms": 0 }"#)
                .unwrap();
        assert_eq!(settings.urgency_window(), chrono::Duration::hours(3));
        assert_eq!(settings.tick_interval(), std::time::Duration::from_millis(1));
    }
}
