use std::cmp::Reverse;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::Task;

/// Priority filter value that keeps every task.
pub const ALL_PRIORITIES: &str = "all";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    None,
    Deadline,
    Priority,
}

impl SortKey {
    /// Unrecognized keys mean "keep input order".
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "deadline" => SortKey::Deadline,
            "priority" => SortKey::Priority,
            _ => SortKey::None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusFilter {
    #[default]
    All,
    Completed,
    Active,
}

impl StatusFilter {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "completed" => StatusFilter::Completed,
            "active" => StatusFilter::Active,
            _ => StatusFilter::All,
        }
    }

    fn keeps(self, task: &Task) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Completed => task.completed,
            StatusFilter::Active => !task.completed,
        }
    }
}

/// Stable sort into a new list; the input is left untouched.
pub fn sort_by(tasks: &[Task], key: SortKey) -> Vec<Task> {
    let mut sorted = tasks.to_vec();
    match key {
        SortKey::None => {}
        // Undated tasks go after every real date.
        SortKey::Deadline => {
            sorted.sort_by_key(|task| task.deadline.unwrap_or(NaiveDate::MAX))
        }
        SortKey::Priority => sorted.sort_by_key(|task| Reverse(task.priority_rank())),
    }
    sorted
}

/// `priority` of `None`, blank or `"all"` keeps every priority.
pub fn filter(tasks: &[Task], priority: Option<&str>, status: StatusFilter) -> Vec<Task> {
    let wanted = priority
        .map(|p| p.trim().to_lowercase())
        .filter(|p| !p.is_empty() && p != ALL_PRIORITIES);
    tasks
        .iter()
        .filter(|task| match &wanted {
            Some(p) => task.priority.trim().to_lowercase() == *p,
            None => true,
        })
        .filter(|task| status.keeps(task))
        .cloned()
        .collect()
}

/// The list controls as the renderer submits them: raw select values, any may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ViewQuery {
    #[serde(default)]
    pub sort: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

impl ViewQuery {
    pub fn sort_key(&self) -> SortKey {
        self.sort.as_deref().map(SortKey::parse).unwrap_or_default()
    }

    pub fn status_filter(&self) -> StatusFilter {
        self.status
            .as_deref()
            .map(StatusFilter::parse)
            .unwrap_or_default()
    }

    /// Whether any control differs from the plain insertion-order list.
    pub fn is_active(&self) -> bool {
        [&self.sort, &self.priority, &self.status]
            .iter()
            .any(|value| value.as_deref().is_some_and(|v| !v.trim().is_empty()))
    }

    /// Filter first, then sort.
    pub fn apply(&self, tasks: &[Task]) -> Vec<Task> {
        let filtered = filter(tasks, self.priority.as_deref(), self.status_filter());
        sort_by(&filtered, self.sort_key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_task(
        id: &str,
        priority: &str,
        deadline: Option<(i32, u32, u32)>,
        done: bool,
    ) -> Task {
        let mut task = Task::with_id(
            id.to_string(),
            format!("task-{id}"),
            String::new(),
            priority.to_string(),
            deadline.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d)),
        );
        task.completed = done;
        task
    }

    fn ids(tasks: &[Task]) -> Vec<&str> {
        tasks.iter().map(|t| t.id.as_str()).collect()
    }

    fn sample() -> Vec<Task> {
        vec![
            make_task("a", "Low", None, false),
            make_task("b", "high", Some((2024, 3, 1)), true),
            make_task("c", "", Some((2024, 1, 1)), false),
            make_task("d", "Medium", Some((2024, 3, 1)), false),
            make_task("e", "HIGH", None, false),
        ]
    }

    #[test]
    fn sort_by_deadline_puts_undated_last_and_keeps_ties_stable() {
        let tasks = sample();
        assert_eq!(ids(&sort_by(&tasks, SortKey::Deadline)), vec!["c", "b", "d", "a", "e"]);
    }

    #[test]
    fn sort_by_priority_is_descending_and_stable() {
        let tasks = sample();
        let once = sort_by(&tasks, SortKey::Priority);
        assert_eq!(ids(&once), vec!["b", "e", "d", "a", "c"]);
        assert_eq!(sort_by(&once, SortKey::Priority), once);
    }

    #[test]
    fn unrecognized_sort_key_keeps_input_order() {
        let tasks = sample();
        assert_eq!(SortKey::parse("colour"), SortKey::None);
        assert_eq!(SortKey::parse(" Deadline "), SortKey::Deadline);
        assert_eq!(sort_by(&tasks, SortKey::parse("colour")), tasks);
    }

    #[test]
    fn sorting_never_touches_the_input() {
        let tasks = sample();
        let before = tasks.clone();
        let _ = sort_by(&tasks, SortKey::Priority);
        let _ = filter(&tasks, Some("high"), StatusFilter::Active);
        assert_eq!(tasks, before);
    }

    #[test]
    fn filter_matches_priority_case_insensitively() {
        let tasks = sample();
        assert_eq!(ids(&filter(&tasks, Some("High"), StatusFilter::All)), vec!["b", "e"]);
        assert_eq!(ids(&filter(&tasks, Some("all"), StatusFilter::All)).len(), 5);
        assert_eq!(ids(&filter(&tasks, Some(""), StatusFilter::All)).len(), 5);
        assert_eq!(ids(&filter(&tasks, None, StatusFilter::All)).len(), 5);
        assert!(filter(&tasks, Some("urgent"), StatusFilter::All).is_empty());
    }

    #[test]
    fn filter_by_status() {
        let tasks = sample();
        assert_eq!(ids(&filter(&tasks, None, StatusFilter::Completed)), vec!["b"]);
        assert_eq!(
            ids(&filter(&tasks, None, StatusFilter::Active)),
            vec!["a", "c", "d", "e"]
        );
        assert_eq!(StatusFilter::parse("whatever"), StatusFilter::All);
        assert_eq!(StatusFilter::parse("ACTIVE"), StatusFilter::Active);
    }

    #[test]
    fn filter_is_idempotent() {
        let tasks = sample();
        for status in [StatusFilter::All, StatusFilter::Active, StatusFilter::Completed] {
            for priority in [None, Some("high"), Some("low"), Some("all")] {
                let once = filter(&tasks, priority, status);
                assert_eq!(filter(&once, priority, status), once);
            }
        }
    }

    #[test]
    fn view_query_filters_before_sorting() {
        let tasks = sample();
        let query = ViewQuery {
            sort: Some("deadline".into()),
            priority: None,
            status: Some("active".into()),
        };
        assert!(query.is_active());
        assert_eq!(ids(&query.apply(&tasks)), vec!["c", "d", "a", "e"]);

        let idle = ViewQuery {
            sort: Some(" ".into()),
            ..ViewQuery::default()
        };
        assert!(!idle.is_active());
        assert_eq!(idle.apply(&tasks), tasks);
    }

    #[test]
    fn view_query_deserializes_missing_controls() {
        let query: ViewQuery = serde_json::from_str(r#"{ "priority": "low" }"#).unwrap();
        assert_eq!(query.sort_key(), SortKey::None);
        assert_eq!(query.status_filter(), StatusFilter::All);
        assert_eq!(ids(&query.apply(&sample())), vec!["a"]);
    }
}
