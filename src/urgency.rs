use std::collections::HashSet;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Local, LocalResult, NaiveDate, NaiveTime, TimeZone};
use serde::Serialize;

use crate::models::{Millis, Task};

const DAY_MS: Millis = 24 * 60 * 60 * 1000;
const HOUR_MS: Millis = 60 * 60 * 1000;
const MINUTE_MS: Millis = 60 * 1000;

/// Source of wall-clock time for the store and the scheduler.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Local>>,
}

impl ManualClock {
    pub fn new(now: DateTime<Local>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: DateTime<Local>) {
        *self.now.lock().expect("clock poisoned") = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut guard = self.now.lock().expect("clock poisoned");
        *guard += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Local> {
        *self.now.lock().expect("clock poisoned")
    }
}

/// The last millisecond of `date` in `tz`.
pub fn end_of_day<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> DateTime<Tz> {
    let naive = date
        .and_hms_milli_opt(23, 59, 59, 999)
        .unwrap_or_else(|| date.and_time(NaiveTime::MIN));
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => dt,
        LocalResult::Ambiguous(_, latest) => latest,
        LocalResult::None => tz.from_utc_datetime(&naive),
    }
}

/// Milliseconds from `now` until the end of the deadline day, negative once it has passed.
pub fn time_left<Tz: TimeZone>(deadline: NaiveDate, now: &DateTime<Tz>) -> Millis {
    end_of_day(deadline, &now.timezone())
        .signed_duration_since(now.clone())
        .num_milliseconds()
}

pub fn is_urgent(time_left: Millis, window: Duration) -> bool {
    time_left > 0 && time_left <= window.num_milliseconds()
}

/// Recomputes `time_left`/`is_urgent` in place.
pub fn refresh<Tz: TimeZone>(task: &mut Task, now: &DateTime<Tz>, window: Duration) {
    match task.deadline {
        Some(deadline) if !task.completed => {
            task.time_left = time_left(deadline, now);
            task.is_urgent = is_urgent(task.time_left, window);
        }
        _ => {
            task.time_left = 0;
            task.is_urgent = false;
        }
    }
}

/// One tick over the whole list. Returns snapshots of the urgent tasks whose ids were not
/// yet in `announced`, and records them there. Tasks outside the window leave `announced`,
/// so a task that re-enters the window is reported again.
///
/// `announced` is separate from `is_urgent`: a task that is urgent straight away on
/// create or load has not been reported yet.
pub fn recompute_all<Tz: TimeZone>(
    tasks: &mut [Task],
    now: &DateTime<Tz>,
    window: Duration,
    announced: &mut HashSet<String>,
) -> Vec<Task> {
    let mut crossed = Vec::new();
    for task in tasks.iter_mut() {
        refresh(task, now, window);
        if !task.is_urgent {
            announced.remove(&task.id);
        } else if announced.insert(task.id.clone()) {
            crossed.push(task.clone());
        }
    }
    crossed
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DisplayState {
    Completed,
    NoDeadline,
    Urgent,
    Counting { time_left: Millis },
    Overdue,
}

impl DisplayState {
    pub fn label(&self) -> String {
        match self {
            DisplayState::Completed => "Completed".to_string(),
            DisplayState::NoDeadline => "No deadline".to_string(),
            DisplayState::Urgent => "Deadline approaching!".to_string(),
            DisplayState::Counting { time_left } => format_countdown(*time_left),
            DisplayState::Overdue => "OVERDUE!".to_string(),
        }
    }
}

pub fn display_state(task: &Task) -> DisplayState {
    if task.completed {
        DisplayState::Completed
    } else if task.deadline.is_none() {
        DisplayState::NoDeadline
    } else if task.is_urgent {
        DisplayState::Urgent
    } else if task.time_left > 0 {
        DisplayState::Counting {
            time_left: task.time_left,
        }
    } else {
        DisplayState::Overdue
    }
}

/// `1d 2h 3m 4s`, or `2h 3m 4s` under a day.
pub fn format_countdown(time_left: Millis) -> String {
    let time_left = time_left.max(0);
    let days = time_left / DAY_MS;
    let hours = time_left % DAY_MS / HOUR_MS;
    let minutes = time_left % HOUR_MS / MINUTE_MS;
    let seconds = time_left % MINUTE_MS / 1000;
    if days > 0 {
        format!("{days}d {hours}h {minutes}m {seconds}s")
    } else {
        format!("{hours}h {minutes}m {seconds}s")
    }
}
