use std::collections::HashSet;
use std::sync::Arc;

use chrono::Duration;

use crate::error::{HandlerError, StorageError, TaskError};
use crate::events::{EventBus, EVENT_TASK_COMPLETED, EVENT_URGENT};
use crate::models::{new_task_id, parse_deadline, Task, TaskRecord};
use crate::storage::TaskPersistence;
use crate::urgency::{recompute_all, refresh, Clock};

/// Owns the task list. Every mutation goes through here, is saved before returning and
/// leaves the derived fields current.
pub struct TaskStore {
    tasks: Vec<Task>,
    persistence: Box<dyn TaskPersistence>,
    bus: EventBus<Task>,
    clock: Arc<dyn Clock>,
    urgency_window: Duration,
    /// Ids already reported through `onUrgent` while inside the window.
    announced: HashSet<String>,
    /// The last save failed; the persisted list is behind the in-memory one.
    dirty: bool,
}

impl TaskStore {
    pub fn new(
        persistence: Box<dyn TaskPersistence>,
        clock: Arc<dyn Clock>,
        urgency_window: Duration,
    ) -> Self {
        Self {
            tasks: Vec::new(),
            persistence,
            bus: EventBus::new(),
            clock,
            urgency_window,
            announced: HashSet::new(),
            dirty: false,
        }
    }

    /// Builds a store from whatever `persistence` holds. A failed load leaves it empty.
    pub fn load(
        persistence: Box<dyn TaskPersistence>,
        clock: Arc<dyn Clock>,
        urgency_window: Duration,
    ) -> Self {
        let mut store = Self::new(persistence, clock, urgency_window);
        store.reload();
        store
    }

    /// Replaces the in-memory list with the persisted one. Urgent tasks that have not been
    /// reported yet are announced on the next tick.
    pub fn reload(&mut self) {
        let records = match self.persistence.load_tasks() {
            Ok(records) => records,
            Err(error) if error.is_missing() => Vec::new(),
            Err(error) => {
                log::warn!("task list unreadable, starting empty error={error}");
                Vec::new()
            }
        };
        let mut seen = HashSet::new();
        self.tasks = records
            .into_iter()
            .map(|record| {
                let mut task = record.into_task();
                if !seen.insert(task.id.clone()) {
                    let fresh = new_task_id();
                    log::warn!("duplicate task id={} reassigned to {fresh}", task.id);
                    task.id = fresh.clone();
                    seen.insert(fresh);
                }
                task
            })
            .collect();
        let now = self.clock.now();
        for task in &mut self.tasks {
            refresh(task, &now, self.urgency_window);
        }
        self.announced.retain(|id| seen.contains(id));
        self.dirty = false;
        log::info!("tasks loaded count={}", self.tasks.len());
    }

    pub fn subscribe<F>(&mut self, event: &str, handler: F)
    where
        F: Fn(&Task) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        self.bus.subscribe(event, handler);
        log::debug!(
            "handler subscribed event={event} handlers={}",
            self.bus.handler_count(event)
        );
    }

    pub fn urgency_window(&self) -> Duration {
        self.urgency_window
    }

    pub fn create(
        &mut self,
        name: &str,
        description: &str,
        priority: &str,
        deadline: &str,
    ) -> Result<Task, TaskError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(TaskError::Validation("task name is required".to_string()));
        }
        let deadline = parse_deadline(deadline).map_err(|error| {
            TaskError::Validation(format!(
                "deadline {:?} is not a date: {error}",
                deadline.trim()
            ))
        })?;

        let mut task = Task::new(
            name.to_string(),
            description.trim().to_string(),
            priority.trim().to_string(),
            deadline,
        );
        refresh(&mut task, &self.clock.now(), self.urgency_window);
        self.tasks.push(task.clone());
        log::info!("task created id={} deadline={:?}", task.id, task.deadline);
        self.save()?;
        Ok(task)
    }

    /// Marks the task done. Completing a completed task changes nothing and returns it.
    pub fn complete(&mut self, id: &str) -> Result<Task, TaskError> {
        let task = self
            .tasks
            .iter_mut()
            .find(|task| task.id == id)
            .ok_or_else(|| TaskError::NotFound(id.to_string()))?;
        if task.completed {
            let task = task.clone();
            self.flush()?;
            return Ok(task);
        }
        task.completed = true;
        task.time_left = 0;
        task.is_urgent = false;
        let completed = task.clone();
        log::info!("task completed id={id}");

        let saved = self.save();
        self.bus.publish(EVENT_TASK_COMPLETED, &completed);
        saved?;
        Ok(completed)
    }

    /// Returns whether a task was removed. Unknown ids are not an error.
    pub fn remove(&mut self, id: &str) -> Result<bool, TaskError> {
        let before = self.tasks.len();
        self.tasks.retain(|task| task.id != id);
        if self.tasks.len() == before {
            self.flush()?;
            return Ok(false);
        }
        self.announced.remove(id);
        log::info!("task removed id={id}");
        self.save()?;
        Ok(true)
    }

    /// Snapshot in insertion order.
    pub fn all(&self) -> Vec<Task> {
        self.tasks.clone()
    }

    pub fn find_by_id(&self, id: &str) -> Option<Task> {
        self.tasks.iter().find(|task| task.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Saves again if an earlier save failed. A no-op when the persisted list is current.
    pub fn flush(&mut self) -> Result<(), TaskError> {
        if self.dirty {
            log::info!("retrying failed task save");
            self.save()?;
        }
        Ok(())
    }

    /// Recomputes every task against the clock and publishes `onUrgent` for each urgent
    /// task not reported yet, including tasks that were urgent from the moment they were
    /// created or loaded. Ticks do not save.
    pub fn tick(&mut self) -> Vec<Task> {
        let now = self.clock.now();
        let crossed = recompute_all(
            &mut self.tasks,
            &now,
            self.urgency_window,
            &mut self.announced,
        );
        for task in &crossed {
            log::info!(
                "task became urgent id={} time_left_ms={}",
                task.id,
                task.time_left
            );
            self.bus.publish(EVENT_URGENT, task);
        }
        crossed
    }

    fn save(&mut self) -> Result<(), StorageError> {
        let records: Vec<TaskRecord> = self.tasks.iter().map(TaskRecord::from).collect();
        match self.persistence.save_tasks(&records) {
            Ok(()) => {
                self.dirty = false;
                log::debug!("tasks saved count={}", records.len());
                Ok(())
            }
            Err(error) => {
                self.dirty = true;
                log::warn!("saving tasks failed, keeping in-memory state error={error}");
                Err(error)
            }
        }
    }
}
