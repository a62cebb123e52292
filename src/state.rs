use std::sync::{Arc, Mutex};

use crate::error::{StorageError, TaskError};
use crate::models::{Settings, StreakRecord, Task, Theme};
use crate::storage::Storage;
use crate::store::TaskStore;

/// Shared handle to the one authoritative store and the data directory it was opened on. The lock serializes scheduler ticks
/// against user mutations, so a tick never sees a half-applied change.
///
/// Event handlers run while the lock is held and must not call back into `AppState`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<Mutex<AppData>>,
}

impl AppState {
    pub fn new(storage: Storage, store: TaskStore, settings: Settings, theme: Theme) -> Self {
        Self {
            inner: Arc::new(Mutex::new(AppData {
                storage,
                store,
                settings,
                theme,
            })),
        }
    }

    pub fn tasks(&self) -> Vec<Task> {
        let guard = self.inner.lock().expect("state poisoned");
        guard.store.all()
    }

    pub fn find_task(&self, task_id: &str) -> Option<Task> {
        let guard = self.inner.lock().expect("state poisoned");
        guard.store.find_by_id(task_id)
    }

    pub fn create_task(
        &self,
        name: &str,
        description: &str,
        priority: &str,
        deadline: &str,
    ) -> Result<Task, TaskError> {
        let mut guard = self.inner.lock().expect("state poisoned");
        guard.store.create(name, description, priority, deadline)
    }

    pub fn complete_task(&self, task_id: &str) -> Result<Task, TaskError> {
        let mut guard = self.inner.lock().expect("state poisoned");
        guard.store.complete(task_id)
    }

    pub fn remove_task(&self, task_id: &str) -> Result<bool, TaskError> {
        let mut guard = self.inner.lock().expect("state poisoned");
        guard.store.remove(task_id)
    }

    pub fn reload_tasks(&self) {
        let mut guard = self.inner.lock().expect("state poisoned");
        guard.store.reload();
    }

    /// Retries a task save that failed earlier.
    pub fn flush_tasks(&self) -> Result<(), TaskError> {
        let mut guard = self.inner.lock().expect("state poisoned");
        guard.store.flush()
    }

    /// One scheduler tick. Returns the tasks that just became urgent.
    pub fn tick(&self) -> Vec<Task> {
        let mut guard = self.inner.lock().expect("state poisoned");
        guard.store.tick()
    }

    pub fn settings(&self) -> Settings {
        let guard = self.inner.lock().expect("state poisoned");
        guard.settings.clone()
    }

    pub fn theme(&self) -> Theme {
        let guard = self.inner.lock().expect("state poisoned");
        guard.theme
    }

    pub fn set_theme(&self, theme: Theme) {
        let mut guard = self.inner.lock().expect("state poisoned");
        guard.theme = theme;
    }

    /// Rereads the persisted theme into memory.
    pub fn reload_theme(&self) -> Theme {
        let mut guard = self.inner.lock().expect("state poisoned");
        guard.theme = guard.storage.load_theme();
        guard.theme
    }

    /// Persists `theme`, then adopts it. A failed save leaves the current theme in place.
    pub fn save_theme(&self, theme: Theme) -> Result<(), StorageError> {
        let mut guard = self.inner.lock().expect("state poisoned");
        guard.storage.save_theme(theme)?;
        guard.theme = theme;
        Ok(())
    }

    pub fn streak(&self) -> StreakRecord {
        let guard = self.inner.lock().expect("state poisoned");
        guard.storage.load_streak()
    }
}

struct AppData {
    storage: Storage,
    store: TaskStore,
    settings: Settings,
    theme: Theme,
}
