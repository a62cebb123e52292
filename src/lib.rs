pub mod commands;
pub mod error;
pub mod events;
pub mod logging;
pub mod models;
pub mod rewards;
pub mod scheduler;
pub mod state;
pub mod storage;
pub mod store;
pub mod streak;
pub mod urgency;
pub mod view;

use std::sync::Arc;

#[cfg(all(feature = "app", not(test)))]
use std::path::PathBuf;

use crate::error::StorageError;
use crate::events::{EVENT_TASK_COMPLETED, EVENT_URGENT};
use crate::state::AppState;
use crate::storage::Storage;
use crate::store::TaskStore;
use crate::urgency::Clock;

#[cfg(all(feature = "app", not(test)))]
use crate::scheduler::start_scheduler;
#[cfg(all(feature = "app", not(test)))]
use crate::urgency::SystemClock;

/// Hooks the streak and reward bookkeeping onto task completion, and logs urgency.
pub fn wire_collaborators(store: &mut TaskStore, storage: Storage, clock: Arc<dyn Clock>) {
    store.subscribe(EVENT_TASK_COMPLETED, move |_task| {
        let today = clock.now().date_naive();
        let streak = streak::record_completion(&storage, today)?;
        rewards::check_rewards(&storage, &streak)?;
        Ok(())
    });
    store.subscribe(EVENT_URGENT, |task| {
        log::info!("deadline approaching name={:?} id={}", task.name, task.id);
        Ok(())
    });
}

/// Loads settings, theme and tasks from `storage` and returns the shared state.
pub fn open_state(storage: Storage, clock: Arc<dyn Clock>) -> Result<AppState, StorageError> {
    storage.ensure_dirs()?;
    let settings = storage.load_settings();
    let theme = storage.load_theme();
    let mut store = TaskStore::load(
        Box::new(storage.clone()),
        Arc::clone(&clock),
        settings.urgency_window(),
    );
    wire_collaborators(&mut store, storage.clone(), clock);
    Ok(AppState::new(storage, store, settings, theme))
}

/// Runs the tick scheduler over the data in `data_dir` until Ctrl-C.
#[cfg(all(feature = "app", not(test)))]
pub async fn run(data_dir: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let storage = Storage::new(data_dir);
    log::info!("opening data dir={}", storage.root().display());
    let state = open_state(storage, Arc::new(SystemClock))?;
    let settings = state.settings();
    log::info!(
        "taskdeck started tasks={} urgency_window_minutes={} tick_interval_ms={}",
        state.tasks().len(),
        settings.urgency_window_minutes,
        settings.tick_interval_ms
    );

    let scheduler = start_scheduler(state.clone(), settings.tick_interval(), |tasks| {
        log::trace!("tick tasks={}", tasks.len());
    });

    tokio::signal::ctrl_c().await?;
    scheduler.abort();
    if let Err(error) = state.flush_tasks() {
        log::error!("tasks not saved on shutdown error={error}");
    }
    log::info!("taskdeck stopped");
    Ok(())
}
