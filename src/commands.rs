use crate::error::TaskError;
use crate::events::StatePayload;
use crate::models::{Task, Theme};
use crate::state::AppState;
use crate::view::ViewQuery;

#[derive(Debug, serde::Serialize)]
pub struct CommandResult<T> {
    pub ok: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

/// The host's channel for handing fresh snapshots to the view renderer.
pub trait CommandCtx {
    fn emit_state_updated(&self, payload: StatePayload);
}

/// The add-task form as submitted.
#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(default)]
pub struct NewTask {
    pub name: String,
    pub description: String,
    pub priority: String,
    pub deadline: String,
}

fn ok<T>(data: T) -> CommandResult<T> {
    CommandResult {
        ok: true,
        data: Some(data),
        error: None,
    }
}

fn err<T>(message: &str) -> CommandResult<T> {
    CommandResult {
        ok: false,
        data: None,
        error: Some(message.to_string()),
    }
}

fn snapshot(state: &AppState) -> StatePayload {
    StatePayload {
        tasks: state.tasks(),
        theme: state.theme(),
        streak: state.streak(),
    }
}

fn notify(ctx: &impl CommandCtx, state: &AppState) {
    ctx.emit_state_updated(snapshot(state));
}

/// Rereads tasks and theme from the data directory the state was opened on.
pub fn load_state(state: &AppState) -> CommandResult<StatePayload> {
    state.reload_tasks();
    state.reload_theme();
    ok(snapshot(state))
}

pub fn create_task(
    ctx: &impl CommandCtx,
    state: &AppState,
    input: NewTask,
) -> CommandResult<Task> {
    let result = state.create_task(
        &input.name,
        &input.description,
        &input.priority,
        &input.deadline,
    );
    finish(ctx, state, result)
}

pub fn complete_task(
    ctx: &impl CommandCtx,
    state: &AppState,
    task_id: String,
) -> CommandResult<Task> {
    let result = state.complete_task(&task_id);
    finish(ctx, state, result)
}

pub fn delete_task(
    ctx: &impl CommandCtx,
    state: &AppState,
    task_id: String,
) -> CommandResult<bool> {
    let result = state.remove_task(&task_id);
    finish(ctx, state, result)
}

/// Filtered and sorted view of the list; never changes the store.
pub fn list_tasks(state: &AppState, query: ViewQuery) -> CommandResult<Vec<Task>> {
    let tasks = state.tasks();
    if !query.is_active() {
        return ok(tasks);
    }
    ok(query.apply(&tasks))
}

pub fn toggle_theme(ctx: &impl CommandCtx, state: &AppState) -> CommandResult<Theme> {
    let next = state.theme().toggled();
    if let Err(error) = state.save_theme(next) {
        return err(&format!("storage error: {error}"));
    }
    notify(ctx, state);
    ok(next)
}

/// Validation and lookup failures leave the store alone, so there is nothing to redraw.
/// Persistence failures still changed the in-memory list and are pushed to the renderer.
fn finish<T>(
    ctx: &impl CommandCtx,
    state: &AppState,
    result: Result<T, TaskError>,
) -> CommandResult<T> {
    match result {
        Ok(data) => {
            notify(ctx, state);
            ok(data)
        }
        Err(error @ TaskError::Persistence(_)) => {
            notify(ctx, state);
            err(&error.to_string())
        }
        Err(error) => err(&error.to_string()),
    }
}
