use std::any::Any;
use std::cell::Cell;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};

use crate::error::HandlerError;
use crate::models::{StreakRecord, Task, Theme};

/// A task entered its urgency window. Payload: the task.
pub const EVENT_URGENT: &str = "onUrgent";
/// A task was completed for the first time. Payload: the task.
pub const EVENT_TASK_COMPLETED: &str = "onTaskCompleted";

/// Snapshot handed to the view renderer after every change.
#[derive(Debug, Clone, serde::Serialize)]
pub struct StatePayload {
    pub tasks: Vec<Task>,
    pub theme: Theme,
    pub streak: StreakRecord,
}

type Handler<P> = Box<dyn Fn(&P) -> Result<(), HandlerError> + Send + Sync>;

thread_local! {
    static IN_HANDLER: Cell<bool> = const { Cell::new(false) };
}

/// True while this thread is running an event handler. Panics raised there are caught
/// and logged by the bus itself.
pub fn in_event_handler() -> bool {
    IN_HANDLER.with(Cell::get)
}

/// Text of a panic payload, for `&str` and `String` payloads.
pub fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("<non-string panic payload>")
}

/// Outcome of one publish call.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PublishReport {
    pub delivered: usize,
    pub failed: usize,
}

/// In-process publish/subscribe keyed by event name.
///
/// Handlers run synchronously in registration order. A handler that returns an error or
/// panics is logged and skipped; the remaining handlers still run and the publisher never
/// sees the failure.
pub struct EventBus<P> {
    handlers: HashMap<String, Vec<Handler<P>>>,
}

impl<P> Default for EventBus<P> {
    fn default() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }
}

impl<P> std::fmt::Debug for EventBus<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let counts: HashMap<&str, usize> = self
            .handlers
            .iter()
            .map(|(name, handlers)| (name.as_str(), handlers.len()))
            .collect();
        f.debug_struct("EventBus").field("handlers", &counts).finish()
    }
}

impl<P> EventBus<P> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&mut self, event: &str, handler: F)
    where
        F: Fn(&P) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        self.handlers
            .entry(event.to_string())
            .or_default()
            .push(Box::new(handler));
    }

    pub fn handler_count(&self, event: &str) -> usize {
        self.handlers.get(event).map_or(0, Vec::len)
    }

    pub fn publish(&self, event: &str, payload: &P) -> PublishReport {
        let mut report = PublishReport::default();
        let Some(handlers) = self.handlers.get(event) else {
            return report;
        };
        for (index, handler) in handlers.iter().enumerate() {
            let outer = IN_HANDLER.with(|flag| flag.replace(true));
            let outcome = catch_unwind(AssertUnwindSafe(|| handler(payload)));
            IN_HANDLER.with(|flag| flag.set(outer));
            match outcome {
                Ok(Ok(())) => report.delivered += 1,
                Ok(Err(error)) => {
                    report.failed += 1;
                    log::warn!("event handler failed event={event} handler={index} error={error}");
                }
                Err(panic) => {
                    report.failed += 1;
                    log::warn!(
                        "event handler panicked event={event} handler={index} payload={}",
                        panic_message(&*panic)
                    );
                }
            }
        }
        report
    }
}
