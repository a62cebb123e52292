use std::time::Duration;

use tokio::task::JoinHandle;

use crate::models::Task;
use crate::state::AppState;

/// Runs one tick per `period` for the life of the process. Missed ticks are skipped
/// rather than bunched, and each tick completes before the next is awaited.
/// `on_tick` receives the refreshed list for redrawing countdowns.
pub fn start_scheduler<F>(state: AppState, period: Duration, mut on_tick: F) -> JoinHandle<()>
where
    F: FnMut(Vec<Task>) + Send + 'static,
{
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            interval.tick().await;
            let crossed = state.tick();
            if !crossed.is_empty() {
                log::debug!("tick found {} newly urgent task(s)", crossed.len());
            }
            on_tick(state.tasks());
        }
    })
}
