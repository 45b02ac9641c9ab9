//! One-second countdown background task

use std::{sync::Weak, time::Duration};
use tokio::time::{interval_at, Instant};
use tracing::{debug, error, info};

use crate::state::{AppState, TickOutcome};

/// Ticks the timer once per `period` until the phase ends, the timer is paused,
/// or the state is dropped.
pub async fn countdown_task(state: Weak<AppState>, period: Duration) {
    debug!("Starting countdown task");

    // First tick one full period after start, not immediately.
    let mut interval = interval_at(Instant::now() + period, period);

    loop {
        interval.tick().await;

        let Some(state) = state.upgrade() else {
            debug!("Timer state dropped, stopping countdown");
            break;
        };

        match state.tick().await {
            Ok(TickOutcome::Counting { remaining_seconds }) => {
                if remaining_seconds % 60 == 0 {
                    debug!("{} minutes remaining", remaining_seconds / 60);
                }
            }
            Ok(TickOutcome::PhaseCompleted(done)) => {
                info!("Countdown finished {:?} phase, waiting for start", done.finished);
                break;
            }
            Ok(TickOutcome::Idle) => {
                debug!("Timer no longer running, stopping countdown");
                break;
            }
            Err(e) => {
                error!("Countdown tick failed, stopping: {}", e);
                break;
            }
        }
    }
}
