//! Main application state management

use std::{
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{broadcast, watch, Mutex as AsyncMutex};
use tracing::{debug, error, info, warn};

use super::{
    load_snapshot, save_snapshot, HostSignals, HostState, Phase, PhaseCompletion, TickOutcome,
    TimerSnapshot, TimerState,
};
use crate::{
    error::{Error, Result},
    storage::KeyValueStore,
    tasks::{countdown_task, TickSource},
};

pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Read-only copy of the timer handed to the UI
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerView {
    pub work_minutes: u32,
    pub break_minutes: u32,
    pub completed_sessions: u64,
    pub remaining_seconds: u32,
    pub phase: Phase,
    pub is_break: bool,
    pub running: bool,
    pub progress: f64,
    pub display: String,
}

impl From<&TimerState> for TimerView {
    fn from(timer: &TimerState) -> Self {
        let config = timer.config();
        Self {
            work_minutes: config.work_minutes(),
            break_minutes: config.break_minutes(),
            completed_sessions: timer.completed_sessions(),
            remaining_seconds: timer.remaining_seconds(),
            phase: timer.phase(),
            is_break: timer.phase().is_break(),
            running: timer.is_running(),
            progress: timer.progress_fraction(),
            display: timer.formatted_remaining(),
        }
    }
}

/// Owns the timer state machine, its tick source and its persistence
pub struct AppState {
    timer: Mutex<TimerState>,
    host: Mutex<HostState>,
    store: Arc<dyn KeyValueStore>,
    /// Serializes snapshot writes
    persist_lock: AsyncMutex<()>,
    tick_source: TickSource,
    tick_period: Duration,
    pub start_time: Instant,
    /// Last intent tracking
    last_action: Mutex<Option<(String, DateTime<Utc>)>>,
    /// Phase completion notifications
    phase_tx: broadcast::Sender<PhaseCompletion>,
    /// Latest timer view after every change
    view_tx: watch::Sender<TimerView>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("timer", &self.timer)
            .field("host", &self.host)
            .field("tick_period", &self.tick_period)
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Restore the timer from `store`, falling back to defaults
    pub async fn restore(store: Arc<dyn KeyValueStore>) -> Arc<Self> {
        Self::restore_with_period(store, TICK_PERIOD).await
    }

    pub async fn restore_with_period(
        store: Arc<dyn KeyValueStore>,
        tick_period: Duration,
    ) -> Arc<Self> {
        let snapshot = load_snapshot(store.as_ref()).await;
        let timer = snapshot.into_timer();
        info!(
            "Timer restored: {:?} phase, {}s remaining, {} sessions completed",
            timer.phase(),
            timer.remaining_seconds(),
            timer.completed_sessions()
        );
        Arc::new(Self::new(timer, store, tick_period))
    }

    pub fn new(timer: TimerState, store: Arc<dyn KeyValueStore>, tick_period: Duration) -> Self {
        let (phase_tx, _) = broadcast::channel(16);
        let (view_tx, _) = watch::channel(TimerView::from(&timer));

        Self {
            timer: Mutex::new(timer),
            host: Mutex::new(HostState::new()),
            store,
            persist_lock: AsyncMutex::new(()),
            tick_source: TickSource::new(),
            tick_period,
            start_time: Instant::now(),
            last_action: Mutex::new(None),
            phase_tx,
            view_tx,
        }
    }

    /// Apply `updater` to the timer and publish the new view
    fn mutate<R, F>(&self, updater: F) -> Result<R>
    where
        F: FnOnce(&mut TimerState) -> R,
    {
        let mut timer = self.timer.lock()
            .map_err(|e| Error::Lock(format!("timer state: {}", e)))?;

        let result = updater(&mut timer);
        let view = TimerView::from(&*timer);
        drop(timer);

        self.view_tx.send_replace(view);
        Ok(result)
    }

    fn record_action(&self, action: &str) {
        if let Ok(mut last_action) = self.last_action.lock() {
            *last_action = Some((action.to_string(), Utc::now()));
        }
    }

    /// Write the current snapshot. Failures are logged; the countdown keeps
    /// going without storage.
    async fn persist(&self) {
        let _guard = self.persist_lock.lock().await;

        // Captured under the write lock so a later write never carries an
        // older state.
        let snapshot = match self.snapshot() {
            Ok(snapshot) => snapshot,
            Err(e) => {
                error!("Failed to capture timer snapshot: {}", e);
                return;
            }
        };

        if let Err(e) = save_snapshot(self.store.as_ref(), &snapshot).await {
            warn!("Failed to persist timer snapshot: {}", e);
        }
    }

    /// Start counting down. No-op if already running.
    pub async fn start(self: &Arc<Self>) -> Result<TimerView> {
        let started = self.mutate(|timer| timer.start())?;
        self.record_action("start");

        if started {
            info!("Timer started");
            self.tick_source
                .schedule(countdown_task(Arc::downgrade(self), self.tick_period));
        } else {
            debug!("Timer already running");
        }

        self.persist().await;
        self.view()
    }

    /// Stop counting down, keeping the remaining time
    pub async fn pause(&self) -> Result<TimerView> {
        self.tick_source.cancel();
        if self.mutate(|timer| timer.pause())? {
            info!("Timer paused");
        }
        self.record_action("pause");

        self.persist().await;
        self.view()
    }

    /// Back to the start of a work phase; completed sessions are kept
    pub async fn reset(&self) -> Result<TimerView> {
        self.tick_source.cancel();
        self.mutate(|timer| timer.reset())?;
        self.record_action("reset");
        info!("Timer reset");

        self.persist().await;
        self.view()
    }

    pub async fn set_work_minutes(&self, minutes: i64) -> Result<TimerView> {
        let applied = self.mutate(|timer| timer.set_work_minutes(minutes))?;
        self.record_action("set-work-minutes");
        info!("Work duration set to {} minutes (requested {})", applied, minutes);

        self.persist().await;
        self.view()
    }

    pub async fn set_break_minutes(&self, minutes: i64) -> Result<TimerView> {
        let applied = self.mutate(|timer| timer.set_break_minutes(minutes))?;
        self.record_action("set-break-minutes");
        info!("Break duration set to {} minutes (requested {})", applied, minutes);

        self.persist().await;
        self.view()
    }

    /// Advance the countdown by one second; driven by the tick task
    pub async fn tick(&self) -> Result<TickOutcome> {
        let outcome = self.mutate(|timer| timer.tick())?;

        match outcome {
            TickOutcome::Idle => return Ok(outcome),
            TickOutcome::Counting { .. } => {}
            TickOutcome::PhaseCompleted(done) => {
                info!(
                    "{:?} phase completed ({} sessions total), next: {:?}",
                    done.finished, done.completed_sessions, done.next
                );
                if self.phase_tx.send(done).is_err() {
                    debug!("No phase completion listeners");
                }
            }
        }

        self.persist().await;
        Ok(outcome)
    }

    /// Cancel the tick task and write a final snapshot
    pub async fn shutdown(&self) {
        if self.tick_source.cancel() {
            info!("Countdown cancelled for shutdown");
        }
        self.persist().await;
    }

    pub fn view(&self) -> Result<TimerView> {
        self.timer.lock()
            .map(|timer| TimerView::from(&*timer))
            .map_err(|e| Error::Lock(format!("timer state: {}", e)))
    }

    pub fn snapshot(&self) -> Result<TimerSnapshot> {
        self.timer.lock()
            .map(|timer| TimerSnapshot::capture(&timer))
            .map_err(|e| Error::Lock(format!("timer state: {}", e)))
    }

    pub fn progress_fraction(&self) -> Result<f64> {
        self.timer.lock()
            .map(|timer| timer.progress_fraction())
            .map_err(|e| Error::Lock(format!("timer state: {}", e)))
    }

    pub fn is_ticking(&self) -> bool {
        self.tick_source.is_scheduled()
    }

    pub fn subscribe_phases(&self) -> broadcast::Receiver<PhaseCompletion> {
        self.phase_tx.subscribe()
    }

    pub fn subscribe_views(&self) -> watch::Receiver<TimerView> {
        self.view_tx.subscribe()
    }

    pub fn host_state(&self) -> HostState {
        self.host.lock().map(|host| *host).unwrap_or_default()
    }

    pub fn get_last_action(&self) -> (Option<String>, Option<DateTime<Utc>>) {
        match self.last_action.lock().ok().and_then(|a| a.clone()) {
            Some((action, at)) => (Some(action), Some(at)),
            None => (None, None),
        }
    }

    /// Calculate uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }
}

impl HostSignals for AppState {
    fn on_connectivity_change(&self, online: bool) {
        if let Ok(mut host) = self.host.lock() {
            if host.online != online {
                info!("Connectivity changed: {}", if online { "online" } else { "offline" });
            }
            host.online = online;
        }
    }

    fn on_installable(&self) {
        if let Ok(mut host) = self.host.lock() {
            if !host.installable {
                info!("Application is installable");
            }
            host.installable = true;
        }
    }
}
