//! State management module
//!
//! This module contains the timer state machine, its persisted snapshot and
//! the application state that drives both.

pub mod app_state;
pub mod host_state;
pub mod snapshot;
pub mod timer_state;

// Re-export main types
pub use app_state::{AppState, TimerView, TICK_PERIOD};
pub use host_state::{HostSignals, HostState};
pub use snapshot::{load_snapshot, save_snapshot, TimerSnapshot, STORAGE_KEY};
pub use timer_state::{Phase, PhaseCompletion, TickOutcome, TimerConfig, TimerState};
