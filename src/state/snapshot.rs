//! Persisted timer snapshot and its on-disk record schema

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::timer_state::{
    Phase, TimerConfig, TimerState, DEFAULT_BREAK_MINUTES, DEFAULT_WORK_MINUTES,
    MAX_REMAINING_SECONDS,
};
use crate::{error::StorageError, storage::KeyValueStore};

/// Key the snapshot is stored under
pub const STORAGE_KEY: &str = "pomodoroData";

/// Copy of the timer's durable fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerSnapshot {
    pub work_minutes: u32,
    pub break_minutes: u32,
    pub completed_sessions: u64,
    pub remaining_seconds: u32,
    pub is_break: bool,
    /// Epoch millis, informational only
    pub last_saved_at: i64,
}

impl TimerSnapshot {
    pub fn capture(timer: &TimerState) -> Self {
        let config = timer.config();
        Self {
            work_minutes: config.work_minutes(),
            break_minutes: config.break_minutes(),
            completed_sessions: timer.completed_sessions(),
            remaining_seconds: timer.remaining_seconds(),
            is_break: timer.phase().is_break(),
            last_saved_at: Utc::now().timestamp_millis(),
        }
    }

    /// Rebuild a paused timer from this snapshot
    pub fn into_timer(self) -> TimerState {
        TimerState::restored(
            TimerConfig::new(self.work_minutes.into(), self.break_minutes.into()),
            Phase::from_is_break(self.is_break),
            self.remaining_seconds,
            self.completed_sessions,
        )
    }

    /// Field-for-field equality ignoring `last_saved_at`
    pub fn same_progress(&self, other: &Self) -> bool {
        Self {
            last_saved_at: 0,
            ..*self
        } == Self {
            last_saved_at: 0,
            ..*other
        }
    }

    pub fn to_json(&self) -> Result<String, StorageError> {
        Ok(serde_json::to_string(&StoredRecord::from(*self))?)
    }

    /// Parse a stored record, filling every missing field from defaults
    pub fn from_json(raw: &str) -> Result<Self, StorageError> {
        let record: StoredRecord = serde_json::from_str(raw)?;
        Ok(record.into_snapshot())
    }
}

impl Default for TimerSnapshot {
    fn default() -> Self {
        Self::capture(&TimerState::new())
    }
}

/// Wire shape of the `pomodoroData` record. Every field is optional so older or
/// partial records still load.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredRecord {
    work_time: Option<i64>,
    break_time: Option<i64>,
    completed_sessions: Option<i64>,
    current_time: Option<i64>,
    is_break: Option<bool>,
    last_saved: Option<i64>,
}

impl From<TimerSnapshot> for StoredRecord {
    fn from(snapshot: TimerSnapshot) -> Self {
        Self {
            work_time: Some(snapshot.work_minutes.into()),
            break_time: Some(snapshot.break_minutes.into()),
            completed_sessions: Some(snapshot.completed_sessions as i64),
            current_time: Some(snapshot.remaining_seconds.into()),
            is_break: Some(snapshot.is_break),
            last_saved: Some(snapshot.last_saved_at),
        }
    }
}

impl StoredRecord {
    fn into_snapshot(self) -> TimerSnapshot {
        // Zero durations are as good as missing.
        let config = TimerConfig::new(
            self.work_time
                .filter(|v| *v != 0)
                .unwrap_or(DEFAULT_WORK_MINUTES.into()),
            self.break_time
                .filter(|v| *v != 0)
                .unwrap_or(DEFAULT_BREAK_MINUTES.into()),
        );
        let phase = Phase::from_is_break(self.is_break.unwrap_or(false));

        // A missing or zero countdown falls back to a full work phase,
        // whichever phase was stored.
        let remaining_seconds = self
            .current_time
            .filter(|v| *v > 0)
            .map(|v| v.min(i64::from(MAX_REMAINING_SECONDS)) as u32)
            .unwrap_or_else(|| config.phase_seconds(Phase::Work));

        TimerSnapshot {
            work_minutes: config.work_minutes(),
            break_minutes: config.break_minutes(),
            completed_sessions: self.completed_sessions.unwrap_or(0).max(0) as u64,
            remaining_seconds,
            is_break: phase.is_break(),
            last_saved_at: self.last_saved.unwrap_or(0),
        }
    }
}

/// Read the snapshot at startup. Missing or malformed records fall back to
/// defaults without surfacing an error.
pub async fn load_snapshot(store: &dyn KeyValueStore) -> TimerSnapshot {
    match store.get(STORAGE_KEY).await {
        Ok(Some(raw)) => match TimerSnapshot::from_json(&raw) {
            Ok(snapshot) => {
                debug!("Restored timer snapshot: {:?}", snapshot);
                snapshot
            }
            Err(e) => {
                warn!("Ignoring malformed timer snapshot: {}", e);
                TimerSnapshot::default()
            }
        },
        Ok(None) => {
            debug!("No saved timer snapshot, using defaults");
            TimerSnapshot::default()
        }
        Err(e) => {
            warn!("Failed to read timer snapshot: {}", e);
            TimerSnapshot::default()
        }
    }
}

/// Serialize and write the snapshot under `STORAGE_KEY`
pub async fn save_snapshot(
    store: &dyn KeyValueStore,
    snapshot: &TimerSnapshot,
) -> Result<(), StorageError> {
    let raw = snapshot.to_json()?;
    store.set(STORAGE_KEY, &raw).await
}
