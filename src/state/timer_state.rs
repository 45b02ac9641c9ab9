//! Timer state machine: work/break phases and the one-second countdown

use serde::{Deserialize, Serialize};

pub const MIN_WORK_MINUTES: u32 = 1;
pub const MAX_WORK_MINUTES: u32 = 60;
pub const MIN_BREAK_MINUTES: u32 = 1;
pub const MAX_BREAK_MINUTES: u32 = 30;

pub const DEFAULT_WORK_MINUTES: u32 = 25;
pub const DEFAULT_BREAK_MINUTES: u32 = 5;

/// Longest countdown any phase can hold. A phase shortened while running keeps
/// its old remaining time, so restore can only bound by this.
pub const MAX_REMAINING_SECONDS: u32 = MAX_WORK_MINUTES * 60;

/// Current phase of the cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Work,
    Break,
}

impl Phase {
    pub fn is_break(self) -> bool {
        matches!(self, Phase::Break)
    }

    pub fn from_is_break(is_break: bool) -> Self {
        if is_break { Phase::Break } else { Phase::Work }
    }
}

/// Work and break durations, always within their clamp bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerConfig {
    work_minutes: u32,
    break_minutes: u32,
}

impl TimerConfig {
    /// Build a config, clamping both durations into range
    pub fn new(work_minutes: i64, break_minutes: i64) -> Self {
        Self {
            work_minutes: clamp_minutes(work_minutes, MIN_WORK_MINUTES, MAX_WORK_MINUTES),
            break_minutes: clamp_minutes(break_minutes, MIN_BREAK_MINUTES, MAX_BREAK_MINUTES),
        }
    }

    pub fn work_minutes(&self) -> u32 {
        self.work_minutes
    }

    pub fn break_minutes(&self) -> u32 {
        self.break_minutes
    }

    pub fn set_work_minutes(&mut self, value: i64) -> u32 {
        self.work_minutes = clamp_minutes(value, MIN_WORK_MINUTES, MAX_WORK_MINUTES);
        self.work_minutes
    }

    pub fn set_break_minutes(&mut self, value: i64) -> u32 {
        self.break_minutes = clamp_minutes(value, MIN_BREAK_MINUTES, MAX_BREAK_MINUTES);
        self.break_minutes
    }

    /// Length of the given phase in seconds (never below 60)
    pub fn phase_seconds(&self, phase: Phase) -> u32 {
        match phase {
            Phase::Work => self.work_minutes * 60,
            Phase::Break => self.break_minutes * 60,
        }
    }
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            work_minutes: DEFAULT_WORK_MINUTES,
            break_minutes: DEFAULT_BREAK_MINUTES,
        }
    }
}

fn clamp_minutes(value: i64, min: u32, max: u32) -> u32 {
    value.clamp(i64::from(min), i64::from(max)) as u32
}

/// Emitted once when a phase runs out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseCompletion {
    pub finished: Phase,
    pub next: Phase,
    pub completed_sessions: u64,
}

/// Result of a single tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The machine was not running, nothing changed
    Idle,
    /// Countdown advanced by one second
    Counting { remaining_seconds: u32 },
    /// Phase boundary crossed; the machine paused itself
    PhaseCompleted(PhaseCompletion),
}

/// Timer state machine owned by `AppState`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerState {
    config: TimerConfig,
    phase: Phase,
    running: bool,
    remaining_seconds: u32,
    completed_sessions: u64,
}

impl TimerState {
    /// Idle × Work with default durations
    pub fn new() -> Self {
        Self::with_config(TimerConfig::default())
    }

    /// Idle × Work with the given durations
    pub fn with_config(config: TimerConfig) -> Self {
        Self {
            config,
            phase: Phase::Work,
            running: false,
            remaining_seconds: config.phase_seconds(Phase::Work),
            completed_sessions: 0,
        }
    }

    /// Rebuild a paused machine from restored fields
    pub fn restored(
        config: TimerConfig,
        phase: Phase,
        remaining_seconds: u32,
        completed_sessions: u64,
    ) -> Self {
        Self {
            config,
            phase,
            running: false,
            remaining_seconds: remaining_seconds.min(MAX_REMAINING_SECONDS),
            completed_sessions,
        }
    }

    pub fn config(&self) -> TimerConfig {
        self.config
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn remaining_seconds(&self) -> u32 {
        self.remaining_seconds
    }

    pub fn completed_sessions(&self) -> u64 {
        self.completed_sessions
    }

    /// Returns true when the machine transitioned to running
    pub fn start(&mut self) -> bool {
        if self.running {
            return false;
        }
        self.running = true;
        true
    }

    /// Returns true when the machine was running
    pub fn pause(&mut self) -> bool {
        let was_running = self.running;
        self.running = false;
        was_running
    }

    pub fn reset(&mut self) {
        self.running = false;
        self.phase = Phase::Work;
        self.remaining_seconds = self.config.phase_seconds(Phase::Work);
    }

    pub fn tick(&mut self) -> TickOutcome {
        if !self.running {
            return TickOutcome::Idle;
        }

        self.remaining_seconds = self.remaining_seconds.saturating_sub(1);
        if self.remaining_seconds > 0 {
            return TickOutcome::Counting {
                remaining_seconds: self.remaining_seconds,
            };
        }

        let finished = self.phase;
        let next = match finished {
            Phase::Work => {
                self.completed_sessions += 1;
                Phase::Break
            }
            Phase::Break => Phase::Work,
        };
        self.phase = next;
        self.remaining_seconds = self.config.phase_seconds(next);
        self.running = false;

        TickOutcome::PhaseCompleted(PhaseCompletion {
            finished,
            next,
            completed_sessions: self.completed_sessions,
        })
    }

    pub fn set_work_minutes(&mut self, value: i64) -> u32 {
        let minutes = self.config.set_work_minutes(value);
        self.resync_if_previewing(Phase::Work);
        minutes
    }

    pub fn set_break_minutes(&mut self, value: i64) -> u32 {
        let minutes = self.config.set_break_minutes(value);
        self.resync_if_previewing(Phase::Break);
        minutes
    }

    // A paused countdown in the edited phase shows the new duration; a running
    // one keeps counting down what it had.
    fn resync_if_previewing(&mut self, edited: Phase) {
        if self.phase == edited && !self.running {
            self.remaining_seconds = self.config.phase_seconds(edited);
        }
    }

    /// Fraction of the active phase already elapsed, in [0, 1]
    pub fn progress_fraction(&self) -> f64 {
        let total = f64::from(self.config.phase_seconds(self.phase));
        let elapsed = total - f64::from(self.remaining_seconds);
        (elapsed / total).clamp(0.0, 1.0)
    }

    /// Remaining time as `MM:SS`
    pub fn formatted_remaining(&self) -> String {
        let minutes = self.remaining_seconds / 60;
        let seconds = self.remaining_seconds % 60;
        format!("{:02}:{:02}", minutes, seconds)
    }
}

impl Default for TimerState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn work_minutes_clamp_to_bounds() {
        let mut timer = TimerState::new();
        assert_eq!(timer.set_work_minutes(0), 1);
        assert_eq!(timer.set_work_minutes(100), 60);
        assert_eq!(timer.set_work_minutes(-5), 1);
        assert_eq!(timer.set_work_minutes(42), 42);
        assert_eq!(timer.config().work_minutes(), 42);
    }

    #[test]
    fn break_minutes_clamp_to_bounds() {
        let mut timer = TimerState::new();
        assert_eq!(timer.set_break_minutes(0), 1);
        assert_eq!(timer.set_break_minutes(31), 30);
        for value in -3..=40 {
            let minutes = timer.set_break_minutes(value);
            assert!((1..=30).contains(&minutes));
        }
    }

    #[test]
    fn full_work_phase_moves_to_break_and_pauses() {
        let mut timer = TimerState::new();
        assert!(timer.start());

        let mut completions = Vec::new();
        for _ in 0..1500 {
            if let TickOutcome::PhaseCompleted(done) = timer.tick() {
                completions.push(done);
            }
        }

        assert_eq!(completions.len(), 1);
        assert_eq!(completions[0].finished, Phase::Work);
        assert_eq!(completions[0].next, Phase::Break);
        assert_eq!(timer.completed_sessions(), 1);
        assert_eq!(timer.phase(), Phase::Break);
        assert_eq!(timer.remaining_seconds(), 5 * 60);
        assert!(!timer.is_running());
    }

    #[test]
    fn break_completion_returns_to_work_without_counting() {
        let mut timer = TimerState::restored(TimerConfig::new(10, 2), Phase::Break, 1, 3);
        timer.start();

        let outcome = timer.tick();

        assert_eq!(
            outcome,
            TickOutcome::PhaseCompleted(PhaseCompletion {
                finished: Phase::Break,
                next: Phase::Work,
                completed_sessions: 3,
            })
        );
        assert_eq!(timer.phase(), Phase::Work);
        assert_eq!(timer.remaining_seconds(), 600);
        assert_eq!(timer.completed_sessions(), 3);
        assert!(!timer.is_running());
    }

    #[test]
    fn tick_while_paused_is_ignored() {
        let mut timer = TimerState::new();
        assert_eq!(timer.tick(), TickOutcome::Idle);
        assert_eq!(timer.remaining_seconds(), 1500);

        timer.start();
        timer.tick();
        timer.pause();
        assert_eq!(timer.tick(), TickOutcome::Idle);
        assert_eq!(timer.remaining_seconds(), 1499);
    }

    #[test]
    fn start_is_idempotent() {
        let mut timer = TimerState::new();
        assert!(timer.start());
        assert!(!timer.start());
        assert!(timer.is_running());
        assert_eq!(timer.remaining_seconds(), 1500);
    }

    #[test]
    fn reset_restores_work_phase_and_keeps_sessions() {
        let mut timer = TimerState::restored(TimerConfig::new(20, 5), Phase::Break, 42, 7);
        timer.start();
        timer.reset();

        assert_eq!(timer.phase(), Phase::Work);
        assert_eq!(timer.remaining_seconds(), 20 * 60);
        assert_eq!(timer.completed_sessions(), 7);
        assert!(!timer.is_running());
    }

    #[test]
    fn duration_change_previews_only_when_paused_in_that_phase() {
        let mut timer = TimerState::new();

        timer.set_work_minutes(10);
        assert_eq!(timer.remaining_seconds(), 600);

        // break edits leave the work countdown alone
        timer.set_break_minutes(15);
        assert_eq!(timer.remaining_seconds(), 600);

        timer.start();
        timer.tick();
        timer.set_work_minutes(30);
        assert_eq!(timer.remaining_seconds(), 599);
        assert_eq!(timer.config().work_minutes(), 30);
    }

    #[test]
    fn progress_is_monotonic_within_a_phase() {
        let mut timer = TimerState::with_config(TimerConfig::new(1, 1));
        assert_eq!(timer.progress_fraction(), 0.0);

        timer.start();
        let mut last = timer.progress_fraction();
        for _ in 0..59 {
            timer.tick();
            let progress = timer.progress_fraction();
            assert!(progress >= last);
            assert!(progress <= 1.0);
            last = progress;
        }
        assert!(last > 0.98);
    }

    #[test]
    fn progress_stays_in_range_after_shrinking_running_phase() {
        let mut timer = TimerState::new();
        timer.start();
        timer.tick();
        timer.set_work_minutes(1);
        assert_eq!(timer.progress_fraction(), 0.0);
    }

    #[test]
    fn formats_remaining_time() {
        let mut timer = TimerState::new();
        assert_eq!(timer.formatted_remaining(), "25:00");
        timer.start();
        timer.tick();
        assert_eq!(timer.formatted_remaining(), "24:59");
    }
}
