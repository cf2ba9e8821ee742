use super::enums::{PomodoroPhase, TimerMode};
use crate::error::EngineError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single task inside a project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Stable identifier. Generated ids are UUIDv4 strings, but imports
    /// may carry arbitrary strings and they are kept verbatim.
    pub id: String,
    /// Task description
    pub content: String,
    /// Whether the task is done
    pub completed: bool,
}

impl Task {
    pub fn new(content: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            content,
            completed: false,
        }
    }

    /// Flip the completion flag
    pub fn toggle(&mut self) {
        self.completed = !self.completed;
    }
}

/// Pomodoro configuration for a project. Durations are minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PomodoroSettings {
    pub work_duration: u32,
    pub short_break_duration: u32,
    pub long_break_duration: u32,
    pub cycles_before_long_break: u32,
    pub auto_start_cycles: bool,
}

impl Default for PomodoroSettings {
    fn default() -> Self {
        Self {
            work_duration: 25,
            short_break_duration: 5,
            long_break_duration: 15,
            cycles_before_long_break: 4,
            auto_start_cycles: false,
        }
    }
}

/// Largest phase length in minutes whose second count still fits in u32
const MAX_DURATION_MINUTES: u32 = u32::MAX / 60;

impl PomodoroSettings {
    /// Validate the configuration.
    ///
    /// Every duration and the cycle count must be at least 1, and
    /// durations must stay convertible to seconds.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.work_duration < 1 {
            return Err(EngineError::InvalidConfiguration(
                "workDuration must be at least 1 minute".to_string(),
            ));
        }
        if self.short_break_duration < 1 {
            return Err(EngineError::InvalidConfiguration(
                "shortBreakDuration must be at least 1 minute".to_string(),
            ));
        }
        if self.long_break_duration < 1 {
            return Err(EngineError::InvalidConfiguration(
                "longBreakDuration must be at least 1 minute".to_string(),
            ));
        }
        if self.cycles_before_long_break < 1 {
            return Err(EngineError::InvalidConfiguration(
                "cyclesBeforeLongBreak must be at least 1".to_string(),
            ));
        }
        let longest = self
            .work_duration
            .max(self.short_break_duration)
            .max(self.long_break_duration);
        if longest > MAX_DURATION_MINUTES {
            return Err(EngineError::InvalidConfiguration(format!(
                "durations must be at most {} minutes",
                MAX_DURATION_MINUTES
            )));
        }
        Ok(())
    }

    /// Configured countdown length for a phase, in seconds
    pub fn phase_secs(&self, phase: PomodoroPhase) -> u32 {
        let minutes = match phase {
            PomodoroPhase::Work => self.work_duration,
            PomodoroPhase::ShortBreak => self.short_break_duration,
            PomodoroPhase::LongBreak => self.long_break_duration,
        };
        minutes * 60
    }
}

/// Mutable Pomodoro machine state for one project.
///
/// Created lazily the first time Pomodoro mode is engaged, mutated only
/// by the engine, and persisted with its owning project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PomodoroState {
    /// Mirrors whether the owning project is currently tracked
    pub is_active: bool,
    pub current_phase: PomodoroPhase,
    /// Seconds remaining in the current phase countdown
    pub session_time: u32,
    /// Completed work phases, used to decide short vs long break
    pub cycles_completed: u32,
    /// True exactly while the countdown sits at zero awaiting an advance
    pub waiting_for_next_phase: bool,
}

impl PomodoroState {
    /// Fresh state: a full work phase, nothing completed yet
    pub fn new(settings: &PomodoroSettings) -> Self {
        Self {
            is_active: false,
            current_phase: PomodoroPhase::Work,
            session_time: settings.phase_secs(PomodoroPhase::Work),
            cycles_completed: 0,
            waiting_for_next_phase: false,
        }
    }
}

/// A tracked work project: named task list plus accumulated time
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    /// Unique name, used as the lookup key
    pub name: String,
    #[serde(default)]
    pub tasks: Vec<Task>,
    /// Plain-timer seconds accumulated; monotonically non-decreasing
    #[serde(default)]
    pub time_spent: u64,
    #[serde(default)]
    pub is_tracking: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pomodoro_settings: Option<PomodoroSettings>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pomodoro_state: Option<PomodoroState>,
    /// Session-level display mode; never persisted
    #[serde(skip)]
    pub timer_mode: TimerMode,
}

impl Project {
    pub fn new(name: String) -> Self {
        Self {
            name,
            tasks: Vec::new(),
            time_spent: 0,
            is_tracking: false,
            pomodoro_settings: None,
            pomodoro_state: None,
            timer_mode: TimerMode::Stopwatch,
        }
    }

    /// Append a new task and return a reference to it
    pub fn add_task(&mut self, content: String) -> &Task {
        self.tasks.push(Task::new(content));
        self.tasks.last().expect("just pushed")
    }

    /// Find a task by id
    pub fn task_mut(&mut self, id: &str) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == id)
    }

    /// Remove a task by id, returning it if present
    pub fn remove_task(&mut self, id: &str) -> Option<Task> {
        let idx = self.tasks.iter().position(|t| t.id == id)?;
        Some(self.tasks.remove(idx))
    }

    /// The configured settings, or the defaults when none were saved
    pub fn effective_settings(&self) -> PomodoroSettings {
        self.pomodoro_settings.unwrap_or_default()
    }

    /// Lazily create Pomodoro state on first engagement
    pub fn ensure_pomodoro_state(&mut self) -> &mut PomodoroState {
        if self.pomodoro_state.is_none() {
            self.pomodoro_state = Some(PomodoroState::new(&self.effective_settings()));
        }
        self.pomodoro_state.as_mut().expect("just initialized")
    }

    /// Reset transient flags after loading a snapshot from disk.
    ///
    /// Tracking state is not meaningful across restarts, so both the
    /// project flag and the mirrored engine flag come back false.
    pub fn normalize_loaded(&mut self) {
        self.is_tracking = false;
        if let Some(state) = self.pomodoro_state.as_mut() {
            state.is_active = false;
        }
    }
}
