use serde::{Deserialize, Serialize};

/// Phase of the Pomodoro cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PomodoroPhase {
    Work,
    ShortBreak,
    LongBreak,
}

impl PomodoroPhase {
    /// Human-readable label for display
    pub fn label(&self) -> &'static str {
        match self {
            Self::Work => "Work Session",
            Self::ShortBreak => "Short Break",
            Self::LongBreak => "Long Break",
        }
    }

    /// Check if this phase is a break of either length
    pub fn is_break(&self) -> bool {
        matches!(self, Self::ShortBreak | Self::LongBreak)
    }
}

/// Which display/accounting mode the timer uses for a project.
///
/// Mode is a session-level choice and is never persisted: a tick is
/// billed either to plain elapsed time or to the Pomodoro countdown,
/// never both.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TimerMode {
    #[default]
    Stopwatch,
    Pomodoro,
}
