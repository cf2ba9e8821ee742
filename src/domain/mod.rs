pub mod enums;
pub mod project;
pub mod views;

pub use enums::{PomodoroPhase, TimerMode};
pub use project::{PomodoroSettings, PomodoroState, Project, Task};
pub use views::{cycle_position, format_elapsed, format_hours_minutes, format_session, task_progress_pct};
