//! Pure derived values over projects and tasks.
//!
//! Display math lives here, computed on demand and never stored, so the
//! registry and engine keep only authoritative state.

use super::project::{PomodoroSettings, PomodoroState, Task};

/// Percentage of completed tasks, rounded. Empty list counts as 0.
pub fn task_progress_pct(tasks: &[Task]) -> u32 {
    if tasks.is_empty() {
        return 0;
    }
    let completed = tasks.iter().filter(|t| t.completed).count();
    ((completed as f64 / tasks.len() as f64) * 100.0).round() as u32
}

/// Format accumulated seconds as "HH:MM:SS"
pub fn format_elapsed(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, secs)
}

/// Format a phase countdown as "MM:SS"
pub fn format_session(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// Format seconds as "Xh Ym" for summary listings
pub fn format_hours_minutes(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    format!("{}h {}m", hours, minutes)
}

/// Position within the current cycle group, 1-based: "Cycle X of Y"
pub fn cycle_position(state: &PomodoroState, settings: &PomodoroSettings) -> (u32, u32) {
    let total = settings.cycles_before_long_break;
    ((state.cycles_completed % total) + 1, total)
}
