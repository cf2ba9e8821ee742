/// Cross-platform notification support
/// Currently only implements macOS notifications
use crate::domain::PomodoroPhase;

#[cfg(target_os = "macos")]
use std::process::Command;

/// Send a notification when a Pomodoro phase completes
pub fn notify_phase_complete(project_name: &str, phase: PomodoroPhase) {
    let body = if phase.is_break() {
        format!("{}: break over, back to work", project_name)
    } else {
        format!("{}: work session complete, time for a break", project_name)
    };
    send(&body);
}

#[cfg(target_os = "macos")]
fn send(body: &str) {
    let script = format!(
        r#"display notification "{}" with title "todoterm""#,
        body.replace('"', "\\\"")
    );

    let _ = Command::new("osascript").arg("-e").arg(&script).output();
}

#[cfg(not(target_os = "macos"))]
fn send(body: &str) {
    // No-op on other platforms
    let _ = body;
}
