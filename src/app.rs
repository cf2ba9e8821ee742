use crate::domain::{PomodoroSettings, Project, TimerMode};
use crate::error::EngineError;
use crate::notifications;
use crate::persistence::{ensure_data_dir, load_projects, projects_file, save_projects};
use crate::tracking::{TrackEvent, TrackingRegistry};
use anyhow::Result;
use std::path::PathBuf;

/// Main application state
pub struct AppState {
    pub registry: TrackingRegistry,
    pub data_file: PathBuf,
    pub needs_save: bool,
}

impl AppState {
    /// Load projects from disk and build the application state
    pub fn load() -> Result<Self> {
        ensure_data_dir()?;
        let data_file = projects_file()?;
        let projects = load_projects(&data_file)?;
        Ok(Self {
            registry: TrackingRegistry::new(projects),
            data_file,
            needs_save: false,
        })
    }

    /// Build state around an explicit file, used by tests
    #[cfg(test)]
    pub fn with_file(data_file: PathBuf, projects: Vec<Project>) -> Self {
        Self {
            registry: TrackingRegistry::new(projects),
            data_file,
            needs_save: false,
        }
    }

    /// Persist the project list if anything changed since the last save
    pub fn save(&mut self) -> Result<()> {
        if !self.needs_save {
            return Ok(());
        }
        save_projects(&self.data_file, self.registry.projects())?;
        self.needs_save = false;
        Ok(())
    }

    /// Persist unconditionally, for shutdown paths
    pub fn save_now(&mut self) -> Result<()> {
        save_projects(&self.data_file, self.registry.projects())?;
        self.needs_save = false;
        Ok(())
    }

    pub fn add_project(&mut self, name: Option<String>) -> Result<String, EngineError> {
        let name = name.unwrap_or_else(|| self.registry.next_default_name());
        self.registry.add_project(name.clone())?;
        self.needs_save = true;
        Ok(name)
    }

    pub fn rename_project(&mut self, old: &str, new: &str) -> Result<(), EngineError> {
        self.registry.rename_project(old, new)?;
        self.needs_save = true;
        Ok(())
    }

    pub fn remove_project(&mut self, name: &str) -> Result<(), EngineError> {
        self.registry.remove_project(name)?;
        self.needs_save = true;
        Ok(())
    }

    pub fn add_task(&mut self, project: &str, content: String) -> Result<String, EngineError> {
        let id = self.registry.add_task(project, content)?;
        self.needs_save = true;
        Ok(id)
    }

    pub fn toggle_task(&mut self, project: &str, task_id: &str) -> Result<bool, EngineError> {
        let completed = self.registry.toggle_task(project, task_id)?;
        self.needs_save = true;
        Ok(completed)
    }

    pub fn remove_task(&mut self, project: &str, task_id: &str) -> Result<(), EngineError> {
        self.registry.remove_task(project, task_id)?;
        self.needs_save = true;
        Ok(())
    }

    pub fn start_tracking(&mut self, name: &str, mode: TimerMode) -> Result<(), EngineError> {
        self.registry.set_timer_mode(name, mode)?;
        self.registry.start_tracking(name)?;
        self.needs_save = true;
        Ok(())
    }

    pub fn stop_tracking(&mut self, name: &str) -> Result<(), EngineError> {
        self.registry.stop_tracking(name)?;
        self.needs_save = true;
        Ok(())
    }

    pub fn update_settings(
        &mut self,
        name: &str,
        settings: PomodoroSettings,
    ) -> Result<(), EngineError> {
        self.registry.update_settings(name, settings)?;
        self.needs_save = true;
        Ok(())
    }

    pub fn advance_phase(&mut self, name: &str) -> Result<(), EngineError> {
        self.registry.advance_phase(name, false)?;
        self.needs_save = true;
        Ok(())
    }

    pub fn replace_all(&mut self, projects: Vec<Project>) {
        self.registry.replace_all(projects);
        self.needs_save = true;
    }

    /// Advance all timers by one second.
    ///
    /// When a pomodoro phase completes without auto-start, the machine is
    /// left waiting for the user, so tracking stops rather than silently
    /// billing idle time. Returns the event so callers can report it.
    pub fn handle_tick(&mut self) -> Option<TrackEvent> {
        let event = self.registry.tick()?;
        self.needs_save = true;

        let TrackEvent::PhaseComplete { project, phase } = &event;
        notifications::notify_phase_complete(project, *phase);

        let still_waiting = self
            .registry
            .project(project)
            .and_then(|p| p.pomodoro_state.as_ref())
            .map(|s| s.waiting_for_next_phase)
            .unwrap_or(false);
        if still_waiting {
            let _ = self.registry.stop_tracking(&project.clone());
        }

        Some(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PomodoroPhase;
    use tempfile::tempdir;

    fn state_with(projects: Vec<Project>) -> (AppState, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let file = dir.path().join("projects.json");
        (AppState::with_file(file, projects), dir)
    }

    #[test]
    fn test_save_is_skipped_without_changes() {
        let (mut app, _dir) = state_with(vec![Project::new("a".to_string())]);
        app.save().unwrap();
        assert!(!app.data_file.exists());

        app.add_task("a", "task".to_string()).unwrap();
        app.save().unwrap();
        assert!(app.data_file.exists());
        assert!(!app.needs_save);
    }

    #[test]
    fn test_phase_complete_stops_tracking_when_waiting() {
        let mut project = Project::new("a".to_string());
        project.pomodoro_settings = Some(PomodoroSettings {
            work_duration: 1,
            auto_start_cycles: false,
            ..Default::default()
        });
        let (mut app, _dir) = state_with(vec![project]);
        app.start_tracking("a", TimerMode::Pomodoro).unwrap();

        let mut event = None;
        for _ in 0..60 {
            event = app.handle_tick();
            if event.is_some() {
                break;
            }
        }
        assert_eq!(
            event,
            Some(TrackEvent::PhaseComplete {
                project: "a".to_string(),
                phase: PomodoroPhase::Work,
            })
        );
        assert!(app.registry.is_idle());
    }

    #[test]
    fn test_phase_complete_keeps_tracking_with_auto_start() {
        let mut project = Project::new("a".to_string());
        project.pomodoro_settings = Some(PomodoroSettings {
            work_duration: 1,
            auto_start_cycles: true,
            ..Default::default()
        });
        let (mut app, _dir) = state_with(vec![project]);
        app.start_tracking("a", TimerMode::Pomodoro).unwrap();

        for _ in 0..60 {
            app.handle_tick();
        }
        assert_eq!(app.registry.tracking_project().unwrap().name, "a");
        let state = app.registry.project("a").unwrap().pomodoro_state.as_ref().unwrap();
        assert_eq!(state.current_phase, PomodoroPhase::ShortBreak);
    }

    #[test]
    fn test_default_project_names_skip_taken_ones() {
        let (mut app, _dir) = state_with(vec![Project::new("Project 1".to_string())]);
        assert_eq!(app.add_project(None).unwrap(), "Project 2");
        assert_eq!(app.add_project(None).unwrap(), "Project 3");
    }
}
