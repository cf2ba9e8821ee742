//! Tracking registry: the single source of truth for which project, if
//! any, is accumulating time.
//!
//! The registry owns the project list and enforces the invariant that at
//! most one project has `is_tracking` set at any instant. Each delivered
//! tick is billed exactly once: to plain elapsed seconds in stopwatch
//! mode, or to the project's Pomodoro countdown in Pomodoro mode, never
//! both. Every tick re-resolves the hot project by name lookup, so a
//! stale reference can never receive a tick.

use chrono::{DateTime, Local};

use crate::domain::{PomodoroPhase, PomodoroSettings, Project, TimerMode};
use crate::error::EngineError;
use crate::pomodoro::{PomodoroEngine, PomodoroEvent};

/// Event surfaced from a tick, tagged with the owning project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackEvent {
    PhaseComplete {
        project: String,
        phase: PomodoroPhase,
    },
}

pub struct TrackingRegistry {
    projects: Vec<Project>,
    /// When the current tracking session started. Display metadata only:
    /// accounting is exactly one second per delivered tick.
    tracking_since: Option<DateTime<Local>>,
}

impl TrackingRegistry {
    /// Build a registry from a loaded snapshot.
    ///
    /// Tracking state is not meaningful across restarts, so every
    /// project comes up not tracking.
    pub fn new(mut projects: Vec<Project>) -> Self {
        for project in &mut projects {
            project.normalize_loaded();
        }
        Self {
            projects,
            tracking_since: None,
        }
    }

    // Queries

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn project(&self, name: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.name == name)
    }

    fn project_mut(&mut self, name: &str) -> Option<&mut Project> {
        self.projects.iter_mut().find(|p| p.name == name)
    }

    /// The project currently accumulating time, if any
    pub fn tracking_project(&self) -> Option<&Project> {
        self.projects.iter().find(|p| p.is_tracking)
    }

    pub fn tracking_since(&self) -> Option<DateTime<Local>> {
        self.tracking_since
    }

    pub fn is_idle(&self) -> bool {
        self.tracking_project().is_none()
    }

    /// First "Project N" name not already taken
    pub fn next_default_name(&self) -> String {
        let mut n = self.projects.len() + 1;
        loop {
            let candidate = format!("Project {}", n);
            if self.project(&candidate).is_none() {
                return candidate;
            }
            n += 1;
        }
    }

    // Project lifecycle

    pub fn add_project(&mut self, name: String) -> Result<&Project, EngineError> {
        if self.project(&name).is_some() {
            return Err(EngineError::ProjectExists(name));
        }
        self.projects.push(Project::new(name));
        Ok(self.projects.last().expect("just pushed"))
    }

    /// Rename a project. Tracking state, mode, and Pomodoro state all
    /// travel with the new name.
    pub fn rename_project(&mut self, old: &str, new: &str) -> Result<(), EngineError> {
        if old == new {
            return Ok(());
        }
        if self.project(new).is_some() {
            return Err(EngineError::ProjectExists(new.to_string()));
        }
        let project = self
            .project_mut(old)
            .ok_or_else(|| EngineError::ProjectNotFound(old.to_string()))?;
        project.name = new.to_string();
        Ok(())
    }

    pub fn remove_project(&mut self, name: &str) -> Result<Project, EngineError> {
        let idx = self
            .projects
            .iter()
            .position(|p| p.name == name)
            .ok_or_else(|| EngineError::ProjectNotFound(name.to_string()))?;
        let removed = self.projects.remove(idx);
        if removed.is_tracking {
            self.tracking_since = None;
        }
        Ok(removed)
    }

    /// Replace the whole project list (import). The caller is expected
    /// to have validated and normalized the snapshot.
    pub fn replace_all(&mut self, projects: Vec<Project>) {
        *self = Self::new(projects);
    }

    // Tracking transitions

    /// Start accumulating time for a project.
    ///
    /// Any other tracking project is stopped first, freezing its total
    /// at the current value. Starting the already-tracking project is an
    /// idempotent no-op.
    pub fn start_tracking(&mut self, name: &str) -> Result<(), EngineError> {
        if self.project(name).is_none() {
            return Err(EngineError::ProjectNotFound(name.to_string()));
        }
        if self.project(name).map(|p| p.is_tracking) == Some(true) {
            return Ok(());
        }

        for project in &mut self.projects {
            if project.is_tracking {
                Self::clear_tracking(project);
            }
        }

        let project = self.project_mut(name).expect("checked above");
        project.is_tracking = true;
        if let Some(state) = project.pomodoro_state.as_mut() {
            state.is_active = true;
        }
        self.tracking_since = Some(Local::now());
        Ok(())
    }

    /// Stop accumulating time for a project. No-op if it was not
    /// tracking; takes effect before the next tick is delivered.
    pub fn stop_tracking(&mut self, name: &str) -> Result<(), EngineError> {
        let project = self
            .project_mut(name)
            .ok_or_else(|| EngineError::ProjectNotFound(name.to_string()))?;
        if project.is_tracking {
            Self::clear_tracking(project);
            self.tracking_since = None;
        }
        Ok(())
    }

    fn clear_tracking(project: &mut Project) {
        project.is_tracking = false;
        if let Some(state) = project.pomodoro_state.as_mut() {
            state.is_active = false;
        }
    }

    /// Choose how ticks are billed for a project.
    ///
    /// Engaging Pomodoro mode for the first time creates a fresh
    /// work-phase state.
    pub fn set_timer_mode(&mut self, name: &str, mode: TimerMode) -> Result<(), EngineError> {
        let project = self
            .project_mut(name)
            .ok_or_else(|| EngineError::ProjectNotFound(name.to_string()))?;
        project.timer_mode = mode;
        if mode == TimerMode::Pomodoro {
            let tracking = project.is_tracking;
            let state = project.ensure_pomodoro_state();
            state.is_active = tracking;
        }
        Ok(())
    }

    // Tick delivery

    /// Deliver one second of elapsed time.
    ///
    /// A no-op when nothing tracks. Otherwise the hot project is
    /// resolved by lookup and the second is billed to exactly one of
    /// plain accumulation or the Pomodoro countdown.
    pub fn tick(&mut self) -> Option<TrackEvent> {
        let project = self.projects.iter_mut().find(|p| p.is_tracking)?;
        match project.timer_mode {
            TimerMode::Stopwatch => {
                project.time_spent += 1;
                None
            }
            TimerMode::Pomodoro => {
                let settings = project.effective_settings();
                let name = project.name.clone();
                let state = project.ensure_pomodoro_state();
                PomodoroEngine::new(state, settings).tick().map(
                    |PomodoroEvent::PhaseComplete { phase }| TrackEvent::PhaseComplete {
                        project: name,
                        phase,
                    },
                )
            }
        }
    }

    // Pomodoro operations

    /// Advance a waiting Pomodoro machine to its next phase.
    pub fn advance_phase(&mut self, name: &str, force: bool) -> Result<(), EngineError> {
        let project = self
            .project_mut(name)
            .ok_or_else(|| EngineError::ProjectNotFound(name.to_string()))?;
        let settings = project.effective_settings();
        let state = project.pomodoro_state.as_mut().ok_or_else(|| {
            EngineError::InvalidState("pomodoro mode has not been engaged".to_string())
        })?;
        PomodoroEngine::new(state, settings).advance_phase(force)
    }

    /// Store new Pomodoro settings for a project, restarting the current
    /// phase countdown at the new duration if a machine exists.
    pub fn update_settings(
        &mut self,
        name: &str,
        settings: PomodoroSettings,
    ) -> Result<(), EngineError> {
        settings.validate()?;
        let project = self
            .project_mut(name)
            .ok_or_else(|| EngineError::ProjectNotFound(name.to_string()))?;
        project.pomodoro_settings = Some(settings);
        if let Some(state) = project.pomodoro_state.as_mut() {
            PomodoroEngine::new(state, settings).apply_settings(settings)?;
        }
        Ok(())
    }

    // Task operations

    pub fn add_task(&mut self, name: &str, content: String) -> Result<String, EngineError> {
        let project = self
            .project_mut(name)
            .ok_or_else(|| EngineError::ProjectNotFound(name.to_string()))?;
        Ok(project.add_task(content).id.clone())
    }

    pub fn toggle_task(&mut self, name: &str, task_id: &str) -> Result<bool, EngineError> {
        let project = self
            .project_mut(name)
            .ok_or_else(|| EngineError::ProjectNotFound(name.to_string()))?;
        let task = project
            .task_mut(task_id)
            .ok_or_else(|| EngineError::InvalidState(format!("no task with id '{}'", task_id)))?;
        task.toggle();
        Ok(task.completed)
    }

    pub fn remove_task(&mut self, name: &str, task_id: &str) -> Result<(), EngineError> {
        let project = self
            .project_mut(name)
            .ok_or_else(|| EngineError::ProjectNotFound(name.to_string()))?;
        project
            .remove_task(task_id)
            .map(|_| ())
            .ok_or_else(|| EngineError::InvalidState(format!("no task with id '{}'", task_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PomodoroPhase;

    fn registry(names: &[&str]) -> TrackingRegistry {
        TrackingRegistry::new(names.iter().map(|n| Project::new(n.to_string())).collect())
    }

    fn tracking_count(reg: &TrackingRegistry) -> usize {
        reg.projects().iter().filter(|p| p.is_tracking).count()
    }

    #[test]
    fn test_new_clears_stale_tracking() {
        let mut stale = Project::new("a".to_string());
        stale.is_tracking = true;
        let reg = TrackingRegistry::new(vec![stale]);
        assert!(reg.is_idle());
        assert!(reg.tracking_since().is_none());
    }

    #[test]
    fn test_at_most_one_project_tracks() {
        let mut reg = registry(&["a", "b", "c"]);
        reg.start_tracking("a").unwrap();
        assert_eq!(tracking_count(&reg), 1);

        reg.start_tracking("b").unwrap();
        assert_eq!(tracking_count(&reg), 1);
        assert_eq!(reg.tracking_project().unwrap().name, "b");
        assert!(!reg.project("a").unwrap().is_tracking);
    }

    #[test]
    fn test_start_tracking_is_idempotent() {
        let mut reg = registry(&["a"]);
        reg.start_tracking("a").unwrap();
        let since = reg.tracking_since();
        reg.start_tracking("a").unwrap();
        assert_eq!(reg.tracking_since(), since);
        assert_eq!(tracking_count(&reg), 1);
    }

    #[test]
    fn test_unknown_project_is_reported_not_thrown() {
        let mut reg = registry(&["a"]);
        assert!(reg.start_tracking("nope").unwrap_err().is_not_found());
        assert!(reg.stop_tracking("nope").unwrap_err().is_not_found());
        // The tick loop is unaffected by the failed call.
        assert!(reg.tick().is_none());
    }

    #[test]
    fn test_tick_increments_exactly_one_project() {
        let mut reg = registry(&["a", "b"]);
        reg.start_tracking("a").unwrap();
        for _ in 0..5 {
            reg.tick();
        }
        assert_eq!(reg.project("a").unwrap().time_spent, 5);
        assert_eq!(reg.project("b").unwrap().time_spent, 0);
    }

    #[test]
    fn test_tick_while_idle_is_noop() {
        let mut reg = registry(&["a"]);
        assert!(reg.tick().is_none());
        assert_eq!(reg.project("a").unwrap().time_spent, 0);
    }

    #[test]
    fn test_no_double_counting_across_toggles() {
        let mut reg = registry(&["a", "b"]);
        let mut expected_a = 0u64;
        let mut expected_b = 0u64;

        reg.start_tracking("a").unwrap();
        for _ in 0..3 {
            reg.tick();
            expected_a += 1;
        }
        reg.stop_tracking("a").unwrap();
        // Idle ticks are counted nowhere.
        reg.tick();
        reg.tick();

        reg.start_tracking("b").unwrap();
        reg.tick();
        expected_b += 1;
        // Switching tracks stops b before a starts.
        reg.start_tracking("a").unwrap();
        for _ in 0..4 {
            reg.tick();
            expected_a += 1;
        }

        let total: u64 = reg.projects().iter().map(|p| p.time_spent).sum();
        assert_eq!(reg.project("a").unwrap().time_spent, expected_a);
        assert_eq!(reg.project("b").unwrap().time_spent, expected_b);
        assert_eq!(total, expected_a + expected_b);
    }

    #[test]
    fn test_pomodoro_mode_never_bills_time_spent() {
        let mut reg = registry(&["a"]);
        reg.set_timer_mode("a", TimerMode::Pomodoro).unwrap();
        reg.start_tracking("a").unwrap();
        for _ in 0..10 {
            reg.tick();
        }
        let project = reg.project("a").unwrap();
        assert_eq!(project.time_spent, 0);
        assert_eq!(
            project.pomodoro_state.as_ref().unwrap().session_time,
            25 * 60 - 10
        );
    }

    #[test]
    fn test_engaging_pomodoro_lazily_creates_state() {
        let mut reg = registry(&["a"]);
        assert!(reg.project("a").unwrap().pomodoro_state.is_none());
        reg.set_timer_mode("a", TimerMode::Pomodoro).unwrap();
        let state = reg.project("a").unwrap().pomodoro_state.as_ref().unwrap();
        assert_eq!(state.current_phase, PomodoroPhase::Work);
        assert_eq!(state.session_time, 25 * 60);
    }

    #[test]
    fn test_phase_complete_event_carries_project_name() {
        let mut reg = registry(&["deep work"]);
        reg.set_timer_mode("deep work", TimerMode::Pomodoro).unwrap();
        reg.start_tracking("deep work").unwrap();
        reg.project_mut("deep work")
            .unwrap()
            .pomodoro_state
            .as_mut()
            .unwrap()
            .session_time = 1;

        let event = reg.tick().unwrap();
        assert_eq!(
            event,
            TrackEvent::PhaseComplete {
                project: "deep work".to_string(),
                phase: PomodoroPhase::Work,
            }
        );
        // Without auto-start the machine now waits for an advance.
        let state = reg.project("deep work").unwrap().pomodoro_state.as_ref().unwrap();
        assert!(state.waiting_for_next_phase);

        reg.advance_phase("deep work", false).unwrap();
        let state = reg.project("deep work").unwrap().pomodoro_state.as_ref().unwrap();
        assert_eq!(state.current_phase, PomodoroPhase::ShortBreak);
        assert_eq!(state.cycles_completed, 1);
    }

    #[test]
    fn test_is_active_mirrors_tracking() {
        let mut reg = registry(&["a"]);
        reg.set_timer_mode("a", TimerMode::Pomodoro).unwrap();
        assert!(!reg.project("a").unwrap().pomodoro_state.as_ref().unwrap().is_active);

        reg.start_tracking("a").unwrap();
        assert!(reg.project("a").unwrap().pomodoro_state.as_ref().unwrap().is_active);

        reg.stop_tracking("a").unwrap();
        assert!(!reg.project("a").unwrap().pomodoro_state.as_ref().unwrap().is_active);
    }

    #[test]
    fn test_add_project_rejects_duplicates() {
        let mut reg = registry(&["a"]);
        assert!(matches!(
            reg.add_project("a".to_string()),
            Err(EngineError::ProjectExists(_))
        ));
        reg.add_project("b".to_string()).unwrap();
        assert_eq!(reg.projects().len(), 2);
    }

    #[test]
    fn test_next_default_name_skips_taken() {
        let mut reg = registry(&[]);
        assert_eq!(reg.next_default_name(), "Project 1");
        reg.add_project("Project 1".to_string()).unwrap();
        reg.add_project("Project 2".to_string()).unwrap();
        reg.remove_project("Project 1").unwrap();
        // len()+1 == 2 collides, so the next free name is picked.
        assert_eq!(reg.next_default_name(), "Project 3");
    }

    #[test]
    fn test_rename_preserves_tracking_and_rejects_duplicates() {
        let mut reg = registry(&["a", "b"]);
        reg.start_tracking("a").unwrap();

        assert!(matches!(
            reg.rename_project("a", "b"),
            Err(EngineError::ProjectExists(_))
        ));

        reg.rename_project("a", "c").unwrap();
        assert_eq!(reg.tracking_project().unwrap().name, "c");
        reg.tick();
        assert_eq!(reg.project("c").unwrap().time_spent, 1);
    }

    #[test]
    fn test_remove_tracking_project_goes_idle() {
        let mut reg = registry(&["a", "b"]);
        reg.start_tracking("a").unwrap();
        reg.remove_project("a").unwrap();
        assert!(reg.is_idle());
        assert!(reg.tracking_since().is_none());
        assert!(reg.tick().is_none());
    }

    #[test]
    fn test_replace_all_resets_tracking() {
        let mut reg = registry(&["a"]);
        reg.start_tracking("a").unwrap();

        let mut imported = Project::new("x".to_string());
        imported.is_tracking = true;
        reg.replace_all(vec![imported]);

        assert_eq!(reg.projects().len(), 1);
        assert!(reg.is_idle());
    }

    #[test]
    fn test_update_settings_stores_and_resets_countdown() {
        let mut reg = registry(&["a"]);
        reg.set_timer_mode("a", TimerMode::Pomodoro).unwrap();
        reg.start_tracking("a").unwrap();
        reg.tick();
        reg.tick();

        let settings = PomodoroSettings {
            work_duration: 50,
            ..Default::default()
        };
        reg.update_settings("a", settings).unwrap();

        let project = reg.project("a").unwrap();
        assert_eq!(project.pomodoro_settings, Some(settings));
        assert_eq!(project.pomodoro_state.as_ref().unwrap().session_time, 50 * 60);
    }

    #[test]
    fn test_update_settings_validates_before_mutating() {
        let mut reg = registry(&["a"]);
        let bad = PomodoroSettings {
            work_duration: 0,
            ..Default::default()
        };
        assert!(matches!(
            reg.update_settings("a", bad),
            Err(EngineError::InvalidConfiguration(_))
        ));
        assert!(reg.project("a").unwrap().pomodoro_settings.is_none());
    }

    #[test]
    fn test_advance_without_engaged_pomodoro_is_invalid_state() {
        let mut reg = registry(&["a"]);
        assert!(matches!(
            reg.advance_phase("a", false),
            Err(EngineError::InvalidState(_))
        ));
    }

    #[test]
    fn test_task_operations() {
        let mut reg = registry(&["a"]);
        let id = reg.add_task("a", "write tests".to_string()).unwrap();
        assert!(reg.toggle_task("a", &id).unwrap());
        assert!(!reg.toggle_task("a", &id).unwrap());
        reg.remove_task("a", &id).unwrap();
        assert!(reg.remove_task("a", &id).is_err());
        assert!(reg.add_task("nope", "x".to_string()).unwrap_err().is_not_found());
    }
}
