//! Pomodoro phase state machine.
//!
//! The engine is caller-driven: it owns no thread and no clock. The
//! tracking registry hands it one tick per delivered second, and it
//! answers with a `PhaseComplete` event when a countdown runs out.
//! Phase order is work -> short break, with a long break replacing the
//! short one after every `cyclesBeforeLongBreak` completed work phases.

use crate::domain::{PomodoroPhase, PomodoroSettings, PomodoroState};
use crate::error::EngineError;

/// Events the engine emits for collaborators (notifications, sounds).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PomodoroEvent {
    /// The countdown for `phase` just reached zero.
    PhaseComplete { phase: PomodoroPhase },
}

/// Phase machine over one project's `PomodoroState`.
///
/// Borrows the state for a single operation; the settings are copied in
/// because they are immutable for the duration of a call.
pub struct PomodoroEngine<'a> {
    state: &'a mut PomodoroState,
    settings: PomodoroSettings,
}

impl<'a> PomodoroEngine<'a> {
    pub fn new(state: &'a mut PomodoroState, settings: PomodoroSettings) -> Self {
        Self { state, settings }
    }

    /// Count down one second.
    ///
    /// No-op while waiting for an advance or when the countdown already
    /// sits at zero. When the decrement reaches zero the phase is
    /// complete: the event is returned, `waiting_for_next_phase` is set,
    /// and with `auto_start_cycles` the next phase begins in the same
    /// call (so the caller never observes the waiting state).
    pub fn tick(&mut self) -> Option<PomodoroEvent> {
        if self.state.waiting_for_next_phase || self.state.session_time == 0 {
            return None;
        }

        self.state.session_time -= 1;
        if self.state.session_time > 0 {
            return None;
        }

        let phase = self.state.current_phase;
        self.state.waiting_for_next_phase = true;

        if self.settings.auto_start_cycles {
            // Waiting flag is set, so this cannot fail.
            let _ = self.advance_phase(false);
        }

        Some(PomodoroEvent::PhaseComplete { phase })
    }

    /// Move to the next phase.
    ///
    /// Valid while waiting after a completed countdown, or at any time
    /// with `force`. Completing a work phase increments the cycle count
    /// here, not at countdown expiry.
    pub fn advance_phase(&mut self, force: bool) -> Result<(), EngineError> {
        if !self.state.waiting_for_next_phase && !force {
            return Err(EngineError::InvalidState(
                "cannot advance: current phase has not completed".to_string(),
            ));
        }

        let next = match self.state.current_phase {
            PomodoroPhase::Work => {
                self.state.cycles_completed += 1;
                if self.state.cycles_completed % self.settings.cycles_before_long_break == 0 {
                    PomodoroPhase::LongBreak
                } else {
                    PomodoroPhase::ShortBreak
                }
            }
            PomodoroPhase::ShortBreak | PomodoroPhase::LongBreak => PomodoroPhase::Work,
        };

        self.state.current_phase = next;
        self.state.session_time = self.settings.phase_secs(next);
        self.state.waiting_for_next_phase = false;
        Ok(())
    }

    /// Apply a new configuration.
    ///
    /// The current phase's countdown restarts from the new duration for
    /// that phase; `current_phase` and `cycles_completed` are untouched.
    pub fn apply_settings(&mut self, settings: PomodoroSettings) -> Result<(), EngineError> {
        settings.validate()?;
        self.settings = settings;
        self.state.session_time = settings.phase_secs(self.state.current_phase);
        Ok(())
    }
}
