//! Supervisor run state machine
//!
//! `Idle → Materializing → Spawned → Running → Terminating → Cleaned`, with
//! `Aborted` as the detour for fatal setup errors.

use crate::error::SupervisorError;
use tracing::debug;

/// Supervisor run states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SupervisorState {
    /// No run in progress
    #[default]
    Idle,

    /// Writing the transient config
    Materializing,

    /// frpc has been started
    Spawned,

    /// Signal handling armed, waiting on frpc
    Running,

    /// A termination request is being carried out
    Terminating,

    /// Setup failed before frpc could run
    Aborted,

    /// Transient state released
    Cleaned,
}

impl SupervisorState {
    /// Whether the state machine allows moving from `self` to `next`
    pub fn can_transition_to(self, next: SupervisorState) -> bool {
        use SupervisorState::*;

        matches!(
            (self, next),
            (Idle, Materializing)
                | (Materializing, Spawned)
                | (Materializing, Aborted)
                | (Spawned, Running)
                | (Spawned, Aborted)
                | (Running, Terminating)
                | (Running, Cleaned)
                | (Terminating, Cleaned)
                | (Aborted, Cleaned)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, SupervisorState::Cleaned)
    }
}

impl std::fmt::Display for SupervisorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SupervisorState::Idle => "idle",
            SupervisorState::Materializing => "materializing",
            SupervisorState::Spawned => "spawned",
            SupervisorState::Running => "running",
            SupervisorState::Terminating => "terminating",
            SupervisorState::Aborted => "aborted",
            SupervisorState::Cleaned => "cleaned",
        };
        f.write_str(name)
    }
}

/// Current state plus every state visited during the run
#[derive(Debug, Clone)]
pub struct StateTracker {
    history: Vec<SupervisorState>,
}

impl StateTracker {
    pub fn new() -> Self {
        Self {
            history: vec![SupervisorState::Idle],
        }
    }

    pub fn current(&self) -> SupervisorState {
        self.history
            .last()
            .copied()
            .unwrap_or(SupervisorState::Idle)
    }

    pub fn history(&self) -> &[SupervisorState] {
        &self.history
    }

    /// Whether the run passed through `state`
    pub fn visited(&self, state: SupervisorState) -> bool {
        self.history.contains(&state)
    }

    /// Start a fresh run; only allowed when idle or after cleanup
    pub fn begin(&mut self) -> Result<(), SupervisorError> {
        match self.current() {
            SupervisorState::Idle | SupervisorState::Cleaned => {
                self.history = vec![SupervisorState::Idle];
                Ok(())
            }
            other => Err(SupervisorError::InvalidStateTransition {
                from: other.to_string(),
                to: SupervisorState::Idle.to_string(),
            }),
        }
    }

    pub fn transition(&mut self, next: SupervisorState) -> Result<(), SupervisorError> {
        let current = self.current();
        if !current.can_transition_to(next) {
            return Err(SupervisorError::InvalidStateTransition {
                from: current.to_string(),
                to: next.to_string(),
            });
        }

        debug!("Supervisor state {} -> {}", current, next);
        self.history.push(next);
        Ok(())
    }
}

impl Default for StateTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use SupervisorState::*;

    #[test]
    fn test_happy_path_with_signal() {
        let mut tracker = StateTracker::new();
        for next in [Materializing, Spawned, Running, Terminating, Cleaned] {
            tracker.transition(next).unwrap();
        }
        assert!(tracker.current().is_terminal());
        assert_eq!(tracker.history().len(), 6);
    }

    #[test]
    fn test_natural_exit_skips_terminating() {
        let mut tracker = StateTracker::new();
        for next in [Materializing, Spawned, Running, Cleaned] {
            tracker.transition(next).unwrap();
        }
        assert!(!tracker.visited(Terminating));
    }

    #[test]
    fn test_abort_paths() {
        assert!(Materializing.can_transition_to(Aborted));
        assert!(Spawned.can_transition_to(Aborted));
        assert!(Aborted.can_transition_to(Cleaned));
        assert!(!Running.can_transition_to(Aborted));
        assert!(!Aborted.can_transition_to(Running));
    }

    #[test]
    fn test_rejects_skipping_states() {
        let mut tracker = StateTracker::new();
        let err = tracker.transition(Running).unwrap_err();
        assert!(matches!(
            err,
            SupervisorError::InvalidStateTransition { .. }
        ));
        assert_eq!(tracker.current(), Idle);
    }

    #[test]
    fn test_begin_requires_finished_run() {
        let mut tracker = StateTracker::new();
        tracker.transition(Materializing).unwrap();
        assert!(tracker.begin().is_err());

        tracker.transition(Aborted).unwrap();
        tracker.transition(Cleaned).unwrap();
        tracker.begin().unwrap();
        assert_eq!(tracker.history(), &[Idle]);
    }

    #[test]
    fn test_display() {
        assert_eq!(Terminating.to_string(), "terminating");
        assert_eq!(Cleaned.to_string(), "cleaned");
    }
}
