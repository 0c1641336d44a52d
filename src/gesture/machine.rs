use super::error::{GestureError, GestureResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GesturePhase {
    #[default]
    Idle,
    Active,
    Ended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureStep {
    Start,
    Move,
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseTransition {
    pub from: GesturePhase,
    pub step: GestureStep,
    pub to: GesturePhase,
}

impl PhaseTransition {
    pub const fn new(from: GesturePhase, step: GestureStep, to: GesturePhase) -> Self {
        Self { from, step, to }
    }
}

/// Idle -> Active -> Ended, with any number of moves while active.
///
/// Only phase changes are kept in the history; repeated moves are not.
#[derive(Debug, Clone, Default)]
pub struct GesturePhaseMachine {
    phase: GesturePhase,
    transition_history: Vec<PhaseTransition>,
}

impl GesturePhaseMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> GesturePhase {
        self.phase
    }

    pub fn can_transition(&self, step: GestureStep) -> bool {
        self.next_phase(step).is_some()
    }

    pub fn next_phase(&self, step: GestureStep) -> Option<GesturePhase> {
        use GestureStep::*;
        match (self.phase, step) {
            (GesturePhase::Idle, Start) => Some(GesturePhase::Active),
            (GesturePhase::Active, Move) => Some(GesturePhase::Active),
            (GesturePhase::Active, End) => Some(GesturePhase::Ended),
            _ => None,
        }
    }

    pub fn transition(&mut self, step: GestureStep) -> GestureResult<GesturePhase> {
        let next = self.next_phase(step).ok_or(GestureError::InvalidTransition {
            from: self.phase,
            step,
        })?;

        if next != self.phase {
            tracing::debug!(from = ?self.phase, step = ?step, to = ?next, "gesture phase change");
            self.transition_history
                .push(PhaseTransition::new(self.phase, step, next));
        }
        self.phase = next;
        Ok(self.phase)
    }

    pub fn history(&self) -> &[PhaseTransition] {
        &self.transition_history
    }
}
