use super::machine::{GesturePhase, GestureStep};
use thiserror::Error;

pub type GestureResult<T> = std::result::Result<T, GestureError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GestureError {
    #[error("invalid gesture step: {step:?} while {from:?}")]
    InvalidTransition { from: GesturePhase, step: GestureStep },
}
