//! Generic gesture sessions: one start, any number of moves, one end.

pub mod error;
pub mod machine;

use std::time::Instant;

use crate::geometry::{merge_dirty, DirtyRect, Point};

pub use error::{GestureError, GestureResult};
pub use machine::{GesturePhase, GesturePhaseMachine, GestureStep, PhaseTransition};

/// One input sample, already mapped to image space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureEvent {
    pub position: Point,
    /// Monotonic milliseconds.
    pub timestamp_ms: u64,
    pub pressure: Option<f32>,
    pub velocity: Option<f32>,
    pub pointer_id: Option<u32>,
    pub tilt: Option<f32>,
    pub azimuth: Option<f32>,
}

impl GestureEvent {
    pub const fn at(position: Point, timestamp_ms: u64) -> Self {
        Self {
            position,
            timestamp_ms,
            pressure: None,
            velocity: None,
            pointer_id: None,
            tilt: None,
            azimuth: None,
        }
    }

    pub fn now(position: Point, clock: &dyn TimeSource) -> Self {
        Self::at(position, clock.now_ms())
    }

    pub const fn with_pressure(mut self, pressure: f32) -> Self {
        self.pressure = Some(pressure);
        self
    }

    pub const fn with_velocity(mut self, velocity: f32) -> Self {
        self.velocity = Some(velocity);
        self
    }

    pub const fn with_pointer(mut self, pointer_id: u32) -> Self {
        self.pointer_id = Some(pointer_id);
        self
    }

    /// Same sample metadata at another position, used to replay synthetic strokes.
    pub const fn moved_to(mut self, position: Point) -> Self {
        self.position = position;
        self
    }
}

/// Source of monotonic milliseconds for event timestamps.
pub trait TimeSource {
    fn now_ms(&self) -> u64;
}

#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl TimeSource for MonotonicClock {
    fn now_ms(&self) -> u64 {
        u64::try_from(self.origin.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}

/// Per-gesture session over a typed parameter set.
///
/// Calls must arrive in input order: `start`, then `move_to` any number of
/// times, then `end` once. A session is discarded after `end`; there is no
/// cancel step, callers that abort simply drop the session.
pub trait GestureSession {
    type Params;

    fn params(&self) -> &Self::Params;

    fn phase(&self) -> GesturePhase;

    fn start(&mut self, event: &GestureEvent) -> DirtyRect;

    fn move_to(&mut self, event: &GestureEvent) -> DirtyRect;

    fn end(&mut self, event: &GestureEvent) -> DirtyRect;
}

/// Shared bookkeeping for sessions: parameters, phase, last point, and the
/// dirty region accumulated over the gesture.
#[derive(Debug, Clone)]
pub struct SessionCore<P> {
    params: P,
    machine: GesturePhaseMachine,
    last_point: Option<Point>,
    accumulated_dirty: DirtyRect,
}

impl<P> SessionCore<P> {
    pub fn new(params: P) -> Self {
        Self {
            params,
            machine: GesturePhaseMachine::new(),
            last_point: None,
            accumulated_dirty: None,
        }
    }

    pub fn params(&self) -> &P {
        &self.params
    }

    /// Per-sample adjustments made by the session itself, such as event pressure.
    pub fn params_mut(&mut self) -> &mut P {
        &mut self.params
    }

    pub fn phase(&self) -> GesturePhase {
        self.machine.phase()
    }

    pub fn last_point(&self) -> Option<Point> {
        self.last_point
    }

    pub fn accumulated_dirty(&self) -> DirtyRect {
        self.accumulated_dirty
    }

    /// Advances the phase machine. Out-of-order steps are logged and refused so
    /// the caller can turn them into a no-op.
    pub fn advance(&mut self, step: GestureStep, point: Point) -> bool {
        match self.machine.transition(step) {
            Ok(_) => {
                self.last_point = Some(point);
                true
            }
            Err(err) => {
                tracing::warn!(%err, "ignoring out-of-order gesture event");
                false
            }
        }
    }

    pub fn record_dirty(&mut self, dirty: DirtyRect) -> DirtyRect {
        self.accumulated_dirty = merge_dirty(self.accumulated_dirty, dirty);
        dirty
    }
}
