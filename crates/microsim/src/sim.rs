//! Simulation state machines.
//!
//! Each simulation owns its state and is driven through [`Sim::handle_event`] and [`Sim::tick`].
//! Derived values (determinants, solutions, errors) are recomputed by getters from the current
//! state, never stored across events.

use std::time::Instant;

use thiserror::Error;

use microsim_linalg::LinalgError;

use crate::Stepper;

mod condition;
mod cofactor;
mod cramer;
mod gram_schmidt;
mod inverse;
mod lu;
mod power;
mod quaternion;
mod row_ops;
mod sarrus;
mod svd;

pub use condition::*;
pub use cofactor::*;
pub use cramer::*;
pub use gram_schmidt::*;
pub use inverse::*;
pub use lu::*;
pub use power::*;
pub use quaternion::*;
pub use row_ops::*;
pub use sarrus::*;
pub use svd::*;

/// Common interface of all simulations.
pub trait Sim {
    /// The input events understood by this simulation.
    type Event;

    /// A human-readable name.
    fn name(&self) -> &'static str;

    /// Applies one input event.
    ///
    /// Expected edge cases (singular matrices, zero vectors) never fail; they are reflected in the
    /// getters instead. Invalid input is rejected with an error and leaves the state unchanged.
    fn handle_event(&mut self, event: Self::Event, now: Instant) -> Result<(), SimError>;

    /// Advances timed playback. Returns `true` if the state changed.
    fn tick(&mut self, now: Instant) -> bool;
}

/// Errors returned for rejected input.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    #[error(transparent)]
    Linalg(#[from] LinalgError),
    #[error("{what} must be in {min}..={max} (got {value})")]
    OutOfRange {
        what: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
}

/// The Step / Play / Reset buttons shared by the step-through simulations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepControl {
    Next,
    TogglePlay,
    Reset,
}

impl StepControl {
    pub(crate) fn apply(self, stepper: &mut Stepper, now: Instant) {
        match self {
            StepControl::Next => {
                stepper.next();
            }
            StepControl::TogglePlay => stepper.toggle_play(now),
            StepControl::Reset => stepper.reset(),
        }
    }
}

pub(crate) fn check_range(what: &'static str, value: f64, min: f64, max: f64) -> Result<f64, SimError> {
    if value >= min && value <= max {
        Ok(value)
    } else {
        log::debug!("rejected {what} = {value}");
        Err(SimError::OutOfRange {
            what,
            value,
            min,
            max,
        })
    }
}

/// Rejects non-finite cell values.
pub(crate) fn check_finite(value: f64) -> Result<f64, SimError> {
    if value.is_finite() {
        Ok(value)
    } else {
        log::debug!("rejected non-finite input {value}");
        Err(LinalgError::NonFinite.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_errors() {
        assert_eq!(check_range("rank", 3.0, 1.0, 64.0), Ok(3.0));
        let err = check_range("rank", 0.0, 1.0, 64.0).unwrap_err();
        assert_eq!(err.to_string(), "rank must be in 1..=64 (got 0)");
        assert_eq!(
            check_finite(f64::INFINITY),
            Err(SimError::Linalg(LinalgError::NonFinite))
        );
    }
}
