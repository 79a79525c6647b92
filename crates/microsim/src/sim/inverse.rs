use std::time::Instant;

use fastrand::Rng;
use microsim_linalg::{LinalgError, Mat2d, Matrix};

use crate::config::Tolerances;
use crate::sim::check_finite;
use crate::{Sim, SimError};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InverseEvent {
    SetCell { row: usize, col: usize, value: f64 },
    /// Rolls integer entries in `-5..=5` until `|det| >= 0.5`.
    Randomize,
    /// Replaces the second row by a multiple of the first.
    MakeSingular,
}

/// A 2x2 matrix and its inverse, with singular matrices flagged instead of inverted.
#[derive(Debug, Clone)]
pub struct MatrixInverse {
    matrix: Mat2d,
    tolerances: Tolerances,
    rng: Rng,
}

impl Default for MatrixInverse {
    fn default() -> Self {
        Self::new()
    }
}

impl MatrixInverse {
    pub fn new() -> Self {
        Self {
            matrix: Matrix::from_rows([[2.0, 1.0], [1.0, 1.0]]),
            tolerances: Tolerances::default(),
            rng: Rng::new(),
        }
    }

    pub fn with_seed(self, seed: u64) -> Self {
        Self {
            rng: Rng::with_seed(seed),
            ..self
        }
    }

    pub fn with_tolerances(self, tolerances: Tolerances) -> Self {
        Self { tolerances, ..self }
    }

    pub fn matrix(&self) -> &Mat2d {
        &self.matrix
    }

    pub fn determinant(&self) -> f64 {
        self.matrix.determinant()
    }

    pub fn adjugate(&self) -> Mat2d {
        self.matrix.adjugate()
    }

    /// The inverse, or [`LinalgError::Singular`] when `|det|` is below the display threshold.
    pub fn inverse(&self) -> Result<Mat2d, LinalgError> {
        self.matrix.inverse(self.tolerances.singular_display)
    }

    pub fn is_singular(&self) -> bool {
        self.inverse().is_err()
    }

    /// `A · A⁻¹`, which should be the identity.
    pub fn product(&self) -> Option<Mat2d> {
        self.inverse().ok().map(|inv| self.matrix * inv)
    }

    fn randomize(&mut self) {
        loop {
            let m: Mat2d = Matrix::from_fn(|_, _| self.rng.i32(-5..=5) as f64);
            if m.determinant().abs() >= 0.5 {
                self.matrix = m;
                return;
            }
        }
    }

    fn make_singular(&mut self) {
        let k = [-3.0, -2.0, -1.0, 1.0, 2.0, 3.0][self.rng.usize(..6)];
        let first = self.matrix.row(0);
        if first.as_array().iter().all(|v| *v == 0.0) {
            log::debug!("first row is zero, matrix is already singular");
        }
        self.matrix = Matrix::from_rows([first, first * k]);
    }
}

impl Sim for MatrixInverse {
    type Event = InverseEvent;

    fn name(&self) -> &'static str {
        "Matrix Inverse"
    }

    fn handle_event(&mut self, event: InverseEvent, _now: Instant) -> Result<(), SimError> {
        match event {
            InverseEvent::SetCell { row, col, value } => {
                self.matrix.set(row, col, check_finite(value)?)?;
            }
            InverseEvent::Randomize => self.randomize(),
            InverseEvent::MakeSingular => self.make_singular(),
        }
        if self.is_singular() {
            log::debug!("matrix is singular (det = {})", self.determinant());
        }
        Ok(())
    }

    fn tick(&mut self, _now: Instant) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn initial() {
        let sim = MatrixInverse::new();
        assert_eq!(sim.determinant(), 1.0);
        assert_eq!(
            sim.inverse().unwrap(),
            Matrix::from_rows([[1.0, -1.0], [-1.0, 2.0]])
        );
        assert_eq!(sim.product(), Some(Mat2d::IDENTITY));
    }

    #[test]
    fn edits() {
        let now = Instant::now();
        let mut sim = MatrixInverse::new();
        sim.handle_event(
            InverseEvent::SetCell {
                row: 1,
                col: 0,
                value: 2.0,
            },
            now,
        )
        .unwrap();
        // [[2, 1], [2, 1]]
        assert!(sim.is_singular());
        assert!(sim.product().is_none());

        assert_eq!(
            sim.handle_event(
                InverseEvent::SetCell {
                    row: 2,
                    col: 0,
                    value: 1.0
                },
                now
            ),
            Err(SimError::Linalg(LinalgError::IndexOutOfBounds {
                row: 2,
                col: 0,
                rows: 2,
                cols: 2
            }))
        );
        assert!(sim
            .handle_event(
                InverseEvent::SetCell {
                    row: 0,
                    col: 0,
                    value: f64::NAN
                },
                now
            )
            .is_err());
        assert_eq!(sim.matrix()[(0, 0)], 2.0);
    }

    #[test]
    fn randomize_and_make_singular() {
        let now = Instant::now();
        let mut sim = MatrixInverse::new().with_seed(42);
        for _ in 0..20 {
            sim.handle_event(InverseEvent::Randomize, now).unwrap();
            assert!(sim.determinant().abs() >= 0.5);
            assert_relative_eq!(sim.product().unwrap(), Mat2d::IDENTITY, epsilon = 1e-12);

            sim.handle_event(InverseEvent::MakeSingular, now).unwrap();
            assert!(sim.is_singular());
            assert_eq!(sim.determinant(), 0.0);
        }
    }
}
