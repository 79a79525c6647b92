use std::time::{Duration, Instant};

use microsim_linalg::{CofactorTerm, LinalgError, Mat3d, Matrix};

use crate::{Sim, SimError, StepControl, Stepper, StepperOptions};

/// Input events of [`CofactorExpansion`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CofactorEvent {
    Step(StepControl),
    /// Selects the (0-based) expansion row.
    SelectRow(usize),
    SetMatrix(Mat3d),
}

/// Determinant of a 3x3 matrix by cofactor expansion along a chosen row.
///
/// Step 0 shows the matrix, steps 1 to 3 each add one term `(-1)^(i+j) a_ij M_ij`, and step 4
/// shows the determinant.
#[derive(Debug, Clone)]
pub struct CofactorExpansion {
    matrix: Mat3d,
    row: usize,
    stepper: Stepper,
}

impl Default for CofactorExpansion {
    fn default() -> Self {
        Self::new()
    }
}

impl CofactorExpansion {
    pub const TOTAL_STEPS: usize = 4;

    pub fn new() -> Self {
        #[rustfmt::skip]
        let matrix = Matrix::from_rows([
            [2.0, 1.0, 3.0],
            [4.0, 5.0, 6.0],
            [7.0, 8.0, 9.0],
        ]);
        Self {
            matrix,
            row: 0,
            stepper: Stepper::new(
                Self::TOTAL_STEPS,
                StepperOptions::new().with_interval(Duration::from_millis(2000)),
            ),
        }
    }

    pub fn with_stepper_options(self, options: StepperOptions) -> Self {
        Self {
            stepper: Stepper::new(Self::TOTAL_STEPS, options),
            ..self
        }
    }

    pub fn matrix(&self) -> &Mat3d {
        &self.matrix
    }

    pub fn expansion_row(&self) -> usize {
        self.row
    }

    pub fn stepper(&self) -> &Stepper {
        &self.stepper
    }

    /// All three terms of the expansion along the selected row.
    pub fn terms(&self) -> [CofactorTerm<f64, 2>; 3] {
        self.matrix
            .cofactor_terms(self.row)
            .expect("expansion row is always in bounds")
    }

    /// The terms revealed at the current step.
    pub fn visible_terms(&self) -> Vec<CofactorTerm<f64, 2>> {
        let shown = self.stepper.step().min(3);
        self.terms().into_iter().take(shown).collect()
    }

    /// The column whose term is being added at the current step, if any.
    pub fn active_column(&self) -> Option<usize> {
        match self.stepper.step() {
            step @ 1..=3 => Some(step - 1),
            _ => None,
        }
    }

    /// Sum of the visible terms.
    pub fn running_sum(&self) -> f64 {
        self.visible_terms().iter().map(CofactorTerm::value).sum()
    }

    /// The determinant, once the final step is reached.
    pub fn result(&self) -> Option<f64> {
        self.stepper.is_at_end().then(|| self.running_sum_all())
    }

    fn running_sum_all(&self) -> f64 {
        self.terms().iter().map(CofactorTerm::value).sum()
    }

    /// `+` or `-` for each position of the checkerboard sign pattern.
    pub fn sign_pattern() -> [[char; 3]; 3] {
        std::array::from_fn(|i| std::array::from_fn(|j| if (i + j) % 2 == 0 { '+' } else { '-' }))
    }
}

impl Sim for CofactorExpansion {
    type Event = CofactorEvent;

    fn name(&self) -> &'static str {
        "Cofactor Expansion"
    }

    fn handle_event(&mut self, event: CofactorEvent, now: Instant) -> Result<(), SimError> {
        match event {
            CofactorEvent::Step(control) => control.apply(&mut self.stepper, now),
            CofactorEvent::SelectRow(row) => {
                if row >= 3 {
                    log::debug!("rejected expansion row {row}");
                    return Err(LinalgError::IndexOutOfBounds {
                        row,
                        col: 0,
                        rows: 3,
                        cols: 3,
                    }
                    .into());
                }
                self.row = row;
                self.stepper.reset();
            }
            CofactorEvent::SetMatrix(matrix) => {
                if !matrix.is_finite() {
                    return Err(LinalgError::NonFinite.into());
                }
                self.matrix = matrix;
                self.stepper.reset();
            }
        }
        Ok(())
    }

    fn tick(&mut self, now: Instant) -> bool {
        self.stepper.tick(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walk_through() {
        let now = Instant::now();
        let mut sim = CofactorExpansion::new();
        assert_eq!(sim.result(), None);
        assert_eq!(sim.active_column(), None);

        for _ in 0..3 {
            sim.handle_event(CofactorEvent::Step(StepControl::Next), now)
                .unwrap();
        }
        assert_eq!(sim.active_column(), Some(2));
        assert_eq!(sim.visible_terms().len(), 3);

        sim.handle_event(CofactorEvent::Step(StepControl::Next), now)
            .unwrap();
        let det = sim.result().unwrap();
        assert!((det - sim.matrix().determinant()).abs() < 1e-9);
        assert!((det + 9.0).abs() < 1e-9);
    }

    #[test]
    fn every_row_agrees() {
        let now = Instant::now();
        let mut sim = CofactorExpansion::new();
        let expected = sim.matrix().determinant();
        for row in 0..3 {
            sim.handle_event(CofactorEvent::SelectRow(row), now).unwrap();
            assert_eq!(sim.stepper().step(), 0);
            assert!((sim.running_sum_all() - expected).abs() < 1e-9);
        }
        assert!(sim.handle_event(CofactorEvent::SelectRow(3), now).is_err());
        assert_eq!(sim.expansion_row(), 2);
    }

    #[test]
    fn signs() {
        assert_eq!(
            CofactorExpansion::sign_pattern(),
            [['+', '-', '+'], ['-', '+', '-'], ['+', '-', '+']]
        );
    }
}
