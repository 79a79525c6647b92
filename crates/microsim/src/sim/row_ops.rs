use std::time::Instant;

use microsim_linalg::{Layout, Mat3x4, Matrix, RowOperation, Vec3d};

use crate::config::Tolerances;
use crate::{Sim, SimError};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RowOpsEvent {
    Apply(RowOperation<f64>),
    /// Reverts the most recent operation. Does nothing if there is none.
    Undo,
    /// Restores the original system and clears the history.
    Reset,
}

/// An applied operation and the matrix it was applied to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistoryEntry {
    pub previous: Mat3x4<f64>,
    pub operation: RowOperation<f64>,
}

/// Practice tool for solving a 3x3 system by hand with elementary row operations.
#[derive(Debug, Clone)]
pub struct RowOperations {
    original: Mat3x4<f64>,
    matrix: Mat3x4<f64>,
    history: Vec<HistoryEntry>,
    tolerances: Tolerances,
}

impl Default for RowOperations {
    fn default() -> Self {
        #[rustfmt::skip]
        let system = Matrix::from_rows([
            [ 2.0,  1.0, -1.0,   8.0],
            [-3.0, -1.0,  2.0, -11.0],
            [-2.0,  1.0,  2.0,  -3.0],
        ]);
        Self::new(system)
    }
}

impl RowOperations {
    /// Starts from the augmented matrix `[A | b]`.
    pub fn new(system: Mat3x4<f64>) -> Self {
        Self {
            original: system,
            matrix: system,
            history: Vec::new(),
            tolerances: Tolerances::default(),
        }
    }

    pub fn with_tolerances(self, tolerances: Tolerances) -> Self {
        Self { tolerances, ..self }
    }

    pub fn matrix(&self) -> &Mat3x4<f64> {
        &self.matrix
    }

    pub fn original(&self) -> &Mat3x4<f64> {
        &self.original
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    /// The applied operations in notation form, oldest first.
    pub fn notation(&self) -> Vec<String> {
        self.history
            .iter()
            .map(|entry| entry.operation.to_string())
            .collect()
    }

    /// The reduced row echelon form of the original system, i.e. where the user should end up.
    pub fn target(&self) -> Mat3x4<f64> {
        self.original
            .reduced_row_echelon(Layout::Augmented, self.tolerances.epsilon)
            .matrix
    }

    fn is_zero(&self, value: f64) -> bool {
        value.abs() < self.tolerances.singular_display
    }

    /// Column of the first non-zero coefficient in `row`, ignoring the right-hand side.
    fn leading_column(&self, row: usize) -> Option<usize> {
        (0..3).find(|&col| !self.is_zero(self.matrix[(row, col)]))
    }

    /// `(row, col)` of the leading entries, if the matrix is in row echelon form.
    fn echelon_pivots(&self) -> Option<Vec<(usize, usize)>> {
        let mut pivots = Vec::new();
        let mut seen_zero_row = false;
        for row in 0..3 {
            match self.leading_column(row) {
                None => seen_zero_row = true,
                Some(_) if seen_zero_row => return None,
                Some(col) => {
                    if pivots.last().is_some_and(|&(_, prev)| col <= prev) {
                        return None;
                    }
                    pivots.push((row, col));
                }
            }
        }
        Some(pivots)
    }

    pub fn is_row_echelon(&self) -> bool {
        self.echelon_pivots().is_some()
    }

    /// Row echelon form with unit pivots that are the only non-zero entry of their column.
    pub fn is_reduced(&self) -> bool {
        let Some(pivots) = self.echelon_pivots() else {
            return false;
        };
        pivots.iter().all(|&(row, col)| {
            self.is_zero(self.matrix[(row, col)] - 1.0)
                && (0..3).all(|r| r == row || self.is_zero(self.matrix[(r, col)]))
        })
    }

    /// The solution, once the coefficient part has been reduced to the identity.
    pub fn solution(&self) -> Option<Vec3d> {
        let solved = self.is_reduced()
            && self.echelon_pivots().is_some_and(|p| p == [(0, 0), (1, 1), (2, 2)]);
        solved.then(|| self.matrix.column(3))
    }
}

impl Sim for RowOperations {
    type Event = RowOpsEvent;

    fn name(&self) -> &'static str {
        "Row Operations"
    }

    fn handle_event(&mut self, event: RowOpsEvent, _now: Instant) -> Result<(), SimError> {
        match event {
            RowOpsEvent::Apply(operation) => {
                let previous = self.matrix;
                if let Err(err) = self.matrix.apply_row_operation(operation) {
                    log::debug!("rejected {operation}: {err}");
                    return Err(err.into());
                }
                log::trace!("applied {operation}");
                self.history.push(HistoryEntry {
                    previous,
                    operation,
                });
            }
            RowOpsEvent::Undo => {
                if let Some(entry) = self.history.pop() {
                    self.matrix = entry.previous;
                }
            }
            RowOpsEvent::Reset => {
                self.matrix = self.original;
                self.history.clear();
            }
        }
        Ok(())
    }

    fn tick(&mut self, _now: Instant) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use microsim_linalg::{vec3, LinalgError};

    use super::*;

    fn apply(sim: &mut RowOperations, op: RowOperation<f64>) {
        sim.handle_event(RowOpsEvent::Apply(op), Instant::now())
            .unwrap();
    }

    fn add(target: usize, source: usize, factor: f64) -> RowOperation<f64> {
        RowOperation::AddMultiple {
            target,
            source,
            factor,
        }
    }

    fn scale(row: usize, factor: f64) -> RowOperation<f64> {
        RowOperation::Scale { row, factor }
    }

    #[test]
    fn solve_by_hand() {
        let mut sim = RowOperations::default();
        assert!(!sim.is_row_echelon());

        apply(&mut sim, add(1, 0, 1.5));
        apply(&mut sim, add(2, 0, 1.0));
        apply(&mut sim, add(2, 1, -4.0));
        assert!(sim.is_row_echelon());
        assert!(!sim.is_reduced());
        assert_eq!(sim.solution(), None);

        apply(&mut sim, scale(0, 0.5));
        apply(&mut sim, scale(1, 2.0));
        apply(&mut sim, scale(2, -1.0));
        apply(&mut sim, add(0, 1, -0.5));
        apply(&mut sim, add(0, 2, 1.0));
        apply(&mut sim, add(1, 2, -1.0));
        assert!(sim.is_reduced());
        assert_abs_diff_eq!(sim.solution().unwrap(), vec3(2.0, 3.0, -1.0), epsilon = 1e-12);
        assert_abs_diff_eq!(*sim.matrix(), sim.target(), epsilon = 1e-12);
        assert_eq!(sim.history().len(), 9);
        assert_eq!(sim.notation()[0], "R2 + 1.5×R1 → R2");
    }

    #[test]
    fn undo_and_reset() {
        let now = Instant::now();
        let mut sim = RowOperations::default();
        sim.handle_event(RowOpsEvent::Undo, now).unwrap();
        assert_eq!(sim.matrix(), sim.original());

        apply(&mut sim, RowOperation::Swap(0, 2));
        apply(&mut sim, scale(1, 3.0));
        assert_eq!(sim.matrix().row(0), [-2.0, 1.0, 2.0, -3.0]);

        sim.handle_event(RowOpsEvent::Undo, now).unwrap();
        assert_eq!(sim.history().len(), 1);
        assert_eq!(sim.matrix().row(1), sim.original().row(1));

        sim.handle_event(RowOpsEvent::Reset, now).unwrap();
        assert!(sim.history().is_empty());
        assert_eq!(sim.matrix(), sim.original());
    }

    #[test]
    fn invalid_operations() {
        let mut sim = RowOperations::default();
        for op in [
            RowOperation::Swap(1, 1),
            scale(0, 0.0),
            add(2, 2, 1.0),
            RowOperation::Swap(0, 3),
        ] {
            let err = sim
                .handle_event(RowOpsEvent::Apply(op), Instant::now())
                .unwrap_err();
            assert!(matches!(
                err,
                SimError::Linalg(LinalgError::InvalidRowOperation { .. })
            ));
        }
        assert!(sim.history().is_empty());
        assert_eq!(sim.matrix(), sim.original());
    }
}
