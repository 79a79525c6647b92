//! Elementary row operations and (reduced) row echelon form.

use std::fmt;

use crate::{Float, LinalgError, Matrix};

/// An elementary row operation. Rows are 0-based; the [`Display`] notation is 1-based.
///
/// ```
/// # use microsim_linalg::*;
/// assert_eq!(RowOperation::<f64>::Swap(0, 1).to_string(), "R1 ↔ R2");
/// assert_eq!(RowOperation::Scale { row: 0, factor: 3.0 }.to_string(), "3 × R1 → R1");
/// assert_eq!(
///     RowOperation::AddMultiple { target: 0, source: 1, factor: -2.0 }.to_string(),
///     "R1 + -2×R2 → R1",
/// );
/// ```
///
/// [`Display`]: fmt::Display
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RowOperation<T> {
    /// Exchanges two rows.
    Swap(usize, usize),
    /// Multiplies a row by a non-zero factor.
    Scale { row: usize, factor: T },
    /// Adds `factor` times row `source` to row `target`.
    AddMultiple { target: usize, source: usize, factor: T },
}

impl<T: Float> RowOperation<T> {
    /// Checks that this operation is valid for a matrix with `rows` rows.
    ///
    /// # Errors
    ///
    /// Returns [`LinalgError::InvalidRowOperation`] for out-of-range rows, swapping a row with
    /// itself, scaling by zero (or by a non-finite factor), and adding a row to itself.
    pub fn validate(&self, rows: usize) -> Result<(), LinalgError> {
        let invalid = |reason| Err(LinalgError::InvalidRowOperation { reason });
        match *self {
            RowOperation::Swap(a, b) => {
                if a >= rows || b >= rows {
                    return invalid("row index out of range");
                }
                if a == b {
                    return invalid("cannot swap a row with itself");
                }
            }
            RowOperation::Scale { row, factor } => {
                if row >= rows {
                    return invalid("row index out of range");
                }
                if !factor.is_finite() {
                    return invalid("scale factor must be finite");
                }
                if factor == T::ZERO {
                    return invalid("cannot scale a row by zero");
                }
            }
            RowOperation::AddMultiple {
                target,
                source,
                factor,
            } => {
                if target >= rows || source >= rows {
                    return invalid("row index out of range");
                }
                if target == source {
                    return invalid("cannot add a row to itself");
                }
                if !factor.is_finite() {
                    return invalid("multiple must be finite");
                }
            }
        }
        Ok(())
    }
}

impl<T: fmt::Display> fmt::Display for RowOperation<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowOperation::Swap(a, b) => write!(f, "R{} ↔ R{}", a + 1, b + 1),
            RowOperation::Scale { row, factor } => {
                write!(f, "{} × R{} → R{}", factor, row + 1, row + 1)
            }
            RowOperation::AddMultiple {
                target,
                source,
                factor,
            } => write!(
                f,
                "R{} + {}×R{} → R{}",
                target + 1,
                factor,
                source + 1,
                target + 1
            ),
        }
    }
}

/// Which columns take part in the pivot search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Layout {
    /// Every column is a coefficient column.
    #[default]
    Coefficient,
    /// The last column is the right-hand side of a linear system and never holds a pivot.
    Augmented,
}

impl Layout {
    fn searched_columns(self, columns: usize) -> usize {
        match self {
            Layout::Coefficient => columns,
            Layout::Augmented => columns.saturating_sub(1),
        }
    }
}

/// A matrix in (reduced) row echelon form, with the operations that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Echelon<T, const R: usize, const C: usize> {
    pub matrix: Matrix<T, R, C>,
    /// `(row, column)` of every pivot, in row order.
    pub pivots: Vec<(usize, usize)>,
    pub operations: Vec<RowOperation<T>>,
}

impl<T, const R: usize, const C: usize> Echelon<T, R, C> {
    /// Number of row operations performed.
    pub fn operation_count(&self) -> usize {
        self.operations.len()
    }

    pub fn rank(&self) -> usize {
        self.pivots.len()
    }
}

impl<T: Float, const R: usize, const C: usize> Matrix<T, R, C> {
    /// Applies an elementary row operation in place.
    ///
    /// # Errors
    ///
    /// Returns [`LinalgError::InvalidRowOperation`] if the operation is invalid for this matrix
    /// (see [`RowOperation::validate`]). The matrix is unchanged in that case.
    pub fn apply_row_operation(&mut self, op: RowOperation<T>) -> Result<(), LinalgError> {
        op.validate(R)?;
        match op {
            RowOperation::Swap(a, b) => self.swap_rows(a, b),
            RowOperation::Scale { row, factor } => {
                for col in 0..C {
                    self[(row, col)] = self[(row, col)] * factor;
                }
            }
            RowOperation::AddMultiple {
                target,
                source,
                factor,
            } => {
                let source = self.row(source);
                for col in 0..C {
                    self[(target, col)] = self[(target, col)] + factor * source[col];
                }
            }
        }
        Ok(())
    }

    /// Reduces the matrix to row echelon form by Gaussian elimination with partial pivoting.
    ///
    /// Entries with magnitude below `epsilon` count as zero. Eliminated entries are set to exactly
    /// zero.
    ///
    /// # Examples
    ///
    /// ```
    /// # use microsim_linalg::*;
    /// let system = Matrix::from_rows([
    ///     [1.0, 2.0, 5.0],
    ///     [3.0, 4.0, 6.0],
    /// ]);
    /// let ref_ = system.row_echelon(Layout::Augmented, 1e-10);
    /// assert_eq!(ref_.pivots, [(0, 0), (1, 1)]);
    /// assert_eq!(ref_.matrix.row(0), [3.0, 4.0, 6.0]);
    /// ```
    pub fn row_echelon(&self, layout: Layout, epsilon: T) -> Echelon<T, R, C> {
        let mut matrix = *self;
        let mut pivots = Vec::new();
        let mut operations = Vec::new();
        let mut apply = |m: &mut Self, op| {
            // Every generated operation has distinct in-range rows and a finite, non-zero factor.
            if m.apply_row_operation(op).is_ok() {
                operations.push(op);
            }
        };

        let mut pivot_row = 0;
        for col in 0..layout.searched_columns(C) {
            if pivot_row == R {
                break;
            }
            let max_row = (pivot_row..R)
                .max_by(|&a, &b| {
                    let (a, b) = (matrix[(a, col)].abs(), matrix[(b, col)].abs());
                    a.partial_cmp(&b).unwrap_or(std::cmp::Ordering::Equal)
                })
                .unwrap_or(pivot_row);
            if matrix[(max_row, col)].abs() < epsilon {
                continue;
            }
            if max_row != pivot_row {
                apply(&mut matrix, RowOperation::Swap(pivot_row, max_row));
            }

            let pivot = matrix[(pivot_row, col)];
            for row in pivot_row + 1..R {
                let entry = matrix[(row, col)];
                if entry.abs() > epsilon {
                    apply(
                        &mut matrix,
                        RowOperation::AddMultiple {
                            target: row,
                            source: pivot_row,
                            factor: -(entry / pivot),
                        },
                    );
                }
                matrix[(row, col)] = T::ZERO;
            }
            pivots.push((pivot_row, col));
            pivot_row += 1;
        }

        Echelon {
            matrix,
            pivots,
            operations,
        }
    }

    /// Reduces the matrix to reduced row echelon form: row echelon form with every pivot scaled to
    /// 1 and the entries above each pivot eliminated.
    ///
    /// The recorded operations include those of the row echelon pass.
    pub fn reduced_row_echelon(&self, layout: Layout, epsilon: T) -> Echelon<T, R, C> {
        let Echelon {
            mut matrix,
            pivots,
            mut operations,
        } = self.row_echelon(layout, epsilon);
        let mut apply = |m: &mut Self, op| {
            if m.apply_row_operation(op).is_ok() {
                operations.push(op);
            }
        };

        for &(row, col) in pivots.iter().rev() {
            let pivot = matrix[(row, col)];
            if (pivot - T::ONE).abs() > epsilon {
                apply(
                    &mut matrix,
                    RowOperation::Scale {
                        row,
                        factor: T::ONE / pivot,
                    },
                );
            }
            matrix[(row, col)] = T::ONE;

            for above in 0..row {
                let entry = matrix[(above, col)];
                if entry.abs() > epsilon {
                    apply(
                        &mut matrix,
                        RowOperation::AddMultiple {
                            target: above,
                            source: row,
                            factor: -entry,
                        },
                    );
                }
                matrix[(above, col)] = T::ZERO;
            }
        }

        Echelon {
            matrix,
            pivots,
            operations,
        }
    }

    /// Returns the number of pivots in row echelon form.
    pub fn rank(&self, epsilon: T) -> usize {
        self.row_echelon(Layout::Coefficient, epsilon).rank()
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use itertools::iproduct;

    use crate::Mat3x4;

    use super::*;

    #[rustfmt::skip]
    fn system() -> Mat3x4<f64> {
        // x = 1, y = 2, z = 3
        Matrix::from_rows([
            [ 2.0,  1.0, -1.0,   1.0],
            [-3.0, -1.0,  2.0,   1.0],
            [-2.0,  1.0,  2.0,   6.0],
        ])
    }

    #[test]
    fn notation() {
        assert_eq!(RowOperation::<f64>::Swap(1, 2).to_string(), "R2 ↔ R3");
        assert_eq!(
            RowOperation::Scale {
                row: 2,
                factor: 0.5
            }
            .to_string(),
            "0.5 × R3 → R3"
        );
    }

    #[test]
    fn invalid_operations() {
        let mut m = system();
        let rejected = [
            RowOperation::Scale {
                row: 0,
                factor: 0.0,
            },
            RowOperation::Swap(1, 1),
            RowOperation::AddMultiple {
                target: 2,
                source: 2,
                factor: 1.0,
            },
            RowOperation::Swap(0, 3),
            RowOperation::Scale {
                row: 5,
                factor: 2.0,
            },
        ];
        for op in rejected {
            assert!(matches!(
                m.apply_row_operation(op),
                Err(LinalgError::InvalidRowOperation { .. })
            ));
        }
        assert_eq!(m, system());
    }

    #[test]
    fn apply() {
        let mut m = system();
        m.apply_row_operation(RowOperation::Swap(0, 2)).unwrap();
        assert_eq!(m.row(0), [-2.0, 1.0, 2.0, 6.0]);
        m.apply_row_operation(RowOperation::Scale {
            row: 0,
            factor: -0.5,
        })
        .unwrap();
        assert_eq!(m.row(0), [1.0, -0.5, -1.0, -3.0]);
        m.apply_row_operation(RowOperation::AddMultiple {
            target: 2,
            source: 0,
            factor: -2.0,
        })
        .unwrap();
        assert_eq!(m.row(2), [0.0, 2.0, 1.0, 7.0]);
    }

    #[test]
    fn echelon_forms() {
        let ref_ = system().row_echelon(Layout::Augmented, 1e-10);
        assert_eq!(ref_.pivots, [(0, 0), (1, 1), (2, 2)]);
        // Partial pivoting moves the largest first-column entry up.
        assert_eq!(ref_.operations[0], RowOperation::Swap(0, 1));
        for (r, c) in [(1, 0), (2, 0), (2, 1)] {
            assert_eq!(ref_.matrix[(r, c)], 0.0);
        }

        let rref = system().reduced_row_echelon(Layout::Augmented, 1e-10);
        assert!(rref.operation_count() > ref_.operation_count());
        assert_abs_diff_eq!(
            rref.matrix.column(3),
            crate::vec3(1.0, 2.0, 3.0),
            epsilon = 1e-12
        );
        for (r, c) in iproduct!(0..3, 0..3) {
            let expected = if r == c { 1.0 } else { 0.0 };
            assert_abs_diff_eq!(rref.matrix[(r, c)], expected, epsilon = 1e-12);
        }
    }

    #[test]
    fn rank() {
        #[rustfmt::skip]
        let m = Matrix::from_rows([
            [1.0, 2.0, 3.0],
            [2.0, 4.0, 6.0],
            [1.0, 0.0, 1.0],
        ]);
        assert_eq!(m.rank(1e-10), 2);
        assert_eq!(Matrix::<f64, 3, 3>::ZERO.rank(1e-10), 0);
        assert_eq!(Matrix::<f64, 4, 4>::identity().rank(1e-10), 4);

        // An inconsistent system has a pivot in the last column only without `Augmented`.
        let inconsistent = Matrix::from_rows([[1.0, 1.0, 1.0], [1.0, 1.0, 2.0]]);
        assert_eq!(inconsistent.row_echelon(Layout::Augmented, 1e-10).rank(), 1);
        assert_eq!(inconsistent.rank(1e-10), 2);
    }
}
