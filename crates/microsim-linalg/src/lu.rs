//! LU decomposition by Gaussian elimination without pivoting.
//!
//! Rows are never exchanged: a pivot that is (numerically) zero ends the decomposition with
//! [`LinalgError::ZeroPivot`], even when the matrix could be factored after a row swap.

use itertools::iproduct;

use crate::{Float, LinalgError, Matrix};

/// `L` and `U` factors with `L * U = A`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lu<T, const N: usize> {
    /// Unit lower triangular factor holding the elimination multipliers.
    pub l: Matrix<T, N, N>,
    /// Upper triangular factor.
    pub u: Matrix<T, N, N>,
}

impl<T: Float, const N: usize> Lu<T, N> {
    /// Returns `L * U`.
    pub fn reconstruct(&self) -> Matrix<T, N, N> {
        self.l * self.u
    }

    /// Returns `true` if `L * U` matches `original` element-wise within `tolerance`.
    pub fn verify(&self, original: &Matrix<T, N, N>, tolerance: T) -> bool {
        let product = self.reconstruct();
        iproduct!(0..N, 0..N)
            .all(|(r, c)| (product[(r, c)] - original[(r, c)]).abs() <= tolerance)
    }
}

impl<T: Float, const N: usize> Matrix<T, N, N> {
    /// Computes the LU decomposition without pivoting (Doolittle form: `L` has a unit diagonal).
    ///
    /// # Errors
    ///
    /// - [`LinalgError::NonFinite`] if an element is NaN or infinite.
    /// - [`LinalgError::ZeroPivot`] as soon as a pivot has magnitude below `epsilon`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use microsim_linalg::*;
    /// # use approx::assert_abs_diff_eq;
    /// let a = Matrix::from_rows([
    ///     [2.0, 1.0, 1.0],
    ///     [4.0, 3.0, 3.0],
    ///     [8.0, 7.0, 9.0],
    /// ]);
    /// let lu = a.lu(1e-10)?;
    /// assert_abs_diff_eq!(lu.reconstruct(), a, epsilon = 1e-6);
    ///
    /// let needs_swap = Matrix::from_rows([[0.0, 1.0], [1.0, 0.0]]);
    /// assert!(matches!(needs_swap.lu(1e-10), Err(LinalgError::ZeroPivot { column: 0, .. })));
    /// # Ok::<(), LinalgError>(())
    /// ```
    #[doc(alias = "luDecompose")]
    pub fn lu(&self, epsilon: T) -> Result<Lu<T, N>, LinalgError> {
        let mut elim = Elimination::new(*self, epsilon)?;
        while elim.step()?.is_some() {}
        Ok(elim.factors())
    }
}

/// A single row operation performed during elimination: `row[target] -= multiplier * row[pivot]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EliminationStep<T> {
    /// The pivot row (equal to the pivot column).
    pub pivot_row: usize,
    pub target_row: usize,
    /// The multiplier `a[target][pivot] / a[pivot][pivot]`, stored in `L`.
    pub multiplier: T,
}

/// Gaussian elimination performed one row operation at a time.
///
/// Steps visit pivot columns `k = 0..N-1` and, for each, the rows below the pivot in order, for a
/// total of `N(N-1)/2` steps. After a zero pivot the elimination is stuck and every further
/// [`Elimination::step`] returns the same error.
#[derive(Debug, Clone)]
pub struct Elimination<T, const N: usize> {
    original: Matrix<T, N, N>,
    l: Matrix<T, N, N>,
    u: Matrix<T, N, N>,
    epsilon: T,
    steps_done: usize,
    last: Option<EliminationStep<T>>,
    failure: Option<LinalgError>,
}

impl<T: Float, const N: usize> Elimination<T, N> {
    /// # Errors
    ///
    /// Returns [`LinalgError::NonFinite`] if `matrix` contains NaN or infinite elements.
    pub fn new(matrix: Matrix<T, N, N>, epsilon: T) -> Result<Self, LinalgError> {
        if !matrix.is_finite() {
            return Err(LinalgError::NonFinite);
        }
        Ok(Self {
            original: matrix,
            l: Matrix::identity(),
            u: matrix,
            epsilon,
            steps_done: 0,
            last: None,
            failure: None,
        })
    }

    /// Returns a restarted elimination that uses a different pivot threshold.
    pub fn with_epsilon(self, epsilon: T) -> Self {
        let mut elim = Self { epsilon, ..self };
        elim.reset();
        elim
    }

    pub fn epsilon(&self) -> T {
        self.epsilon
    }

    /// `N(N-1)/2`.
    pub fn total_steps(&self) -> usize {
        N * N.saturating_sub(1) / 2
    }

    pub fn steps_done(&self) -> usize {
        self.steps_done
    }

    pub fn is_complete(&self) -> bool {
        self.steps_done == self.total_steps()
    }

    pub fn failure(&self) -> Option<LinalgError> {
        self.failure
    }

    /// The most recently performed step.
    pub fn last_step(&self) -> Option<EliminationStep<T>> {
        self.last
    }

    pub fn original(&self) -> &Matrix<T, N, N> {
        &self.original
    }

    /// `L` so far (multipliers of the steps done, identity elsewhere).
    pub fn l(&self) -> &Matrix<T, N, N> {
        &self.l
    }

    /// The working matrix, equal to `U` once complete.
    pub fn u(&self) -> &Matrix<T, N, N> {
        &self.u
    }

    /// Returns the `(pivot_row, target_row)` of the next step, if any.
    pub fn next_position(&self) -> Option<(usize, usize)> {
        // Pivot column k contributes N-1-k steps.
        let mut remaining = self.steps_done;
        for k in 0..N.saturating_sub(1) {
            let in_column = N - 1 - k;
            if remaining < in_column {
                return Some((k, k + 1 + remaining));
            }
            remaining -= in_column;
        }
        None
    }

    /// Performs the next row operation.
    ///
    /// Returns `Ok(None)` once all steps are done.
    ///
    /// # Errors
    ///
    /// Returns [`LinalgError::ZeroPivot`] if the pivot of this step has magnitude below the
    /// epsilon. The elimination makes no further progress after that.
    pub fn step(&mut self) -> Result<Option<EliminationStep<T>>, LinalgError> {
        if let Some(err) = self.failure {
            return Err(err);
        }
        let Some((k, i)) = self.next_position() else {
            return Ok(None);
        };

        let pivot = self.u[(k, k)];
        if pivot.abs() < self.epsilon {
            let err = LinalgError::ZeroPivot {
                column: k,
                value: pivot.to_f64(),
            };
            self.failure = Some(err);
            return Err(err);
        }

        let multiplier = self.u[(i, k)] / pivot;
        self.l[(i, k)] = multiplier;
        for col in 0..N {
            self.u[(i, col)] = self.u[(i, col)] - multiplier * self.u[(k, col)];
        }

        let step = EliminationStep {
            pivot_row: k,
            target_row: i,
            multiplier,
        };
        self.steps_done += 1;
        self.last = Some(step);
        Ok(Some(step))
    }

    /// Returns the current factors. Only a complete elimination yields a valid decomposition.
    pub fn factors(&self) -> Lu<T, N> {
        Lu {
            l: self.l,
            u: self.u,
        }
    }

    /// Restarts the elimination from the original matrix.
    pub fn reset(&mut self) {
        self.l = Matrix::identity();
        self.u = self.original;
        self.steps_done = 0;
        self.last = None;
        self.failure = None;
    }
}

#[cfg(test)]
mod tests {
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    use crate::Mat3d;

    use super::*;

    #[rustfmt::skip]
    fn example3() -> Mat3d {
        Matrix::from_rows([
            [2.0, 1.0, 1.0],
            [4.0, 3.0, 3.0],
            [8.0, 7.0, 9.0],
        ])
    }

    #[test]
    fn decompose3x3() {
        let a = example3();
        let lu = a.lu(1e-10).unwrap();

        #[rustfmt::skip]
        assert_eq!(lu.l, Matrix::from_rows([
            [1.0, 0.0, 0.0],
            [2.0, 1.0, 0.0],
            [4.0, 3.0, 1.0],
        ]));
        #[rustfmt::skip]
        assert_eq!(lu.u, Matrix::from_rows([
            [2.0, 1.0, 1.0],
            [0.0, 1.0, 1.0],
            [0.0, 0.0, 2.0],
        ]));
        assert_abs_diff_eq!(lu.reconstruct(), a, epsilon = 1e-6);
        assert!(lu.verify(&a, 1e-3));

        for (r, c) in iproduct!(0..3, 0..3) {
            if r > c {
                assert_eq!(lu.u[(r, c)], 0.0);
            }
            if r < c {
                assert_eq!(lu.l[(r, c)], 0.0);
            }
            if r == c {
                assert_eq!(lu.l[(r, c)], 1.0);
            }
        }
    }

    #[test]
    fn decompose4x4() {
        #[rustfmt::skip]
        let a = Matrix::from_rows([
            [2.0, 1.0, 1.0, 0.0],
            [4.0, 3.0, 3.0, 1.0],
            [8.0, 7.0, 9.0, 5.0],
            [6.0, 7.0, 9.0, 8.0],
        ]);
        let lu = a.lu(1e-10).unwrap();
        assert_eq!(lu.u.into_diagonal(), [2.0, 1.0, 2.0, 2.0]);
        assert_relative_eq!(
            lu.u.into_diagonal().into_array().iter().product::<f64>(),
            a.determinant()
        );
        assert!(lu.verify(&a, 1e-9));
    }

    #[test]
    fn stepwise() {
        let mut elim = Elimination::new(example3(), 1e-4).unwrap();
        assert_eq!(elim.total_steps(), 3);
        assert_eq!(elim.next_position(), Some((0, 1)));

        let s = elim.step().unwrap().unwrap();
        assert_eq!((s.pivot_row, s.target_row, s.multiplier), (0, 1, 2.0));
        let s = elim.step().unwrap().unwrap();
        assert_eq!((s.pivot_row, s.target_row, s.multiplier), (0, 2, 4.0));
        let s = elim.step().unwrap().unwrap();
        assert_eq!((s.pivot_row, s.target_row, s.multiplier), (1, 2, 3.0));
        assert!(elim.is_complete());
        assert_eq!(elim.step(), Ok(None));
        assert_eq!(elim.last_step(), Some(s));

        elim.reset();
        assert_eq!(elim.steps_done(), 0);
        assert_eq!(elim.u(), &example3());
        assert_eq!(elim.l(), &Mat3d::IDENTITY);
    }

    #[test]
    fn zero_pivot() {
        // The first pivot is fine, the second one vanishes after elimination.
        #[rustfmt::skip]
        let a = Matrix::from_rows([
            [1.0, 2.0, 3.0],
            [2.0, 4.0, 7.0],
            [1.0, 1.0, 1.0],
        ]);
        assert_eq!(
            a.lu(1e-10),
            Err(LinalgError::ZeroPivot {
                column: 1,
                value: 0.0
            })
        );

        let mut elim = Elimination::new(a, 1e-10).unwrap();
        assert!(elim.step().is_ok());
        assert!(elim.step().is_ok());
        let err = elim.step().unwrap_err();
        assert_eq!(elim.failure(), Some(err));
        assert_eq!(elim.step(), Err(err));
        assert_eq!(elim.steps_done(), 2);
    }

    #[test]
    fn trivial_sizes() {
        let one = Matrix::from_rows([[5.0]]);
        let elim = Elimination::new(one, 1e-10).unwrap();
        assert_eq!(elim.total_steps(), 0);
        assert!(elim.is_complete());
        assert_eq!(one.lu(1e-10).unwrap().u, one);

        let nan = Matrix::from_rows([[f64::NAN, 0.0], [0.0, 1.0]]);
        assert_eq!(nan.lu(1e-10).unwrap_err(), LinalgError::NonFinite);
    }
}
