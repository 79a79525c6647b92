//! Classical Gram-Schmidt orthonormalization.

use crate::{Float, LinalgError, Matrix, Vector};

/// The phase of the Gram-Schmidt process that a step performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Computes the coefficients `r[j][i] = q_j · v_i` against every finished basis vector.
    Project,
    /// Subtracts the projections from `v_i`, leaving the residual.
    Subtract,
    /// Divides the residual by its length, producing the next basis vector.
    Normalize,
}

impl Phase {
    fn next(self) -> Self {
        match self {
            Phase::Project => Phase::Subtract,
            Phase::Subtract => Phase::Normalize,
            Phase::Normalize => Phase::Project,
        }
    }

    fn offset(self) -> usize {
        match self {
            Phase::Project => 0,
            Phase::Subtract => 1,
            Phase::Normalize => 2,
        }
    }
}

/// Describes a performed step: the input vector being processed and the phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GramSchmidtStep {
    pub index: usize,
    pub phase: Phase,
}

/// Result of a completed Gram-Schmidt run, with `Q * R` equal to the matrix whose columns are the
/// input vectors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Qr<T, const N: usize, const K: usize> {
    /// Orthonormal basis vectors as columns.
    pub q: Matrix<T, N, K>,
    /// Upper triangular coefficients.
    pub r: Matrix<T, K, K>,
}

impl<T: Float, const N: usize, const K: usize> Qr<T, N, K> {
    pub fn reconstruct(&self) -> Matrix<T, N, K> {
        self.q * self.r
    }
}

/// Orthonormalizes `K` vectors in `N` dimensions, three phases per vector.
///
/// # Examples
///
/// ```
/// # use microsim_linalg::*;
/// let mut gs = GramSchmidt::new([vec2(3.0, 1.0), vec2(2.0, 2.0)], 1e-10)?;
/// assert_eq!(gs.total_steps(), 6);
/// while gs.step()?.is_some() {}
/// assert!(gs.basis()[0].dot(gs.basis()[1]).abs() < 1e-12);
/// # Ok::<(), LinalgError>(())
/// ```
#[derive(Debug, Clone)]
pub struct GramSchmidt<T, const N: usize, const K: usize> {
    vectors: [Vector<T, N>; K],
    basis: [Vector<T, N>; K],
    r: Matrix<T, K, K>,
    residual: Vector<T, N>,
    index: usize,
    phase: Phase,
    epsilon: T,
    failure: Option<LinalgError>,
}

impl<T: Float, const N: usize, const K: usize> GramSchmidt<T, N, K> {
    /// # Errors
    ///
    /// Returns [`LinalgError::NonFinite`] if an input vector contains NaN or infinite elements.
    pub fn new(vectors: [Vector<T, N>; K], epsilon: T) -> Result<Self, LinalgError> {
        if !vectors.iter().all(Vector::is_finite) {
            return Err(LinalgError::NonFinite);
        }
        Ok(Self {
            vectors,
            basis: [Vector::ZERO; K],
            r: Matrix::ZERO,
            residual: Vector::ZERO,
            index: 0,
            phase: Phase::Project,
            epsilon,
            failure: None,
        })
    }

    pub fn vectors(&self) -> &[Vector<T, N>; K] {
        &self.vectors
    }

    /// The basis vectors produced so far.
    pub fn basis(&self) -> &[Vector<T, N>] {
        &self.basis[..self.index]
    }

    /// The residual of the vector currently being processed, valid after its subtract phase.
    pub fn residual(&self) -> Vector<T, N> {
        self.residual
    }

    /// Coefficients recorded so far. Entries not computed yet are zero.
    pub fn r(&self) -> &Matrix<T, K, K> {
        &self.r
    }

    /// The step that [`GramSchmidt::step`] will perform next.
    pub fn next_step(&self) -> Option<GramSchmidtStep> {
        (self.index < K && self.failure.is_none()).then_some(GramSchmidtStep {
            index: self.index,
            phase: self.phase,
        })
    }

    pub fn total_steps(&self) -> usize {
        3 * K
    }

    pub fn steps_done(&self) -> usize {
        3 * self.index + self.phase.offset()
    }

    pub fn is_complete(&self) -> bool {
        self.index == K
    }

    pub fn failure(&self) -> Option<LinalgError> {
        self.failure
    }

    /// Performs the next phase. Returns `Ok(None)` once every vector is processed.
    ///
    /// # Errors
    ///
    /// Returns [`LinalgError::LinearlyDependent`] when the residual of a vector is shorter than
    /// the epsilon. Every later call returns the same error.
    pub fn step(&mut self) -> Result<Option<GramSchmidtStep>, LinalgError> {
        if let Some(err) = self.failure {
            return Err(err);
        }
        if self.index == K {
            return Ok(None);
        }

        let i = self.index;
        let performed = GramSchmidtStep {
            index: i,
            phase: self.phase,
        };
        match self.phase {
            Phase::Project => {
                for j in 0..i {
                    self.r[(j, i)] = self.basis[j].dot(self.vectors[i]);
                }
            }
            Phase::Subtract => {
                self.residual = (0..i).fold(self.vectors[i], |acc, j| {
                    acc - self.basis[j] * self.r[(j, i)]
                });
            }
            Phase::Normalize => {
                let length = self.residual.length();
                if !length.is_finite() || length < self.epsilon {
                    let err = LinalgError::LinearlyDependent { index: i };
                    self.failure = Some(err);
                    return Err(err);
                }
                self.r[(i, i)] = length;
                self.basis[i] = self.residual / length;
                self.index += 1;
            }
        }
        self.phase = self.phase.next();
        Ok(Some(performed))
    }

    /// Returns `Q` and `R` once the process has completed.
    pub fn qr(&self) -> Option<Qr<T, N, K>> {
        self.is_complete().then(|| Qr {
            q: Matrix::from_columns(self.basis),
            r: self.r,
        })
    }

    pub fn reset(&mut self) {
        self.basis = [Vector::ZERO; K];
        self.r = Matrix::ZERO;
        self.residual = Vector::ZERO;
        self.index = 0;
        self.phase = Phase::Project;
        self.failure = None;
    }
}

/// Runs Gram-Schmidt on `vectors` to completion.
///
/// # Errors
///
/// [`LinalgError::LinearlyDependent`] if a vector lies (within `epsilon`) in the span of the
/// previous ones, or [`LinalgError::NonFinite`].
pub fn gram_schmidt<T: Float, const N: usize, const K: usize>(
    vectors: [Vector<T, N>; K],
    epsilon: T,
) -> Result<Qr<T, N, K>, LinalgError> {
    let mut gs = GramSchmidt::new(vectors, epsilon)?;
    while gs.step()?.is_some() {}
    gs.qr().ok_or(LinalgError::LinearlyDependent { index: gs.index })
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use crate::{vec3, Mat3d};

    use super::*;

    #[test]
    fn orthonormal_basis() {
        let vs = [vec3(1.0, 1.0, 0.0), vec3(1.0, 0.0, 1.0), vec3(0.0, 1.0, 1.0)];
        let qr = gram_schmidt(vs, 1e-10).unwrap();

        assert_abs_diff_eq!(qr.q.transpose() * qr.q, Mat3d::IDENTITY, epsilon = 1e-12);
        assert_abs_diff_eq!(qr.reconstruct(), Matrix::from_columns(vs), epsilon = 1e-12);
        for (r, c) in [(1, 0), (2, 0), (2, 1)] {
            assert_eq!(qr.r[(r, c)], 0.0);
        }
        assert_abs_diff_eq!(qr.r[(0, 0)], 2.0f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn phases() {
        let mut gs = GramSchmidt::new([vec3(2.0, 0.0, 0.0), vec3(1.0, 1.0, 0.0)], 1e-10).unwrap();
        assert_eq!(gs.total_steps(), 6);

        let expected = [
            (0, Phase::Project),
            (0, Phase::Subtract),
            (0, Phase::Normalize),
            (1, Phase::Project),
            (1, Phase::Subtract),
        ];
        for (index, phase) in expected {
            assert_eq!(gs.step(), Ok(Some(GramSchmidtStep { index, phase })));
        }
        assert_eq!(gs.steps_done(), 5);
        assert_eq!(gs.basis(), &[vec3(1.0, 0.0, 0.0)]);
        assert_eq!(gs.r()[(0, 1)], 1.0);
        assert_eq!(gs.residual(), vec3(0.0, 1.0, 0.0));
        assert!(gs.qr().is_none());

        assert!(gs.step().unwrap().is_some());
        assert!(gs.is_complete());
        assert_eq!(gs.next_step(), None);
        assert_eq!(gs.step(), Ok(None));

        gs.reset();
        assert_eq!(gs.steps_done(), 0);
        assert!(gs.basis().is_empty());
    }

    #[test]
    fn dependent() {
        let vs = [vec3(1.0, 2.0, 3.0), vec3(2.0, 4.0, 6.0)];
        assert_eq!(
            gram_schmidt(vs, 1e-10),
            Err(LinalgError::LinearlyDependent { index: 1 })
        );

        let mut gs = GramSchmidt::new([Vector::<f64, 3>::ZERO], 1e-10).unwrap();
        gs.step().unwrap();
        gs.step().unwrap();
        let err = gs.step().unwrap_err();
        assert_eq!(err, LinalgError::LinearlyDependent { index: 0 });
        assert_eq!(gs.step(), Err(err));
        assert_eq!(gs.next_step(), None);
    }

    #[test]
    fn non_finite() {
        assert_eq!(
            GramSchmidt::new([vec3(f64::NAN, 0.0, 0.0)], 1e-10).unwrap_err(),
            LinalgError::NonFinite
        );
    }
}
