//! Eigenvalues and eigenvectors of 2x2 matrices, and power iteration.

use crate::{Float, Mat2, Matrix, Vec2, Vector};

/// The characteristic polynomial `λ² - trace·λ + det` of a 2x2 matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CharacteristicPolynomial<T> {
    pub trace: T,
    pub determinant: T,
}

impl<T: Float> CharacteristicPolynomial<T> {
    /// Returns the coefficients `[1, -trace, det]`, highest degree first.
    pub fn coefficients(&self) -> [T; 3] {
        [T::ONE, -self.trace, self.determinant]
    }

    /// Returns `trace² - 4·det`. Negative values mean a complex conjugate pair of roots.
    pub fn discriminant(&self) -> T {
        self.trace * self.trace - T::from_f64(4.0) * self.determinant
    }

    pub fn evaluate(&self, lambda: T) -> T {
        lambda * lambda - self.trace * lambda + self.determinant
    }
}

/// The two eigenvalues of a 2x2 matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Eigenvalues<T> {
    /// Two real eigenvalues, the first one being the larger (`λ1 ≥ λ2`).
    Real(T, T),
    /// The complex conjugate pair `re ± im·i`, with `im > 0`.
    Complex { re: T, im: T },
}

impl<T: Float> Eigenvalues<T> {
    /// Returns the real eigenvalue with the larger magnitude, which power iteration converges to.
    pub fn dominant(&self) -> Option<T> {
        match *self {
            Eigenvalues::Real(l1, l2) => Some(if l1.abs() >= l2.abs() { l1 } else { l2 }),
            Eigenvalues::Complex { .. } => None,
        }
    }

    pub fn is_real(&self) -> bool {
        matches!(self, Eigenvalues::Real(..))
    }
}

/// Eigenvalues of a general 2x2 matrix, plus unit eigenvectors when the eigenvalues are real.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Eigen<T> {
    pub values: Eigenvalues<T>,
    /// Eigenvectors matching `Eigenvalues::Real(λ1, λ2)` in order. [`None`] for complex pairs.
    pub vectors: Option<[Vec2<T>; 2]>,
}

/// Eigendecomposition of a symmetric 2x2 matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SymmetricEigen<T> {
    /// `[λ1, λ2]` with `λ1 ≥ λ2`.
    pub values: [T; 2],
    /// Orthonormal eigenvectors, `vectors[i]` belonging to `values[i]`.
    pub vectors: [Vec2<T>; 2],
}

impl<T: Float> Mat2<T> {
    pub fn characteristic_polynomial(&self) -> CharacteristicPolynomial<T> {
        CharacteristicPolynomial {
            trace: self.trace(),
            determinant: self.determinant(),
        }
    }

    /// Computes the eigenvalues as the roots of the characteristic polynomial.
    ///
    /// # Examples
    ///
    /// ```
    /// # use microsim_linalg::*;
    /// let m = Matrix::from_rows([[2.0, 1.0], [1.0, 2.0]]);
    /// assert_eq!(m.eigenvalues(), Eigenvalues::Real(3.0, 1.0));
    ///
    /// let rotation = Matrix::from_rows([[0.0, -1.0], [1.0, 0.0]]);
    /// assert_eq!(rotation.eigenvalues(), Eigenvalues::Complex { re: 0.0, im: 1.0 });
    /// ```
    pub fn eigenvalues(&self) -> Eigenvalues<T> {
        let poly = self.characteristic_polynomial();
        let disc = poly.discriminant();
        let two = T::from_f64(2.0);
        if disc >= T::ZERO {
            let root = disc.sqrt();
            Eigenvalues::Real((poly.trace + root) / two, (poly.trace - root) / two)
        } else {
            Eigenvalues::Complex {
                re: poly.trace / two,
                im: (-disc).sqrt() / two,
            }
        }
    }

    /// Returns a unit vector spanning the null space of `self - λI`.
    ///
    /// The direction is read off the first row when its off-diagonal entry is usable, then off the
    /// second row, falling back to a standard basis vector. `epsilon` decides which entries count
    /// as zero.
    pub fn eigenvector(&self, lambda: T, epsilon: T) -> Vec2<T> {
        let [[a, b], [c, d]] = self.0;
        let v = if b.abs() > epsilon {
            Vector([b, lambda - a])
        } else if (a - lambda).abs() > epsilon {
            Vec2::Y
        } else if c.abs() > epsilon {
            Vector([lambda - d, c])
        } else {
            Vec2::X
        };
        v.normalize_or(Vec2::X, epsilon)
    }

    /// Computes eigenvalues, and eigenvectors if the eigenvalues are real.
    pub fn eigen(&self, epsilon: T) -> Eigen<T> {
        let values = self.eigenvalues();
        let vectors = match values {
            Eigenvalues::Real(l1, l2) => {
                Some([self.eigenvector(l1, epsilon), self.eigenvector(l2, epsilon)])
            }
            Eigenvalues::Complex { .. } => None,
        };
        Eigen { values, vectors }
    }

    /// Closed-form eigendecomposition of a symmetric matrix.
    ///
    /// The discriminant is clamped to 0 so that rounding on (near) repeated eigenvalues does not
    /// produce NaN. If the off-diagonal entry is below `epsilon` the matrix is treated as diagonal
    /// and the standard basis is returned. Only the upper off-diagonal entry is read.
    ///
    /// # Examples
    ///
    /// ```
    /// # use microsim_linalg::*;
    /// # use approx::assert_relative_eq;
    /// let m = Matrix::from_rows([[2.0, 1.0], [1.0, 2.0]]);
    /// let eig = m.symmetric_eigen(1e-10);
    /// assert_relative_eq!(eig.values[0], 3.0);
    /// assert_relative_eq!(m * eig.vectors[0], eig.vectors[0] * 3.0, epsilon = 1e-12);
    /// ```
    #[doc(alias = "eigen2x2Symmetric")]
    pub fn symmetric_eigen(&self, epsilon: T) -> SymmetricEigen<T> {
        let [[a, b], [_, d]] = self.0;
        let poly = self.characteristic_polynomial();
        let two = T::from_f64(2.0);
        let root = poly.discriminant().max(T::ZERO).sqrt();
        let l1 = (poly.trace + root) / two;
        let l2 = (poly.trace - root) / two;

        if b.abs() < epsilon {
            // Already diagonal: the larger diagonal entry goes with λ1.
            let (x, y) = if a >= d {
                (Vec2::X, Vec2::Y)
            } else {
                (Vec2::Y, Vec2::X)
            };
            return SymmetricEigen {
                values: [a.max(d), a.min(d)],
                vectors: [x, y],
            };
        }

        // Symmetric, so v2 ⟂ v1 even when rounding collapses λ1 and λ2.
        let v1 = Vector([b, l1 - a]).normalize_or(Vec2::X, epsilon);
        let v2 = Vector([-v1[1], v1[0]]);
        SymmetricEigen {
            values: [l1, l2],
            vectors: [v1, v2],
        }
    }
}

/// Stepwise power iteration `x ← A x / |A x|`, converging to the dominant eigenvector.
///
/// # Examples
///
/// ```
/// # use microsim_linalg::*;
/// let m = Matrix::from_rows([[3.0, 1.0], [1.0, 2.0]]);
/// let mut it = PowerIteration::new(m, Vec2d::X, 1e-4);
/// for _ in 0..30 {
///     it.step();
/// }
/// let dominant = m.eigenvalues().dominant().unwrap();
/// assert!((it.rayleigh_quotient() - dominant).abs() < 1e-9);
/// ```
#[derive(Debug, Clone)]
pub struct PowerIteration<T, const N: usize> {
    matrix: Matrix<T, N, N>,
    current: Vector<T, N>,
    iteration: usize,
    rayleigh: T,
    epsilon: T,
}

impl<T: Float, const N: usize> PowerIteration<T, N> {
    /// Starts power iteration from `start`. `epsilon` is the smallest `|A x|` that is still
    /// normalized; below it the vector is left unchanged.
    pub fn new(matrix: Matrix<T, N, N>, start: Vector<T, N>, epsilon: T) -> Self {
        Self {
            matrix,
            current: start,
            iteration: 0,
            rayleigh: T::ZERO,
            epsilon,
        }
    }

    pub fn matrix(&self) -> &Matrix<T, N, N> {
        &self.matrix
    }

    pub fn current(&self) -> Vector<T, N> {
        self.current
    }

    /// Number of steps performed so far.
    pub fn iteration(&self) -> usize {
        self.iteration
    }

    /// The Rayleigh quotient `xᵀAx / xᵀx` after the last step (0 before the first step).
    pub fn rayleigh_quotient(&self) -> T {
        self.rayleigh
    }

    /// Performs one multiply-and-normalize step and returns the new vector.
    pub fn step(&mut self) -> Vector<T, N> {
        let y = self.matrix * self.current;
        if let Some(next) = y.try_normalize(self.epsilon) {
            self.current = next;
        }

        let x = self.current;
        let xtx = x.length2();
        if xtx > T::ZERO {
            self.rayleigh = x.dot(self.matrix * x) / xtx;
        }

        self.iteration += 1;
        self.current
    }

    /// Restarts from `start`.
    pub fn restart(&mut self, start: Vector<T, N>) {
        self.current = start;
        self.iteration = 0;
        self.rayleigh = T::ZERO;
    }

    /// Returns the angle in degrees between the current vector and the line spanned by
    /// `reference`. The sign of either vector is ignored, so the result lies in `[0, 90]`.
    ///
    /// Degenerate vectors (length below `0.01`) report the maximum error of 90°.
    pub fn angle_error_degrees(&self, reference: Vector<T, N>) -> T {
        let min_len = T::from_f64(0.01);
        let ninety = T::from_f64(90.0);
        let (Some(r), Some(v)) = (
            reference.try_normalize(min_len),
            self.current.try_normalize(min_len),
        ) else {
            return ninety;
        };
        let cos = r.dot(v).abs().clamp(-T::ONE, T::ONE);
        cos.acos() * T::from_f64(180.0) / T::PI
    }
}
