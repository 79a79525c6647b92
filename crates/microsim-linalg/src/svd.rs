//! Singular values, condition numbers, and an approximate power-iteration SVD.

use fastrand::Rng;
use itertools::iproduct;

use crate::{Float, Mat2, Matrix, Vector};

/// The condition number reported for (numerically) singular matrices.
pub const CONDITION_SENTINEL: f64 = 1e10;

impl<T: Float> Mat2<T> {
    /// Returns the singular values `[σ1, σ2]`, with `σ1 ≥ σ2 ≥ 0`.
    ///
    /// They are the square roots of the eigenvalues of `AᵀA`. Rounding can push the smaller
    /// eigenvalue slightly below zero; it is clamped.
    ///
    /// # Examples
    ///
    /// ```
    /// # use microsim_linalg::*;
    /// let m = Matrix::from_rows([[3.0, 0.0], [0.0, -2.0]]);
    /// assert_eq!(m.singular_values(), [3.0, 2.0]);
    /// ```
    #[doc(alias = "singularValues2x2")]
    pub fn singular_values(&self) -> [T; 2] {
        let ata = self.transpose() * *self;
        let trace = ata.trace();
        let det = ata.determinant();
        let two = T::from_f64(2.0);
        let root = (trace * trace - T::from_f64(4.0) * det).max(T::ZERO).sqrt();
        let l1 = ((trace + root) / two).max(T::ZERO);
        let l2 = ((trace - root) / two).max(T::ZERO);
        [l1.sqrt(), l2.sqrt()]
    }

    /// Returns the condition number `σ1 / σ2`.
    ///
    /// If `σ2 <= epsilon`, [`CONDITION_SENTINEL`] is returned instead.
    ///
    /// # Examples
    ///
    /// ```
    /// # use microsim_linalg::*;
    /// assert_eq!(Mat2d::IDENTITY.condition_number(1e-10), 1.0);
    /// assert_eq!(Mat2d::ZERO.condition_number(1e-10), CONDITION_SENTINEL);
    /// ```
    #[doc(alias = "conditionNumber")]
    pub fn condition_number(&self, epsilon: T) -> T {
        let [s1, s2] = self.singular_values();
        if s2 > epsilon {
            s1 / s2
        } else {
            T::from_f64(CONDITION_SENTINEL)
        }
    }
}

/// How sensitive a linear system is to perturbations, derived from its condition number `κ`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conditioning {
    /// `κ < 10`.
    Well,
    /// `10 ≤ κ < 100`.
    Moderate,
    /// `100 ≤ κ < 10⁶`. Roughly `⌊log10 κ⌋` significant digits are lost when solving.
    Ill { digits_lost: u32 },
    /// `κ ≥ 10⁶` (or not a number).
    NearlySingular,
}

impl Conditioning {
    pub fn classify(kappa: f64) -> Self {
        if kappa < 10.0 {
            Self::Well
        } else if kappa < 100.0 {
            Self::Moderate
        } else if kappa < 1e6 {
            Self::Ill {
                digits_lost: kappa.log10().floor() as u32,
            }
        } else {
            Self::NearlySingular
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Well => "well-conditioned",
            Self::Moderate => "moderately conditioned",
            Self::Ill { .. } => "ill-conditioned",
            Self::NearlySingular => "nearly singular",
        }
    }
}

/// One singular triple `σ u vᵀ`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SvdComponent<T, const R: usize, const C: usize> {
    pub sigma: T,
    pub u: Vector<T, R>,
    pub v: Vector<T, C>,
}

/// Approximate singular value decomposition by power iteration with deflation.
///
/// Each component starts from a random unit vector, alternates `u = Av/|Av|` and
/// `v = Aᵀu/|Aᵀu|` for a fixed number of iterations, and is then subtracted from the matrix. The
/// result is only as accurate as the iteration count allows, which is plenty for low-rank
/// approximations.
///
/// # Examples
///
/// ```
/// # use microsim_linalg::*;
/// # use approx::assert_relative_eq;
/// let m = Matrix::from_rows([[3.0, 0.0], [0.0, 1.0]]);
/// let svd = PowerSvd::new().with_seed(1).decompose(&m, 2);
/// assert_relative_eq!(svd.singular_values()[0], 3.0, epsilon = 1e-9);
/// assert_relative_eq!(svd.reconstruct(2), m, epsilon = 1e-6);
/// ```
#[doc(alias = "powerIterationSVD")]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerSvd {
    iterations: usize,
    epsilon: f64,
    seed: u64,
}

impl Default for PowerSvd {
    fn default() -> Self {
        Self {
            iterations: 20,
            epsilon: 1e-10,
            seed: 0,
        }
    }
}

impl PowerSvd {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of inner power iterations per component (default 20).
    pub fn with_iterations(self, iterations: usize) -> Self {
        Self { iterations, ..self }
    }

    /// Sets the norm below which a vector or singular value counts as zero (default `1e-10`).
    pub fn with_epsilon(self, epsilon: f64) -> Self {
        Self { epsilon, ..self }
    }

    /// Sets the seed of the random start vectors.
    pub fn with_seed(self, seed: u64) -> Self {
        Self { seed, ..self }
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Extracts up to `rank` components of `matrix`.
    ///
    /// Extraction stops early once the remaining singular value falls below the epsilon, so the
    /// result may hold fewer than `rank` components (none for the zero matrix).
    pub fn decompose<T: Float, const R: usize, const C: usize>(
        &self,
        matrix: &Matrix<T, R, C>,
        rank: usize,
    ) -> Svd<T, R, C> {
        let eps = T::from_f64(self.epsilon);
        let mut rng = Rng::with_seed(self.seed);
        let mut a = *matrix;
        let at_rank = rank.min(R).min(C);
        let mut components = Vec::with_capacity(at_rank);

        for index in 0..at_rank {
            let mut v = random_unit_vector::<T, C>(&mut rng, eps);
            for _ in 0..self.iterations {
                let Some(u) = (a * v).try_normalize(eps) else {
                    break;
                };
                let Some(next) = (a.transpose() * u).try_normalize(eps) else {
                    break;
                };
                v = next;
            }

            let av = a * v;
            let sigma = av.length();
            if !sigma.is_finite() || sigma < eps {
                log::trace!("power SVD: stopping after {index} components (σ = {sigma:?})");
                break;
            }
            let u = av / sigma;
            log::trace!("power SVD: component {index}: σ = {sigma:?}");

            a = a - Matrix::from_fn(|row, col| sigma * u[row] * v[col]);
            components.push(SvdComponent { sigma, u, v });
        }

        Svd { components }
    }
}

fn random_unit_vector<T: Float, const N: usize>(rng: &mut Rng, eps: T) -> Vector<T, N> {
    let v = Vector::from_fn(|_| T::from_f64(rng.f64() - 0.5));
    v.try_normalize(eps)
        .unwrap_or_else(|| Vector::from_fn(|i| if i == 0 { T::ONE } else { T::ZERO }))
}

/// The components extracted by [`PowerSvd::decompose`], largest singular value first.
#[derive(Debug, Clone, PartialEq)]
pub struct Svd<T, const R: usize, const C: usize> {
    components: Vec<SvdComponent<T, R, C>>,
}

impl<T: Float, const R: usize, const C: usize> Svd<T, R, C> {
    pub fn components(&self) -> &[SvdComponent<T, R, C>] {
        &self.components
    }

    pub fn singular_values(&self) -> Vec<T> {
        self.components.iter().map(|c| c.sigma).collect()
    }

    /// Number of extracted (non-negligible) components.
    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Returns the rank-`k` approximation `Σ_{i<k} σᵢ uᵢ vᵢᵀ`.
    ///
    /// `k` larger than the number of components uses all of them.
    pub fn reconstruct(&self, k: usize) -> Matrix<T, R, C> {
        let mut out = Matrix::ZERO;
        for c in self.components.iter().take(k) {
            for (row, col) in iproduct!(0..R, 0..C) {
                out[(row, col)] = out[(row, col)] + c.sigma * c.u[row] * c.v[col];
            }
        }
        out
    }

    /// Fraction of `Σσ²` kept by the first `k` components. 0 if there are no components.
    pub fn energy_captured(&self, k: usize) -> T {
        let square = |c: &SvdComponent<T, R, C>| c.sigma * c.sigma;
        let total = self.components.iter().map(square).fold(T::ZERO, |a, b| a + b);
        if total <= T::ZERO {
            return T::ZERO;
        }
        let kept = self
            .components
            .iter()
            .take(k)
            .map(square)
            .fold(T::ZERO, |a, b| a + b);
        kept / total
    }

    /// Relative Frobenius error `|original - reconstruct(k)| / |original|`. 0 for a zero matrix.
    pub fn relative_error(&self, original: &Matrix<T, R, C>, k: usize) -> T {
        let norm = original.frobenius_norm();
        if norm <= T::ZERO {
            return T::ZERO;
        }
        (*original - self.reconstruct(k)).frobenius_norm() / norm
    }

    /// Number of values needed to store the rank-`k` approximation: `k · (R + C + 1)`.
    pub fn storage(&self, k: usize) -> usize {
        k.min(self.len()) * (R + C + 1)
    }
}
