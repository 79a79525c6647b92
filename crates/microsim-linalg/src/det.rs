//! Determinants, minors, cofactors, adjugates, inverses and Cramer's rule for 2x2, 3x3 and 4x4
//! matrices.

use crate::{Float, LinalgError, Mat2, Mat3, Mat4, Matrix, Number, Vector};

/// `(-1)^(row + col)`.
fn checkerboard_sign<T: Number>(row: usize, col: usize) -> T {
    if (row + col) % 2 == 0 {
        T::ONE
    } else {
        -T::ONE
    }
}

fn check_bounds<const N: usize>(row: usize, col: usize) -> Result<(), LinalgError> {
    if row < N && col < N {
        Ok(())
    } else {
        Err(LinalgError::IndexOutOfBounds {
            row,
            col,
            rows: N,
            cols: N,
        })
    }
}

/// Removes `row` and `col` from an `N`x`N` matrix. `M` must be `N - 1` and the indices in bounds.
fn minor_unchecked<T: Copy, const N: usize, const M: usize>(
    m: &Matrix<T, N, N>,
    row: usize,
    col: usize,
) -> Matrix<T, M, M> {
    debug_assert_eq!(M + 1, N);
    Matrix::from_fn(|r, c| {
        let r = if r < row { r } else { r + 1 };
        let c = if c < col { c } else { c + 1 };
        m[(r, c)]
    })
}

fn checked_inverse<T: Float, const N: usize>(
    m: &Matrix<T, N, N>,
    determinant: T,
    adjugate: impl FnOnce() -> Matrix<T, N, N>,
    epsilon: T,
) -> Result<Matrix<T, N, N>, LinalgError> {
    if !m.is_finite() {
        return Err(LinalgError::NonFinite);
    }
    if determinant.abs() < epsilon {
        return Err(LinalgError::Singular {
            determinant: determinant.to_f64(),
        });
    }
    Ok(adjugate() / determinant)
}

/// One signed term of a cofactor expansion: `sign * entry * det(minor)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CofactorTerm<T, const M: usize> {
    pub row: usize,
    pub col: usize,
    pub entry: T,
    /// `+1` or `-1`, following the checkerboard pattern.
    pub sign: T,
    pub minor: Matrix<T, M, M>,
    pub minor_determinant: T,
}

impl<T: Number, const M: usize> CofactorTerm<T, M> {
    /// The contribution of this term to the determinant.
    pub fn value(&self) -> T {
        self.sign * self.entry * self.minor_determinant
    }
}

/// The six diagonal products of Sarrus' rule for a 3x3 matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SarrusDiagonals<T> {
    /// Products along the down-right diagonals (added).
    pub positive: [T; 3],
    /// Products along the down-left diagonals (subtracted).
    pub negative: [T; 3],
}

impl<T: Number> SarrusDiagonals<T> {
    /// The cells `(row, col)` on positive diagonal `i`.
    pub fn positive_cells(i: usize) -> [(usize, usize); 3] {
        [(0, i % 3), (1, (i + 1) % 3), (2, (i + 2) % 3)]
    }

    /// The cells `(row, col)` on negative diagonal `i`.
    pub fn negative_cells(i: usize) -> [(usize, usize); 3] {
        let i = i % 3;
        [(0, 2 - i), (1, (4 - i) % 3), (2, (3 - i) % 3)]
    }

    pub fn positive_sum(&self) -> T {
        self.positive.iter().fold(T::ZERO, |acc, &p| acc + p)
    }

    pub fn negative_sum(&self) -> T {
        self.negative.iter().fold(T::ZERO, |acc, &p| acc + p)
    }

    pub fn determinant(&self) -> T {
        self.positive_sum() - self.negative_sum()
    }
}

/// The intermediate determinants and the solution of `A x = b` by Cramer's rule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CramerSolution<T, const N: usize> {
    /// `det(A)`.
    pub determinant: T,
    /// `det(A_i)`, where `A_i` is `A` with column `i` replaced by `b`.
    pub replaced_determinants: [T; N],
    /// `x_i = det(A_i) / det(A)`.
    pub solution: Vector<T, N>,
}

fn cramer<T: Float, const N: usize>(
    a: &Matrix<T, N, N>,
    b: Vector<T, N>,
    determinant: impl Fn(&Matrix<T, N, N>) -> T,
    epsilon: T,
) -> Result<CramerSolution<T, N>, LinalgError> {
    if !a.is_finite() || !b.is_finite() {
        return Err(LinalgError::NonFinite);
    }
    let det = determinant(a);
    if det.abs() < epsilon {
        return Err(LinalgError::Singular {
            determinant: det.to_f64(),
        });
    }
    let replaced_determinants: [T; N] =
        std::array::from_fn(|i| determinant(&a.with_column(i, b)));
    Ok(CramerSolution {
        determinant: det,
        replaced_determinants,
        solution: Vector::from_fn(|i| replaced_determinants[i] / det),
    })
}

impl<T: Number> Mat2<T> {
    /// Returns the [determinant] `ad - bc` of the matrix.
    ///
    /// # Examples
    ///
    /// ```
    /// # use microsim_linalg::*;
    /// let m = Matrix::from_rows([[3.0, 1.0], [2.0, 4.0]]);
    /// assert_eq!(m.determinant(), 10.0);
    /// ```
    ///
    /// [determinant]: https://en.wikipedia.org/wiki/Determinant
    #[doc(alias = "determinant2x2")]
    #[inline]
    pub fn determinant(&self) -> T {
        let [[a, b], [c, d]] = self.0;
        a * d - b * c
    }

    /// Returns the adjugate `[[d, -b], [-c, a]]`.
    pub fn adjugate(&self) -> Self {
        let [[a, b], [c, d]] = self.0;
        Matrix([[d, -b], [-c, a]])
    }
}

impl<T: Float> Mat2<T> {
    /// Inverts this 2x2 matrix.
    ///
    /// # Errors
    ///
    /// - [`LinalgError::NonFinite`] if an element is NaN or infinite.
    /// - [`LinalgError::Singular`] if `|det| < epsilon`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use microsim_linalg::*;
    /// # use approx::assert_relative_eq;
    /// let m = Matrix::from_rows([[4.0, 7.0], [2.0, 6.0]]);
    /// let inv = m.inverse(1e-10)?;
    /// assert_relative_eq!(m * inv, Mat2d::IDENTITY, epsilon = 1e-12);
    ///
    /// let singular = Matrix::from_rows([[1.0, 2.0], [2.0, 4.0]]);
    /// assert!(matches!(singular.inverse(1e-10), Err(LinalgError::Singular { .. })));
    /// # Ok::<(), LinalgError>(())
    /// ```
    pub fn inverse(&self, epsilon: T) -> Result<Self, LinalgError> {
        checked_inverse(self, self.determinant(), || self.adjugate(), epsilon)
    }

    /// Solves `self * x = b` with Cramer's rule.
    pub fn solve_cramer(
        &self,
        b: Vector<T, 2>,
        epsilon: T,
    ) -> Result<CramerSolution<T, 2>, LinalgError> {
        cramer(self, b, Mat2::determinant, epsilon)
    }
}

impl<T: Number> Mat3<T> {
    /// Returns the [determinant] of the matrix, using the closed-form rule of Sarrus.
    ///
    /// [determinant]: https://en.wikipedia.org/wiki/Determinant
    #[doc(alias = "determinant3x3")]
    pub fn determinant(&self) -> T {
        self.sarrus_diagonals().determinant()
    }

    /// Returns the three positive and three negative diagonal products of Sarrus' rule.
    ///
    /// Positive diagonal `i` multiplies `m[0][i] * m[1][(i+1)%3] * m[2][(i+2)%3]`, negative
    /// diagonal `i` multiplies `m[0][2-i] * m[1][(4-i)%3] * m[2][(3-i)%3]`.
    pub fn sarrus_diagonals(&self) -> SarrusDiagonals<T> {
        let product = |cells: [(usize, usize); 3]| {
            cells
                .iter()
                .fold(T::ONE, |acc, &(row, col)| acc * self[(row, col)])
        };
        SarrusDiagonals {
            positive: std::array::from_fn(|i| product(SarrusDiagonals::<T>::positive_cells(i))),
            negative: std::array::from_fn(|i| product(SarrusDiagonals::<T>::negative_cells(i))),
        }
    }

    /// Returns the 2x2 matrix left after deleting `row` and `col`.
    ///
    /// # Errors
    ///
    /// Returns [`LinalgError::IndexOutOfBounds`] if `row` or `col` is not in `0..3`.
    pub fn minor(&self, row: usize, col: usize) -> Result<Mat2<T>, LinalgError> {
        check_bounds::<3>(row, col)?;
        Ok(minor_unchecked(self, row, col))
    }

    /// Returns the signed minor determinant `(-1)^(row+col) * det(minor(row, col))`.
    pub fn cofactor(&self, row: usize, col: usize) -> Result<T, LinalgError> {
        Ok(checkerboard_sign::<T>(row, col) * self.minor(row, col)?.determinant())
    }

    /// Returns the three signed terms of the cofactor expansion along `row`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use microsim_linalg::*;
    /// let m = Matrix::from_rows([
    ///     [2.0, 1.0, 3.0],
    ///     [4.0, 5.0, 6.0],
    ///     [7.0, 8.0, 9.0],
    /// ]);
    /// let terms = m.cofactor_terms(0)?;
    /// assert_eq!(terms[1].sign, -1.0);
    /// assert_eq!(terms[1].minor, Matrix::from_rows([[4.0, 6.0], [7.0, 9.0]]));
    /// let sum: f64 = terms.iter().map(|t| t.value()).sum();
    /// assert_eq!(sum, m.determinant());
    /// # Ok::<(), LinalgError>(())
    /// ```
    pub fn cofactor_terms(&self, row: usize) -> Result<[CofactorTerm<T, 2>; 3], LinalgError> {
        check_bounds::<3>(row, 0)?;
        Ok(std::array::from_fn(|col| {
            let minor: Mat2<T> = minor_unchecked(self, row, col);
            CofactorTerm {
                row,
                col,
                entry: self[(row, col)],
                sign: checkerboard_sign(row, col),
                minor,
                minor_determinant: minor.determinant(),
            }
        }))
    }

    /// Computes the determinant by cofactor expansion along `row`.
    pub fn cofactor_expansion_row(&self, row: usize) -> Result<T, LinalgError> {
        Ok(self
            .cofactor_terms(row)?
            .iter()
            .fold(T::ZERO, |acc, term| acc + term.value()))
    }

    /// Computes the determinant by cofactor expansion along `col`.
    pub fn cofactor_expansion_column(&self, col: usize) -> Result<T, LinalgError> {
        // det(Mᵀ) = det(M), and column `col` of M is row `col` of Mᵀ.
        self.transpose().cofactor_expansion_row(col)
    }

    /// Returns the adjugate (the transposed cofactor matrix).
    pub fn adjugate(&self) -> Self {
        Matrix::from_fn(|row, col| {
            let minor: Mat2<T> = minor_unchecked(self, col, row);
            checkerboard_sign::<T>(row, col) * minor.determinant()
        })
    }
}

impl<T: Float> Mat3<T> {
    /// Inverts this 3x3 matrix via its adjugate.
    ///
    /// # Errors
    ///
    /// - [`LinalgError::NonFinite`] if an element is NaN or infinite.
    /// - [`LinalgError::Singular`] if `|det| < epsilon`.
    pub fn inverse(&self, epsilon: T) -> Result<Self, LinalgError> {
        checked_inverse(self, self.determinant(), || self.adjugate(), epsilon)
    }

    /// Solves `self * x = b` with Cramer's rule.
    pub fn solve_cramer(
        &self,
        b: Vector<T, 3>,
        epsilon: T,
    ) -> Result<CramerSolution<T, 3>, LinalgError> {
        cramer(self, b, Mat3::determinant, epsilon)
    }
}

impl<T: Number> Mat4<T> {
    /// Returns the 3x3 matrix left after deleting `row` and `col`.
    ///
    /// # Errors
    ///
    /// Returns [`LinalgError::IndexOutOfBounds`] if `row` or `col` is not in `0..4`.
    pub fn minor(&self, row: usize, col: usize) -> Result<Mat3<T>, LinalgError> {
        check_bounds::<4>(row, col)?;
        Ok(minor_unchecked(self, row, col))
    }

    /// Returns the [determinant] of the matrix by cofactor expansion along the first row.
    ///
    /// [determinant]: https://en.wikipedia.org/wiki/Determinant
    pub fn determinant(&self) -> T {
        (0..4).fold(T::ZERO, |acc, col| {
            let minor: Mat3<T> = minor_unchecked(self, 0, col);
            acc + checkerboard_sign::<T>(0, col) * self[(0, col)] * minor.determinant()
        })
    }
}

#[cfg(test)]
mod tests {
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use fastrand::Rng;

    use crate::{vec2, vec3, Mat2d, Mat3d, Mat4d};

    use super::*;

    fn random_mat3(rng: &mut Rng) -> Mat3d {
        Matrix::from_fn(|_, _| rng.f64() * 20.0 - 10.0)
    }

    #[test]
    fn determinant2x2() {
        assert_eq!(Matrix::from_rows([[3.0, 1.0], [2.0, 4.0]]).determinant(), 10.0);
        assert_eq!(Matrix::from_rows([[3, 1], [2, 4]]).determinant(), 10);
        assert_eq!(Mat2d::ZERO.determinant(), 0.0);
        assert_eq!(Mat2d::IDENTITY.determinant(), 1.0);
    }

    #[test]
    fn determinant3x3() {
        assert_eq!(Mat3d::ZERO.determinant(), 0.0);
        assert_eq!(Mat3d::IDENTITY.determinant(), 1.0);

        #[rustfmt::skip]
        let testmat = Matrix::from_rows([
            [-2, -1,  2],
            [ 2,  1,  4],
            [-3,  3, -1],
        ]);
        assert_eq!(testmat.determinant(), 54);
        assert_eq!(testmat.transpose().determinant(), 54);
    }

    #[test]
    fn expansion_rows_agree() {
        #[rustfmt::skip]
        let m = Matrix::from_rows([
            [2.0, 1.0, 3.0],
            [4.0, 5.0, 6.0],
            [7.0, 8.0, 9.0],
        ]);
        let row0 = m.cofactor_expansion_row(0).unwrap();
        let row1 = m.cofactor_expansion_row(1).unwrap();
        assert_eq!(row0, -9.0);
        assert_eq!(row1, -9.0);
        assert_eq!(m.determinant(), -9.0);
        assert_eq!(m.cofactor_expansion_column(2).unwrap(), -9.0);
    }

    #[test]
    fn expansion_property() {
        let mut rng = Rng::with_seed(7);
        for _ in 0..200 {
            let m = random_mat3(&mut rng);
            let det = m.determinant();
            for i in 0..3 {
                assert_abs_diff_eq!(m.cofactor_expansion_row(i).unwrap(), det, epsilon = 1e-9);
                assert_abs_diff_eq!(m.cofactor_expansion_column(i).unwrap(), det, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn minors() {
        #[rustfmt::skip]
        let m = Matrix::from_rows([
            [1, 2, 3],
            [4, 5, 6],
            [7, 8, 9],
        ]);
        assert_eq!(m.minor(1, 1).unwrap(), Matrix::from_rows([[1, 3], [7, 9]]));
        assert_eq!(m.minor(0, 2).unwrap(), Matrix::from_rows([[4, 5], [7, 8]]));
        assert_eq!(m.cofactor(0, 1).unwrap(), -(4 * 9 - 6 * 7));
        assert_eq!(
            m.minor(3, 0),
            Err(LinalgError::IndexOutOfBounds {
                row: 3,
                col: 0,
                rows: 3,
                cols: 3
            })
        );
        assert!(m.cofactor_terms(5).is_err());

        let m4 = Matrix::<i32, 4, 4>::from_fn(|r, c| (r * 4 + c) as i32);
        assert_eq!(m4.minor(0, 0).unwrap(), Matrix::from_rows([[5, 6, 7], [9, 10, 11], [13, 14, 15]]));
        assert!(m4.minor(0, 4).is_err());
    }

    #[test]
    fn sarrus() {
        #[rustfmt::skip]
        let m = Matrix::from_rows([
            [1.0, 2.0, 3.0],
            [4.0, 5.0, 6.0],
            [7.0, 8.0, 9.0],
        ]);
        let d = m.sarrus_diagonals();
        assert_eq!(d.positive, [1.0 * 5.0 * 9.0, 2.0 * 6.0 * 7.0, 3.0 * 4.0 * 8.0]);
        assert_eq!(d.negative, [3.0 * 5.0 * 7.0, 2.0 * 4.0 * 9.0, 1.0 * 6.0 * 8.0]);
        assert_eq!(d.determinant(), 0.0);
        assert_eq!(SarrusDiagonals::<f64>::negative_cells(0), [(0, 2), (1, 1), (2, 0)]);
    }

    #[test]
    fn determinant4x4() {
        assert_eq!(Mat4d::IDENTITY.determinant(), 1.0);
        let m = Matrix::from_diagonal([1.0, 2.0, 3.0, 4.0]);
        assert_eq!(m.determinant(), 24.0);

        #[rustfmt::skip]
        let lu_example = Matrix::from_rows([
            [2.0, 1.0, 1.0, 0.0],
            [4.0, 3.0, 3.0, 1.0],
            [8.0, 7.0, 9.0, 5.0],
            [6.0, 7.0, 9.0, 8.0],
        ]);
        // U has diagonal 2, 1, 2, 2.
        assert_relative_eq!(lu_example.determinant(), 8.0);
    }

    #[test]
    fn inverse2x2() {
        let m = Matrix::from_rows([[4.0, 7.0], [2.0, 6.0]]);
        let inv = m.inverse(1e-10).unwrap();
        assert_relative_eq!(inv, Matrix::from_rows([[0.6, -0.7], [-0.2, 0.4]]), epsilon = 1e-12);

        assert_eq!(
            Matrix::from_rows([[2.0, 4.0], [1.0, 2.0]]).inverse(1e-10),
            Err(LinalgError::Singular { determinant: 0.0 })
        );
        assert_eq!(
            Matrix::from_rows([[f64::INFINITY, 0.0], [0.0, 1.0]]).inverse(1e-10),
            Err(LinalgError::NonFinite)
        );
    }

    #[test]
    fn inverse_round_trip() {
        let mut rng = Rng::with_seed(99);
        let mut checked = 0;
        while checked < 100 {
            let m = random_mat3(&mut rng);
            if m.determinant().abs() < 1.0 {
                continue;
            }
            let inv = m.inverse(1e-10).unwrap();
            assert_abs_diff_eq!(m * inv, Mat3d::IDENTITY, epsilon = 1e-8);

            let oracle = nalgebra::Matrix3::from_row_slice(&m.into_rows().concat())
                .try_inverse()
                .unwrap();
            for (r, c) in itertools::iproduct!(0..3, 0..3) {
                assert_relative_eq!(inv[(r, c)], oracle[(r, c)], epsilon = 1e-8);
            }
            checked += 1;
        }
    }

    #[test]
    fn cramer() {
        let a = Matrix::from_rows([[2.0, 3.0], [1.0, 4.0]]);
        let sol = a.solve_cramer(vec2(7.0, 9.0), 1e-10).unwrap();
        assert_eq!(sol.determinant, 5.0);
        assert_eq!(sol.replaced_determinants, [1.0, 11.0]);
        assert_relative_eq!(sol.solution, vec2(0.2, 2.2), epsilon = 1e-12);
        assert_relative_eq!(a * sol.solution, vec2(7.0, 9.0), epsilon = 1e-12);

        let singular = Matrix::from_rows([[2.0, 4.0], [1.0, 2.0]]);
        assert!(matches!(
            singular.solve_cramer(vec2(6.0, 3.0), 1e-10),
            Err(LinalgError::Singular { .. })
        ));

        let a3 = Matrix::from_rows([[2.0, 1.0, -1.0], [-3.0, -1.0, 2.0], [-2.0, 1.0, 2.0]]);
        let sol = a3.solve_cramer(vec3(8.0, -11.0, -3.0), 1e-10).unwrap();
        assert_relative_eq!(sol.solution, vec3(2.0, 3.0, -1.0), epsilon = 1e-12);
    }
}
