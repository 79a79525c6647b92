use std::{array, fmt};

use crate::{Float, LinalgError, Number, One, Vector, Zero};

mod ops;

/// A 2x2 matrix.
pub type Mat2<T> = Matrix<T, 2, 2>;
/// A 2x2 matrix with [`f64`] elements.
pub type Mat2d = Mat2<f64>;
/// A 3x3 matrix.
pub type Mat3<T> = Matrix<T, 3, 3>;
/// A 3x3 matrix with [`f64`] elements.
pub type Mat3d = Mat3<f64>;
/// A 4x4 matrix.
pub type Mat4<T> = Matrix<T, 4, 4>;
/// A 4x4 matrix with [`f64`] elements.
pub type Mat4d = Mat4<f64>;

/// A matrix with 2 rows and 3 columns.
pub type Mat2x3<T> = Matrix<T, 2, 3>;
/// A matrix with 3 rows and 4 columns (eg. an augmented 3x3 system).
pub type Mat3x4<T> = Matrix<T, 3, 4>;

/// A row-major matrix with `R` rows and `C` columns, and element type `T`.
///
/// The dimensions are part of the type: there is no resizing. Elements are changed in place through
/// [`IndexMut`], [`Matrix::set`], [`Matrix::swap_rows`], or rebuilt with [`Matrix::with_column`].
///
/// # Construction
///
/// - [`Matrix::from_rows`] and [`Matrix::from_columns`] fill a matrix with raw elements or from an
///   array of row or column vectors.
/// - [`Matrix::from_fn`] creates each element by invoking a closure with its row and column.
/// - For square matrices, [`Matrix::from_diagonal`] and [`Matrix::identity`].
/// - [`Matrix::ZERO`], and `Matrix::IDENTITY` for 2x2, 3x3 and 4x4 matrices.
///
/// # Element Access
///
/// [`Matrix`] implements [`Index`] and [`IndexMut`] for `(row, col)` tuples. Indices are 0-based.
///
/// ```
/// # use microsim_linalg::*;
/// let mut mat = Matrix::from_rows([
///     [0, 1]
/// ]);
/// mat[(0, 0)] = 4;
/// assert_eq!(mat[(0, 0)], 4);
/// assert_eq!(mat[(0, 1)], 1);
/// ```
///
/// [`Index`]: std::ops::Index
/// [`IndexMut`]: std::ops::IndexMut
#[derive(Clone, Copy, Hash)]
pub struct Matrix<T, const R: usize, const C: usize>(pub(crate) [[T; C]; R]);

impl<T, const R: usize, const C: usize> Matrix<T, R, C> {
    /// Creates a [`Matrix`] from an array of row vectors.
    ///
    /// # Examples
    ///
    /// ```
    /// # use microsim_linalg::*;
    /// let rows = Matrix::from_rows([
    ///     [0, 1],
    ///     [2, 3],
    /// ]);
    /// let columns = Matrix::from_columns([
    ///     [0, 2],
    ///     [1, 3],
    /// ]);
    /// assert_eq!(rows, columns);
    /// ```
    pub fn from_rows<U: Into<Vector<T, C>>>(rows: [U; R]) -> Self {
        Self(rows.map(|row| row.into().into_array()))
    }

    /// Creates a [`Matrix`] from an array of column vectors.
    pub fn from_columns<U: Into<Vector<T, R>>>(columns: [U; C]) -> Self
    where
        T: Copy,
    {
        Matrix::<T, C, R>::from_rows(columns).transpose()
    }

    /// Creates a [`Matrix`] by invoking a closure with the position (row and column) of each element.
    ///
    /// # Examples
    ///
    /// ```
    /// # use microsim_linalg::*;
    /// let mat = Matrix::from_fn(|row, col| row * 10 + col);
    /// assert_eq!(mat, Matrix::from_rows([
    ///     [ 0,  1,  2],
    ///     [10, 11, 12],
    /// ]));
    /// ```
    pub fn from_fn<F>(mut cb: F) -> Self
    where
        F: FnMut(usize, usize) -> T,
    {
        Self(array::from_fn(|row| array::from_fn(|col| cb(row, col))))
    }

    /// Applies a closure to each element, returning a new matrix.
    pub fn map<F, U>(self, mut f: F) -> Matrix<U, R, C>
    where
        F: FnMut(T) -> U,
    {
        Matrix(self.0.map(|row| row.map(&mut f)))
    }

    /// Swaps the rows and columns of this matrix.
    ///
    /// # Examples
    ///
    /// ```
    /// # use microsim_linalg::*;
    /// let mat = Matrix::from_rows([
    ///     [0, 1, 2],
    ///     [3, 4, 5],
    /// ]).transpose();
    /// assert_eq!(mat, Matrix::from_rows([
    ///     [0, 3],
    ///     [1, 4],
    ///     [2, 5],
    /// ]));
    /// ```
    pub fn transpose(self) -> Matrix<T, C, R>
    where
        T: Copy,
    {
        Matrix::from_fn(|row, col| self.0[col][row])
    }

    /// Replaces the element at `(row, col)`.
    ///
    /// # Errors
    ///
    /// Returns [`LinalgError::IndexOutOfBounds`] if the position lies outside the matrix. The
    /// matrix is left unchanged in that case.
    ///
    /// # Examples
    ///
    /// ```
    /// # use microsim_linalg::*;
    /// let mut mat = Mat2d::IDENTITY;
    /// mat.set(0, 1, 5.0)?;
    /// assert_eq!(mat[(0, 1)], 5.0);
    /// assert!(mat.set(2, 0, 1.0).is_err());
    /// # Ok::<(), LinalgError>(())
    /// ```
    pub fn set(&mut self, row: usize, col: usize, value: T) -> Result<(), LinalgError> {
        match self.0.get_mut(row).and_then(|r| r.get_mut(col)) {
            Some(elem) => {
                *elem = value;
                Ok(())
            }
            None => Err(LinalgError::IndexOutOfBounds {
                row,
                col,
                rows: R,
                cols: C,
            }),
        }
    }

    /// Returns row `row` as a [`Vector`].
    ///
    /// # Panics
    ///
    /// Panics if `row` is out of bounds.
    pub fn row(&self, row: usize) -> Vector<T, C>
    where
        T: Copy,
    {
        Vector(self.0[row])
    }

    /// Returns column `col` as a [`Vector`].
    ///
    /// # Panics
    ///
    /// Panics if `col` is out of bounds.
    pub fn column(&self, col: usize) -> Vector<T, R>
    where
        T: Copy,
    {
        Vector::from_fn(|row| self.0[row][col])
    }

    /// Returns a copy of `self` with column `col` replaced by `column`.
    ///
    /// This is the substitution used by Cramer's rule.
    ///
    /// # Panics
    ///
    /// Panics if `col` is out of bounds.
    ///
    /// # Examples
    ///
    /// ```
    /// # use microsim_linalg::*;
    /// let a = Mat2d::IDENTITY.with_column(1, vec2(7.0, 9.0));
    /// assert_eq!(a, Matrix::from_rows([[1.0, 7.0], [0.0, 9.0]]));
    /// ```
    pub fn with_column(mut self, col: usize, column: Vector<T, R>) -> Self {
        assert!(col < C, "column {col} out of bounds for a matrix with {C} columns");
        for (row, value) in self.0.iter_mut().zip(column.into_array()) {
            row[col] = value;
        }
        self
    }

    /// Swaps rows `a` and `b`.
    ///
    /// # Panics
    ///
    /// Panics if either row is out of bounds.
    pub fn swap_rows(&mut self, a: usize, b: usize) {
        self.0.swap(a, b);
    }

    /// Converts the matrix into an array of rows.
    pub fn into_rows(self) -> [[T; C]; R] {
        self.0
    }

    /// Returns `true` if every element is finite (neither NaN nor infinite).
    pub fn is_finite(&self) -> bool
    where
        T: Float,
    {
        self.0.iter().flatten().all(|e| e.is_finite())
    }

    /// Returns the Frobenius norm (the square root of the sum of squared elements).
    pub fn frobenius_norm(&self) -> T
    where
        T: Float,
    {
        self.0
            .iter()
            .flatten()
            .fold(T::ZERO, |acc, &e| acc + e * e)
            .sqrt()
    }
}

impl<T: Zero, const R: usize, const C: usize> Matrix<T, R, C> {
    const ZERO_ROW: [T; C] = [T::ZERO; C];

    /// A matrix with every element set to 0.
    pub const ZERO: Self = Self([Self::ZERO_ROW; R]);
}

impl<T: Zero + One> Matrix<T, 2, 2> {
    /// The 2x2 identity matrix.
    #[rustfmt::skip]
    pub const IDENTITY: Self = Self([
        [T::ONE, T::ZERO],
        [T::ZERO, T::ONE],
    ]);
}

impl<T: Zero + One> Matrix<T, 3, 3> {
    /// The 3x3 identity matrix.
    #[rustfmt::skip]
    pub const IDENTITY: Self = Self([
        [T::ONE, T::ZERO, T::ZERO],
        [T::ZERO, T::ONE, T::ZERO],
        [T::ZERO, T::ZERO, T::ONE],
    ]);
}

impl<T: Zero + One> Matrix<T, 4, 4> {
    /// The 4x4 identity matrix.
    #[rustfmt::skip]
    pub const IDENTITY: Self = Self([
        [T::ONE, T::ZERO, T::ZERO, T::ZERO],
        [T::ZERO, T::ONE, T::ZERO, T::ZERO],
        [T::ZERO, T::ZERO, T::ONE, T::ZERO],
        [T::ZERO, T::ZERO, T::ZERO, T::ONE],
    ]);
}

impl<T, const N: usize> Matrix<T, N, N> {
    /// Returns the `N`x`N` identity matrix.
    ///
    /// For 2x2, 3x3 and 4x4 matrices, the `IDENTITY` constant can be used instead.
    ///
    /// # Examples
    ///
    /// ```
    /// # use microsim_linalg::*;
    /// assert_eq!(Mat3d::identity(), Mat3d::IDENTITY);
    /// ```
    pub fn identity() -> Self
    where
        T: Zero + One,
    {
        Self::from_fn(|row, col| if row == col { T::ONE } else { T::ZERO })
    }

    /// Returns a [`Vector`] holding the diagonal elements of this square matrix.
    pub fn into_diagonal(self) -> Vector<T, N>
    where
        T: Copy,
    {
        Vector::from_fn(|i| self.0[i][i])
    }

    /// Creates a square matrix from its diagonal.
    ///
    /// Elements outside the diagonal will be initialized with zero.
    ///
    /// # Examples
    ///
    /// ```
    /// # use microsim_linalg::*;
    /// let diag = Matrix::from_diagonal([1, 2, 3]);
    /// assert_eq!(diag, Matrix::from_rows([
    ///     [1, 0, 0],
    ///     [0, 2, 0],
    ///     [0, 0, 3],
    /// ]));
    /// ```
    pub fn from_diagonal<D: Into<Vector<T, N>>>(diag: D) -> Self
    where
        T: Zero + Copy,
    {
        let diag = diag.into();
        Self::from_fn(|row, col| if row == col { diag[row] } else { T::ZERO })
    }

    /// Returns the *trace* of the matrix (the sum of all elements on the diagonal).
    pub fn trace(&self) -> T
    where
        T: Number,
    {
        (0..N).fold(T::ZERO, |acc, i| acc + self.0[i][i])
    }
}

impl<T: fmt::Debug, const R: usize, const C: usize> fmt::Debug for Matrix<T, R, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        struct FormatRow<'a, T: fmt::Debug, const C: usize>(&'a [T; C]);
        impl<'a, T: fmt::Debug, const C: usize> fmt::Debug for FormatRow<'a, T, C> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "[")?;
                for (col, elem) in self.0.iter().enumerate() {
                    if col != 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{:?}", elem)?;
                }
                write!(f, "]")
            }
        }

        let mut list = f.debug_list();
        for row in &self.0 {
            list.entry(&FormatRow(row));
        }
        list.finish()
    }
}

/// Writes the rows in bracket notation. Precision and width are forwarded to each element.
impl<T: fmt::Display, const R: usize, const C: usize> fmt::Display for Matrix<T, R, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (r, row) in self.0.iter().enumerate() {
            if r != 0 {
                f.write_str(", ")?;
            }
            f.write_str("[")?;
            for (c, elem) in row.iter().enumerate() {
                if c != 0 {
                    f.write_str(", ")?;
                }
                elem.fmt(f)?;
            }
            f.write_str("]")?;
        }
        f.write_str("]")
    }
}

impl<T, const R: usize, const C: usize> Default for Matrix<T, R, C>
where
    T: Default,
{
    fn default() -> Self {
        Self::from_fn(|_, _| T::default())
    }
}

impl<T, const R: usize, const C: usize> From<[[T; C]; R]> for Matrix<T, R, C> {
    fn from(rows: [[T; C]; R]) -> Self {
        Self(rows)
    }
}

#[cfg(test)]
mod tests {
    use crate::vec2;

    use super::*;

    #[test]
    fn from_rows_columns() {
        assert_eq!(
            Mat2x3::from_rows([[1, 2, 3], [4, 5, 6]]),
            Mat2x3::from_columns([[1, 4], [2, 5], [3, 6]]),
        );
    }

    #[test]
    fn diagonal() {
        let mat = Matrix::from_diagonal([1, 2]);

        #[rustfmt::skip]
        assert_eq!(mat, Matrix::from_rows([
            [1, 0],
            [0, 2],
        ]));

        assert_eq!(mat.into_diagonal(), [1, 2]);
        assert_eq!(mat.trace(), 3);
    }

    #[test]
    fn fmt() {
        let mat = Matrix::from_rows([[0, 1], [2, 3]]);

        // Natural writing order (row-wise) for debug output.
        assert_eq!(format!("{:?}", mat), "[[0, 1], [2, 3]]");

        // `#` modifier prints each row in its own line, but not each individual element.
        assert_eq!(
            format!("{:#?}", mat),
            "
[
    [0, 1],
    [2, 3],
]
"
            .trim()
        );

        assert_eq!(
            format!("{:.2}", Matrix::from_rows([[0.5, 1.0]])),
            "[[0.50, 1.00]]"
        );
    }

    #[test]
    fn constants() {
        assert_eq!(format!("{:?}", Mat2d::ZERO), "[[0.0, 0.0], [0.0, 0.0]]");
        assert_eq!(format!("{:?}", Mat2d::IDENTITY), "[[1.0, 0.0], [0.0, 1.0]]");
        assert_eq!(Mat4d::identity(), Mat4d::IDENTITY);
        assert_eq!(Matrix::<i32, 5, 5>::identity().trace(), 5);
    }

    #[test]
    fn setters() {
        let mut mat = Mat2d::ZERO;
        mat.set(1, 0, 2.5).unwrap();
        assert_eq!(mat.row(1), vec2(2.5, 0.0));
        assert_eq!(mat.column(0), vec2(0.0, 2.5));

        assert_eq!(
            mat.set(0, 2, 1.0),
            Err(LinalgError::IndexOutOfBounds {
                row: 0,
                col: 2,
                rows: 2,
                cols: 2
            })
        );
        assert_eq!(mat[(0, 0)], 0.0);

        mat.swap_rows(0, 1);
        assert_eq!(mat.into_rows(), [[2.5, 0.0], [0.0, 0.0]]);
    }

    #[test]
    #[should_panic]
    fn with_column_out_of_bounds() {
        let _ = Mat2d::IDENTITY.with_column(2, vec2(1.0, 1.0));
    }

    #[test]
    fn norm_and_finiteness() {
        assert_eq!(Matrix::from_rows([[3.0, 0.0], [0.0, 4.0]]).frobenius_norm(), 5.0);
        assert!(!Matrix::from_rows([[f64::NAN, 0.0], [0.0, 1.0]]).is_finite());
        assert!(Mat2d::IDENTITY.is_finite());
    }

    #[test]
    fn mat_vec_mul() {
        let mat = Matrix::from_rows([[0, 1], [2, 3]]);
        let vec = vec2(4, 5);
        let out = mat * vec;
        assert_eq!(out, [4 * 0 + 5 * 1, 4 * 2 + 5 * 3]);
    }

    #[test]
    fn mat_mat_mul() {
        #[rustfmt::skip]
        let a = Matrix::from_rows([
            [1, 2],
            [3, 4],
            [5, 6],
            [7, 8],
        ]);
        #[rustfmt::skip]
        let b = Matrix::from_rows([
            [9, 10, 11],
            [12, 13, 14],
        ]);
        let c = a * b;
        assert_eq!(c[(0, 1)], a[(0, 0)] * b[(0, 1)] + a[(0, 1)] * b[(1, 1)]);
        assert_eq!(c[(2, 2)], a[(2, 0)] * b[(0, 2)] + a[(2, 1)] * b[(1, 2)]);
        assert_eq!(Mat2d::IDENTITY * Mat2d::IDENTITY, Mat2d::IDENTITY);
    }
}
