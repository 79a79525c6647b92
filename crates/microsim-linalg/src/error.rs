use thiserror::Error;

/// Errors returned by the fallible kernel operations.
///
/// Numeric payloads are widened to [`f64`] so that the error type does not depend on the element
/// type of the matrix that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum LinalgError {
    /// The determinant is too close to zero for the matrix to be inverted or solved.
    #[error("matrix is singular (determinant {determinant:e})")]
    Singular { determinant: f64 },

    /// Elimination without pivoting hit a pivot too close to zero.
    #[error("zero pivot {value:e} in column {column}")]
    ZeroPivot { column: usize, value: f64 },

    #[error("index ({row}, {col}) is out of bounds for a {rows}x{cols} matrix")]
    IndexOutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    /// A vector lies (numerically) in the span of the vectors before it.
    #[error("vector {index} is linearly dependent on the preceding vectors")]
    LinearlyDependent { index: usize },

    #[error("invalid row operation: {reason}")]
    InvalidRowOperation { reason: &'static str },

    /// The input contains a NaN or infinite element.
    #[error("matrix contains non-finite elements")]
    NonFinite,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages() {
        assert_eq!(
            LinalgError::IndexOutOfBounds {
                row: 3,
                col: 0,
                rows: 3,
                cols: 3
            }
            .to_string(),
            "index (3, 0) is out of bounds for a 3x3 matrix"
        );
        assert_eq!(
            LinalgError::ZeroPivot {
                column: 1,
                value: 0.0
            }
            .to_string(),
            "zero pivot 0e0 in column 1"
        );
    }
}
