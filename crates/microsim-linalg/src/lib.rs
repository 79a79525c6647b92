//! Small fixed-size linear algebra for stepwise teaching simulations.
//!
//! Vectors and matrices have their dimensions in the type (via const generics) and are generic
//! over the element type. Algorithms that compare against a tolerance are implemented for
//! [`Float`] elements ([`f32`] and [`f64`]) and take the tolerance as an explicit `epsilon`
//! argument.
//!
//! Besides one-shot results, several algorithms expose their intermediate state so that a
//! caller can show them one step at a time:
//!
//! - [`Mat3::cofactor_terms`] and [`Mat3::sarrus_diagonals`] break a 3x3 determinant into its
//!   summands.
//! - [`Mat2::solve_cramer`] returns the replaced-column determinants.
//! - [`Elimination`] performs LU elimination one row operation per step.
//! - [`PowerIteration`] and [`GramSchmidt`] advance one iteration or phase at a time.
//!
//! Matrices are stored row-major. Degenerate inputs are reported through [`LinalgError`] where the
//! operation has no meaningful result, and through sentinel values or fallbacks where it does
//! (a singular matrix has condition number [`CONDITION_SENTINEL`], a zero vector normalizes to a
//! caller-chosen fallback).

mod det;
mod eigen;
mod error;
mod gram_schmidt;
mod lu;
mod matrix;
mod quat;
mod row_ops;
mod svd;
mod traits;
mod vector;

pub use det::*;
pub use eigen::*;
pub use error::*;
pub use gram_schmidt::*;
pub use lu::*;
pub use matrix::*;
pub use quat::*;
pub use row_ops::*;
pub use svd::*;
pub use traits::*;
pub use vector::*;
