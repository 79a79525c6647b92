use std::{fmt, ops};

/// The trigonometry needed for unit vectors, angle errors and Euler angles.
pub trait Trig: Sized {
    /// Computes sine and cosine of `self` (in radians) at once.
    fn sin_cos(self) -> (Self, Self);
    fn asin(self) -> Self;
    fn acos(self) -> Self;
    fn atan2(self, other: Self) -> Self;
}

/// Types that support computing their square root.
pub trait Sqrt {
    fn sqrt(self) -> Self;
}

/// Types that support a `min` and `max` operation.
///
/// [`f32`] and [`f64`] implement this trait in terms of [`f64::min`] and [`f64::max`], so a `NaN`
/// operand is ignored in favor of the other one.
pub trait MinMax: Sized {
    fn min(self, other: Self) -> Self;
    fn max(self, other: Self) -> Self;
    fn clamp(self, min: Self, max: Self) -> Self {
        self.max(min).min(max)
    }
}

/// Types that have a "zero" value (an additive identity).
pub trait Zero {
    /// The *0* value of this type.
    const ZERO: Self;
}

/// Types that have a "one" value (a multiplicative identity).
pub trait One {
    /// The *1* value of this type.
    const ONE: Self;
}

/// A trait for numeric types that support basic arithmetic operations.
pub trait Number:
    Zero
    + One
    + ops::Neg<Output = Self>
    + ops::Add<Output = Self>
    + ops::Sub<Output = Self>
    + ops::Mul<Output = Self>
    + ops::Div<Output = Self>
    + PartialEq
    + Copy
{
}
impl<T> Number for T where
    T: Zero
        + One
        + ops::Neg<Output = Self>
        + ops::Add<Output = Self>
        + ops::Sub<Output = Self>
        + ops::Mul<Output = Self>
        + ops::Div<Output = Self>
        + PartialEq
        + Copy
{
}

/// Floating-point scalars.
///
/// Everything that compares against a tolerance (inverses, eigenvectors, decompositions) is
/// written against this trait. It is implemented for [`f32`] and [`f64`].
pub trait Float: Number + Sqrt + Trig + MinMax + PartialOrd + fmt::Debug {
    /// The value `π`.
    const PI: Self;

    fn abs(self) -> Self;
    fn is_finite(self) -> bool;

    /// Converts an [`f64`] constant into this type (rounding for [`f32`]).
    fn from_f64(value: f64) -> Self;
    /// Widens this value to an [`f64`], used when reporting values in errors.
    fn to_f64(self) -> f64;
}

macro_rules! int_impls {
    ($($types:ty),+) => {
        $(
            impl Zero for $types {
                const ZERO: Self = 0;
            }
            impl One for $types {
                const ONE: Self = 1;
            }
            impl MinMax for $types {
                fn min(self, other: Self) -> Self {
                    Ord::min(self, other)
                }

                fn max(self, other: Self) -> Self {
                    Ord::max(self, other)
                }
            }
        )+
    };
}
int_impls!(u8, u16, u32, u64, usize, i8, i16, i32, i64, isize);

macro_rules! float_impls {
    ($($ty:ident),+) => {
        $(
            impl Zero for $ty {
                const ZERO: Self = 0.0;
            }
            impl One for $ty {
                const ONE: Self = 1.0;
            }

            impl MinMax for $ty {
                fn min(self, other: Self) -> Self {
                    $ty::min(self, other)
                }

                fn max(self, other: Self) -> Self {
                    $ty::max(self, other)
                }
            }

            impl Sqrt for $ty {
                fn sqrt(self) -> Self {
                    $ty::sqrt(self)
                }
            }

            impl Trig for $ty {
                fn sin_cos(self) -> (Self, Self) {
                    $ty::sin_cos(self)
                }

                fn asin(self) -> Self {
                    $ty::asin(self)
                }

                fn acos(self) -> Self {
                    $ty::acos(self)
                }

                fn atan2(self, other: Self) -> Self {
                    $ty::atan2(self, other)
                }
            }

            impl Float for $ty {
                const PI: Self = std::$ty::consts::PI;

                fn abs(self) -> Self {
                    $ty::abs(self)
                }

                fn is_finite(self) -> bool {
                    $ty::is_finite(self)
                }

                fn from_f64(value: f64) -> Self {
                    value as $ty
                }

                fn to_f64(self) -> f64 {
                    self as f64
                }
            }
        )+
    };
}
float_impls!(f32, f64);

#[cfg(test)]
mod tests {
    use super::*;

    fn generic_clamp<T: MinMax>(v: T, lo: T, hi: T) -> T {
        v.clamp(lo, hi)
    }

    #[test]
    fn clamp() {
        assert_eq!(generic_clamp(5, 0, 3), 3);
        assert_eq!(generic_clamp(-1.0, 0.0, 3.0), 0.0);
        assert_eq!(generic_clamp(f64::NAN, 0.0, 3.0), 0.0);
    }

    #[test]
    fn float_roundtrip() {
        assert_eq!(<f32 as Float>::from_f64(0.5).to_f64(), 0.5);
        assert_eq!(Float::abs(-2.0f64), 2.0);
        assert!(!Float::is_finite(f64::INFINITY));
    }
}
