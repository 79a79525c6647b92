mod ops;

use crate::{vec3, vec4, Float, Mat3, Matrix, Number, One, Sqrt, Trig, Vec3, Vector, Zero};

/// A quaternion consisting of 3 imaginary numbers and a real number.
///
/// Unit-length quaternions ("*versors*") represent rotations in 3D space. Multiplying two of them
/// (the Hamilton product) composes their rotations, with the right-hand side applied first.
///
/// Quaternions are stored like a 4-dimensional vector, with the `x`, `y` and `z` components holding
/// the imaginary part and `w` holding the real part.
#[derive(Clone, Copy, Hash)]
pub struct Quat<T> {
    vec: Vector<T, 4>,
}

/// Roll, pitch and yaw angles in radians (rotations about X, Y and Z, applied in that order).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EulerAngles<T> {
    pub roll: T,
    pub pitch: T,
    pub yaw: T,
}

impl<T: Zero + One> Quat<T> {
    /// The multiplicative identity.
    ///
    /// This is a unit quaternion that will not change a vector it is multiplied with.
    pub const IDENTITY: Self = Self {
        vec: vec4(T::ZERO, T::ZERO, T::ZERO, T::ONE),
    };
}

impl<T> Quat<T> {
    /// Creates a quaternion from a 4-dimensional [`Vector`].
    ///
    /// The `x`, `y`, and `z` coordinates correspond to the `i`, `j`, and `k` imaginary parts, while
    /// the `w` component corresponds to the real number part of the quaternion.
    pub fn from_vec(vec: Vector<T, 4>) -> Self {
        Self { vec }
    }

    pub fn from_components(x: T, y: T, z: T, w: T) -> Self {
        Self {
            vec: vec4(x, y, z, w),
        }
    }

    pub fn into_vec(self) -> Vector<T, 4> {
        self.vec
    }

    fn half(radians: T) -> T
    where
        T: Number,
    {
        radians / (T::ONE + T::ONE)
    }

    /// Creates a rotation of `radians` around `axis` (right-handed).
    ///
    /// The axis does not need to be normalized. An axis shorter than `0.001` yields
    /// [`Quat::IDENTITY`].
    ///
    /// # Examples
    ///
    /// ```
    /// # use microsim_linalg::*;
    /// # use approx::assert_abs_diff_eq;
    /// let q = Quat::from_axis_angle(vec3(0.0, 0.0, 2.0), std::f64::consts::FRAC_PI_2);
    /// assert_abs_diff_eq!(q.rotate(Vec3d::X), Vec3d::Y, epsilon = 1e-12);
    ///
    /// assert_eq!(Quat::from_axis_angle(Vec3d::ZERO, 1.0), Quat::IDENTITY);
    /// ```
    pub fn from_axis_angle(axis: Vec3<T>, radians: T) -> Self
    where
        T: Float,
    {
        match axis.try_normalize(T::from_f64(1e-3)) {
            Some(axis) => {
                let (sin, cos) = Self::half(radians).sin_cos();
                let [x, y, z] = (axis * sin).into_array();
                Self::from_components(x, y, z, cos)
            }
            None => Self::IDENTITY,
        }
    }

    pub fn from_rotation_x(radians: T) -> Self
    where
        T: Trig + Number,
    {
        let (sin, cos) = Self::half(radians).sin_cos();
        Self::from_components(sin, T::ZERO, T::ZERO, cos)
    }

    pub fn from_rotation_y(radians: T) -> Self
    where
        T: Trig + Number,
    {
        let (sin, cos) = Self::half(radians).sin_cos();
        Self::from_components(T::ZERO, sin, T::ZERO, cos)
    }

    pub fn from_rotation_z(radians: T) -> Self
    where
        T: Trig + Number,
    {
        let (sin, cos) = Self::half(radians).sin_cos();
        Self::from_components(T::ZERO, T::ZERO, sin, cos)
    }

    /// Creates a rotation that applies roll, then pitch, then yaw. Inverse of [`Quat::to_euler`].
    #[doc(alias = "euler")]
    pub fn from_euler(angles: EulerAngles<T>) -> Self
    where
        T: Number + Trig,
    {
        Self::from_rotation_z(angles.yaw)
            * Self::from_rotation_y(angles.pitch)
            * Self::from_rotation_x(angles.roll)
    }

    pub fn x(&self) -> T
    where
        T: Copy,
    {
        self.vec[0]
    }

    pub fn y(&self) -> T
    where
        T: Copy,
    {
        self.vec[1]
    }

    pub fn z(&self) -> T
    where
        T: Copy,
    {
        self.vec[2]
    }

    /// The real part.
    pub fn w(&self) -> T
    where
        T: Copy,
    {
        self.vec[3]
    }

    /// Returns the imaginary part as a 3D vector.
    pub fn vector_part(&self) -> Vec3<T>
    where
        T: Copy,
    {
        vec3(self.x(), self.y(), self.z())
    }

    /// Negates the imaginary part. For unit quaternions this is the inverse rotation.
    pub fn conjugate(self) -> Self
    where
        T: Number,
    {
        Self::from_components(-self.x(), -self.y(), -self.z(), self.w())
    }

    /// Rotates `v` by computing `q * v * q̄`.
    pub fn rotate(&self, v: Vec3<T>) -> Vec3<T>
    where
        T: Number,
    {
        let [x, y, z] = v.into_array();
        let pure = Self::from_components(x, y, z, T::ZERO);
        (*self * pure * self.conjugate()).vector_part()
    }

    /// Returns the 3x3 rotation matrix equivalent to [`Quat::rotate`] (for unit quaternions).
    pub fn to_rotation_matrix(&self) -> Mat3<T>
    where
        T: Number,
    {
        let [x, y, z, w] = self.vec.into_array();
        let two = T::ONE + T::ONE;
        Matrix::from_rows([
            [
                T::ONE - two * (y * y + z * z),
                two * (x * y - z * w),
                two * (x * z + y * w),
            ],
            [
                two * (x * y + z * w),
                T::ONE - two * (x * x + z * z),
                two * (y * z - x * w),
            ],
            [
                two * (x * z - y * w),
                two * (y * z + x * w),
                T::ONE - two * (x * x + y * y),
            ],
        ])
    }

    /// Converts a unit quaternion to roll, pitch and yaw.
    ///
    /// Pitch is clamped to `±π/2` at the gimbal-lock singularity.
    pub fn to_euler(&self) -> EulerAngles<T>
    where
        T: Float,
    {
        let [x, y, z, w] = self.vec.into_array();
        let two = T::ONE + T::ONE;

        let roll = (two * (w * x + y * z)).atan2(T::ONE - two * (x * x + y * y));
        let sinp = two * (w * y - z * x);
        let pitch = if sinp.abs() >= T::ONE {
            let half_pi = T::PI / two;
            if sinp > T::ZERO {
                half_pi
            } else {
                -half_pi
            }
        } else {
            sinp.asin()
        };
        let yaw = (two * (w * z + x * y)).atan2(T::ONE - two * (y * y + z * z));

        EulerAngles { roll, pitch, yaw }
    }

    /// Returns the squared length of this quaternion.
    pub fn length2(&self) -> T
    where
        T: Number,
    {
        self.vec.length2()
    }

    /// Returns the length of this quaternion.
    ///
    /// Only unit quaternions rotate vectors without also scaling them.
    #[doc(alias = "norm", alias = "magnitude")]
    pub fn length(&self) -> T
    where
        T: Number + Sqrt,
    {
        self.vec.length()
    }

    /// Returns a normalized copy of this quaternion (whose length equals one).
    pub fn normalize(self) -> Self
    where
        T: Number + Sqrt,
    {
        Self {
            vec: self.vec.normalize(),
        }
    }
}

impl<T: Zero + One> Default for Quat<T> {
    fn default() -> Self {
        Self::IDENTITY
    }
}
