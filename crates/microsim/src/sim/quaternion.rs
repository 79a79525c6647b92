use std::time::Instant;

use microsim_linalg::{EulerAngles, Mat3d, Quat, Vec3d};

use crate::sim::{check_finite, check_range};
use crate::{Sim, SimError};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum QuaternionEvent {
    /// Sets the rotation axis. Each component must lie in `-1..=1`; the axis need not be unit.
    SetAxis(Vec3d),
    /// Sets the rotation angle in degrees, `0..=360`.
    SetAngle(f64),
    /// Replaces the orientation by the preview rotation.
    Apply,
    /// Applies the preview rotation on top of the current orientation.
    Compose,
    /// Returns to the identity orientation.
    Reset,
}

/// Axis-angle rotations accumulated into a unit quaternion.
#[derive(Debug, Clone)]
pub struct QuaternionRotation {
    axis: Vec3d,
    angle_degrees: f64,
    orientation: Quat<f64>,
}

impl Default for QuaternionRotation {
    fn default() -> Self {
        Self::new()
    }
}

impl QuaternionRotation {
    /// Axes shorter than this cannot be applied.
    pub const MIN_AXIS_LENGTH: f64 = 1e-3;

    pub fn new() -> Self {
        Self {
            axis: Vec3d::Y,
            angle_degrees: 45.0,
            orientation: Quat::IDENTITY,
        }
    }

    pub fn axis(&self) -> Vec3d {
        self.axis
    }

    /// The unit axis, or `None` if the axis is too short to define a direction.
    pub fn unit_axis(&self) -> Option<Vec3d> {
        self.axis.try_normalize(Self::MIN_AXIS_LENGTH)
    }

    pub fn angle_degrees(&self) -> f64 {
        self.angle_degrees
    }

    /// The rotation described by the current axis and angle.
    pub fn preview(&self) -> Quat<f64> {
        Quat::from_axis_angle(self.axis, self.angle_degrees.to_radians())
    }

    /// The accumulated orientation, always of unit length.
    pub fn orientation(&self) -> Quat<f64> {
        self.orientation
    }

    pub fn rotation_matrix(&self) -> Mat3d {
        self.orientation.to_rotation_matrix()
    }

    /// Roll, pitch and yaw of the orientation, in degrees.
    pub fn euler_degrees(&self) -> EulerAngles<f64> {
        let EulerAngles { roll, pitch, yaw } = self.orientation.to_euler();
        EulerAngles {
            roll: roll.to_degrees(),
            pitch: pitch.to_degrees(),
            yaw: yaw.to_degrees(),
        }
    }

    /// Rotates `v` by the current orientation.
    pub fn rotate(&self, v: Vec3d) -> Vec3d {
        self.orientation.rotate(v)
    }

    /// The preview rotation if the axis is usable. Degenerate axes leave the orientation alone.
    fn usable_preview(&self) -> Option<Quat<f64>> {
        if self.unit_axis().is_none() {
            log::debug!("axis {} is too short to rotate about", self.axis);
            return None;
        }
        Some(self.preview())
    }
}

impl Sim for QuaternionRotation {
    type Event = QuaternionEvent;

    fn name(&self) -> &'static str {
        "Quaternion Rotation"
    }

    fn handle_event(&mut self, event: QuaternionEvent, _now: Instant) -> Result<(), SimError> {
        match event {
            QuaternionEvent::SetAxis(axis) => {
                for value in axis.into_array() {
                    check_range("axis component", check_finite(value)?, -1.0, 1.0)?;
                }
                self.axis = axis;
            }
            QuaternionEvent::SetAngle(degrees) => {
                self.angle_degrees = check_range("angle", check_finite(degrees)?, 0.0, 360.0)?;
            }
            QuaternionEvent::Apply => {
                if let Some(q) = self.usable_preview() {
                    self.orientation = q;
                }
            }
            QuaternionEvent::Compose => {
                if let Some(q) = self.usable_preview() {
                    self.orientation = (q * self.orientation).normalize();
                    log::trace!("orientation {:?}", self.orientation);
                }
            }
            QuaternionEvent::Reset => self.orientation = Quat::IDENTITY,
        }
        Ok(())
    }

    fn tick(&mut self, _now: Instant) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use microsim_linalg::vec3;

    use super::*;

    fn send(sim: &mut QuaternionRotation, event: QuaternionEvent) {
        sim.handle_event(event, Instant::now()).unwrap();
    }

    #[test]
    fn apply_and_compose() {
        let mut sim = QuaternionRotation::new();
        send(&mut sim, QuaternionEvent::SetAxis(vec3(0.0, 0.0, 0.5)));
        send(&mut sim, QuaternionEvent::SetAngle(45.0));
        send(&mut sim, QuaternionEvent::Apply);
        send(&mut sim, QuaternionEvent::Compose);
        assert_abs_diff_eq!(sim.rotate(Vec3d::X), Vec3d::Y, epsilon = 1e-12);
        assert_abs_diff_eq!(sim.orientation().length(), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(sim.euler_degrees().yaw, 90.0, epsilon = 1e-9);
        assert_abs_diff_eq!(
            sim.rotation_matrix() * Vec3d::X,
            Vec3d::Y,
            epsilon = 1e-12
        );

        // Applying replaces instead of accumulating.
        send(&mut sim, QuaternionEvent::Apply);
        assert_abs_diff_eq!(sim.euler_degrees().yaw, 45.0, epsilon = 1e-9);

        send(&mut sim, QuaternionEvent::Reset);
        assert_eq!(sim.orientation(), Quat::IDENTITY);
    }

    #[test]
    fn degenerate_axis_is_ignored() {
        let mut sim = QuaternionRotation::new();
        send(&mut sim, QuaternionEvent::Apply);
        let before = sim.orientation();

        send(&mut sim, QuaternionEvent::SetAxis(Vec3d::ZERO));
        assert_eq!(sim.unit_axis(), None);
        assert_eq!(sim.preview(), Quat::IDENTITY);
        send(&mut sim, QuaternionEvent::Compose);
        send(&mut sim, QuaternionEvent::Apply);
        assert_eq!(sim.orientation(), before);
    }

    #[test]
    fn rejects_out_of_range_input() {
        let now = Instant::now();
        let mut sim = QuaternionRotation::new();
        assert!(matches!(
            sim.handle_event(QuaternionEvent::SetAngle(400.0), now),
            Err(SimError::OutOfRange { what: "angle", .. })
        ));
        assert!(sim
            .handle_event(QuaternionEvent::SetAxis(vec3(0.0, 1.5, 0.0)), now)
            .is_err());
        assert!(sim
            .handle_event(QuaternionEvent::SetAxis(vec3(f64::NAN, 0.0, 0.0)), now)
            .is_err());
        assert_eq!(sim.axis(), Vec3d::Y);
        assert_eq!(sim.angle_degrees(), 45.0);
    }
}
