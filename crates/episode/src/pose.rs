//! 6-DoF annotation pose and its rounded read-out.

use glam::{Mat3, Quat, Vec3};

/// Decimal places kept in the displayed and saved pose.
pub const DISPLAY_DECIMALS: i32 = 3;

#[inline]
fn round_display(v: f32) -> f32 {
    let scale = 10f32.powi(DISPLAY_DECIMALS);
    (v * scale).round() / scale
}

/// Position plus orientation of the annotation target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Vec3,
    pub orientation: Quat,
}

impl Default for Pose {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            orientation: Quat::IDENTITY,
        }
    }
}

impl Pose {
    pub fn new(position: Vec3, orientation: Quat) -> Self {
        Self {
            position,
            orientation,
        }
    }

    /// Builds a pose from XYZ-ordered Euler angles (radians), i.e. the
    /// rotation `Rx * Ry * Rz`.
    pub fn from_euler_xyz(position: Vec3, euler: Vec3) -> Self {
        let orientation = Quat::from_rotation_x(euler.x)
            * Quat::from_rotation_y(euler.y)
            * Quat::from_rotation_z(euler.z);
        Self::new(position, orientation.normalize())
    }

    /// XYZ-ordered Euler angles (radians) of the orientation.
    pub fn euler_xyz(&self) -> Vec3 {
        let m = Mat3::from_quat(self.orientation);
        let (m11, m12, m13) = (m.x_axis.x, m.y_axis.x, m.z_axis.x);
        let (m22, m23) = (m.y_axis.y, m.z_axis.y);
        let (m32, m33) = (m.y_axis.z, m.z_axis.z);

        let y = m13.clamp(-1.0, 1.0).asin();
        if m13.abs() < 0.999_999_9 {
            Vec3::new((-m23).atan2(m33), y, (-m12).atan2(m11))
        } else {
            // Gimbal lock: fold all roll into x.
            Vec3::new(m32.atan2(m22), y, 0.0)
        }
    }

    /// Rounded values as shown in the pose panel.
    pub fn readout(&self) -> PoseReadout {
        let e = self.euler_xyz();
        let q = self.orientation;
        PoseReadout {
            x: round_display(self.position.x),
            y: round_display(self.position.y),
            z: round_display(self.position.z),
            rx: round_display(e.x),
            ry: round_display(e.y),
            rz: round_display(e.z),
            qx: round_display(q.x),
            qy: round_display(q.y),
            qz: round_display(q.z),
            qw: round_display(q.w),
        }
    }
}

/// Display copy of a [`Pose`], every component rounded to
/// [`DISPLAY_DECIMALS`] places.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoseReadout {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub rx: f32,
    pub ry: f32,
    pub rz: f32,
    pub qx: f32,
    pub qy: f32,
    pub qz: f32,
    pub qw: f32,
}

impl Default for PoseReadout {
    fn default() -> Self {
        Pose::default().readout()
    }
}

impl PoseReadout {
    /// Wire order used by the pose store: `[x, y, z, qw, qx, qy, qz]`.
    pub fn wire(&self) -> [f32; 7] {
        [self.x, self.y, self.z, self.qw, self.qx, self.qy, self.qz]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn identity_reads_out_as_zero_rotation() {
        let r = Pose::default().readout();
        assert_eq!((r.rx, r.ry, r.rz), (0.0, 0.0, 0.0));
        assert_eq!(r.qw, 1.0);
        assert_eq!(r.wire(), [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn euler_angles_survive_conversion() {
        let euler = Vec3::new(0.3, -0.4, 1.2);
        let pose = Pose::from_euler_xyz(Vec3::ZERO, euler);
        let back = pose.euler_xyz();
        assert_relative_eq!(back.x, euler.x, epsilon = 1e-5);
        assert_relative_eq!(back.y, euler.y, epsilon = 1e-5);
        assert_relative_eq!(back.z, euler.z, epsilon = 1e-5);
    }

    #[test]
    fn single_axis_rotation_matches_euler_component() {
        let pose = Pose::new(Vec3::ZERO, Quat::from_rotation_z(0.5));
        let e = pose.euler_xyz();
        assert_relative_eq!(e.z, 0.5, epsilon = 1e-6);
        assert_relative_eq!(e.x, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn readout_rounds_to_three_places() {
        let pose = Pose::new(Vec3::new(0.123_46, -1.000_4, 2.0), Quat::IDENTITY);
        let r = pose.readout();
        assert_eq!(r.x, 0.123);
        assert_eq!(r.y, -1.0);
        assert_eq!(r.z, 2.0);
    }

    #[test]
    fn wire_order_puts_scalar_part_first() {
        let q = Quat::from_rotation_x(std::f32::consts::FRAC_PI_2);
        let r = Pose::new(Vec3::new(1.0, 2.0, 3.0), q).readout();
        let w = r.wire();
        assert_eq!(&w[..3], &[1.0, 2.0, 3.0]);
        assert_eq!(w[3], r.qw);
        assert_eq!(w[4], r.qx);
        assert_relative_eq!(w[3], 0.707, epsilon = 1e-6);
    }
}
