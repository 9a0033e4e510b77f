use glam::Quat;
use liftphys_core::types::Vec3;
use serde::{Deserialize, Serialize};

/// How a held body is steered toward the hand pose each fixed step. Fixed at
/// construction; the two strategies are alternatives, never mixed per-tick.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum TrackingMode {
    /// Damped-torque rotation control; position is left to the spring joint.
    Torque,
    /// Direct exponential smoothing of the full pose; no joint involved.
    Kinematic { responsiveness: f32 },
}

impl Default for TrackingMode {
    fn default() -> Self { Self::Torque }
}

/// Wrap an angle into (-pi, pi] so a 179 degree error never takes the long
/// way around.
#[inline]
pub fn wrap_angle(a: f32) -> f32 {
    let mut a = a;
    while a > core::f32::consts::PI {
        a -= core::f32::consts::TAU;
    }
    while a <= -core::f32::consts::PI {
        a += core::f32::consts::TAU;
    }
    a
}

/// Damped rotation control law: shortest-arc delta from `current` to
/// `target`, converted to angle-axis, deadbanded, then P on angular
/// displacement minus D on current angular velocity. Returns `None` inside
/// the deadband (no torque at all, so a settled object does not jitter).
pub fn correction_torque(
    current: Quat,
    angvel: Vec3,
    target: Quat,
    rotate_force: f32,
    rotate_damping: f32,
    deadband_rad: f32,
) -> Option<Vec3> {
    let diff = (target * current.inverse()).normalize();
    let (axis, angle) = diff.to_axis_angle();
    let angle = wrap_angle(angle);
    if angle.abs() <= deadband_rad {
        return None;
    }
    let displacement = Vec3::from(axis) * angle;
    Some(displacement * rotate_force - angvel * rotate_damping)
}

#[cfg(test)]
mod tests {
    use super::*;
    use liftphys_core::vec3;

    const DEADBAND: f32 = 1.0_f32 * core::f32::consts::PI / 180.0;

    #[test]
    fn aligned_orientations_produce_no_torque() {
        let q = Quat::from_rotation_y(0.3);
        assert!(correction_torque(q, Vec3::ZERO, q, 200.0, 10.0, DEADBAND).is_none());
    }

    #[test]
    fn sub_deadband_error_is_ignored() {
        let current = Quat::IDENTITY;
        let target = Quat::from_rotation_y(0.5_f32.to_radians());
        assert!(correction_torque(current, Vec3::ZERO, target, 200.0, 10.0, DEADBAND).is_none());
    }

    #[test]
    fn large_error_never_wraps_past_half_turn() {
        let current = Quat::IDENTITY;
        let target = Quat::from_rotation_y(179.0_f32.to_radians());
        let t = correction_torque(current, Vec3::ZERO, target, 1.0, 0.0, DEADBAND)
            .expect("well past deadband");
        // with unit gain the torque magnitude equals the angle magnitude
        let angle = t.length();
        assert!(angle <= core::f32::consts::PI + 1e-4, "angle {} wrapped long", angle);
        assert!((angle - 179.0_f32.to_radians()).abs() < 1e-2);
    }

    #[test]
    fn torque_points_along_shortest_arc() {
        let current = Quat::IDENTITY;
        let target = Quat::from_rotation_y(0.5);
        let t = correction_torque(current, Vec3::ZERO, target, 1.0, 0.0, DEADBAND).unwrap();
        assert!(t.y > 0.0 && t.x.abs() < 1e-5 && t.z.abs() < 1e-5);
    }

    #[test]
    fn damping_opposes_spin() {
        let q = Quat::IDENTITY;
        let target = Quat::from_rotation_y(0.5);
        let spinning = vec3(0.0, 50.0, 0.0);
        let t = correction_torque(q, spinning, target, 200.0, 10.0, DEADBAND).unwrap();
        let t0 = correction_torque(q, Vec3::ZERO, target, 200.0, 10.0, DEADBAND).unwrap();
        assert!(t.y < t0.y, "spin must reduce the applied torque");
    }

    #[test]
    fn wrap_angle_halves() {
        assert!((wrap_angle(270.0_f32.to_radians()) + 90.0_f32.to_radians()).abs() < 1e-5);
        assert!((wrap_angle(-270.0_f32.to_radians()) - 90.0_f32.to_radians()).abs() < 1e-5);
        assert_eq!(wrap_angle(0.0), 0.0);
    }
}
