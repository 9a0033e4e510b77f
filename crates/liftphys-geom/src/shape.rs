use liftphys_core::types::{Isometry, Vec3, Mat3};
use glam::Mat3A;
use crate::aabb::Aabb;

#[derive(Copy, Clone, Debug)]
pub enum Shape {
    Sphere { r: f32 },
    Box { hx: f32, hy: f32, hz: f32 },
}

#[inline]
pub fn aabb_of(shape: &Shape, xf: &Isometry) -> Aabb {
    match *shape {
        Shape::Sphere { r } => Aabb::from_center_half_extents(xf.pos, Vec3::splat(r)),
        Shape::Box { hx, hy, hz } => {
            let he = Vec3::new(hx, hy, hz);
            let rot = Mat3A::from_quat(xf.rot);
            let m = Mat3::from_cols(rot.x_axis.abs(), rot.y_axis.abs(), rot.z_axis.abs());
            Aabb::from_center_half_extents(xf.pos, m * he)
        }
    }
}

/// Closest point of the solid shape to a world-space point `p`.
/// Interior points map to themselves (grab anchors inside the volume stay put).
pub fn closest_point(shape: &Shape, xf: &Isometry, p: Vec3) -> Vec3 {
    match *shape {
        Shape::Sphere { r } => {
            let d = p - xf.pos;
            let len = d.length();
            if len <= r || len <= 1.0e-6 { p } else { xf.pos + d * (r / len) }
        }
        Shape::Box { hx, hy, hz } => {
            let local = xf.inverse_transform_point(p);
            let he = Vec3::new(hx, hy, hz);
            xf.transform_point(local.clamp(-he, he))
        }
    }
}
