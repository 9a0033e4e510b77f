use liftphys_core::BodyId;
use liftphys_geom::{Aabb, Shape, aabb_of};
use crate::Bodies;

/// A shape attached to a body. `layer` is the collision layer and is the
/// save/restore target when a liftable is carried (held objects move to an
/// "occupied" layer so they stop colliding with the carrying holder).
#[derive(Copy, Clone, Debug)]
pub struct Collider {
    pub body: BodyId,
    pub shape: Shape,
    pub aabb: Aabb,
    pub layer: i32,
}

impl Collider {
    pub fn new(body: BodyId, shape: Shape, layer: i32, bodies: &Bodies) -> Self {
        let aabb = aabb_of(&shape, &bodies.pose(body.0));
        Self { body, shape, aabb, layer }
    }

    #[inline]
    pub fn refresh_aabb(&mut self, bodies: &Bodies) {
        self.aabb = aabb_of(&self.shape, &bodies.pose(self.body.0));
    }
}
