use liftphys_core::{BodyId, JointId, Scalar};
use liftphys_core::types::Vec3;
use liftphys_dynamics::{Bodies, ForceMode};

/// Spring/damper joint pulling body `b`'s anchor onto body `a`'s anchor.
/// Anchors are body-local; `rest` is the target separation (zero for a carry
/// attachment: the grab point is pulled to coincide with the hand, not
/// dangled below it).
#[derive(Copy, Clone, Debug)]
pub struct SpringJoint {
    pub a: BodyId,
    pub b: BodyId,
    pub anchor_a: Vec3,
    pub anchor_b: Vec3,
    pub spring: Scalar,
    pub damper: Scalar,
    pub rest: Scalar,
}

/// Slot-based joint set. Removal leaves a free slot so JointIds stay stable;
/// removing an already-removed or out-of-range id is a guarded no-op (the
/// drop/teleport/destroy exit paths may race to tear down the same joint).
#[derive(Default)]
pub struct Joints {
    slots: Vec<Option<SpringJoint>>,
}

impl Joints {
    pub fn new() -> Self { Self { slots: Vec::new() } }

    pub fn add(&mut self, j: SpringJoint) -> JointId {
        if let Some(i) = self.slots.iter().position(|s| s.is_none()) {
            self.slots[i] = Some(j);
            JointId(i as u32)
        } else {
            self.slots.push(Some(j));
            JointId((self.slots.len() as u32) - 1)
        }
    }

    pub fn remove(&mut self, id: JointId) {
        if let Some(slot) = self.slots.get_mut(id.0 as usize) {
            *slot = None;
        }
    }

    pub fn get(&self, id: JointId) -> Option<&SpringJoint> {
        self.slots.get(id.0 as usize).and_then(|s| s.as_ref())
    }

    pub fn len_active(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Accumulate spring/damper forces for this tick. Force-based (not a hard
    /// constraint): the body's own damping plus the joint damper keep the
    /// carry critically-damped-ish instead of fighting the integrator.
    pub fn apply_forces(&self, bodies: &mut Bodies) {
        for j in self.slots.iter().flatten() {
            let pa = bodies.pose(j.a.0).transform_point(j.anchor_a);
            let pb = bodies.pose(j.b.0).transform_point(j.anchor_b);
            let d = pb - pa;
            let dist = d.length();

            let stretch = if j.rest > 0.0 && dist > 1.0e-6 {
                d * ((dist - j.rest) / dist)
            } else {
                d
            };

            let rel_v = bodies.velocity_at_point(j.b.0, pb) - bodies.velocity_at_point(j.a.0, pa);
            let f_on_b = -(stretch * j.spring) - rel_v * j.damper;

            bodies.apply_force(j.b.0, f_on_b, ForceMode::Force);
            bodies.apply_force(j.a.0, -f_on_b, ForceMode::Force);
        }
    }
}
