use anyhow::{bail, Result};
use glam::Quat;
use serde::{Deserialize, Serialize};

use liftphys_articulation::{Joints, SpringJoint};
use liftphys_core::types::{Vec3, Velocity};
use liftphys_core::{BodyId, HolderId, JointId, LiftableId};
use liftphys_dynamics::{Bodies, Collider, ForceMode};
use liftphys_liftable::LiftableSet;
use liftphys_locomotion::MovementState;

use crate::rotation::{correction_torque, TrackingMode};

/// Interaction tuning. Serializable so scenes can supply it as data.
#[derive(Copy, Clone, Debug, Serialize, Deserialize)]
pub struct InteractParams {
    /// Layer held objects are moved to while carried, so they stop colliding
    /// with the holder carrying them.
    pub held_object_layer: i32,
    pub joint_spring: f32,
    pub joint_damper: f32,
    pub rotate_force: f32,
    pub rotate_damping: f32,
    pub deadband_deg: f32,
    pub throw_force: f32,
    pub tracking: TrackingMode,
}

impl Default for InteractParams {
    fn default() -> Self {
        Self {
            held_object_layer: 8,
            joint_spring: 1500.0,
            joint_damper: 100.0,
            rotate_force: 200.0,
            rotate_damping: 10.0,
            deadband_deg: 1.0,
            throw_force: 10.0,
            tracking: TrackingMode::Torque,
        }
    }
}

/// Sphere detection volume around the hand, holder-local.
#[derive(Copy, Clone, Debug)]
pub struct TriggerVolume {
    pub local_offset: Vec3,
    pub radius: f32,
}

/// Borrowed view of everything a controller mutates during orchestration.
/// The world assembles one per call; nothing here is retained.
pub struct HoldCtx<'a> {
    pub bodies: &'a mut Bodies,
    pub colliders: &'a mut [Collider],
    pub joints: &'a mut Joints,
    pub liftables: &'a mut LiftableSet,
    pub movement: &'a mut MovementState,
}

/// Builder so missing required collaborators (hand frame, trigger volume)
/// fail at construction instead of at first use.
#[derive(Default)]
pub struct InteractionControllerBuilder {
    holder: Option<HolderId>,
    body: Option<BodyId>,
    hand_local: Option<Vec3>,
    trigger: Option<TriggerVolume>,
    params: InteractParams,
}

impl InteractionControllerBuilder {
    pub fn new() -> Self { Self::default() }

    pub fn holder(mut self, h: HolderId) -> Self { self.holder = Some(h); self }
    pub fn body(mut self, b: BodyId) -> Self { self.body = Some(b); self }
    pub fn hand_local(mut self, p: Vec3) -> Self { self.hand_local = Some(p); self }
    pub fn trigger(mut self, t: TriggerVolume) -> Self { self.trigger = Some(t); self }
    pub fn params(mut self, p: InteractParams) -> Self { self.params = p; self }

    pub fn build(self) -> Result<InteractionController> {
        let Some(holder) = self.holder else { bail!("interaction controller: holder id missing") };
        let Some(body) = self.body else { bail!("interaction controller: holder body missing") };
        let Some(hand_local) = self.hand_local else {
            bail!("interaction controller: hand reference frame missing")
        };
        let Some(trigger) = self.trigger else {
            bail!("interaction controller: trigger volume missing")
        };
        if !(trigger.radius > 0.0) {
            bail!("interaction controller: trigger radius must be positive, got {}", trigger.radius);
        }
        if !hand_local.is_finite() {
            bail!("interaction controller: hand offset is not finite");
        }
        Ok(InteractionController {
            holder,
            body,
            hand_local,
            trigger,
            params: self.params,
            held: None,
            candidate: None,
            joint: None,
            interacting: false,
        })
    }
}

/// One holder's grab/hold/throw orchestration.
///
/// Holds at most one object regardless of how many holders that object
/// accepts. Invariants: `joint.is_some() == held.is_some()` (torque mode;
/// kinematic mode never creates a joint), and `candidate` is cleared the
/// moment something is held.
pub struct InteractionController {
    holder: HolderId,
    body: BodyId,
    hand_local: Vec3,
    trigger: TriggerVolume,
    params: InteractParams,
    held: Option<LiftableId>,
    candidate: Option<LiftableId>,
    joint: Option<JointId>,
    interacting: bool,
}

impl InteractionController {
    pub fn builder() -> InteractionControllerBuilder {
        InteractionControllerBuilder::new()
    }

    #[inline] pub fn holder(&self) -> HolderId { self.holder }
    #[inline] pub fn body(&self) -> BodyId { self.body }
    #[inline] pub fn held(&self) -> Option<LiftableId> { self.held }
    #[inline] pub fn candidate(&self) -> Option<LiftableId> { self.candidate }
    #[inline] pub fn joint(&self) -> Option<JointId> { self.joint }
    #[inline] pub fn trigger(&self) -> TriggerVolume { self.trigger }
    #[inline] pub fn params(&self) -> &InteractParams { &self.params }

    /// Candidate or held object, for highlighting.
    pub fn selected(&self) -> Option<LiftableId> {
        self.candidate.or(self.held)
    }

    /// World-space hand frame.
    pub fn hand_frame(&self, bodies: &Bodies) -> (Vec3, Quat) {
        let pose = bodies.pose(self.body.0);
        (pose.transform_point(self.hand_local), pose.rot)
    }

    /// World-space center of the detection volume.
    pub fn trigger_center(&self, bodies: &Bodies) -> Vec3 {
        bodies.pose(self.body.0).transform_point(self.trigger.local_offset)
    }

    // -------- candidate detection --------

    /// Overlap-enter: last object entered while idle wins; entering objects
    /// are ignored entirely while something is held.
    pub fn on_overlap_enter(&mut self, id: LiftableId) {
        if self.held.is_some() {
            return;
        }
        self.candidate = Some(id);
    }

    /// Overlap-exit clears the candidate only when it matches the leaver.
    pub fn on_overlap_exit(&mut self, id: LiftableId) {
        if self.candidate == Some(id) {
            self.candidate = None;
        }
    }

    // -------- input edge --------

    /// Feed the polled interact input. A rising edge toggles: drop-with-throw
    /// when holding, else pick up the current candidate. Falling edges do
    /// nothing (toggle-on-press, not press-and-hold).
    pub fn poll_interact(&mut self, pressed: bool, ctx: &mut HoldCtx<'_>) {
        if pressed == self.interacting {
            return;
        }
        self.interacting = pressed;
        if !pressed {
            return;
        }
        if self.held.is_some() {
            self.drop_held(true, ctx);
        } else if let Some(id) = self.candidate {
            self.pick_up(id, ctx);
        }
    }

    // -------- pickup / drop --------

    /// Commit `id` as the held object. Rejected when the object is at
    /// capacity or the reference has gone stale.
    pub fn pick_up(&mut self, id: LiftableId, ctx: &mut HoldCtx<'_>) -> bool {
        if self.held.is_some() {
            return false;
        }
        let Some(obj) = ctx.liftables.get_mut(id) else {
            self.candidate = None;
            return false;
        };
        if !obj.can_be_picked_up() {
            return false;
        }
        // anchor resolved against the pre-pickup state; membership changes
        // colliders' layers, not poses, so the order is free
        let obj_body = obj.body;
        let (hand_pos, _hand_rot) = self.hand_frame(ctx.bodies);
        let grab_world = obj.grab_point(hand_pos, ctx.bodies, ctx.colliders);
        if !obj.pick_up(self.holder, self.params.held_object_layer, ctx.bodies, ctx.colliders) {
            return false;
        }

        let penalty = obj.speed_penalty();
        let face = obj.force_face();

        if let TrackingMode::Torque = self.params.tracking {
            let anchor_b = ctx.bodies.pose(obj_body.0).inverse_transform_point(grab_world);
            self.joint = Some(ctx.joints.add(SpringJoint {
                a: self.body,
                b: obj_body,
                anchor_a: self.hand_local,
                anchor_b,
                spring: self.params.joint_spring,
                damper: self.params.joint_damper,
                rest: 0.0,
            }));
        }

        self.held = Some(id);
        self.candidate = None;
        ctx.movement.set(penalty, if face { Some(obj_body) } else { None });
        log::info!("{} grabbed {} (penalty {:.2}, face {})", self.holder, obj_body, penalty, face);
        true
    }

    /// Release the held object; `throw` adds holder momentum plus a forward
    /// impulse-equivalent velocity.
    pub fn drop_held(&mut self, throw: bool, ctx: &mut HoldCtx<'_>) {
        let Some(id) = self.held.take() else { return };
        if let Some(j) = self.joint.take() {
            ctx.joints.remove(j);
        }
        ctx.movement.neutral();

        let Some(obj) = ctx.liftables.get_mut(id) else {
            // object destroyed while held; joint and movement already reset
            return;
        };
        let obj_body = obj.body;
        obj.drop(self.holder, ctx.bodies, ctx.colliders);

        if throw {
            let holder_vel = ctx.bodies.vel(self.body.0).lin;
            let fwd = ctx.bodies.forward(self.body.0);
            let mut v = ctx.bodies.vel(obj_body.0);
            v.lin = holder_vel + fwd * self.params.throw_force;
            ctx.bodies.set_vel(obj_body.0, Velocity { lin: v.lin, ang: v.ang });
            log::info!("{} threw {} at {:?}", self.holder, obj_body, v.lin);
        } else {
            log::info!("{} released {}", self.holder, obj_body);
        }
    }

    /// Teleport path: unconditional release, no throw. Also the teardown path
    /// when the controller or held object is removed.
    pub fn force_drop(&mut self, ctx: &mut HoldCtx<'_>) {
        if self.held.is_some() {
            log::warn!("{} force-dropped held object (teleport/teardown)", self.holder);
            self.drop_held(false, ctx);
        }
    }

    // -------- per-tick tracking --------

    /// Runs once per fixed physics step while holding. Torque mode corrects
    /// rotation only (the spring joint owns position); kinematic mode smooths
    /// the whole pose toward the hand target and keeps velocities zeroed.
    pub fn fixed_tick(&mut self, ctx: &mut HoldCtx<'_>, dt: f32) {
        let Some(id) = self.held else { return };
        let Some(obj) = ctx.liftables.get(id) else {
            // stale held reference: tear down like an object-destroyed drop
            self.force_drop(ctx);
            return;
        };
        let obj_body = obj.body;
        let offset = obj.lift_dir_offset();
        let (hand_pos, hand_rot) = self.hand_frame(ctx.bodies);
        let target_rot = (hand_rot * offset).normalize();

        match self.params.tracking {
            TrackingMode::Torque => {
                let pose = ctx.bodies.pose(obj_body.0);
                let angvel = ctx.bodies.vel(obj_body.0).ang;
                if let Some(torque) = correction_torque(
                    pose.rot,
                    angvel,
                    target_rot,
                    self.params.rotate_force,
                    self.params.rotate_damping,
                    self.params.deadband_deg.to_radians(),
                ) {
                    ctx.bodies.apply_torque(obj_body.0, torque, ForceMode::Acceleration);
                }
            }
            TrackingMode::Kinematic { responsiveness } => {
                let mut pose = ctx.bodies.pose(obj_body.0);
                let t = (responsiveness * dt).clamp(0.0, 1.0);
                pose.pos = pose.pos.lerp(hand_pos, t);
                pose.rot = pose.rot.slerp(target_rot, t).normalize();
                ctx.bodies.set_pose(obj_body.0, pose);
                ctx.bodies.set_vel(obj_body.0, Velocity::default());
            }
        }
    }
}
