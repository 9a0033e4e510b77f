//! Glue world for the carry/hold/throw stack: owns bodies, colliders,
//! joints, liftables and interaction controllers, and runs the fixed-step
//! schedule that keeps them coherent.
//!
//! Single-threaded by construction: every mutation happens inside one tick,
//! so per-object holder membership updates from several controllers can
//! never interleave mid-transition.

use anyhow::Result;

use liftphys_articulation::Joints;
use liftphys_core::types::{Isometry, Vec3, Velocity};
use liftphys_core::{
    hash_quat_q, hash_vec3_q, BodyId, ColliderId, HolderId, LiftableId, StateHasher, TeleportBus,
};
use liftphys_controllers::{HoldCtx, InteractionController, InteractionControllerBuilder};
use liftphys_dynamics::{Bodies, BodyDesc, Collider};
use liftphys_geom::Shape;
use liftphys_liftable::{LiftKind, LiftParams, Liftable, LiftableSet};
use liftphys_locomotion::{HolderMover, MovementState};

/// Handle to a registered interaction controller.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct ControllerId(pub usize);

struct ControllerSlot {
    ctrl: InteractionController,
    movement: MovementState,
    mover: Option<HolderMover>,
    move_input: Vec3,
    /// liftables overlapping the trigger volume as of the last step
    in_volume: Vec<LiftableId>,
}

/* ---------------- builder ---------------- */

pub struct WorldBuilder {
    pub bodies: usize,
    pub colliders: usize,
}

impl WorldBuilder {
    pub fn new() -> Self { Self { bodies: 64, colliders: 64 } }

    pub fn with_capacity(mut self, bodies: usize, colliders: usize) -> Self {
        self.bodies = bodies;
        self.colliders = colliders;
        self
    }

    pub fn build(self) -> World {
        World::with_capacity(self.bodies, self.colliders)
    }
}

impl Default for WorldBuilder {
    fn default() -> Self { Self::new() }
}

/* ---------------- world ---------------- */

pub struct World {
    pub gravity: Vec3,
    bodies: Bodies,
    colliders: Vec<Collider>,
    joints: Joints,
    liftables: LiftableSet,
    controllers: Vec<Option<ControllerSlot>>,
    teleport: TeleportBus,
    tick: u64,
}

impl World {
    pub fn with_capacity(bodies: usize, colliders: usize) -> Self {
        Self {
            gravity: Vec3::new(0.0, -9.81, 0.0),
            bodies: Bodies::with_capacity(bodies),
            colliders: Vec::with_capacity(colliders),
            joints: Joints::new(),
            liftables: LiftableSet::new(),
            controllers: Vec::new(),
            teleport: TeleportBus::new(),
            tick: 0,
        }
    }

    // -------- spawning --------

    pub fn add_body(&mut self, pose: Isometry, vel: Velocity, mass: f32, dynamic: bool) -> BodyId {
        BodyId(self.bodies.add(BodyDesc { pose, vel, mass, dynamic }))
    }

    pub fn add_collider(&mut self, body: BodyId, shape: Shape, layer: i32) -> ColliderId {
        self.colliders.push(Collider::new(body, shape, layer, &self.bodies));
        ColliderId((self.colliders.len() as u32) - 1)
    }

    pub fn add_liftable(&mut self, body: BodyId, params: LiftParams, kind: LiftKind) -> LiftableId {
        let l = Liftable::new(body, params, kind, &mut self.bodies);
        self.liftables.add(l)
    }

    /// Register a controller; subscribes its holder to the teleport channel.
    pub fn add_controller(&mut self, builder: InteractionControllerBuilder) -> Result<ControllerId> {
        let ctrl = builder.build()?;
        self.teleport.subscribe(ctrl.holder());
        self.controllers.push(Some(ControllerSlot {
            ctrl,
            movement: MovementState::default(),
            mover: None,
            move_input: Vec3::ZERO,
            in_volume: Vec::new(),
        }));
        Ok(ControllerId(self.controllers.len() - 1))
    }

    /// Teardown: releases any held object (no throw) and deregisters the
    /// teleport subscription. Leaking either would be a defect.
    pub fn remove_controller(&mut self, id: ControllerId) {
        let Some(slot) = self.controllers.get_mut(id.0) else { return };
        let Some(mut slot) = slot.take() else { return };
        let mut ctx = HoldCtx {
            bodies: &mut self.bodies,
            colliders: &mut self.colliders,
            joints: &mut self.joints,
            liftables: &mut self.liftables,
            movement: &mut slot.movement,
        };
        slot.ctrl.force_drop(&mut ctx);
        self.teleport.unsubscribe(slot.ctrl.holder());
        log::debug!("controller for {} removed", slot.ctrl.holder());
    }

    /// Destroy a liftable. Every controller holding or candidating it lets
    /// go first, so joints are released and physical state reverts.
    pub fn remove_liftable(&mut self, id: LiftableId) {
        for slot in self.controllers.iter_mut().flatten() {
            if slot.ctrl.held() == Some(id) {
                let mut ctx = HoldCtx {
                    bodies: &mut self.bodies,
                    colliders: &mut self.colliders,
                    joints: &mut self.joints,
                    liftables: &mut self.liftables,
                    movement: &mut slot.movement,
                };
                slot.ctrl.force_drop(&mut ctx);
            }
            slot.ctrl.on_overlap_exit(id);
            slot.in_volume.retain(|l| *l != id);
        }
        self.liftables.remove(id);
    }

    // -------- frame-cadence inputs --------

    /// Feed the polled interact button for one controller. Frame-cadence:
    /// zero or more fixed steps may run between two calls.
    pub fn apply_interact(&mut self, id: ControllerId, pressed: bool) {
        let Some(slot) = self.controllers.get_mut(id.0).and_then(|s| s.as_mut()) else { return };
        let mut ctx = HoldCtx {
            bodies: &mut self.bodies,
            colliders: &mut self.colliders,
            joints: &mut self.joints,
            liftables: &mut self.liftables,
            movement: &mut slot.movement,
        };
        slot.ctrl.poll_interact(pressed, &mut ctx);
    }

    pub fn set_mover(&mut self, id: ControllerId, mover: HolderMover) {
        if let Some(slot) = self.controllers.get_mut(id.0).and_then(|s| s.as_mut()) {
            slot.mover = Some(mover);
        }
    }

    pub fn set_move_input(&mut self, id: ControllerId, dir: Vec3) {
        if let Some(slot) = self.controllers.get_mut(id.0).and_then(|s| s.as_mut()) {
            slot.move_input = dir;
        }
    }

    /// Toggle a nozzle-kind liftable's secondary effect.
    pub fn toggle_nozzle(&mut self, id: LiftableId) {
        if let Some(l) = self.liftables.get_mut(id) {
            l.toggle_shooting();
        }
    }

    /// External "holder entered portal" notification.
    pub fn raise_teleport(&mut self, holder: HolderId) {
        self.teleport.raise(holder);
    }

    // -------- fixed step --------

    /// One fixed physics step.
    pub fn step(&mut self, dt: f32) {
        // 1. teleport force-drops, before anything can stretch across the gap
        for holder in self.teleport.drain() {
            for slot in self.controllers.iter_mut().flatten() {
                if slot.ctrl.holder() == holder {
                    let mut ctx = HoldCtx {
                        bodies: &mut self.bodies,
                        colliders: &mut self.colliders,
                        joints: &mut self.joints,
                        liftables: &mut self.liftables,
                        movement: &mut slot.movement,
                    };
                    slot.ctrl.force_drop(&mut ctx);
                }
            }
        }

        // 2. per-liftable behavior (nozzle recoil)
        for (_, l) in self.liftables.iter_mut() {
            l.fixed_tick(&mut self.bodies);
        }

        // 3. holder movement + per-controller tracking
        for slot in self.controllers.iter_mut().flatten() {
            if let Some(mover) = &slot.mover {
                mover.step(&mut self.bodies, slot.move_input, &slot.movement, dt);
            }
            let mut ctx = HoldCtx {
                bodies: &mut self.bodies,
                colliders: &mut self.colliders,
                joints: &mut self.joints,
                liftables: &mut self.liftables,
                movement: &mut slot.movement,
            };
            slot.ctrl.fixed_tick(&mut ctx, dt);
        }

        // 4. attachment springs
        self.joints.apply_forces(&mut self.bodies);

        // 5. integrate
        self.bodies.integrate_all(self.gravity, dt);

        // 6. refresh collider AABBs
        for c in &mut self.colliders {
            c.refresh_aabb(&self.bodies);
        }

        // 7. detection-volume enter/exit edges
        self.update_overlaps();

        self.tick += 1;
    }

    fn update_overlaps(&mut self) {
        for slot in self.controllers.iter_mut().flatten() {
            let center = slot.ctrl.trigger_center(&self.bodies);
            let radius = slot.ctrl.trigger().radius;
            let held = slot.ctrl.held();

            let mut current: Vec<LiftableId> = Vec::new();
            for (lid, l) in self.liftables.iter() {
                // only the object's own holder stops seeing it; other
                // holders must still candidate a partially-held object
                if held == Some(lid) {
                    continue;
                }
                let overlapping = self.colliders.iter().any(|c| {
                    c.body == l.body
                        && (c.aabb.closest_point(center) - center).length_squared() <= radius * radius
                });
                if overlapping {
                    current.push(lid);
                }
            }

            for lid in &current {
                if !slot.in_volume.contains(lid) {
                    slot.ctrl.on_overlap_enter(*lid);
                }
            }
            for lid in &slot.in_volume {
                if !current.contains(lid) {
                    slot.ctrl.on_overlap_exit(*lid);
                }
            }
            slot.in_volume = current;
        }
    }

    // -------- read access --------

    #[inline] pub fn tick_index(&self) -> u64 { self.tick }
    #[inline] pub fn bodies(&self) -> &Bodies { &self.bodies }
    #[inline] pub fn bodies_mut(&mut self) -> &mut Bodies { &mut self.bodies }
    #[inline] pub fn body_pose(&self, id: BodyId) -> Isometry { self.bodies.pose(id.0) }
    #[inline] pub fn body_vel(&self, id: BodyId) -> Velocity { self.bodies.vel(id.0) }
    #[inline] pub fn joints(&self) -> &Joints { &self.joints }

    pub fn collider_layer(&self, id: ColliderId) -> Option<i32> {
        self.colliders.get(id.0 as usize).map(|c| c.layer)
    }

    pub fn liftable(&self, id: LiftableId) -> Option<&Liftable> {
        self.liftables.get(id)
    }

    pub fn liftable_mut(&mut self, id: LiftableId) -> Option<&mut Liftable> {
        self.liftables.get_mut(id)
    }

    pub fn controller(&self, id: ControllerId) -> Option<&InteractionController> {
        self.controllers.get(id.0).and_then(|s| s.as_ref()).map(|s| &s.ctrl)
    }

    pub fn movement(&self, id: ControllerId) -> Option<&MovementState> {
        self.controllers.get(id.0).and_then(|s| s.as_ref()).map(|s| &s.movement)
    }

    pub fn teleport_subscribed(&self, holder: HolderId) -> bool {
        self.teleport.is_subscribed(holder)
    }

    /// Quantized digest of the dynamic state, for determinism regression.
    pub fn state_digest(&self) -> [u8; 32] {
        let mut h = StateHasher::new();
        h.update_u64(self.tick);
        h.update_u32(self.bodies.len() as u32);
        for id in self.bodies.indices() {
            let pose = self.bodies.pose(id);
            let vel = self.bodies.vel(id);
            hash_vec3_q(&mut h, &pose.pos);
            hash_quat_q(&mut h, &pose.rot);
            hash_vec3_q(&mut h, &vel.lin);
            hash_vec3_q(&mut h, &vel.ang);
        }
        for (lid, l) in self.liftables.iter() {
            h.update_u32(lid.0);
            h.update_u32(l.holders().len() as u32);
        }
        h.update_u32(self.joints.len_active() as u32);
        h.finalize()
    }

    /// Pose write for scene setup / teleports. Call between steps only.
    pub fn set_body_pose(&mut self, id: BodyId, pose: Isometry) {
        self.bodies.set_pose(id.0, pose);
        for c in &mut self.colliders {
            if c.body == id {
                c.refresh_aabb(&self.bodies);
            }
        }
    }
}
