use glam::Quat;
use liftphys_core::types::Vec3;
use liftphys_core::{BodyId, HolderId};
use liftphys_dynamics::{Bodies, Collider, ForceMode, Interpolation};
use liftphys_geom::closest_point;

use crate::params::{HeavyParams, LiftParams, NozzleParams};

/// Carry damping applied by the default first-pickup transition: high enough
/// that the spring attachment settles instead of orbiting the hand.
const CARRY_DAMPING: f32 = 10.0;

/// On/off secondary-effect sink (particle emitter, light, ...). Owned by the
/// nozzle kind; the sim only ever toggles it.
pub trait EffectTarget {
    fn set_active(&mut self, on: bool);
}

/// Per-kind physical behavior, selected at construction. Replaces virtual
/// dispatch with a closed capability set: each kind supplies its own
/// first-pickup / all-dropped / any-pickup / any-drop transitions, grab-point
/// policy and movement hints.
pub enum LiftKind {
    Plain,
    Nozzle {
        params: NozzleParams,
        shooting: bool,
        effect: Option<Box<dyn EffectTarget>>,
    },
    Heavy { params: HeavyParams },
}

impl LiftKind {
    pub fn nozzle(params: NozzleParams, effect: Option<Box<dyn EffectTarget>>) -> Self {
        Self::Nozzle { params, shooting: false, effect }
    }
    pub fn heavy(params: HeavyParams) -> Self {
        Self::Heavy { params }
    }
}

/// A physically simulated object that one or more holders can carry.
///
/// Owns the holder-membership state machine and every physical-property
/// transition that pickup/drop implies (gravity, damping, interpolation,
/// collision layers, mass). `holders` is ordered by pickup and
/// membership-unique; `holders.len() <= max_holders()` always.
pub struct Liftable {
    pub body: BodyId,
    params: LiftParams,
    kind: LiftKind,
    holders: Vec<HolderId>,
    /// (collider index, original layer); Some exactly while lifted.
    saved_layers: Option<Vec<(usize, i32)>>,
    /// (linear, angular) damping snapshot taken once at spawn.
    saved_damping: (f32, f32),
}

impl Liftable {
    /// Captures the spawn-time damping snapshot. The heavy kind also writes
    /// its rest mass to the body here, since heavy objects are heavy from
    /// spawn, not from first pickup.
    pub fn new(body: BodyId, mut params: LiftParams, kind: LiftKind, bodies: &mut Bodies) -> Self {
        match &kind {
            LiftKind::Plain => {}
            LiftKind::Nozzle { .. } => {
                params.max_holders = 1;
            }
            LiftKind::Heavy { params: hp } => {
                params.max_holders = 2;
                bodies.set_mass(body.0, hp.heavy_mass);
            }
        }
        let saved_damping = bodies.damping(body.0);
        let mut lift = Self {
            body,
            params,
            kind,
            holders: Vec::new(),
            saved_layers: None,
            saved_damping,
        };
        if let LiftKind::Nozzle { .. } = lift.kind {
            lift.drive_effect(false);
        }
        lift
    }

    // -------- read accessors --------

    #[inline] pub fn max_holders(&self) -> usize { self.params.max_holders }
    #[inline] pub fn holders(&self) -> &[HolderId] { &self.holders }
    #[inline] pub fn is_lifted(&self) -> bool { !self.holders.is_empty() }
    #[inline] pub fn can_be_picked_up(&self) -> bool { self.holders.len() < self.params.max_holders }

    /// Orientation offset applied while held.
    pub fn lift_dir_offset(&self) -> Quat {
        let [x, y, z] = self.params.lift_dir_offset_deg;
        Quat::from_euler(
            glam::EulerRot::XYZ,
            x.to_radians(),
            y.to_radians(),
            z.to_radians(),
        )
    }

    /// Speed throttle hint in [0,1] for whoever carries this.
    pub fn speed_penalty(&self) -> f32 {
        match &self.kind {
            LiftKind::Heavy { params } => {
                if self.holders.len() >= 2 { params.penalty_coop } else { params.penalty_solo }
            }
            _ => self.params.speed_penalty,
        }
    }

    /// Whether the holder must keep facing the object while carrying it.
    pub fn force_face(&self) -> bool {
        match &self.kind {
            LiftKind::Heavy { .. } => true,
            _ => self.params.force_face,
        }
    }

    /// Anchor for the attachment spring. Default is the body origin; the
    /// heavy kind grabs the closest point of its collision volume to the
    /// requesting hand (heavy objects are grabbed by an edge, not the center).
    pub fn grab_point(&self, hand_pos: Vec3, bodies: &Bodies, colliders: &[Collider]) -> Vec3 {
        let origin = bodies.pose(self.body.0).pos;
        match &self.kind {
            LiftKind::Heavy { .. } => colliders
                .iter()
                .find(|c| c.body == self.body)
                .map(|c| closest_point(&c.shape, &bodies.pose(self.body.0), hand_pos))
                .unwrap_or(origin),
            _ => origin,
        }
    }

    // -------- membership transitions --------

    /// Advisory: silently rejected at capacity or for existing members.
    /// Returns whether the holder was actually added.
    pub fn pick_up(
        &mut self,
        holder: HolderId,
        occupied_layer: i32,
        bodies: &mut Bodies,
        colliders: &mut [Collider],
    ) -> bool {
        if !self.can_be_picked_up() || self.holders.contains(&holder) {
            return false;
        }
        self.holders.push(holder);
        if self.holders.len() == 1 {
            self.save_and_change_layers(occupied_layer, colliders);
            self.on_first_pickup(bodies);
        }
        self.on_any_pickup(bodies);
        log::debug!(
            "{} picked up {} ({}/{} holders)",
            holder, self.body, self.holders.len(), self.params.max_holders
        );
        true
    }

    /// Advisory: silently rejected for non-members.
    pub fn drop(&mut self, holder: HolderId, bodies: &mut Bodies, colliders: &mut [Collider]) -> bool {
        let Some(idx) = self.holders.iter().position(|h| *h == holder) else {
            return false;
        };
        self.holders.remove(idx);
        if self.holders.is_empty() {
            self.revert_layers(colliders);
            self.on_all_dropped(bodies);
        }
        self.on_any_drop(bodies);
        log::debug!(
            "{} dropped {} ({} holders left)",
            holder, self.body, self.holders.len()
        );
        true
    }

    fn on_first_pickup(&mut self, bodies: &mut Bodies) {
        let id = self.body.0;
        match &self.kind {
            LiftKind::Plain => {
                bodies.set_gravity_enabled(id, false);
                bodies.set_interpolation(id, Interpolation::Interpolate);
                bodies.set_damping(id, CARRY_DAMPING, CARRY_DAMPING);
            }
            LiftKind::Nozzle { params, .. } => {
                // floats while held: gravity off, light mass, airy damping
                bodies.set_gravity_enabled(id, false);
                bodies.set_interpolation(id, Interpolation::Interpolate);
                bodies.set_mass(id, params.carry_mass);
                bodies.set_damping(id, params.carry_damping, params.carry_damping);
            }
            LiftKind::Heavy { params } => {
                // heavy loads sag and drag rather than float
                bodies.set_gravity_enabled(id, true);
                bodies.set_interpolation(id, Interpolation::Interpolate);
                bodies.set_damping(id, params.carry_damping, params.carry_damping);
            }
        }
    }

    fn on_all_dropped(&mut self, bodies: &mut Bodies) {
        let id = self.body.0;
        let (lin, ang) = self.saved_damping;
        bodies.set_gravity_enabled(id, true);
        bodies.set_interpolation(id, Interpolation::None);
        match &self.kind {
            LiftKind::Plain => bodies.set_damping(id, lin, ang),
            // carry mass/damping deliberately kept; only the effect is
            // forced off below so a dropped nozzle never keeps firing
            LiftKind::Nozzle { .. } => {}
            LiftKind::Heavy { params } => {
                let mass = params.heavy_mass;
                bodies.set_damping(id, lin, ang);
                bodies.set_mass(id, mass);
            }
        }
        if matches!(self.kind, LiftKind::Nozzle { .. }) {
            self.set_shooting_internal(false);
        }
    }

    /// Runs on every successful pickup (second and third holders included);
    /// the heavy kind recomputes the aggregate mass split here.
    fn on_any_pickup(&mut self, bodies: &mut Bodies) {
        self.update_mass_split(bodies);
    }

    fn on_any_drop(&mut self, bodies: &mut Bodies) {
        self.update_mass_split(bodies);
    }

    fn update_mass_split(&mut self, bodies: &mut Bodies) {
        if let LiftKind::Heavy { params } = &self.kind {
            if self.is_lifted() {
                let mass = if self.holders.len() > 1 {
                    params.heavy_mass / params.coop_mass_divisor
                } else {
                    params.heavy_mass
                };
                bodies.set_mass(self.body.0, mass);
            }
        }
    }

    // -------- layer save/restore --------

    fn save_and_change_layers(&mut self, occupied_layer: i32, colliders: &mut [Collider]) {
        let mut saved = Vec::new();
        for (i, c) in colliders.iter_mut().enumerate() {
            if c.body == self.body {
                saved.push((i, c.layer));
                c.layer = occupied_layer;
            }
        }
        self.saved_layers = Some(saved);
    }

    fn revert_layers(&mut self, colliders: &mut [Collider]) {
        if let Some(saved) = self.saved_layers.take() {
            for (i, layer) in saved {
                if let Some(c) = colliders.get_mut(i) {
                    c.layer = layer;
                }
            }
        }
    }

    #[inline] pub fn layers_saved(&self) -> bool { self.saved_layers.is_some() }

    // -------- nozzle secondary effect --------

    /// Toggle the continuous secondary effect. Refused while not held (a
    /// nozzle on the ground cannot be turned on remotely).
    pub fn toggle_shooting(&mut self) {
        if !self.is_lifted() {
            return;
        }
        let now = matches!(self.kind, LiftKind::Nozzle { shooting: true, .. });
        self.set_shooting_internal(!now);
    }

    pub fn set_shooting(&mut self, state: bool) {
        self.set_shooting_internal(state);
    }

    pub fn is_shooting(&self) -> bool {
        matches!(self.kind, LiftKind::Nozzle { shooting: true, .. })
    }

    fn set_shooting_internal(&mut self, state: bool) {
        let is_nozzle = if let LiftKind::Nozzle { shooting, .. } = &mut self.kind {
            *shooting = state;
            true
        } else {
            false
        };
        if is_nozzle {
            self.drive_effect(state);
        }
    }

    fn drive_effect(&mut self, on: bool) {
        if let LiftKind::Nozzle { effect: Some(e), .. } = &mut self.kind {
            e.set_active(on);
        }
    }

    /// Per-physics-tick behavior: recoil while the nozzle fires. Reaction
    /// force along the body's own backward axis, continuous-force mode.
    pub fn fixed_tick(&mut self, bodies: &mut Bodies) {
        if let LiftKind::Nozzle { params, shooting: true, .. } = &self.kind {
            if self.is_lifted() {
                let back = -bodies.forward(self.body.0);
                bodies.apply_force(self.body.0, back * params.recoil_force, ForceMode::Force);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LiftableSet;
    use liftphys_core::types::Velocity;
    use liftphys_core::{iso, quat_identity, vec3};
    use liftphys_dynamics::BodyDesc;
    use liftphys_geom::Shape;
    use std::cell::Cell;
    use std::rc::Rc;

    const OCCUPIED: i32 = 9;

    fn scene(mass: f32) -> (Bodies, Vec<Collider>, BodyId) {
        let mut bodies = Bodies::default();
        let body = BodyId(bodies.add(BodyDesc {
            pose: iso(vec3(0.0, 1.0, 0.0), quat_identity()),
            vel: Velocity::default(),
            mass,
            dynamic: true,
        }));
        let colliders = vec![
            Collider::new(body, Shape::Box { hx: 0.5, hy: 0.5, hz: 0.5 }, 0, &bodies),
            Collider::new(body, Shape::Sphere { r: 0.2 }, 3, &bodies),
        ];
        (bodies, colliders, body)
    }

    #[test]
    fn membership_is_unique_and_capped() {
        let (mut bodies, mut cols, body) = scene(1.0);
        let mut l = Liftable::new(body, LiftParams::default(), LiftKind::Plain, &mut bodies);
        assert!(l.pick_up(HolderId(1), OCCUPIED, &mut bodies, &mut cols));
        assert!(!l.pick_up(HolderId(1), OCCUPIED, &mut bodies, &mut cols), "re-pickup by member");
        assert!(!l.pick_up(HolderId(2), OCCUPIED, &mut bodies, &mut cols), "beyond capacity");
        assert_eq!(l.holders(), &[HolderId(1)]);
        assert!(l.holders().len() <= l.max_holders());
    }

    #[test]
    fn lifted_iff_holders_nonempty() {
        let (mut bodies, mut cols, body) = scene(1.0);
        let mut l = Liftable::new(body, LiftParams::default(), LiftKind::Plain, &mut bodies);
        assert!(!l.is_lifted());
        l.pick_up(HolderId(1), OCCUPIED, &mut bodies, &mut cols);
        assert!(l.is_lifted());
        l.drop(HolderId(1), &mut bodies, &mut cols);
        assert!(!l.is_lifted());
    }

    #[test]
    fn drop_by_non_member_is_noop() {
        let (mut bodies, mut cols, body) = scene(1.0);
        let mut l = Liftable::new(body, LiftParams::default(), LiftKind::Plain, &mut bodies);
        l.pick_up(HolderId(1), OCCUPIED, &mut bodies, &mut cols);
        assert!(!l.drop(HolderId(2), &mut bodies, &mut cols));
        assert_eq!(l.holders(), &[HolderId(1)]);
        assert!(l.layers_saved());
    }

    #[test]
    fn layers_saved_and_restored_exactly() {
        let (mut bodies, mut cols, body) = scene(1.0);
        let before: Vec<i32> = cols.iter().map(|c| c.layer).collect();
        let mut l = Liftable::new(body, LiftParams::default(), LiftKind::Plain, &mut bodies);

        l.pick_up(HolderId(1), OCCUPIED, &mut bodies, &mut cols);
        assert!(cols.iter().all(|c| c.layer == OCCUPIED));
        assert!(l.layers_saved());

        l.drop(HolderId(1), &mut bodies, &mut cols);
        let after: Vec<i32> = cols.iter().map(|c| c.layer).collect();
        assert_eq!(before, after);
        assert!(!l.layers_saved());
    }

    #[test]
    fn default_transition_floats_then_reverts() {
        let (mut bodies, mut cols, body) = scene(1.0);
        bodies.set_damping(body.0, 0.2, 0.3);
        let mut l = Liftable::new(body, LiftParams::default(), LiftKind::Plain, &mut bodies);

        l.pick_up(HolderId(1), OCCUPIED, &mut bodies, &mut cols);
        assert!(!bodies.gravity_enabled(body.0));
        assert_eq!(bodies.interpolation(body.0), Interpolation::Interpolate);
        assert_eq!(bodies.damping(body.0), (CARRY_DAMPING, CARRY_DAMPING));

        l.drop(HolderId(1), &mut bodies, &mut cols);
        assert!(bodies.gravity_enabled(body.0));
        assert_eq!(bodies.interpolation(body.0), Interpolation::None);
        assert_eq!(bodies.damping(body.0), (0.2, 0.3));
    }

    #[test]
    fn heavy_mass_splits_with_holder_count() {
        let (mut bodies, mut cols, body) = scene(1.0);
        let hp = HeavyParams::default();
        let mut l = Liftable::new(
            body,
            LiftParams::default(),
            LiftKind::heavy(hp),
            &mut bodies,
        );
        assert_eq!(bodies.mass_of(body.0), 60.0);
        assert_eq!(l.max_holders(), 2);

        l.pick_up(HolderId(1), OCCUPIED, &mut bodies, &mut cols);
        assert_eq!(bodies.mass_of(body.0), 60.0);
        assert_eq!(l.speed_penalty(), hp.penalty_solo);
        assert!(bodies.gravity_enabled(body.0), "heavy objects keep gravity while held");

        l.pick_up(HolderId(2), OCCUPIED, &mut bodies, &mut cols);
        assert_eq!(bodies.mass_of(body.0), 15.0);
        assert_eq!(l.speed_penalty(), hp.penalty_coop);
        assert!(!l.can_be_picked_up());

        l.drop(HolderId(1), &mut bodies, &mut cols);
        assert_eq!(bodies.mass_of(body.0), 60.0, "mass recomputed for one remaining holder");
        assert_eq!(l.speed_penalty(), hp.penalty_solo);

        l.drop(HolderId(2), &mut bodies, &mut cols);
        assert_eq!(bodies.mass_of(body.0), 60.0);
        assert!(!l.is_lifted());
        assert!(l.force_face());
    }

    #[test]
    fn heavy_grab_point_is_closest_surface_point() {
        let (mut bodies, cols, body) = scene(1.0);
        let l = Liftable::new(
            body,
            LiftParams::default(),
            LiftKind::heavy(HeavyParams::default()),
            &mut bodies,
        );
        // body at (0,1,0), box half extent 0.5; hand far on +X
        let gp = l.grab_point(vec3(5.0, 1.0, 0.0), &bodies, &cols);
        assert!((gp - vec3(0.5, 1.0, 0.0)).length() < 1e-4);
    }

    #[test]
    fn plain_grab_point_is_origin() {
        let (mut bodies, cols, body) = scene(1.0);
        let l = Liftable::new(body, LiftParams::default(), LiftKind::Plain, &mut bodies);
        let gp = l.grab_point(vec3(5.0, 5.0, 5.0), &bodies, &cols);
        assert_eq!(gp, bodies.pose(body.0).pos);
    }

    struct Flag(Rc<Cell<bool>>);
    impl EffectTarget for Flag {
        fn set_active(&mut self, on: bool) { self.0.set(on); }
    }

    #[test]
    fn nozzle_effect_forced_off_on_drop() {
        let (mut bodies, mut cols, body) = scene(1.0);
        let vfx = Rc::new(Cell::new(true));
        let mut l = Liftable::new(
            body,
            LiftParams::default(),
            LiftKind::nozzle(NozzleParams::default(), Some(Box::new(Flag(vfx.clone())))),
            &mut bodies,
        );
        assert!(!vfx.get(), "effect starts off");

        l.toggle_shooting();
        assert!(!l.is_shooting(), "toggle refused while grounded");

        l.pick_up(HolderId(1), OCCUPIED, &mut bodies, &mut cols);
        assert_eq!(bodies.mass_of(body.0), 5.0);
        assert!(!bodies.gravity_enabled(body.0));
        l.toggle_shooting();
        assert!(l.is_shooting());
        assert!(vfx.get());

        l.drop(HolderId(1), &mut bodies, &mut cols);
        assert!(!l.is_shooting());
        assert!(!vfx.get(), "dropped nozzle never keeps firing");
        assert!(bodies.gravity_enabled(body.0));
    }

    #[test]
    fn nozzle_recoil_pushes_backward() {
        let (mut bodies, mut cols, body) = scene(1.0);
        let mut l = Liftable::new(
            body,
            LiftParams::default(),
            LiftKind::nozzle(NozzleParams::default(), None),
            &mut bodies,
        );
        l.pick_up(HolderId(1), OCCUPIED, &mut bodies, &mut cols);
        l.set_shooting(true);
        l.fixed_tick(&mut bodies);
        bodies.integrate_all(liftphys_core::types::Vec3::ZERO, 0.02);
        // forward is +X, so recoil drives -X
        assert!(bodies.vel(body.0).lin.x < 0.0);
    }

    #[test]
    fn set_ids_survive_removal() {
        let (mut bodies, _cols, body) = scene(1.0);
        let mut set = LiftableSet::new();
        let a = set.add(Liftable::new(body, LiftParams::default(), LiftKind::Plain, &mut bodies));
        let b = set.add(Liftable::new(body, LiftParams::default(), LiftKind::Plain, &mut bodies));
        set.remove(a);
        assert!(set.get(a).is_none());
        assert!(set.get(b).is_some());
    }
}
