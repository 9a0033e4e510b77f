use glam::Quat;
use liftphys_core::types::{Vec3, Velocity};
use liftphys_core::BodyId;
use liftphys_dynamics::Bodies;

/// Movement-state hints pushed by the interaction side: a speed throttle in
/// [0,1] and an optional body to keep facing. Neutral = no penalty, free look.
#[derive(Copy, Clone, Debug, Default)]
pub struct MovementState {
    pub speed_penalty: f32,
    pub forced_look: Option<BodyId>,
}

impl MovementState {
    pub fn set(&mut self, speed_penalty: f32, forced_look: Option<BodyId>) {
        self.speed_penalty = speed_penalty.clamp(0.0, 1.0);
        self.forced_look = forced_look;
    }

    pub fn neutral(&mut self) {
        *self = Self::default();
    }

    #[inline]
    pub fn speed_scale(&self) -> f32 {
        1.0 - self.speed_penalty
    }
}

/// Velocity-driven planar mover for a holder body. Writes the target
/// velocity directly (keeping the vertical component for gravity) and slerps
/// facing toward the move direction, or toward a carried object when the
/// movement state forces it.
#[derive(Copy, Clone, Debug)]
pub struct HolderMover {
    pub body: BodyId,
    pub move_speed: f32,
    pub rotation_speed: f32,
}

impl HolderMover {
    pub fn new(body: BodyId) -> Self {
        Self { body, move_speed: 8.0, rotation_speed: 15.0 }
    }

    pub fn step(&self, bodies: &mut Bodies, input_dir: Vec3, state: &MovementState, dt: f32) {
        let dir = Vec3::new(input_dir.x, 0.0, input_dir.z).normalize_or_zero();
        let speed = self.move_speed * state.speed_scale();

        let mut v = bodies.vel(self.body.0);
        let vy = v.lin.y;
        v.lin = dir * speed;
        v.lin.y = vy;
        bodies.set_vel(self.body.0, Velocity { lin: v.lin, ang: v.ang });

        // facing: forced look wins over move direction
        let look = match state.forced_look {
            Some(target) => {
                let to = bodies.pose(target.0).pos - bodies.pose(self.body.0).pos;
                Vec3::new(to.x, 0.0, to.z).normalize_or_zero()
            }
            None => dir,
        };
        if look.length_squared() > 1.0e-6 {
            let mut pose = bodies.pose(self.body.0);
            // forward convention is +X
            let target_rot = Quat::from_rotation_arc(glam::Vec3::X, look.into());
            let t = (self.rotation_speed * dt).clamp(0.0, 1.0);
            pose.rot = pose.rot.slerp(target_rot, t).normalize();
            bodies.set_pose(self.body.0, pose);
        }
    }
}
