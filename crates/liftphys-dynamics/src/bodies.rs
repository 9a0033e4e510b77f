use liftphys_core::types::{Isometry, Velocity, Vec3};
use liftphys_core::{Scalar, Quat};

/// How an applied force/torque is interpreted, mirroring the usual engine
/// split between continuous and instantaneous application.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ForceMode {
    /// Continuous force (N); divided by mass, integrated over dt.
    Force,
    /// Continuous acceleration; mass-independent, integrated over dt.
    Acceleration,
    /// Instant momentum change (N·s); divided by mass.
    Impulse,
    /// Instant velocity change; mass-independent.
    VelocityChange,
}

/// Render-side interpolation hint. The sim itself never reads it back; held
/// bodies switch to `Interpolate` so a spring-driven carry does not stutter
/// at frame rate.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Interpolation {
    None,
    Interpolate,
}

/// Input descriptor when creating a body.
#[derive(Copy, Clone, Debug)]
pub struct BodyDesc {
    pub pose: Isometry,
    pub vel: Velocity,
    pub mass: Scalar,
    pub dynamic: bool,
}

/// SoA body storage with id = index semantics.
///
/// Inverse inertia falls back to isotropic `inv_mass * I`, which is all the
/// holding controller needs; the rotation control law runs in acceleration
/// mode and bypasses inertia entirely.
pub struct Bodies {
    pos: Vec<Vec3>,
    rot: Vec<Quat>,
    linvel: Vec<Vec3>,
    angvel: Vec<Vec3>,
    mass: Vec<Scalar>,
    inv_mass: Vec<Scalar>,
    lin_damp: Vec<Scalar>,
    ang_damp: Vec<Scalar>,
    gravity_on: Vec<bool>,
    interp: Vec<Interpolation>,
    dynamic: Vec<bool>,
    // per-tick accumulators, cleared by integrate_all
    acc_lin: Vec<Vec3>,
    acc_ang: Vec<Vec3>,
}

impl Bodies {
    pub fn with_capacity(cap: usize) -> Self {
        Self {
            pos: Vec::with_capacity(cap),
            rot: Vec::with_capacity(cap),
            linvel: Vec::with_capacity(cap),
            angvel: Vec::with_capacity(cap),
            mass: Vec::with_capacity(cap),
            inv_mass: Vec::with_capacity(cap),
            lin_damp: Vec::with_capacity(cap),
            ang_damp: Vec::with_capacity(cap),
            gravity_on: Vec::with_capacity(cap),
            interp: Vec::with_capacity(cap),
            dynamic: Vec::with_capacity(cap),
            acc_lin: Vec::with_capacity(cap),
            acc_ang: Vec::with_capacity(cap),
        }
    }

    pub fn add(&mut self, desc: BodyDesc) -> u32 {
        self.pos.push(desc.pose.pos);
        self.rot.push(desc.pose.rot);
        self.linvel.push(desc.vel.lin);
        self.angvel.push(desc.vel.ang);
        let m = desc.mass.max(0.0);
        self.mass.push(m);
        self.inv_mass.push(if desc.dynamic && m > 0.0 { 1.0 / m } else { 0.0 });
        self.lin_damp.push(0.0);
        self.ang_damp.push(0.0);
        self.gravity_on.push(true);
        self.interp.push(Interpolation::None);
        self.dynamic.push(desc.dynamic);
        self.acc_lin.push(Vec3::ZERO);
        self.acc_ang.push(Vec3::ZERO);
        (self.pos.len() as u32) - 1
    }

    #[inline] pub fn len(&self) -> usize { self.pos.len() }
    #[inline] pub fn is_empty(&self) -> bool { self.pos.is_empty() }

    // -------- pose / velocity --------
    #[inline] pub fn pose(&self, id: u32) -> Isometry {
        let i = id as usize;
        Isometry { pos: self.pos[i], rot: self.rot[i] }
    }
    #[inline] pub fn set_pose(&mut self, id: u32, xf: Isometry) {
        let i = id as usize;
        self.pos[i] = xf.pos;
        self.rot[i] = xf.rot.normalize();
    }
    #[inline] pub fn vel(&self, id: u32) -> Velocity {
        let i = id as usize;
        Velocity { lin: self.linvel[i], ang: self.angvel[i] }
    }
    #[inline] pub fn set_vel(&mut self, id: u32, v: Velocity) {
        let i = id as usize;
        self.linvel[i] = v.lin;
        self.angvel[i] = v.ang;
    }
    /// Velocity of the material point of body `id` at world position `p`.
    #[inline] pub fn velocity_at_point(&self, id: u32, p: Vec3) -> Vec3 {
        let i = id as usize;
        self.linvel[i] + self.angvel[i].cross(p - self.pos[i])
    }
    /// Forward axis convention: body-local +X.
    #[inline] pub fn forward(&self, id: u32) -> Vec3 {
        self.rot[id as usize] * Vec3::X
    }

    // -------- mutable physical properties --------
    #[inline] pub fn mass_of(&self, id: u32) -> Scalar { self.mass[id as usize] }
    pub fn set_mass(&mut self, id: u32, m: Scalar) {
        let i = id as usize;
        self.mass[i] = m.max(0.0);
        self.inv_mass[i] = if self.dynamic[i] && m > 0.0 { 1.0 / m } else { 0.0 };
    }
    #[inline] pub fn inv_mass_of(&self, id: u32) -> Scalar { self.inv_mass[id as usize] }
    #[inline] pub fn is_dynamic(&self, id: u32) -> bool { self.dynamic[id as usize] }

    #[inline] pub fn damping(&self, id: u32) -> (Scalar, Scalar) {
        let i = id as usize;
        (self.lin_damp[i], self.ang_damp[i])
    }
    pub fn set_damping(&mut self, id: u32, lin: Scalar, ang: Scalar) {
        let i = id as usize;
        self.lin_damp[i] = lin.max(0.0);
        self.ang_damp[i] = ang.max(0.0);
    }

    #[inline] pub fn gravity_enabled(&self, id: u32) -> bool { self.gravity_on[id as usize] }
    #[inline] pub fn set_gravity_enabled(&mut self, id: u32, on: bool) { self.gravity_on[id as usize] = on; }

    #[inline] pub fn interpolation(&self, id: u32) -> Interpolation { self.interp[id as usize] }
    #[inline] pub fn set_interpolation(&mut self, id: u32, mode: Interpolation) { self.interp[id as usize] = mode; }

    // -------- forces / torques --------
    pub fn apply_force(&mut self, id: u32, f: Vec3, mode: ForceMode) {
        let i = id as usize;
        if !self.dynamic[i] { return; }
        match mode {
            ForceMode::Force => self.acc_lin[i] += f * self.inv_mass[i],
            ForceMode::Acceleration => self.acc_lin[i] += f,
            ForceMode::Impulse => self.linvel[i] += f * self.inv_mass[i],
            ForceMode::VelocityChange => self.linvel[i] += f,
        }
    }

    pub fn apply_torque(&mut self, id: u32, t: Vec3, mode: ForceMode) {
        let i = id as usize;
        if !self.dynamic[i] { return; }
        // isotropic inverse inertia fallback
        let inv_i = self.inv_mass[i];
        match mode {
            ForceMode::Force => self.acc_ang[i] += t * inv_i,
            ForceMode::Acceleration => self.acc_ang[i] += t,
            ForceMode::Impulse => self.angvel[i] += t * inv_i,
            ForceMode::VelocityChange => self.angvel[i] += t,
        }
    }

    /// Semi-implicit step: accumulate accelerations, damp, then advance pose.
    /// Damping uses the `1/(1 + d*dt)` form so large carry damping (10) stays
    /// unconditionally stable at any fixed dt.
    pub fn integrate_all(&mut self, gravity: Vec3, dt: Scalar) {
        for i in 0..self.len() {
            if !self.dynamic[i] || self.inv_mass[i] == 0.0 {
                self.acc_lin[i] = Vec3::ZERO;
                self.acc_ang[i] = Vec3::ZERO;
                continue;
            }
            let g = if self.gravity_on[i] { gravity } else { Vec3::ZERO };
            self.linvel[i] += (g + self.acc_lin[i]) * dt;
            self.angvel[i] += self.acc_ang[i] * dt;
            self.acc_lin[i] = Vec3::ZERO;
            self.acc_ang[i] = Vec3::ZERO;

            self.linvel[i] *= 1.0 / (1.0 + self.lin_damp[i] * dt);
            self.angvel[i] *= 1.0 / (1.0 + self.ang_damp[i] * dt);

            self.pos[i] += self.linvel[i] * dt;
            let w = self.angvel[i] * dt;
            if w.length_squared() > 0.0 {
                // small-angle quaternion step
                let dq = Quat::from_xyzw(w.x * 0.5, w.y * 0.5, w.z * 0.5, 1.0).normalize();
                self.rot[i] = (dq * self.rot[i]).normalize();
            }
        }
    }

    pub fn indices(&self) -> impl ExactSizeIterator<Item = u32> + '_ {
        0..(self.len() as u32)
    }
}

impl Default for Bodies {
    fn default() -> Self { Self::with_capacity(0) }
}
