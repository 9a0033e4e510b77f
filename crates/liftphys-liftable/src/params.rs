use serde::{Deserialize, Serialize};

/// Base liftable tuning. `lift_dir_offset_deg` is the orientation offset
/// (euler XYZ, degrees) applied to the hand frame while the object is held.
#[derive(Copy, Clone, Debug, Serialize, Deserialize)]
pub struct LiftParams {
    pub max_holders: usize,
    pub lift_dir_offset_deg: [f32; 3],
    pub speed_penalty: f32,
    pub force_face: bool,
}

impl Default for LiftParams {
    fn default() -> Self {
        Self {
            max_holders: 1,
            lift_dir_offset_deg: [0.0; 3],
            speed_penalty: 0.0,
            force_face: false,
        }
    }
}

/// Single-holder propelled tool (hose-nozzle-like). Light carry mass,
/// moderate damping, gravity stays off while held for mid-air aiming.
#[derive(Copy, Clone, Debug, Serialize, Deserialize)]
pub struct NozzleParams {
    pub carry_mass: f32,
    pub carry_damping: f32,
    pub recoil_force: f32,
}

impl Default for NozzleParams {
    fn default() -> Self {
        Self { carry_mass: 5.0, carry_damping: 3.0, recoil_force: 5.0 }
    }
}

/// Two-holder heavy object. Mass splits by holder count; carrying solo is
/// heavily penalized, cooperative carry barely at all.
#[derive(Copy, Clone, Debug, Serialize, Deserialize)]
pub struct HeavyParams {
    pub heavy_mass: f32,
    pub coop_mass_divisor: f32,
    pub penalty_solo: f32,
    pub penalty_coop: f32,
    pub carry_damping: f32,
}

impl Default for HeavyParams {
    fn default() -> Self {
        Self {
            heavy_mass: 60.0,
            coop_mass_divisor: 4.0,
            penalty_solo: 0.6,
            penalty_coop: 0.1,
            carry_damping: 0.5,
        }
    }
}
