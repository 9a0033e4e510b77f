mod params;
mod liftable;
mod set;

pub use params::{LiftParams, NozzleParams, HeavyParams};
pub use liftable::{Liftable, LiftKind, EffectTarget};
pub use set::LiftableSet;
