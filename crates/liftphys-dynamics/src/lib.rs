mod bodies;
mod collider;

pub use bodies::{Bodies, BodyDesc, ForceMode, Interpolation};
pub use collider::Collider;
