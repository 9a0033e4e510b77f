pub mod scalar;
pub mod ids;
pub mod types;
pub mod hash;
pub mod events;

pub use scalar::Scalar;
pub use ids::{BodyId, ColliderId, JointId, HolderId, LiftableId};
pub use types::{Vec3, Mat3, Isometry, Velocity, vec3, iso, quat_identity};
pub use hash::{StateHasher, hash_vec3_q, hash_quat_q};
pub use events::TeleportBus;
pub use glam::Quat;
