mod interact;
mod rotation;

pub use interact::{HoldCtx, InteractParams, InteractionController, InteractionControllerBuilder, TriggerVolume};
pub use rotation::{correction_torque, wrap_angle, TrackingMode};
