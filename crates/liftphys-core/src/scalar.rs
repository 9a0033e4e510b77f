/// Simulation scalar. Single precision everywhere; the holding controller is
/// a per-tick control law, so accumulated drift is corrected continuously.
pub type Scalar = f32;
