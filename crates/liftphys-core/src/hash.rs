use blake3::Hasher;
use glam::Quat;
use crate::types::Vec3;

/// Blake3-backed digest over quantized sim state. Quantization (1e-4 grid)
/// keeps the digest stable across benign last-bit float noise.
pub struct StateHasher(Hasher);

const Q: f32 = 1.0e4;

#[inline]
fn q(x: f32) -> i32 { (x * Q).round() as i32 }

impl StateHasher {
    pub fn new() -> Self { StateHasher(Hasher::new()) }
    pub fn update_bytes(&mut self, bytes: &[u8]) { self.0.update(bytes); }
    pub fn update_u32(&mut self, v: u32) { self.0.update(&v.to_le_bytes()); }
    pub fn update_u64(&mut self, v: u64) { self.0.update(&v.to_le_bytes()); }
    pub fn update_f32_q(&mut self, v: f32) { self.0.update(&q(v).to_le_bytes()); }
    pub fn finalize(self) -> [u8; 32] { *self.0.finalize().as_bytes() }
}

impl Default for StateHasher {
    fn default() -> Self { Self::new() }
}

#[inline]
pub fn hash_vec3_q(h: &mut StateHasher, v: &Vec3) {
    for c in [v.x, v.y, v.z] { h.update_f32_q(c); }
}

#[inline]
pub fn hash_quat_q(h: &mut StateHasher, r: &Quat) {
    for c in [r.x, r.y, r.z, r.w] { h.update_f32_q(c); }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vec3;

    #[test]
    fn quantization_absorbs_noise() {
        let mut a = StateHasher::new();
        hash_vec3_q(&mut a, &vec3(1.0, 2.0, 3.0));
        let mut b = StateHasher::new();
        hash_vec3_q(&mut b, &vec3(1.0 + 1.0e-6, 2.0, 3.0));
        assert_eq!(a.finalize(), b.finalize());
    }

    #[test]
    fn distinct_states_differ() {
        let mut a = StateHasher::new();
        hash_vec3_q(&mut a, &vec3(1.0, 2.0, 3.0));
        let mut b = StateHasher::new();
        hash_vec3_q(&mut b, &vec3(1.1, 2.0, 3.0));
        assert_ne!(a.finalize(), b.finalize());
    }
}
