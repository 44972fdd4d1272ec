use crate::Sdf;
use bevy::math::Vec3;
use noise::{NoiseFn, Perlin, Seedable};
use std::fmt::Debug;

/// Displaces another SDF by fractal Perlin noise, giving bumpy non-convex
/// seed shapes.
///
/// The result is no longer a true distance; redistance the sampled field
/// before evolving it.
#[derive(Clone)]
pub struct Noisy<T: Sdf> {
	pub sdf: T,
	pub noise: Perlin,
	pub frequency: f32,
	pub amplitude: f32,
	pub octaves: u32,
}

impl<T: Sdf> Noisy<T> {
	pub fn new(sdf: T, seed: u32) -> Self {
		Self { sdf, noise: Perlin::new(seed), frequency: 0.1, amplitude: 1.0, octaves: 3 }
	}

	pub fn with_frequency(mut self, frequency: f32) -> Self {
		self.frequency = frequency;
		self
	}

	pub fn with_amplitude(mut self, amplitude: f32) -> Self {
		self.amplitude = amplitude;
		self
	}

	pub fn with_octaves(mut self, octaves: u32) -> Self {
		self.octaves = octaves;
		self
	}

	/// Fractal noise at `p`, bounded by `amplitude`.
	pub fn displacement(&self, p: Vec3) -> f32 {
		let mut total = 0.0f64;
		let mut frequency = self.frequency as f64;
		let mut amplitude = 1.0f64;
		let mut norm = 0.0f64;
		for _ in 0..self.octaves.max(1) {
			total += amplitude
				* self.noise.get([p.x as f64 * frequency, p.y as f64 * frequency, p.z as f64 * frequency]);
			norm += amplitude;
			frequency *= 2.0;
			amplitude *= 0.5;
		}
		(total / norm).clamp(-1.0, 1.0) as f32 * self.amplitude
	}
}

impl<T: Sdf + Debug> Debug for Noisy<T> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(
			f,
			"Noisy {{ sdf: {:?}, seed: {}, frequency: {}, amplitude: {}, octaves: {} }}",
			self.sdf,
			self.noise.seed(),
			self.frequency,
			self.amplitude,
			self.octaves
		)
	}
}

impl<T: Sdf> Sdf for Noisy<T> {
	fn distance(&self, p: Vec3) -> f32 {
		self.sdf.distance(p) + self.displacement(p)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::SphereSdf;

	#[test]
	fn test_displacement_is_bounded_and_deterministic() {
		let noisy = Noisy::new(SphereSdf::new(Vec3::ZERO, 5.0), 7).with_amplitude(1.5).with_frequency(0.3);
		let again = Noisy::new(SphereSdf::new(Vec3::ZERO, 5.0), 7).with_amplitude(1.5).with_frequency(0.3);
		for i in 0..50 {
			let p = Vec3::new(i as f32 * 0.37, 5.0 - i as f32 * 0.11, 1.3);
			let d = noisy.displacement(p);
			assert!(d.abs() <= 1.5);
			assert_eq!(d, again.displacement(p));
		}
	}
}
