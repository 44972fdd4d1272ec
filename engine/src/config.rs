use crate::error::{EngineError, Result};
use polygonize::PolygonizerConfig;
use serde::{Deserialize, Serialize};

/// Extent of the narrow band around the interface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BandConfig {
	/// Cells with `|value| <= half_width` are active.
	pub half_width: f32,
	/// Ring passes run after each update.
	pub max_layers: usize,
}

impl Default for BandConfig {
	fn default() -> Self {
		Self { half_width: 3.0, max_layers: 2 }
	}
}

impl BandConfig {
	/// Magnitude stored in every cell outside the band.
	pub fn far_value(&self) -> f32 {
		self.half_width + 0.5
	}
}

/// Weights of the three speed terms.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForceWeights {
	pub curvature: f32,
	pub advection: f32,
	pub pressure: f32,
	/// Pressure at which the balloon term vanishes.
	pub target_pressure: f32,
}

impl Default for ForceWeights {
	fn default() -> Self {
		Self { curvature: 1.0, advection: 0.0, pressure: 0.0, target_pressure: 0.0 }
	}
}

impl ForceWeights {
	pub fn curvature_only(curvature: f32) -> Self {
		Self { curvature, ..Self::none() }
	}

	pub fn none() -> Self {
		Self { curvature: 0.0, advection: 0.0, pressure: 0.0, target_pressure: 0.0 }
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StepConfig {
	/// Upper bound on the time step, in grid units of time.
	pub max_step: f32,
	/// Clamp each speed to `[-1, 1]` and always take `max_step`.
	pub clamp_speed: bool,
	/// Full fast-marching reinitialization every this many frames, 0 for never.
	pub reinitialize_every: u64,
}

impl Default for StepConfig {
	fn default() -> Self {
		Self { max_step: 0.5, clamp_speed: false, reinitialize_every: 0 }
	}
}

/// Everything a level set needs to evolve and mesh itself.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EvolutionConfig {
	pub band: BandConfig,
	pub weights: ForceWeights,
	pub step: StepConfig,
	pub polygonizer: PolygonizerConfig,
}

impl EvolutionConfig {
	/// Rejects settings the integrator cannot run with.
	pub fn validate(&self) -> Result<()> {
		if self.band.half_width.is_nan() || self.band.half_width < 1.0 {
			return Err(EngineError::BandTooNarrow(self.band.half_width));
		}
		validate_step(self.step.max_step)
	}
}

pub(crate) fn validate_step(max_step: f32) -> Result<()> {
	if !max_step.is_finite() || max_step <= 0.0 {
		return Err(EngineError::InvalidStep(max_step));
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_default_config_is_valid() -> Result<()> {
		EvolutionConfig::default().validate()
	}

	#[test]
	fn test_rejects_bad_settings() {
		let mut config = EvolutionConfig::default();
		config.band.half_width = 0.5;
		assert!(matches!(config.validate(), Err(EngineError::BandTooNarrow(_))));

		let mut config = EvolutionConfig::default();
		config.step.max_step = f32::NAN;
		assert!(matches!(config.validate(), Err(EngineError::InvalidStep(_))));
	}

	#[test]
	fn test_far_value_is_outside_band() {
		let band = BandConfig { half_width: 2.0, max_layers: 1 };
		assert_eq!(band.far_value(), 2.5);
	}
}
