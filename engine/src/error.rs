use grid::{Extents, GridError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
	#[error(transparent)]
	Grid(#[from] GridError),
	#[error("{field} extents {actual:?} do not match the level set extents {expected:?}")]
	ExtentsMismatch { field: &'static str, expected: Extents, actual: Extents },
	#[error("band half width must be at least 1, got {0}")]
	BandTooNarrow(f32),
	#[error("max step must be positive and finite, got {0}")]
	InvalidStep(f32),
	#[error("per-label weights require a multi-phase level set")]
	NotMultiPhase,
}

pub type Result<T> = std::result::Result<T, EngineError>;
