use crate::cell::Extents;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GridError {
	#[error("Grid extents must be non-zero on every axis, got {0:?}")]
	EmptyExtents(Extents),

	#[error("Expected {expected} values for the grid, got {actual}")]
	LengthMismatch { expected: usize, actual: usize },

	#[error("Grid extents mismatch: expected {expected:?}, got {actual:?}")]
	ExtentsMismatch { expected: Extents, actual: Extents },
}

pub type Result<T> = std::result::Result<T, GridError>;
