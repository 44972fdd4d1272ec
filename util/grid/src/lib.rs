pub mod access;
pub mod cell;
pub mod dense;
pub mod error;
pub mod sparse;

pub use access::GridAccess;
pub use cell::{Cell, Extents, AXIS_OFFSETS};
pub use dense::DenseGrid;
pub use error::{GridError, Result};
pub use sparse::SparseGrid;

/// The level-set field: one `f32` per grid point.
pub type ScalarField = DenseGrid<f32>;

/// Region ownership for multi-phase evolution. `0` is the background.
pub type LabelField = DenseGrid<u8>;

/// Label of the unowned background region.
pub const BACKGROUND_LABEL: u8 = 0;

/// Three-way sign where exactly zero is its own class.
///
/// Used wherever a zero value must count as "on the interface" rather than
/// being lumped in with either side.
pub fn sign(value: f32) -> f32 {
	if value > 0.0 {
		1.0
	} else if value < 0.0 {
		-1.0
	} else {
		0.0
	}
}

/// Two-way region test. Zero belongs to the outside, matching the polygonizer's
/// `value < iso` inside convention.
pub fn is_inside(value: f32) -> bool {
	value < 0.0
}
