//! Fast-marching redistancing of signed scalar fields.
//!
//! Given a field whose sign is trustworthy but whose magnitude is not a true
//! distance, [`Redistancer::redistance`] rewrites it as a signed distance out
//! to a maximum radius. Cells beyond the radius hold `±max_radius`.

pub mod heap;
pub mod quadratic;
pub mod redistance;

pub use heap::{HeapEntry, MarchQueue};
pub use quadratic::solve_upwind;
pub use redistance::{interface_distance, interface_distance_with, MarchTag, RedistanceStats, Redistancer};
