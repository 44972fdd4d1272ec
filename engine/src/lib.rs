//! Narrow-band level-set evolution.
//!
//! A [`LevelSet`] keeps a signed (or labeled, multi-phase) distance field
//! accurate only within a band around its zero crossing and moves that
//! crossing under curvature, advection and pressure speeds. [`Simulation`]
//! drives it frame by frame and publishes a mesh per frame.

pub mod band;
pub mod config;
pub mod error;
pub mod forces;
pub mod integrator;
pub mod level_set;
pub mod simulation;

pub use band::{ActiveList, BandManager, Regions};
pub use config::{BandConfig, EvolutionConfig, ForceWeights, StepConfig};
pub use error::{EngineError, Result};
pub use forces::{ForceInputs, VectorField};
pub use integrator::{Phase, StepSize};
pub use level_set::{LevelSet, StepReport};
pub use simulation::Simulation;

pub use grid;
pub use polygonize;
pub use render_item;
pub use sdf;
