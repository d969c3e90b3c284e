//! Dense 2D fire/smoke particle simulation.
//!
//! Thousands of particles carry position, velocity, temperature, and a
//! temperature-derived radius; they are advected by a sampled vector field
//! and buoyancy, and collide and exchange heat with neighbors through a
//! uniform spatial hash grid, with:
//! - Symplectic-Euler or position-Verlet integration
//! - Penetration-based position correction plus velocity impulse
//! - Pairwise conservative heat exchange
//! - Swappable heat-source and field-generator strategies
//!
//! This crate is framework-agnostic: it handles simulation only. Hosts call
//! [`EmberSimulation::step`] once per fixed timestep and read
//! [`EmberSimulation::snapshot`] once per frame for display.

pub mod collision;
pub mod field;
pub mod grid;
pub mod heat;
pub mod integrate;
pub mod particle;
pub mod physics;
pub mod settings;
pub mod sim;
pub mod stages;

pub use collision::{find_collisions, CollisionCandidate};
pub use field::{FieldError, FieldGenerator, VectorField};
pub use grid::{pos_to_cell, SpatialGrid};
pub use heat::{HeatNoise, HeatSource};
pub use particle::{radius_for_temperature, Particle, Particles, RenderParticle};
pub use settings::{Bounds, FieldMode, Integration, SettingsError, SimSettings};
pub use sim::{EmberSimulation, SimSummary};
pub use stages::{run_stage, stage_by_name, stage_catalog, RunConfig, StageSummary};
