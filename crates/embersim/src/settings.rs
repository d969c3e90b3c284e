//! Simulation configuration.
//!
//! All tuning knobs live in [`SimSettings`], supplied once at construction
//! and read-only for the run. Malformed configurations are rejected up front
//! with a [`SettingsError`] instead of being logged and limped past.

use glam::Vec3;
use thiserror::Error;

/// Integration scheme for particle advection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Integration {
    /// Symplectic Euler: explicit velocity, `v += a*dt; pos += v*dt`.
    #[default]
    Euler,
    /// Position Verlet: implicit velocity stored as `pos - prev_position`.
    Verlet,
}

/// How the sampled vector field combines with buoyancy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum FieldMode {
    /// The field replaces gravity: acceleration points along the normalized
    /// field vector with the buoyancy scalar as magnitude.
    Gravity,
    /// The field adds turbulence on top of the fixed up-axis buoyancy.
    #[default]
    Additive,
}

/// Axis-aligned simulation bounds. The domain is 2D; `min.z == max.z == 0`
/// in practice, but the type carries z so positions stay plain `Vec3`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl Bounds {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Extent along each axis.
    #[inline]
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Clamp a position to the nearest point inside the bounds.
    #[inline]
    pub fn clamp(&self, p: Vec3) -> Vec3 {
        p.clamp(self.min, self.max)
    }

    #[inline]
    pub fn contains(&self, p: Vec3) -> bool {
        p.x >= self.min.x
            && p.x <= self.max.x
            && p.y >= self.min.y
            && p.y <= self.max.y
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self {
            min: Vec3::new(-5.0, 0.0, 0.0),
            max: Vec3::new(5.0, 10.0, 0.0),
        }
    }
}

/// Fatal configuration errors, detected at setup.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("particle count must be non-zero")]
    ZeroParticleCount,
    #[error("particle count {0} exceeds the 16-bit index space")]
    TooManyParticles(usize),
    #[error("substep count must be non-zero")]
    ZeroSubsteps,
    #[error("bounds are inverted or empty on the x or y axis")]
    InvertedBounds,
    #[error("grid dimensions must be non-zero on both axes")]
    ZeroGridDimension,
    #[error("min particle size exceeds max particle size")]
    InvertedParticleSize,
    #[error("max temperature must be positive")]
    NonPositiveMaxTemperature,
    #[error("vector field expects {expected} vectors, got {got}")]
    FieldSizeMismatch { expected: usize, got: usize },
}

/// Full simulation configuration. Immutable once a simulation is built.
#[derive(Clone, Debug)]
pub struct SimSettings {
    /// Number of particles in the fixed pool.
    pub particle_count: usize,
    /// Lattice spacing used for the initial brick layout.
    pub initial_spacing: f32,
    /// Substeps per fixed timestep.
    pub substeps: u32,
    /// Integration scheme.
    pub integration: Integration,
    /// Simulation-space bounds.
    pub bounds: Bounds,
    /// Spatial hash grid resolution (x, y).
    pub grid_size: (usize, usize),
    /// Fraction of the half-penetration applied as position correction
    /// per collision pass.
    pub collision_step_ratio: f32,
    /// Scale applied to the separation delta when correcting velocities.
    pub collision_velocity_response: f32,
    /// Speed clamp, units/s. Under Verlet this bounds the per-substep
    /// implicit displacement instead.
    pub max_speed: f32,
    /// Restitution applied when bouncing off the bounds, in [0, 1].
    pub wall_bounce: f32,
    /// Base buoyancy acceleration along the up axis.
    pub buoyancy: f32,
    /// Linear temperature decay per second.
    pub temperature_drop_per_second: f32,
    /// Extra upward acceleration per unit of temperature.
    pub temperature_up_force: f32,
    /// Temperature ceiling; also the denominator of the radius mapping.
    pub max_temperature: f32,
    /// Fraction of the temperature difference exchanged per colliding pair
    /// per fixed timestep. Divided by `substeps` internally so the total
    /// transfer does not depend on the substep count.
    pub heat_transfer_percent: f32,
    /// Particle radius at temperature 0.
    pub min_particle_size: f32,
    /// Particle radius at `max_temperature`.
    pub max_particle_size: f32,
    /// How the vector field combines with buoyancy.
    pub field_mode: FieldMode,
    /// Soft cap on collision pairs gathered per substep. Checked
    /// opportunistically; parallel detection may overshoot it.
    pub max_collision_pairs: usize,
    /// RNG seed. Identical seeds and settings reproduce a sequential run
    /// bit for bit.
    pub seed: u64,
    /// Run integration and detection across the rayon pool instead of
    /// single-threaded.
    pub parallel: bool,
}

impl Default for SimSettings {
    fn default() -> Self {
        Self {
            particle_count: 4096,
            initial_spacing: 0.12,
            substeps: 4,
            integration: Integration::Euler,
            bounds: Bounds::default(),
            grid_size: (32, 32),
            collision_step_ratio: 0.8,
            collision_velocity_response: 2.0,
            max_speed: 12.0,
            wall_bounce: 0.4,
            buoyancy: 1.5,
            temperature_drop_per_second: 0.35,
            temperature_up_force: 3.0,
            max_temperature: 1.0,
            heat_transfer_percent: 0.5,
            min_particle_size: 0.04,
            max_particle_size: 0.11,
            field_mode: FieldMode::Additive,
            max_collision_pairs: 1 << 17,
            seed: 42,
            parallel: true,
        }
    }
}

impl SimSettings {
    /// Reject malformed configurations before any allocation happens.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.particle_count == 0 {
            return Err(SettingsError::ZeroParticleCount);
        }
        if self.particle_count > u16::MAX as usize {
            return Err(SettingsError::TooManyParticles(self.particle_count));
        }
        if self.substeps == 0 {
            return Err(SettingsError::ZeroSubsteps);
        }
        if self.bounds.min.x >= self.bounds.max.x || self.bounds.min.y >= self.bounds.max.y {
            return Err(SettingsError::InvertedBounds);
        }
        if self.grid_size.0 == 0 || self.grid_size.1 == 0 {
            return Err(SettingsError::ZeroGridDimension);
        }
        if self.min_particle_size > self.max_particle_size {
            return Err(SettingsError::InvertedParticleSize);
        }
        if self.max_temperature <= 0.0 {
            return Err(SettingsError::NonPositiveMaxTemperature);
        }
        Ok(())
    }

    /// Per-collision heat blend factor, normalized by substep count.
    #[inline]
    pub fn heat_blend_per_substep(&self) -> f32 {
        (self.heat_transfer_percent / self.substeps as f32).clamp(0.0, 1.0)
    }
}
