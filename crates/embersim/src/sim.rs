//! Simulation driver.
//!
//! [`EmberSimulation`] owns the particle pool, the spatial grid, the vector
//! field, the collision scratch buffer, and the RNG for the whole run, and
//! sequences the substep pipeline: heat → field refresh → integrate →
//! rebuild grid → find pairs → resolve → exchange heat. Collaborators
//! (heat source, field generator) are injected at construction; there is no
//! ambient global state.

use crate::collision::{find_collisions, resolve_collisions, transfer_heat, CollisionCandidate};
use crate::field::{FieldGenerator, VectorField};
use crate::grid::SpatialGrid;
use crate::heat::HeatSource;
use crate::integrate::integrate;
use crate::particle::{Particle, Particles, RenderParticle};
use crate::settings::{Integration, SettingsError, SimSettings};
use glam::Vec3;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Aggregate diagnostics over the current particle state. Shared by tests
/// and the headless demos.
#[derive(Clone, Debug, Default)]
pub struct SimSummary {
    pub particle_count: usize,
    pub avg_temperature: f32,
    pub max_temperature: f32,
    /// Mean particle speed: units/s under Euler, displacement per substep
    /// under Verlet.
    pub avg_speed: f32,
    pub max_speed: f32,
    /// Collision pairs found in the most recent substep.
    pub last_pair_count: usize,
    /// Particles outside the bounds. Zero after any completed substep.
    pub escaped_count: usize,
}

pub struct EmberSimulation {
    pub settings: SimSettings,
    pub particles: Particles,
    pub grid: SpatialGrid,
    pub field: VectorField,
    pub field_generator: FieldGenerator,
    pub heat_source: HeatSource,
    collisions: Vec<CollisionCandidate>,
    rng: ChaCha8Rng,
    time: f32,
    origin: Vec3,
}

impl EmberSimulation {
    /// Build a simulation from validated settings. The pool is laid out on
    /// the brick lattice, cold and at rest; the field starts zeroed at the
    /// grid resolution (swap it with [`Self::set_field`] for an independent
    /// resolution).
    pub fn new(settings: SimSettings, heat_source: HeatSource) -> Result<Self, SettingsError> {
        settings.validate()?;
        let particles = Particles::spawn_lattice(&settings);
        let grid = SpatialGrid::new(settings.grid_size);
        let field = VectorField::new(settings.grid_size)?;
        tracing::info!(
            particles = settings.particle_count,
            grid_w = settings.grid_size.0,
            grid_h = settings.grid_size.1,
            substeps = settings.substeps,
            "ember simulation ready"
        );
        Ok(Self {
            rng: ChaCha8Rng::seed_from_u64(settings.seed),
            particles,
            grid,
            field,
            field_generator: FieldGenerator::Still,
            heat_source,
            collisions: Vec::new(),
            time: 0.0,
            origin: Vec3::ZERO,
            settings,
        })
    }

    pub fn with_field_generator(mut self, generator: FieldGenerator) -> Self {
        self.field_generator = generator;
        self
    }

    /// Replace the vector field, e.g. with one restored from a snapshot or
    /// at a different resolution. The field validates its own dimensions.
    pub fn set_field(&mut self, field: VectorField) {
        self.field = field;
    }

    /// World-space offset of the effect, forwarded to the heat source so
    /// noise flicker stays stable in effect-local space.
    pub fn set_origin(&mut self, origin: Vec3) {
        self.origin = origin;
    }

    #[inline]
    pub fn time(&self) -> f32 {
        self.time
    }

    /// Run one fixed timestep: `substeps` equal substeps, advancing the
    /// internal clock.
    pub fn step(&mut self, dt: f32) {
        let sub_dt = dt / self.settings.substeps as f32;
        for _ in 0..self.settings.substeps {
            let time = self.time;
            let origin = self.origin;
            self.tick(time, sub_dt, origin);
            self.time += sub_dt;
        }
    }

    /// One substep of the pipeline. Exposed for hosts that drive their own
    /// clock and heating schedule.
    pub fn tick(&mut self, sim_time: f32, dt: f32, origin: Vec3) {
        self.heat_source
            .apply(sim_time, dt, origin, &mut self.particles, &self.settings);
        self.field_generator
            .update(&mut self.field, &self.settings.bounds, sim_time);
        integrate(&mut self.particles, &self.field, &self.settings, dt);
        self.grid.rebuild(&self.particles, &self.settings.bounds);
        find_collisions(&self.particles, &self.grid, &self.settings, &mut self.collisions);
        resolve_collisions(&mut self.particles, &self.collisions, &self.settings, &mut self.rng);
        transfer_heat(&mut self.particles, &self.collisions, &self.settings);
    }

    /// Paint a directional gust into the vector field. Pair with the
    /// `Still` generator so painted strokes persist across substeps.
    pub fn paint_stroke(&mut self, center: Vec3, direction: Vec3, radius: f32, strength: f32) {
        self.field
            .apply_stroke(&self.settings.bounds, center, direction, radius, strength);
    }

    /// Fill `out` with the render-facing particle view (latest completed
    /// substep). Intended to be called once per frame, not per substep.
    pub fn snapshot(&self, out: &mut Vec<RenderParticle>) {
        self.particles.fill_snapshot(out);
    }

    fn speed_of(&self, p: &Particle) -> f32 {
        match self.settings.integration {
            Integration::Euler => p.velocity.length(),
            Integration::Verlet => p.implicit_velocity().length(),
        }
    }

    pub fn summary(&self) -> SimSummary {
        let n = self.particles.len();
        let mut summary = SimSummary {
            particle_count: n,
            last_pair_count: self.collisions.len(),
            ..Default::default()
        };
        if n == 0 {
            return summary;
        }
        let mut temp_sum = 0.0f32;
        let mut speed_sum = 0.0f32;
        for p in self.particles.iter() {
            let speed = self.speed_of(p);
            temp_sum += p.temperature;
            speed_sum += speed;
            summary.max_temperature = summary.max_temperature.max(p.temperature);
            summary.max_speed = summary.max_speed.max(speed);
            if !self.settings.bounds.contains(p.position) {
                summary.escaped_count += 1;
            }
        }
        summary.avg_temperature = temp_sum / n as f32;
        summary.avg_speed = speed_sum / n as f32;
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Bounds;

    fn small_settings() -> SimSettings {
        SimSettings {
            particle_count: 256,
            initial_spacing: 0.3,
            bounds: Bounds::new(Vec3::ZERO, Vec3::new(8.0, 8.0, 0.0)),
            grid_size: (16, 16),
            parallel: false,
            ..Default::default()
        }
    }

    #[test]
    fn test_construction_rejects_bad_settings() {
        let settings = SimSettings {
            particle_count: 0,
            ..small_settings()
        };
        assert!(EmberSimulation::new(settings, HeatSource::None).is_err());
    }

    #[test]
    fn test_particles_stay_in_bounds() {
        let mut sim = EmberSimulation::new(
            SimSettings {
                buoyancy: 4.0,
                ..small_settings()
            },
            HeatSource::FloorHeat {
                band_height: 1.0,
                intensity: 4.0,
                noise: None,
            },
        )
        .unwrap();

        for _ in 0..60 {
            sim.step(1.0 / 60.0);
        }
        assert_eq!(sim.summary().escaped_count, 0);
    }

    #[test]
    fn test_clock_advances_by_substeps() {
        let mut sim = EmberSimulation::new(small_settings(), HeatSource::None).unwrap();
        sim.step(1.0 / 60.0);
        assert!((sim.time() - 1.0 / 60.0).abs() < 1e-6);
    }

    #[test]
    fn test_floor_heat_raises_average_temperature() {
        let mut sim = EmberSimulation::new(
            small_settings(),
            HeatSource::FloorHeat {
                band_height: 2.0,
                intensity: 5.0,
                noise: None,
            },
        )
        .unwrap();
        assert_eq!(sim.summary().avg_temperature, 0.0);
        for _ in 0..30 {
            sim.step(1.0 / 60.0);
        }
        let summary = sim.summary();
        assert!(summary.avg_temperature > 0.0);
        assert!(summary.max_temperature <= sim.settings.max_temperature + 1e-6);
    }

    #[test]
    fn test_snapshot_has_latest_state() {
        let mut sim = EmberSimulation::new(small_settings(), HeatSource::None).unwrap();
        sim.step(1.0 / 60.0);
        let mut out = Vec::new();
        sim.snapshot(&mut out);
        assert_eq!(out.len(), sim.particles.len());
        for (view, p) in out.iter().zip(sim.particles.iter()) {
            assert_eq!(view.position, p.position);
        }
    }
}
