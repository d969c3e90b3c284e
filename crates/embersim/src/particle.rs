//! Fire/smoke particles.
//!
//! Each particle carries a continuous position, a velocity representation
//! that depends on the integration scheme (explicit under Euler, implicit
//! `pos - prev_position` under Verlet), a temperature, and a radius derived
//! from that temperature. The pool is allocated once and mutated in place
//! every substep; particles are never individually destroyed.

use crate::physics::lerp;
use crate::settings::SimSettings;
use glam::Vec3;

/// One simulated fire/smoke element.
#[derive(Clone, Copy, Debug)]
pub struct Particle {
    /// Continuous position in simulation space. z stays 0.
    pub position: Vec3,
    /// Previous position; only meaningful under Verlet integration.
    pub prev_position: Vec3,
    /// Explicit velocity; only meaningful under Euler integration.
    pub velocity: Vec3,
    /// Heat carried by the particle, clamped to `[0, max_temperature]`.
    pub temperature: f32,
    /// Radius, always recomputed from temperature. Never set directly
    /// after initialization.
    pub radius: f32,
}

impl Particle {
    pub fn at_rest(position: Vec3, radius: f32) -> Self {
        Self {
            position,
            prev_position: position,
            velocity: Vec3::ZERO,
            temperature: 0.0,
            radius,
        }
    }

    /// Implicit Verlet velocity (displacement over the last substep).
    #[inline]
    pub fn implicit_velocity(&self) -> Vec3 {
        self.position - self.prev_position
    }
}

/// Radius as a function of temperature: linear between the configured size
/// bounds, saturating at `max_temperature`. Non-decreasing in temperature.
#[inline]
pub fn radius_for_temperature(temperature: f32, settings: &SimSettings) -> f32 {
    let t = (temperature / settings.max_temperature).clamp(0.0, 1.0);
    lerp(settings.min_particle_size, settings.max_particle_size, t)
}

/// Read-only per-particle state handed to renderers once per frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderParticle {
    pub position: Vec3,
    pub radius: f32,
    pub temperature: f32,
}

/// The fixed-size particle pool.
pub struct Particles {
    pub list: Vec<Particle>,
}

impl Particles {
    /// Lay out `settings.particle_count` particles on a brick lattice:
    /// row-major with alternate rows shifted by half a spacing, all cold
    /// and at rest.
    pub fn spawn_lattice(settings: &SimSettings) -> Self {
        let bounds = settings.bounds;
        let spacing = settings.initial_spacing.max(f32::EPSILON);
        let per_row = ((bounds.size().x / spacing).floor() as usize).max(1);
        let radius = radius_for_temperature(0.0, settings);

        let mut list = Vec::with_capacity(settings.particle_count);
        for i in 0..settings.particle_count {
            let row = i / per_row;
            let col = i % per_row;
            let brick_offset = if row % 2 == 1 { spacing * 0.5 } else { 0.0 };
            let position = bounds.clamp(Vec3::new(
                bounds.min.x + col as f32 * spacing + brick_offset,
                bounds.min.y + row as f32 * spacing,
                0.0,
            ));
            list.push(Particle::at_rest(position, radius));
        }
        Self { list }
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Particle> {
        self.list.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Particle> {
        self.list.iter_mut()
    }

    /// Fill `out` with the render-facing view of every particle.
    /// Reuses the buffer so per-frame consumption does not allocate.
    pub fn fill_snapshot(&self, out: &mut Vec<RenderParticle>) {
        out.clear();
        out.extend(self.list.iter().map(|p| RenderParticle {
            position: p.position,
            radius: p.radius,
            temperature: p.temperature,
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Bounds;

    fn lattice_settings(count: usize, spacing: f32) -> SimSettings {
        SimSettings {
            particle_count: count,
            initial_spacing: spacing,
            bounds: Bounds::new(Vec3::ZERO, Vec3::new(10.0, 10.0, 0.0)),
            ..Default::default()
        }
    }

    #[test]
    fn test_lattice_count_and_rest_state() {
        let settings = lattice_settings(100, 0.5);
        let particles = Particles::spawn_lattice(&settings);
        assert_eq!(particles.len(), 100);
        for p in particles.iter() {
            assert_eq!(p.velocity, Vec3::ZERO);
            assert_eq!(p.prev_position, p.position);
            assert_eq!(p.temperature, 0.0);
            assert_eq!(p.radius, settings.min_particle_size);
            assert!(settings.bounds.contains(p.position));
        }
    }

    #[test]
    fn test_lattice_brick_offset() {
        let settings = lattice_settings(100, 0.5);
        let particles = Particles::spawn_lattice(&settings);
        let per_row = (10.0f32 / 0.5).floor() as usize;

        // Row 0 starts at min.x, row 1 is shifted by half a spacing.
        assert_eq!(particles.list[0].position.x, 0.0);
        assert_eq!(particles.list[per_row].position.x, 0.25);
        assert_eq!(particles.list[per_row].position.y, 0.5);
    }

    #[test]
    fn test_radius_monotonic_in_temperature() {
        let settings = SimSettings::default();
        let mut prev = f32::NEG_INFINITY;
        for i in 0..=20 {
            let t = settings.max_temperature * i as f32 / 20.0;
            let r = radius_for_temperature(t, &settings);
            assert!(r >= prev, "radius decreased at T={}", t);
            prev = r;
        }
        assert_eq!(
            radius_for_temperature(0.0, &settings),
            settings.min_particle_size
        );
        assert_eq!(
            radius_for_temperature(settings.max_temperature, &settings),
            settings.max_particle_size
        );
        // Saturates above the ceiling
        assert_eq!(
            radius_for_temperature(settings.max_temperature * 3.0, &settings),
            settings.max_particle_size
        );
    }

    #[test]
    fn test_snapshot_matches_pool() {
        let settings = lattice_settings(16, 0.5);
        let particles = Particles::spawn_lattice(&settings);
        let mut snapshot = Vec::new();
        particles.fill_snapshot(&mut snapshot);
        assert_eq!(snapshot.len(), 16);
        for (view, p) in snapshot.iter().zip(particles.iter()) {
            assert_eq!(view.position, p.position);
            assert_eq!(view.radius, p.radius);
            assert_eq!(view.temperature, p.temperature);
        }
    }
}
