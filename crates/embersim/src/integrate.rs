//! Particle integration.
//!
//! Per particle, per substep: temperature decay, radius refresh, field
//! sampling, buoyancy, symplectic-Euler or position-Verlet advance, then the
//! boundary bounce. The whole pass is a pure map over the particle index
//! (grid and field are read-only), so it runs either single-threaded or as
//! a rayon fan-out.

use crate::field::VectorField;
use crate::particle::{radius_for_temperature, Particle, Particles};
use crate::physics::{clamp_length, NORMALIZE_EPSILON_SQ, UP};
use crate::settings::{Bounds, FieldMode, Integration, SimSettings};
use glam::Vec3;
use rayon::prelude::*;

/// Bounce a particle off the simulation bounds: on each out-of-bounds axis
/// the velocity component is negated and scaled by `restitution`, and the
/// position is clamped to the boundary. Under Verlet the reflected velocity
/// is written back through `prev_position` so the implicit velocity agrees.
pub fn apply_constraint_bounce(
    p: &mut Particle,
    integration: Integration,
    bounds: &Bounds,
    restitution: f32,
) {
    let out_x = p.position.x < bounds.min.x || p.position.x > bounds.max.x;
    let out_y = p.position.y < bounds.min.y || p.position.y > bounds.max.y;
    if !out_x && !out_y {
        return;
    }

    let mut velocity = match integration {
        Integration::Euler => p.velocity,
        Integration::Verlet => p.implicit_velocity(),
    };
    if out_x {
        velocity.x = -velocity.x * restitution;
    }
    if out_y {
        velocity.y = -velocity.y * restitution;
    }
    p.position = bounds.clamp(p.position);
    match integration {
        Integration::Euler => p.velocity = velocity,
        Integration::Verlet => p.prev_position = p.position - velocity,
    }
}

/// Add an instantaneous velocity change in whichever representation the
/// active scheme uses.
#[inline]
pub fn add_velocity(p: &mut Particle, integration: Integration, dv: Vec3) {
    match integration {
        Integration::Euler => p.velocity += dv,
        // Pulling prev_position back grows the implicit velocity by dv.
        Integration::Verlet => p.prev_position -= dv,
    }
}

#[inline]
fn step_particle(p: &mut Particle, field: &VectorField, settings: &SimSettings, dt: f32) {
    p.temperature = (p.temperature - settings.temperature_drop_per_second * dt)
        .clamp(0.0, settings.max_temperature);
    p.radius = radius_for_temperature(p.temperature, settings);

    let sampled = field.sample(p.position, &settings.bounds);
    let lift = settings.buoyancy + p.temperature * settings.temperature_up_force;
    let accel = match settings.field_mode {
        FieldMode::Gravity => {
            let len_sq = sampled.length_squared();
            let dir = if len_sq > NORMALIZE_EPSILON_SQ {
                sampled / len_sq.sqrt()
            } else {
                UP
            };
            dir * lift
        }
        FieldMode::Additive => UP * lift + sampled,
    };

    match settings.integration {
        Integration::Euler => {
            p.velocity = clamp_length(p.velocity + accel * dt, settings.max_speed);
            p.position += p.velocity * dt;
        }
        Integration::Verlet => {
            let velocity = clamp_length(p.implicit_velocity(), settings.max_speed);
            p.prev_position = p.position;
            p.position += velocity + accel * (dt * dt);
        }
    }

    apply_constraint_bounce(p, settings.integration, &settings.bounds, settings.wall_bounce);
}

/// Advance every particle by `dt`.
pub fn integrate(particles: &mut Particles, field: &VectorField, settings: &SimSettings, dt: f32) {
    if settings.parallel {
        particles
            .list
            .par_iter_mut()
            .for_each(|p| step_particle(p, field, settings, dt));
    } else {
        for p in particles.iter_mut() {
            step_particle(p, field, settings, dt);
        }
    }
}
