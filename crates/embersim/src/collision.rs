//! Collision broad+narrow phase, pair resolution, and heat exchange.
//!
//! Detection scans each particle's 3×3 hash-cell neighborhood and emits each
//! unordered pair exactly once (`a < b`). It runs either as a single
//! sequential pass or as a rayon fan-out with per-thread buffers merged at
//! the end; scans only read the grid and the pool, so no locking is needed.
//!
//! Resolution and heat exchange stay single-threaded: pairs share particles,
//! and serializing the pass is simpler than coloring the pair graph.

use crate::grid::{pos_to_cell, SpatialGrid};
use crate::integrate::{add_velocity, apply_constraint_bounce};
use crate::particle::{radius_for_temperature, Particles};
use crate::physics::{lerp, DEGENERATE_DIST_SQ, DEGENERATE_SEPARATION};
use crate::settings::SimSettings;
use glam::Vec3;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A detected overlapping pair, `a < b`. Indices are 16-bit; the pool size
/// is validated against that at setup.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CollisionCandidate {
    pub a: u16,
    pub b: u16,
    pub dist_sq: f32,
}

/// Gather the pairs for one particle's 3×3 neighborhood into `out`.
#[inline]
fn scan_particle(
    i: usize,
    particles: &Particles,
    grid: &SpatialGrid,
    settings: &SimSettings,
    out: &mut Vec<CollisionCandidate>,
) {
    let p = &particles.list[i];
    let (cx, cy) = pos_to_cell(p.position, &settings.bounds, (grid.width, grid.height));

    for dy in -1i32..=1 {
        for dx in -1i32..=1 {
            let nx = cx as i32 + dx;
            let ny = cy as i32 + dy;
            if nx < 0 || nx >= grid.width as i32 || ny < 0 || ny >= grid.height as i32 {
                continue;
            }
            for &j in grid.cell(nx as usize, ny as usize) {
                let j = j as usize;
                if j <= i {
                    continue;
                }
                let other = &particles.list[j];
                let dist_sq = (p.position - other.position).length_squared();
                let combined = p.radius + other.radius;
                if dist_sq < combined * combined {
                    out.push(CollisionCandidate {
                        a: i as u16,
                        b: j as u16,
                        dist_sq,
                    });
                }
            }
        }
    }
}

/// Find all overlapping pairs. Clears and refills `out`.
///
/// `max_collision_pairs` is a soft budget: the check happens once per
/// particle scan (and without synchronization under rayon), so the final
/// count may overshoot it. It exists to bound pathological clumping, not as
/// an exact limit.
pub fn find_collisions(
    particles: &Particles,
    grid: &SpatialGrid,
    settings: &SimSettings,
    out: &mut Vec<CollisionCandidate>,
) {
    out.clear();
    let n = particles.len();

    if settings.parallel {
        let budget = AtomicUsize::new(0);
        let merged = (0..n)
            .into_par_iter()
            .fold(Vec::new, |mut acc, i| {
                if budget.load(Ordering::Relaxed) >= settings.max_collision_pairs {
                    return acc;
                }
                let before = acc.len();
                scan_particle(i, particles, grid, settings, &mut acc);
                let emitted = acc.len() - before;
                if emitted > 0 {
                    budget.fetch_add(emitted, Ordering::Relaxed);
                }
                acc
            })
            .reduce(Vec::new, |mut a, mut b| {
                a.append(&mut b);
                a
            });
        *out = merged;
    } else {
        for i in 0..n {
            if out.len() >= settings.max_collision_pairs {
                break;
            }
            scan_particle(i, particles, grid, settings, out);
        }
    }

    if out.len() > settings.max_collision_pairs {
        tracing::debug!(
            pairs = out.len(),
            budget = settings.max_collision_pairs,
            "collision pair budget overshot"
        );
    }
}

/// Resolve every candidate pair: position correction plus velocity impulse,
/// both derived from the separation direction at detection time, then a
/// boundary re-bounce for both particles.
///
/// Directions are computed from a snapshot of the pre-pass positions, so
/// the outcome does not depend on pair order (beyond float summation).
pub fn resolve_collisions(
    particles: &mut Particles,
    candidates: &[CollisionCandidate],
    settings: &SimSettings,
    rng: &mut ChaCha8Rng,
) {
    let positions: Vec<Vec3> = particles.list.iter().map(|p| p.position).collect();

    for c in candidates {
        let i = c.a as usize;
        let j = c.b as usize;
        let combined = particles.list[i].radius + particles.list[j].radius;

        let (dir, dist) = if c.dist_sq < DEGENERATE_DIST_SQ {
            // Coincident centers: separate along a random direction.
            let angle = rng.gen::<f32>() * std::f32::consts::TAU;
            (
                Vec3::new(angle.cos(), angle.sin(), 0.0),
                DEGENERATE_SEPARATION * combined,
            )
        } else {
            let dist = c.dist_sq.sqrt();
            ((positions[i] - positions[j]) / dist, dist)
        };

        let penetration = combined - dist;
        let delta = dir * (0.5 * penetration);
        let position_step = delta * settings.collision_step_ratio;
        let velocity_step = delta * settings.collision_velocity_response;

        {
            let p = &mut particles.list[i];
            p.position += position_step;
            add_velocity(p, settings.integration, velocity_step);
            apply_constraint_bounce(p, settings.integration, &settings.bounds, settings.wall_bounce);
        }
        {
            let p = &mut particles.list[j];
            p.position -= position_step;
            add_velocity(p, settings.integration, -velocity_step);
            apply_constraint_bounce(p, settings.integration, &settings.bounds, settings.wall_bounce);
        }
    }
}

/// Exchange heat across every colliding pair: both temperatures blend
/// toward each other by the per-substep fraction, reading each other's
/// pre-update values so the pair's total heat is conserved. Radii are
/// refreshed in the same pass to keep them a pure function of temperature.
pub fn transfer_heat(particles: &mut Particles, candidates: &[CollisionCandidate], settings: &SimSettings) {
    let t = settings.heat_blend_per_substep();
    if t <= 0.0 {
        return;
    }
    for c in candidates {
        let i = c.a as usize;
        let j = c.b as usize;
        let ti = particles.list[i].temperature;
        let tj = particles.list[j].temperature;
        particles.list[i].temperature = lerp(ti, tj, t);
        particles.list[j].temperature = lerp(tj, ti, t);
        particles.list[i].radius = radius_for_temperature(particles.list[i].temperature, settings);
        particles.list[j].radius = radius_for_temperature(particles.list[j].temperature, settings);
    }
}
