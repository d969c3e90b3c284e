//! Heat source policies.
//!
//! A closed set of tagged variants dispatched through [`HeatSource::apply`]
//! so heating can run inside tight loops without virtual calls. Policies
//! mutate particle temperatures only; positions are never touched here.

use crate::particle::Particles;
use crate::physics::smoothstep;
use crate::settings::SimSettings;
use fastnoise_lite::{FastNoiseLite, NoiseType};
use glam::Vec3;

/// Noise modulation for a heating band: flicker over space and time.
pub struct HeatNoise {
    noise: FastNoiseLite,
    /// How much of the heating the noise can add or remove, in [0, 1].
    strength: f32,
    /// Scroll rate of the time axis fed to the noise.
    time_scale: f32,
}

impl HeatNoise {
    pub fn new(seed: i32, frequency: f32, strength: f32, time_scale: f32) -> Self {
        let mut noise = FastNoiseLite::with_seed(seed);
        noise.set_noise_type(Some(NoiseType::OpenSimplex2));
        noise.set_frequency(Some(frequency));
        Self {
            noise,
            strength: strength.clamp(0.0, 1.0),
            time_scale,
        }
    }

    #[inline]
    fn modulation(&self, x: f32, time: f32) -> f32 {
        let raw = self.noise.get_noise_2d(x, time * self.time_scale);
        1.0 + raw * self.strength
    }
}

/// Where the heat comes from. Swappable at configuration time; the driver
/// invokes the active policy once per substep before integration.
pub enum HeatSource {
    /// No built-in heating; the caller heats particles on its own schedule.
    None,
    /// "Floor is lava": a smoothstep band above the lower bound, optionally
    /// flickered by noise.
    FloorHeat {
        /// Height of the heated band above `bounds.min.y`.
        band_height: f32,
        /// Peak temperature gain per second at the floor itself.
        intensity: f32,
        noise: Option<HeatNoise>,
    },
    /// Hot side walls: heating ramps up within `range` of either x bound.
    WallHeat {
        range: f32,
        intensity: f32,
    },
}

impl HeatSource {
    /// Apply one substep of heating. `origin` shifts the noise-sampling
    /// frame so an effect moving through the world keeps a stable flicker
    /// pattern in its local space.
    pub fn apply(
        &self,
        sim_time: f32,
        dt: f32,
        origin: Vec3,
        particles: &mut Particles,
        settings: &SimSettings,
    ) {
        let bounds = settings.bounds;
        let max_temperature = settings.max_temperature;
        match self {
            Self::None => {}
            Self::FloorHeat {
                band_height,
                intensity,
                noise,
            } => {
                for p in particles.iter_mut() {
                    let height = p.position.y - bounds.min.y;
                    let factor = 1.0 - smoothstep(0.0, *band_height, height);
                    if factor <= 0.0 {
                        continue;
                    }
                    let modulation = match noise {
                        Some(n) => n.modulation(p.position.x + origin.x, sim_time).max(0.0),
                        None => 1.0,
                    };
                    p.temperature = (p.temperature + intensity * factor * modulation * dt)
                        .clamp(0.0, max_temperature);
                }
            }
            Self::WallHeat { range, intensity } => {
                for p in particles.iter_mut() {
                    let wall_dist = (p.position.x - bounds.min.x).min(bounds.max.x - p.position.x);
                    let factor = 1.0 - smoothstep(0.0, *range, wall_dist);
                    if factor <= 0.0 {
                        continue;
                    }
                    p.temperature =
                        (p.temperature + intensity * factor * dt).clamp(0.0, max_temperature);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particle::Particle;
    use crate::settings::Bounds;

    fn test_settings() -> SimSettings {
        SimSettings {
            bounds: Bounds::new(Vec3::ZERO, Vec3::new(10.0, 10.0, 0.0)),
            max_temperature: 1.0,
            ..Default::default()
        }
    }

    fn pool_at(positions: &[Vec3]) -> Particles {
        Particles {
            list: positions
                .iter()
                .map(|&p| Particle::at_rest(p, 0.05))
                .collect(),
        }
    }

    #[test]
    fn test_none_leaves_temperatures_alone() {
        let settings = test_settings();
        let mut particles = pool_at(&[Vec3::new(5.0, 0.1, 0.0)]);
        HeatSource::None.apply(0.0, 0.1, Vec3::ZERO, &mut particles, &settings);
        assert_eq!(particles.list[0].temperature, 0.0);
    }

    #[test]
    fn test_floor_heat_decays_with_height() {
        let settings = test_settings();
        let mut particles = pool_at(&[
            Vec3::new(5.0, 0.0, 0.0),
            Vec3::new(5.0, 1.0, 0.0),
            Vec3::new(5.0, 9.0, 0.0),
        ]);
        let source = HeatSource::FloorHeat {
            band_height: 2.0,
            intensity: 3.0,
            noise: None,
        };
        source.apply(0.0, 0.1, Vec3::ZERO, &mut particles, &settings);

        let floor = particles.list[0].temperature;
        let mid = particles.list[1].temperature;
        let high = particles.list[2].temperature;
        assert!(floor > mid, "floor {} should exceed mid {}", floor, mid);
        assert!(mid > 0.0);
        assert_eq!(high, 0.0, "particles above the band stay cold");
        assert!((floor - 0.3).abs() < 1e-6, "full-band gain is intensity*dt");
    }

    #[test]
    fn test_floor_heat_clamps_at_ceiling() {
        let settings = test_settings();
        let mut particles = pool_at(&[Vec3::new(5.0, 0.0, 0.0)]);
        let source = HeatSource::FloorHeat {
            band_height: 2.0,
            intensity: 100.0,
            noise: None,
        };
        source.apply(0.0, 1.0, Vec3::ZERO, &mut particles, &settings);
        assert_eq!(particles.list[0].temperature, settings.max_temperature);
    }

    #[test]
    fn test_wall_heat_symmetric() {
        let settings = test_settings();
        let mut particles = pool_at(&[
            Vec3::new(0.2, 5.0, 0.0),
            Vec3::new(9.8, 5.0, 0.0),
            Vec3::new(5.0, 5.0, 0.0),
        ]);
        let source = HeatSource::WallHeat {
            range: 1.0,
            intensity: 2.0,
        };
        source.apply(0.0, 0.1, Vec3::ZERO, &mut particles, &settings);

        let left = particles.list[0].temperature;
        let right = particles.list[1].temperature;
        let center = particles.list[2].temperature;
        assert!((left - right).abs() < 1e-6, "both walls heat equally");
        assert!(left > 0.0);
        assert_eq!(center, 0.0);
    }

    #[test]
    fn test_noisy_floor_heat_is_deterministic() {
        let settings = test_settings();
        let run = |seed: i32| {
            let mut particles = pool_at(&[Vec3::new(3.0, 0.5, 0.0), Vec3::new(7.0, 0.5, 0.0)]);
            let source = HeatSource::FloorHeat {
                band_height: 2.0,
                intensity: 3.0,
                noise: Some(HeatNoise::new(seed, 0.1, 0.5, 4.0)),
            };
            source.apply(1.5, 0.1, Vec3::ZERO, &mut particles, &settings);
            (particles.list[0].temperature, particles.list[1].temperature)
        };
        assert_eq!(run(9), run(9));
    }
}
