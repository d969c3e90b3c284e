//! Environmental force vector field.
//!
//! A 2D grid of force vectors over the same position→cell mapping as the
//! spatial hash grid, at an independently configurable resolution. The core
//! pipeline only samples it; a [`FieldGenerator`] (or external stroke
//! painting) refreshes it once per substep.
//!
//! Snapshots round-trip through JSON: size and every vector are reproduced
//! exactly.

use crate::grid::pos_to_cell;
use crate::physics::{smoothstep, UP};
use crate::settings::{Bounds, SettingsError};
use fastnoise_lite::{FastNoiseLite, NoiseType};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors surfaced while loading or saving field snapshots.
#[derive(Debug, Error)]
pub enum FieldError {
    #[error("failed to read or write field snapshot")]
    Io(#[from] std::io::Error),
    #[error("malformed field snapshot")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Settings(#[from] SettingsError),
}

/// Serde proxy for `glam::Vec3`.
#[derive(Serialize, Deserialize)]
struct Vec3Def {
    x: f32,
    y: f32,
    z: f32,
}

impl From<Vec3> for Vec3Def {
    fn from(v: Vec3) -> Self {
        Self { x: v.x, y: v.y, z: v.z }
    }
}

impl From<Vec3Def> for Vec3 {
    fn from(def: Vec3Def) -> Self {
        Vec3::new(def.x, def.y, def.z)
    }
}

mod vec3_list {
    use super::Vec3Def;
    use glam::Vec3;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(vectors: &[Vec3], s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        s.collect_seq(vectors.iter().copied().map(Vec3Def::from))
    }

    pub fn deserialize<'de, D>(d: D) -> Result<Vec<Vec3>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Vec::<Vec3Def>::deserialize(d).map(|defs| defs.into_iter().map(Vec3::from).collect())
    }
}

/// Row-major grid of force vectors (`index = y * size.0 + x`).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct VectorField {
    size: (usize, usize),
    #[serde(with = "vec3_list")]
    vectors: Vec<Vec3>,
}

impl VectorField {
    /// A zeroed field of the given resolution.
    pub fn new(size: (usize, usize)) -> Result<Self, SettingsError> {
        if size.0 == 0 || size.1 == 0 {
            return Err(SettingsError::ZeroGridDimension);
        }
        Ok(Self {
            size,
            vectors: vec![Vec3::ZERO; size.0 * size.1],
        })
    }

    /// Wrap an existing vector array, rejecting dimension mismatches.
    pub fn from_vectors(size: (usize, usize), vectors: Vec<Vec3>) -> Result<Self, SettingsError> {
        if size.0 == 0 || size.1 == 0 {
            return Err(SettingsError::ZeroGridDimension);
        }
        let expected = size.0 * size.1;
        if vectors.len() != expected {
            return Err(SettingsError::FieldSizeMismatch {
                expected,
                got: vectors.len(),
            });
        }
        Ok(Self { size, vectors })
    }

    #[inline]
    pub fn size(&self) -> (usize, usize) {
        self.size
    }

    #[inline]
    pub fn vectors(&self) -> &[Vec3] {
        &self.vectors
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Vec3 {
        self.vectors[y * self.size.0 + x]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, v: Vec3) {
        self.vectors[y * self.size.0 + x] = v;
    }

    /// Sample the field at a simulation-space position, using the same
    /// hashing as the spatial grid (clamped affine remap, truncation).
    #[inline]
    pub fn sample(&self, position: Vec3, bounds: &Bounds) -> Vec3 {
        let (cx, cy) = pos_to_cell(position, bounds, self.size);
        self.vectors[cy * self.size.0 + cx]
    }

    /// Simulation-space center of a cell.
    fn cell_center(&self, x: usize, y: usize, bounds: &Bounds) -> Vec3 {
        let size = bounds.size();
        Vec3::new(
            bounds.min.x + (x as f32 + 0.5) / self.size.0 as f32 * size.x,
            bounds.min.y + (y as f32 + 0.5) / self.size.1 as f32 * size.y,
            0.0,
        )
    }

    /// Splat a directional stroke into the field: every cell within
    /// `radius` of `center` gains `direction * strength`, faded out
    /// smoothly toward the stroke edge. Used for drawn-gust interaction.
    pub fn apply_stroke(
        &mut self,
        bounds: &Bounds,
        center: Vec3,
        direction: Vec3,
        radius: f32,
        strength: f32,
    ) {
        if radius <= 0.0 {
            return;
        }
        for y in 0..self.size.1 {
            for x in 0..self.size.0 {
                let dist = (self.cell_center(x, y, bounds) - center).length();
                if dist < radius {
                    let falloff = 1.0 - smoothstep(0.0, radius, dist);
                    self.vectors[y * self.size.0 + x] += direction * (strength * falloff);
                }
            }
        }
    }

    pub fn save_json(&self, path: &Path) -> Result<(), FieldError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn load_json(path: &Path) -> Result<Self, FieldError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Parse and re-validate a snapshot. A snapshot whose vector count does
    /// not match its declared size is an error, never a warning.
    pub fn from_json(json: &str) -> Result<Self, FieldError> {
        let field: Self = serde_json::from_str(json)?;
        Self::from_vectors(field.size, field.vectors).map_err(FieldError::from)
    }
}

/// Per-substep field refresh strategies, dispatched through [`Self::update`].
///
/// `Still` leaves the field untouched so externally painted strokes persist;
/// the other variants overwrite every cell each substep.
pub enum FieldGenerator {
    /// No refresh; the field only changes through strokes or `set`.
    Still,
    /// Uniform upward draft of the given strength.
    Updraft { strength: f32 },
    /// Time-scrolled value-noise turbulence. Noise picks a swirl angle per
    /// cell; `amplitude` scales the resulting vector.
    NoiseTurbulence {
        noise: FastNoiseLite,
        amplitude: f32,
        scroll_speed: f32,
    },
}

impl FieldGenerator {
    /// Turbulence generator with its own deterministic noise state.
    pub fn noise_turbulence(seed: i32, frequency: f32, amplitude: f32, scroll_speed: f32) -> Self {
        let mut noise = FastNoiseLite::with_seed(seed);
        noise.set_noise_type(Some(NoiseType::OpenSimplex2));
        noise.set_frequency(Some(frequency));
        Self::NoiseTurbulence {
            noise,
            amplitude,
            scroll_speed,
        }
    }

    /// Refresh `field` for simulation time `time`.
    pub fn update(&self, field: &mut VectorField, bounds: &Bounds, time: f32) {
        match self {
            Self::Still => {}
            Self::Updraft { strength } => {
                let v = UP * *strength;
                let (w, h) = field.size();
                for y in 0..h {
                    for x in 0..w {
                        field.set(x, y, v);
                    }
                }
            }
            Self::NoiseTurbulence {
                noise,
                amplitude,
                scroll_speed,
            } => {
                let (w, h) = field.size();
                for y in 0..h {
                    for x in 0..w {
                        let c = field.cell_center(x, y, bounds);
                        let raw = noise.get_noise_2d(c.x + time * scroll_speed, c.y);
                        let angle = raw * std::f32::consts::PI;
                        field.set(
                            x,
                            y,
                            Vec3::new(angle.cos(), angle.sin(), 0.0) * *amplitude,
                        );
                    }
                }
            }
        }
    }
}
