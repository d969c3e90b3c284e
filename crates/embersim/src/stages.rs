//! Stage scenarios and lockable metrics.
//!
//! These scenarios are intentionally deterministic: fixed seeds, sequential
//! execution, explicit toggles per stage. Tests and the headless demos share
//! these functions to lock behavior over time.

use crate::field::FieldGenerator;
use crate::heat::{HeatNoise, HeatSource};
use crate::settings::{Bounds, Integration, SettingsError, SimSettings};
use crate::sim::EmberSimulation;
use glam::Vec3;

pub const STAGE_DT: f32 = 1.0 / 60.0;

pub type StageBuild = fn() -> Result<EmberSimulation, SettingsError>;
pub type StageStep = fn(&mut EmberSimulation, usize);

#[derive(Clone, Copy)]
pub struct StageSpec {
    pub name: &'static str,
    pub steps: usize,
    pub build: StageBuild,
    pub per_frame: StageStep,
}

#[derive(Clone, Copy, Debug)]
pub struct RunConfig {
    pub steps: usize,
    pub dt: f32,
    pub metrics_sample_rate: usize,
}

impl RunConfig {
    pub fn new(steps: usize) -> Self {
        Self {
            steps,
            dt: STAGE_DT,
            metrics_sample_rate: 15,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct StageSummary {
    pub frames: usize,
    pub peak_avg_temperature: f32,
    pub peak_max_speed: f32,
    pub final_avg_temperature: f32,
    pub final_max_temperature: f32,
    pub final_avg_speed: f32,
    pub final_pair_count: usize,
    pub escaped_count: usize,
}

/// Drive a stage for `run.steps` fixed timesteps, sampling peak metrics at
/// the configured rate.
pub fn run_stage(stage: &StageSpec, run: RunConfig) -> Result<StageSummary, SettingsError> {
    let mut sim = (stage.build)()?;
    let sample_rate = run.metrics_sample_rate.max(1);

    let mut summary = StageSummary {
        frames: run.steps,
        ..Default::default()
    };

    for frame in 0..run.steps {
        (stage.per_frame)(&mut sim, frame);
        sim.step(run.dt);

        if frame % sample_rate == 0 {
            let s = sim.summary();
            summary.peak_avg_temperature = summary.peak_avg_temperature.max(s.avg_temperature);
            summary.peak_max_speed = summary.peak_max_speed.max(s.max_speed);
        }
    }

    let s = sim.summary();
    summary.peak_avg_temperature = summary.peak_avg_temperature.max(s.avg_temperature);
    summary.peak_max_speed = summary.peak_max_speed.max(s.max_speed);
    summary.final_avg_temperature = s.avg_temperature;
    summary.final_max_temperature = s.max_temperature;
    summary.final_avg_speed = s.avg_speed;
    summary.final_pair_count = s.last_pair_count;
    summary.escaped_count = s.escaped_count;
    Ok(summary)
}

pub fn stage_by_name(name: &str) -> Option<StageSpec> {
    stage_catalog().into_iter().find(|s| s.name == name)
}

pub fn stage_catalog() -> Vec<StageSpec> {
    vec![
        STAGE_SMOKE_COLUMN,
        STAGE_HOT_FLOOR_SETTLE,
        STAGE_STROKE_GUST,
        STAGE_WALL_FURNACE,
    ]
}

const STAGE_SMOKE_COLUMN: StageSpec = StageSpec {
    name: "smoke_column",
    steps: 300,
    build: build_smoke_column,
    per_frame: step_noop,
};

const STAGE_HOT_FLOOR_SETTLE: StageSpec = StageSpec {
    name: "hot_floor_settle",
    steps: 240,
    build: build_hot_floor_settle,
    per_frame: step_noop,
};

const STAGE_STROKE_GUST: StageSpec = StageSpec {
    name: "stroke_gust",
    steps: 240,
    build: build_stroke_gust,
    per_frame: step_stroke_gust,
};

const STAGE_WALL_FURNACE: StageSpec = StageSpec {
    name: "wall_furnace",
    steps: 240,
    build: build_wall_furnace,
    per_frame: step_noop,
};

fn stage_settings() -> SimSettings {
    SimSettings {
        particle_count: 1024,
        initial_spacing: 0.15,
        bounds: Bounds::new(Vec3::ZERO, Vec3::new(8.0, 12.0, 0.0)),
        grid_size: (32, 48),
        parallel: false,
        seed: 7,
        ..Default::default()
    }
}

fn build_smoke_column() -> Result<EmberSimulation, SettingsError> {
    let sim = EmberSimulation::new(
        stage_settings(),
        HeatSource::FloorHeat {
            band_height: 1.5,
            intensity: 3.0,
            noise: Some(HeatNoise::new(7, 0.2, 0.6, 6.0)),
        },
    )?;
    Ok(sim.with_field_generator(FieldGenerator::noise_turbulence(7, 0.08, 0.8, 1.5)))
}

fn build_hot_floor_settle() -> Result<EmberSimulation, SettingsError> {
    let settings = SimSettings {
        temperature_drop_per_second: 0.8,
        buoyancy: 0.6,
        ..stage_settings()
    };
    EmberSimulation::new(
        settings,
        HeatSource::FloorHeat {
            band_height: 1.0,
            intensity: 2.0,
            noise: None,
        },
    )
}

fn build_stroke_gust() -> Result<EmberSimulation, SettingsError> {
    // No heating and no buoyancy: all motion comes from painted gusts.
    let settings = SimSettings {
        buoyancy: 0.0,
        temperature_up_force: 0.0,
        ..stage_settings()
    };
    EmberSimulation::new(settings, HeatSource::None)
}

fn step_stroke_gust(sim: &mut EmberSimulation, frame: usize) {
    // A fresh sideways gust every half second, alternating direction.
    if frame % 30 == 0 {
        let dir = if (frame / 30) % 2 == 0 { 1.0 } else { -1.0 };
        sim.paint_stroke(
            Vec3::new(4.0, 4.0, 0.0),
            Vec3::new(dir, 0.2, 0.0),
            3.0,
            4.0,
        );
    }
}

fn build_wall_furnace() -> Result<EmberSimulation, SettingsError> {
    let settings = SimSettings {
        integration: Integration::Verlet,
        ..stage_settings()
    };
    EmberSimulation::new(
        settings,
        HeatSource::WallHeat {
            range: 1.2,
            intensity: 2.5,
        },
    )
}

fn step_noop(_sim: &mut EmberSimulation, _frame: usize) {}
