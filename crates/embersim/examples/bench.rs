//! Quick benchmark for profiling the particle pipeline
//!
//! Run with: cargo run --release --example bench -p embersim
//! Profile with: cargo flamegraph --example bench -p embersim

use embersim::{
    Bounds, EmberSimulation, FieldGenerator, HeatNoise, HeatSource, SimSettings,
};
use glam::Vec3;
use std::time::Instant;

const FRAMES: usize = 300; // 5 seconds at 60 FPS
const DT: f32 = 1.0 / 60.0;

fn bench_settings(particle_count: usize, parallel: bool) -> SimSettings {
    SimSettings {
        particle_count,
        initial_spacing: 0.1,
        bounds: Bounds::new(Vec3::ZERO, Vec3::new(12.0, 16.0, 0.0)),
        grid_size: (48, 64),
        parallel,
        ..Default::default()
    }
}

fn run_case(particle_count: usize, parallel: bool) {
    let mut sim = EmberSimulation::new(
        bench_settings(particle_count, parallel),
        HeatSource::FloorHeat {
            band_height: 2.0,
            intensity: 3.0,
            noise: Some(HeatNoise::new(3, 0.15, 0.5, 5.0)),
        },
    )
    .expect("bench settings are valid")
    .with_field_generator(FieldGenerator::noise_turbulence(3, 0.06, 1.0, 1.0));

    // Warm up
    for _ in 0..30 {
        sim.step(DT);
    }

    let start = Instant::now();
    for _ in 0..FRAMES {
        sim.step(DT);
    }
    let elapsed = start.elapsed();

    let avg_frame_time = elapsed.as_secs_f64() / FRAMES as f64;
    let fps = 1.0 / avg_frame_time;
    let summary = sim.summary();

    println!(
        "{:>6} particles ({}): {:.2}ms/frame, {:.1} FPS, {} pairs last substep",
        particle_count,
        if parallel { "parallel" } else { "sequential" },
        avg_frame_time * 1000.0,
        fps,
        summary.last_pair_count
    );
}

fn main() {
    println!("Running {} frames per case at dt={:.4}", FRAMES, DT);
    for &count in &[1024usize, 4096, 16384] {
        run_case(count, false);
        run_case(count, true);
    }
}
