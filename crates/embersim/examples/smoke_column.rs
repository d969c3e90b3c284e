//! Headless smoke-column demo: runs the `smoke_column` stage and prints an
//! ASCII heat map of the particle field every second of simulated time.
//!
//! Run with: cargo run --release --example smoke_column -p embersim

use embersim::{stage_by_name, stages::STAGE_DT, RenderParticle};

const COLS: usize = 40;
const ROWS: usize = 20;
const RAMP: &[u8] = b" .:-=+*#%@";

fn draw(snapshot: &[RenderParticle], bounds_min: (f32, f32), bounds_max: (f32, f32)) {
    let mut heat = vec![0.0f32; COLS * ROWS];
    let (min_x, min_y) = bounds_min;
    let (max_x, max_y) = bounds_max;

    for p in snapshot {
        let tx = (p.position.x - min_x) / (max_x - min_x);
        let ty = (p.position.y - min_y) / (max_y - min_y);
        let cx = ((tx * COLS as f32) as usize).min(COLS - 1);
        // Rows print top-down; flip y.
        let cy = ROWS - 1 - ((ty * ROWS as f32) as usize).min(ROWS - 1);
        heat[cy * COLS + cx] += 0.2 + p.temperature;
    }

    for row in heat.chunks(COLS) {
        let line: String = row
            .iter()
            .map(|&h| {
                let idx = ((h * 3.0) as usize).min(RAMP.len() - 1);
                RAMP[idx] as char
            })
            .collect();
        println!("|{}|", line);
    }
}

fn main() {
    let stage = stage_by_name("smoke_column").expect("stage exists");
    let mut sim = (stage.build)().expect("stage settings are valid");
    let bounds = sim.settings.bounds;
    let mut snapshot = Vec::new();

    for frame in 0..stage.steps {
        sim.step(STAGE_DT);

        if frame % 60 == 0 {
            sim.snapshot(&mut snapshot);
            let summary = sim.summary();
            println!(
                "\n== t={:.1}s  avg T={:.3}  max T={:.3}  pairs={} ==",
                sim.time(),
                summary.avg_temperature,
                summary.max_temperature,
                summary.last_pair_count
            );
            draw(
                &snapshot,
                (bounds.min.x, bounds.min.y),
                (bounds.max.x, bounds.max.y),
            );
        }
    }

    let summary = sim.summary();
    println!(
        "\nFinal: {} particles, avg T={:.3}, {} escaped",
        summary.particle_count, summary.avg_temperature, summary.escaped_count
    );
}
