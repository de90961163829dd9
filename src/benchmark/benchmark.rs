use std::time::Instant;

use crate::simulation::engine::Engine;
use crate::simulation::forces::{Coulomb, ForceSet};
use crate::simulation::params::Parameters;
use crate::simulation::states::{Boundary, NVec3, Particle};
use crate::simulation::timestep::StepPolicy;

/// One row of a benchmark table
#[derive(Debug, Clone, Copy)]
pub struct BenchRow {
    pub n: usize,
    pub seconds: f64,
}

/// Deterministic cloud of alternating charges spread over a 10 m box
pub fn charge_cloud(n: usize) -> Vec<Particle> {
    let mut particles = Vec::with_capacity(n);
    for i in 0..n {
        let i_f = i as f64;
        // deterministic positions, no rand needed
        let x = NVec3::new(
            (i_f * 0.37).sin() * 4.5,
            (i_f * 0.13).cos() * 4.5,
            (i_f * 0.07).sin() * 4.5,
        );
        let q = if i % 2 == 0 { 1e-9 } else { -1e-9 };
        // radius > 0 and mass > 0 are constants here
        if let Ok(p) = Particle::new(i as u32, x, NVec3::zeros(), 1.0, q, 0.01) {
            particles.push(p);
        }
    }
    particles
}

/// Time one full O(n^2) force evaluation per system size
pub fn bench_forces(ns: &[usize]) -> Vec<BenchRow> {
    let forces = ForceSet::new().with(Coulomb);
    let mut rows = Vec::with_capacity(ns.len());

    for &n in ns {
        let particles = charge_cloud(n);
        let mut out = vec![NVec3::zeros(); particles.len()];

        // Warm up
        forces.accumulate_forces(&particles, &mut out);

        let t0 = Instant::now();
        forces.accumulate_forces(&particles, &mut out);
        let seconds = t0.elapsed().as_secs_f64();

        println!("N = {n:5}, forces = {seconds:8.6} s");
        rows.push(BenchRow { n, seconds });
    }
    rows
}

/// Time `steps` full engine steps (forces, Euler, merge, energy) per size
pub fn bench_steps(ns: &[usize], steps: u64) -> Vec<BenchRow> {
    let mut rows = Vec::with_capacity(ns.len());

    for &n in ns {
        let particles = charge_cloud(n);
        if particles.is_empty() {
            continue;
        }
        let boundary = Boundary::new([-5.0, 5.0], [-5.0, 5.0], [-5.0, 5.0]).ok();
        let params = Parameters {
            max_steps: Some(steps.max(1)),
            step: StepPolicy::Fixed(1e-4),
            ..Parameters::default()
        };
        let Ok(mut engine) = Engine::new(particles, ForceSet::new().with(Coulomb), boundary, params) else {
            continue;
        };

        let t0 = Instant::now();
        while engine.step().is_some() {}
        let seconds = t0.elapsed().as_secs_f64() / steps.max(1) as f64;

        println!("N = {n:5}, step = {seconds:8.6} s");
        rows.push(BenchRow { n, seconds });
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bench_tables_cover_every_size() {
        assert_eq!(bench_forces(&[4, 8]).len(), 2);
        assert_eq!(bench_steps(&[4], 2).len(), 1);
        assert_eq!(charge_cloud(5).len(), 5);
    }
}
