//! Energy bookkeeping for a particle collection

use crate::simulation::params::K_COULOMB;
use crate::simulation::states::Particle;

/// One row of the energy time series
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnergySample {
    pub t: f64,
    pub kinetic: f64,
    pub potential: f64,
    pub total: f64,
}

impl EnergySample {
    pub fn new(t: f64, kinetic: f64, potential: f64) -> Self {
        Self {
            t,
            kinetic,
            potential,
            total: kinetic + potential,
        }
    }

    pub fn measure(t: f64, particles: &[Particle]) -> Self {
        Self::new(t, kinetic_energy(particles), potential_energy(particles))
    }
}

/// sum 1/2 m |v|^2
pub fn kinetic_energy(particles: &[Particle]) -> f64 {
    particles.iter().map(Particle::kinetic_energy).sum()
}

/// Pair potential over unique pairs (k q_i q_j / r_ij) plus every
/// particle's stored merge energy. Neutral particles and coincident pairs
/// add no pair term.
pub fn potential_energy(particles: &[Particle]) -> f64 {
    let n = particles.len();
    let mut ep = 0.0;
    for i in 0..n {
        let pi = &particles[i];
        ep += pi.stored_energy;
        if pi.q == 0.0 {
            continue;
        }
        for pj in &particles[(i + 1)..n] {
            let r = (pi.x - pj.x).norm();
            if r == 0.0 {
                continue;
            }
            ep += K_COULOMB * pi.q * pj.q / r;
        }
    }
    ep
}
