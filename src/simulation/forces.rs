//! Force contributors for the charge simulation
//!
//! Defines the `ForceTerm` trait, the `ForceSet` that sums terms, a direct
//! Coulomb term and the short-range contact repulsion used by slabs

use crate::simulation::params::K_COULOMB;
use crate::simulation::states::{NVec3, Particle};

/// Trait for force sources acting on a single target particle.
/// Implementations return their contribution from every particle in
/// `sources`; the target itself may appear in `sources` and must be skipped
/// by its zero separation.
pub trait ForceTerm {
    fn force(&self, target: &Particle, sources: &[Particle]) -> NVec3;
}

/// Collection of force terms (Coulomb, contact, etc.)
/// Each term implements [`ForceTerm`] and their contributions are summed
/// into a single force vector for the target
pub struct ForceSet {
    terms: Vec<Box<dyn ForceTerm + Send + Sync>>,
}

impl Default for ForceSet {
    fn default() -> Self {
        Self::new()
    }
}

impl ForceSet {
    /// Create an empty force set
    pub fn new() -> Self {
        Self { terms: Vec::new() }
    }

    /// Add a force term
    pub fn with<T>(mut self, term: T) -> Self
    where
        T: ForceTerm + Send + Sync + 'static,
    {
        self.terms.push(Box::new(term));
        self
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Net force on `target` from all terms. Reads only, no side effects
    pub fn net_force(&self, target: &Particle, sources: &[Particle]) -> NVec3 {
        self.terms
            .iter()
            .fold(NVec3::zeros(), |acc, term| acc + term.force(target, sources))
    }

    /// Net force on every particle of `particles`, all read from the same
    /// snapshot
    pub fn accumulate_forces(&self, particles: &[Particle], out: &mut [NVec3]) {
        for (f, p) in out.iter_mut().zip(particles.iter()) {
            *f = self.net_force(p, particles);
        }
    }
}

/// Electric field at `point` produced by `sources`:
/// E = sum k * q_s / |r|^2 * r_hat, with r = point - x_s.
///
/// Neutral sources and sources sitting exactly on `point` contribute
/// nothing.
pub fn electric_field(point: &NVec3, sources: &[Particle]) -> NVec3 {
    let mut field = NVec3::zeros();
    for s in sources {
        if s.q == 0.0 {
            continue;
        }

        // r points from the source to the field point, so a positive
        // source pushes a positive test charge along +r
        let r = point - s.x;
        let r2 = r.norm_squared();

        // coincident bodies (the target itself, or an exact overlap)
        if r2 == 0.0 {
            log::trace!("skipping coincident source {}", s.id);
            continue;
        }

        // q / |r|^2 * r_hat == q * r / |r|^3
        let inv_r = r2.sqrt().recip();
        field += s.q * inv_r * inv_r * inv_r * r;
    }
    field * K_COULOMB
}

/// Direct O(n) Coulomb force on one target (O(n^2) over the system):
/// F = q_t * E(x_t)
#[derive(Debug, Clone, Copy, Default)]
pub struct Coulomb;

impl ForceTerm for Coulomb {
    fn force(&self, target: &Particle, sources: &[Particle]) -> NVec3 {
        if target.q == 0.0 {
            return NVec3::zeros();
        }
        target.q * electric_field(&target.x, sources)
    }
}

/// Linear push-apart for overlapping bodies.
///
/// When a source is closer than twice the target radius the target is
/// pushed away with `spring_const * (2 R - |r|) * r_hat`. Only the slab
/// scenarios register this term.
#[derive(Debug, Clone, Copy)]
pub struct ContactRepulsion {
    pub spring_const: f64,
}

impl ForceTerm for ContactRepulsion {
    fn force(&self, target: &Particle, sources: &[Particle]) -> NVec3 {
        let contact = 2.0 * target.radius;
        let mut f = NVec3::zeros();
        for s in sources {
            let r = target.x - s.x;
            let d = r.norm();
            if d == 0.0 || d >= contact {
                continue;
            }
            f += self.spring_const * (contact - d) / d * r;
        }
        f
    }
}
