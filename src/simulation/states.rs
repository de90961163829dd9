//! Core state types for the charge simulation.
//!
//! Defines the 3D particle record, the reflecting box and the system
//! state:
//! - `Particle`       kinematic state plus charge, size and stored energy
//! - `Boundary`       axis-aligned box the particles live in
//! - `ParticleBuffer` committed snapshot + staging buffer, swapped per step
//! - `System`         particle buffer, simulated time `t` and last `dt`

use nalgebra::Vector3;

use crate::error::{Error, Result};

pub type NVec3 = Vector3<f64>;

/// What a particle is used for. Replaces a class per kind of charge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChargeRole {
    Ordinary,
    SlabMember,
    Tracker, // test charge followed through a fixed field
}

/// Sign category of a charge, used for colouring and policy decisions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    Positive,
    Negative,
    Neutral,
}

#[derive(Debug, Clone)]
pub struct Particle {
    pub id: u32,
    pub x: NVec3, // position
    pub v: NVec3, // velocity
    pub a: NVec3, // acceleration from the last step
    pub m: f64, // mass
    pub q: f64, // charge
    pub radius: f64,
    pub stored_energy: f64, // pair potential absorbed by merges
    pub role: ChargeRole,
}

impl Particle {
    /// Create a particle at rest-acceleration after validating invariants.
    ///
    /// Errors:
    /// - `Error::InvalidConfig` if `m` or `radius` is non-positive or any
    ///   component is NaN/inf.
    pub fn new(id: u32, x: NVec3, v: NVec3, m: f64, q: f64, radius: f64) -> Result<Self> {
        let p = Self {
            id,
            x,
            v,
            a: NVec3::zeros(),
            m,
            q,
            radius,
            stored_energy: 0.0,
            role: ChargeRole::Ordinary,
        };
        p.validate()?;
        Ok(p)
    }

    /// Check the invariants the integrator relies on. Fields are public, so
    /// the engine re-checks every particle it is handed.
    pub fn validate(&self) -> Result<()> {
        let id = self.id;
        if !self.m.is_finite() || self.m <= 0.0 {
            return Err(Error::InvalidConfig(format!("particle {id}: mass must be finite and > 0")));
        }
        if !self.radius.is_finite() || self.radius <= 0.0 {
            return Err(Error::InvalidConfig(format!("particle {id}: radius must be finite and > 0")));
        }
        if !self.q.is_finite() || !self.stored_energy.is_finite() {
            return Err(Error::InvalidConfig(format!("particle {id}: charge and stored energy must be finite")));
        }
        let finite = |v: &NVec3| v.iter().all(|c| c.is_finite());
        if !finite(&self.x) || !finite(&self.v) || !finite(&self.a) {
            return Err(Error::InvalidConfig(format!("particle {id}: position and velocity must be finite")));
        }
        Ok(())
    }

    pub fn with_role(mut self, role: ChargeRole) -> Self {
        self.role = role;
        self
    }

    pub fn polarity(&self) -> Polarity {
        if self.q > 0.0 {
            Polarity::Positive
        } else if self.q < 0.0 {
            Polarity::Negative
        } else {
            Polarity::Neutral
        }
    }

    /// 1/2 m |v|^2
    #[inline]
    pub fn kinetic_energy(&self) -> f64 {
        0.5 * self.m * self.v.norm_squared()
    }

    #[inline]
    pub fn momentum(&self) -> NVec3 {
        self.m * self.v
    }
}

/// Axis-aligned simulation volume, `[min, max]` per axis
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Boundary {
    pub x: [f64; 2],
    pub y: [f64; 2],
    pub z: [f64; 2],
}

impl Boundary {
    pub fn new(x: [f64; 2], y: [f64; 2], z: [f64; 2]) -> Result<Self> {
        for (name, range) in [("x", x), ("y", y), ("z", z)] {
            if !range[0].is_finite() || !range[1].is_finite() || range[0] >= range[1] {
                return Err(Error::InvalidConfig(format!(
                    "boundary {name} range must satisfy min < max, got [{}, {}]",
                    range[0], range[1]
                )));
            }
        }
        Ok(Self { x, y, z })
    }

    /// Box centred on `center` with edge lengths `size`
    pub fn from_center_size(center: NVec3, size: NVec3) -> Result<Self> {
        let h = size * 0.5;
        Self::new(
            [center.x - h.x, center.x + h.x],
            [center.y - h.y, center.y + h.y],
            [center.z - h.z, center.z + h.z],
        )
    }

    /// Ranges indexed by axis (0 = x, 1 = y, 2 = z)
    #[inline]
    pub fn axis(&self, k: usize) -> [f64; 2] {
        match k {
            0 => self.x,
            1 => self.y,
            _ => self.z,
        }
    }

    pub fn volume(&self) -> f64 {
        (self.x[1] - self.x[0]) * (self.y[1] - self.y[0]) * (self.z[1] - self.z[0])
    }

    /// Smallest box holding both `self` and `other`
    pub fn union(&self, other: &Boundary) -> Boundary {
        let span = |a: [f64; 2], b: [f64; 2]| [a[0].min(b[0]), a[1].max(b[1])];
        Boundary {
            x: span(self.x, other.x),
            y: span(self.y, other.y),
            z: span(self.z, other.z),
        }
    }

    /// Strict interior test
    pub fn contains(&self, p: &NVec3) -> bool {
        (0..3).all(|k| {
            let [lo, hi] = self.axis(k);
            lo < p[k] && p[k] < hi
        })
    }
}

/// Double buffer over the particle collection.
///
/// `front` is the committed snapshot every force evaluation reads;
/// `back` receives the integrated particles and becomes the front on
/// `commit`. Membership changes (merging) only touch the front, between
/// steps.
#[derive(Debug, Clone, Default)]
pub struct ParticleBuffer {
    front: Vec<Particle>,
    back: Vec<Particle>,
}

impl ParticleBuffer {
    pub fn new(particles: Vec<Particle>) -> Self {
        let capacity = particles.len();
        Self {
            front: particles,
            back: Vec::with_capacity(capacity),
        }
    }

    #[inline]
    pub fn front(&self) -> &[Particle] {
        &self.front
    }

    /// Mutable access to the committed collection (merge phase only)
    #[inline]
    pub fn front_mut(&mut self) -> &mut Vec<Particle> {
        &mut self.front
    }

    /// Clears the back buffer and hands it out for staging
    pub fn begin_stage(&mut self) -> (&[Particle], &mut Vec<Particle>) {
        self.back.clear();
        (&self.front, &mut self.back)
    }

    /// Swap staged particles in. The back buffer must hold one entry per
    /// front particle.
    pub fn commit(&mut self) {
        debug_assert_eq!(self.front.len(), self.back.len());
        std::mem::swap(&mut self.front, &mut self.back);
    }

    pub fn len(&self) -> usize {
        self.front.len()
    }

    pub fn is_empty(&self) -> bool {
        self.front.is_empty()
    }
}

/// True while any particle still carries negative charge
pub fn has_negative_charge(particles: &[Particle]) -> bool {
    particles.iter().any(|p| p.q < 0.0)
}

#[derive(Debug, Clone)]
pub struct System {
    pub particles: ParticleBuffer,
    pub t: f64, // time
    pub dt: f64, // last applied step
}

impl System {
    pub fn new(particles: Vec<Particle>) -> Self {
        Self {
            particles: ParticleBuffer::new(particles),
            t: 0.0,
            dt: 0.0,
        }
    }

    #[inline]
    pub fn bodies(&self) -> &[Particle] {
        self.particles.front()
    }

}
