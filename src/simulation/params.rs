//! Numerical and physical parameters for the simulation
//!
//! `Parameters` holds the immutable runtime settings of one run:
//! - run budget (`t_end`, `max_steps`) and the settling rule,
//! - integrator limits and wall restitution,
//! - fusion radius and merge options,
//! - optional contact repulsion and the step policy

use crate::error::{Error, Result};
use crate::simulation::timestep::StepPolicy;

/// SI Coulomb constant, N m^2 / C^2
pub const K_COULOMB: f64 = 8.987551e9;

/// Velocity thresholds applied by the Euler step
#[derive(Debug, Clone, Copy)]
pub struct Limits {
    pub runaway_speed: f64, // |v| above this gets divided by 10
    pub settle_speed: f64, // |v| below this reports "settled"
    pub restitution: f64, // fraction of velocity kept on a wall hit
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            runaway_speed: 100.0,
            settle_speed: 5e-4,
            restitution: 0.7,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Parameters {
    pub t_end: f64, // time end
    pub max_steps: Option<u64>, // step budget
    pub limits: Limits,
    pub fusion_radius: f64, // merge threshold
    pub conserve_kinetic_on_merge: bool,
    pub contact_spring: Option<f64>, // slab contact repulsion constant
    pub settle_energy: f64, // total Ek below this counts as settled
    pub settle_after: f64, // earliest time the run may settle
    pub step: StepPolicy,
    pub seed: u64, // deterministic seed
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            t_end: 1000.0,
            max_steps: None,
            limits: Limits::default(),
            fusion_radius: 0.0075,
            conserve_kinetic_on_merge: false,
            contact_spring: None,
            settle_energy: 0.0,
            settle_after: 0.0,
            step: StepPolicy::default(),
            seed: 42,
        }
    }
}

impl Parameters {
    /// Reject values the integrator cannot work with
    pub fn validate(&self) -> Result<()> {
        if !self.t_end.is_finite() || self.t_end <= 0.0 {
            return Err(Error::InvalidConfig("t_end must be finite and > 0".into()));
        }
        if self.max_steps == Some(0) {
            return Err(Error::InvalidConfig("max_steps must be > 0 when given".into()));
        }
        let l = &self.limits;
        if !(l.restitution > 0.0 && l.restitution <= 1.0) {
            return Err(Error::InvalidConfig("restitution must lie in (0, 1]".into()));
        }
        if !(l.runaway_speed > l.settle_speed && l.settle_speed >= 0.0) {
            return Err(Error::InvalidConfig(
                "runaway_speed must exceed settle_speed, both non-negative".into(),
            ));
        }
        if !self.fusion_radius.is_finite() || self.fusion_radius < 0.0 {
            return Err(Error::InvalidConfig("fusion_radius must be finite and >= 0".into()));
        }
        if let Some(k) = self.contact_spring {
            if !k.is_finite() || k < 0.0 {
                return Err(Error::InvalidConfig("contact_spring must be finite and >= 0".into()));
            }
        }
        if self.settle_energy < 0.0 || self.settle_after < 0.0 {
            return Err(Error::InvalidConfig("settle_energy and settle_after must be >= 0".into()));
        }
        self.step.validate()
    }
}
