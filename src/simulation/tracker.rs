//! Test charge released into a fixed field
//!
//! A caller supplies a start position; a unit test charge is integrated in
//! the field of the (immobile) sources until it leaves the region of
//! interest, comes to rest, or the step budget runs out. Leaving the region
//! ends the track rather than reflecting.

use crate::error::{Error, Result};
use crate::simulation::forces::electric_field;
use crate::simulation::integrator::euler_step;
use crate::simulation::params::Limits;
use crate::simulation::states::{Boundary, ChargeRole, NVec3, Particle};

/// Default size of a placed test charge
pub const TEST_CHARGE_RADIUS: f64 = 0.001;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackExit {
    LeftRegion,
    Settled,
    StepBudget,
}

#[derive(Debug, Clone)]
pub struct TrackSettings {
    pub dt: f64,
    pub max_steps: u64,
    pub charge: f64,
    pub mass: f64,
    pub limits: Limits,
}

impl Default for TrackSettings {
    fn default() -> Self {
        Self {
            dt: 0.1,
            max_steps: 100_000,
            charge: 1.0,
            mass: 1.0,
            limits: Limits::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Track {
    pub points: Vec<NVec3>, // start position first
    pub exit: TrackExit,
    pub t: f64,
}

/// Follow a test charge from `start` through the field of `sources`
pub fn track_test_charge(
    sources: &[Particle],
    start: NVec3,
    region: &Boundary,
    settings: &TrackSettings,
) -> Result<Track> {
    if !settings.dt.is_finite() || settings.dt <= 0.0 {
        return Err(Error::InvalidConfig("tracker dt must be finite and > 0".into()));
    }
    if !region.contains(&start) {
        return Err(Error::InvalidConfig(format!(
            "test charge start ({:.3}, {:.3}, {:.3}) lies outside the region",
            start.x, start.y, start.z
        )));
    }

    let mut probe = Particle::new(u32::MAX, start, NVec3::zeros(), settings.mass, settings.charge, TEST_CHARGE_RADIUS)?
        .with_role(ChargeRole::Tracker);
    let mut points = vec![start];
    let mut t = 0.0;

    for step in 0..settings.max_steps {
        let force = probe.q * electric_field(&probe.x, sources);
        let out = euler_step(&probe, force, settings.dt, None, &settings.limits);
        probe = out.particle;
        t += settings.dt;
        points.push(probe.x);

        if !region.contains(&probe.x) {
            log::debug!("test charge left the region after {} steps", step + 1);
            return Ok(Track { points, exit: TrackExit::LeftRegion, t });
        }
        // the very first step starts from rest, give it a chance to move
        if out.settled && step > 0 {
            return Ok(Track { points, exit: TrackExit::Settled, t });
        }
    }

    Ok(Track {
        points,
        exit: TrackExit::StepBudget,
        t,
    })
}
