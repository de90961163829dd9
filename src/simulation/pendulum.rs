//! Spring pendulum: one weight hanging from a spring, explicit Euler
//!
//! The rig constants describe the measured lab setup (hook, rod, two
//! stacked weights, a spring with non-negligible mass). The simulated body
//! is the combined centre of mass of rod and weights; the spring mass enters
//! the inertia as m_s / 3 and the gravitational load as m_s / 6.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{Error, Result};
use crate::output::energy::EnergySink;
use crate::output::table::TableSink;
use crate::simulation::energy::EnergySample;
use crate::simulation::states::NVec3;

/// Measured constants of the lab rig (SI units)
#[derive(Debug, Clone)]
pub struct PendulumRig {
    pub g: NVec3,
    pub button_from_hook_length: f64,
    pub rod_length: f64,
    pub rod_mass: f64,
    pub weight_mass: f64,
    pub spring_mass: f64,
    pub spring_constant: f64,
    pub rod_center_of_mass_from_hook: f64,
    pub big_weight_height: f64,
    pub small_weight_height: f64,
    pub spring_weightless_length: f64,
}

impl Default for PendulumRig {
    fn default() -> Self {
        let rod_mass = 0.1135;
        Self {
            g: NVec3::new(0.0, -9.79234, 0.0),
            button_from_hook_length: 0.17,
            rod_length: 0.14,
            rod_mass,
            weight_mass: 0.2622 - rod_mass,
            spring_mass: 0.0414,
            spring_constant: 29.0237,
            rod_center_of_mass_from_hook: 0.125,
            big_weight_height: 0.0115,
            small_weight_height: 0.0085,
            spring_weightless_length: 0.18,
        }
    }
}

impl PendulumRig {
    /// Inertial mass: weights + rod + a third of the spring
    pub fn effective_mass(&self) -> f64 {
        self.weight_mass + self.rod_mass + self.spring_mass / 3.0
    }

    /// Mass the spring has to carry against gravity
    pub fn gravitational_mass(&self) -> f64 {
        self.effective_mass() + self.spring_mass / 6.0
    }

    pub fn spring_equilibrium_length(&self) -> f64 {
        self.spring_weightless_length + self.gravitational_mass() * self.g.norm() / self.spring_constant
    }

    pub fn spring_length(&self, total_length: f64) -> f64 {
        total_length - self.rod_length
    }

    /// Weights' centre of mass measured from the hook: the big weight sits
    /// at the rod's end, the small one on top of it
    pub fn weight_center_of_mass_from_hook(&self) -> f64 {
        let wm = self.weight_mass;
        self.rod_length
            - (2.0 / 3.0 * wm * self.big_weight_height / 2.0
                + 1.0 / 3.0 * wm * (self.big_weight_height + self.small_weight_height / 2.0))
                / wm
    }

    pub fn rod_weights_center_of_mass(&self) -> f64 {
        (self.rod_mass * self.rod_center_of_mass_from_hook
            + self.weight_mass * self.weight_center_of_mass_from_hook())
            / (self.weight_mass + self.rod_mass)
    }

    /// Centre of mass of spring + rod + weights below the anchor
    pub fn center_of_mass(&self, spring_length: f64) -> f64 {
        ((self.weight_mass + self.rod_mass) * (self.rod_weights_center_of_mass() + spring_length)
            + self.spring_mass * spring_length / 2.0)
            / (self.rod_mass + self.weight_mass + self.spring_mass)
    }

    /// Distance between the tracked button and the simulated centre of mass
    pub fn attachment_offset(&self) -> f64 {
        self.rod_weights_center_of_mass() - self.button_from_hook_length
    }

    /// Convert a measured button position/velocity into the simulated
    /// centre-of-mass state
    pub fn initial_state(&self, measured_pos: NVec3, measured_vel: NVec3) -> Result<(NVec3, NVec3)> {
        let r = measured_pos.norm();
        if r == 0.0 {
            return Err(Error::InvalidConfig("pendulum start position must not be the anchor".into()));
        }
        let lever = self.center_of_mass(self.spring_length(r)) / r;
        let vel = with_length(measured_vel, measured_vel.norm() * lever);
        let pos = with_length(measured_pos, r + self.attachment_offset());
        Ok((pos, vel))
    }
}

/// Rescale `v` to `len`, keeping the direction. Zero stays zero.
pub fn with_length(v: NVec3, len: f64) -> NVec3 {
    let n = v.norm();
    if n == 0.0 {
        v
    } else {
        v * (len / n)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PendulumEnergy {
    pub spring: f64,
    pub gravity: f64,
    pub kinetic: f64,
}

impl PendulumEnergy {
    pub fn potential(&self) -> f64 {
        self.spring + self.gravity
    }

    pub fn total(&self) -> f64 {
        self.potential() + self.kinetic
    }
}

/// Power delivered by each force at the last step
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PendulumPower {
    pub spring: f64,
    pub gravity: f64,
}

/// Single-body spring pendulum anchored at the origin
#[derive(Debug, Clone)]
pub struct SpringPendulum {
    pub x: NVec3, // weight position relative to the anchor
    pub v: NVec3,
    pub a: NVec3,
    pub force: NVec3,
    pub effective_mass: f64,
    pub spring_mass: f64,
    pub spring_constant: f64,
    pub equilibrium_length: f64,
    pub g: NVec3,
    pub gravity_enabled: bool,
    pub power: PendulumPower,
    random_amplitude: Option<f64>,
    rng: StdRng,
    energy_offsets: Option<(f64, f64)>, // first spring / gravity energies
}

impl SpringPendulum {
    pub fn new(
        x: NVec3,
        v: NVec3,
        effective_mass: f64,
        spring_mass: f64,
        spring_constant: f64,
        equilibrium_length: f64,
    ) -> Result<Self> {
        if !effective_mass.is_finite() || effective_mass <= 0.0 {
            return Err(Error::InvalidConfig("pendulum effective mass must be finite and > 0".into()));
        }
        if !spring_mass.is_finite() || spring_mass < 0.0 {
            return Err(Error::InvalidConfig("pendulum spring mass must be finite and >= 0".into()));
        }
        if !spring_constant.is_finite() || spring_constant <= 0.0 {
            return Err(Error::InvalidConfig("spring constant must be finite and > 0".into()));
        }
        if x.norm() == 0.0 {
            return Err(Error::InvalidConfig("pendulum weight must not sit on the anchor".into()));
        }
        Ok(Self {
            x,
            v,
            a: NVec3::zeros(),
            force: NVec3::zeros(),
            effective_mass,
            spring_mass,
            spring_constant,
            equilibrium_length,
            g: PendulumRig::default().g,
            gravity_enabled: true,
            power: PendulumPower::default(),
            random_amplitude: None,
            rng: StdRng::seed_from_u64(0),
            energy_offsets: None,
        })
    }

    /// Pendulum for the given rig, started from a measured button state
    pub fn from_rig(rig: &PendulumRig, measured_pos: NVec3, measured_vel: NVec3) -> Result<Self> {
        let (x, v) = rig.initial_state(measured_pos, measured_vel)?;
        let mut p = Self::new(
            x,
            v,
            rig.effective_mass(),
            rig.spring_mass,
            rig.spring_constant,
            rig.spring_equilibrium_length(),
        )?;
        p.g = rig.g;
        Ok(p)
    }

    /// Enable a uniform random kick in [-amplitude, amplitude] per axis
    pub fn with_random_force(mut self, amplitude: f64, seed: u64) -> Self {
        self.random_amplitude = Some(amplitude);
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    fn gravity_force(&self) -> NVec3 {
        if self.gravity_enabled {
            (self.effective_mass + self.spring_mass / 6.0) * self.g
        } else {
            NVec3::zeros()
        }
    }

    /// Hooke's law along the anchor-weight line
    fn spring_force(&self) -> NVec3 {
        let len = self.x.norm();
        -self.spring_constant * (len - self.equilibrium_length) * self.x / len
    }

    fn random_force(&mut self) -> NVec3 {
        match self.random_amplitude {
            Some(amp) => NVec3::new(
                self.rng.random_range(-1.0..=1.0),
                self.rng.random_range(-1.0..=1.0),
                self.rng.random_range(-1.0..=1.0),
            ) * amp,
            None => NVec3::zeros(),
        }
    }

    /// One Euler step (velocity first, then position)
    pub fn step(&mut self, dt: f64) {
        let gravity = self.gravity_force();
        let spring = self.spring_force();
        self.force = self.random_force() + gravity + spring;
        self.a = self.force / self.effective_mass;
        self.v += self.a * dt;
        self.x += self.v * dt;

        self.power = PendulumPower {
            spring: spring.dot(&self.v),
            gravity: gravity.dot(&self.v),
        };
    }

    pub fn energy(&self) -> PendulumEnergy {
        let stretch = self.x.norm() - self.equilibrium_length;
        let load = if self.gravity_enabled {
            self.effective_mass + self.spring_mass / 6.0
        } else {
            0.0
        };
        PendulumEnergy {
            spring: 0.5 * self.spring_constant * stretch * stretch,
            gravity: -load * self.g.dot(&self.x),
            kinetic: 0.5 * self.effective_mass * self.v.norm_squared(),
        }
    }

    /// Spring and gravity energies relative to their first measured values
    pub fn relative_potentials(&mut self) -> (f64, f64) {
        let e = self.energy();
        let (s0, g0) = *self.energy_offsets.get_or_insert((e.spring, e.gravity));
        (e.spring - s0, e.gravity - g0)
    }

    /// |m r x v| about the anchor
    pub fn angular_momentum(&self) -> f64 {
        (self.effective_mass * self.x.cross(&self.v)).norm()
    }
}

/// Timing of a pendulum run
#[derive(Debug, Clone)]
pub struct PendulumRun {
    pub dt: f64,
    pub sample_every: f64, // cadence of the position table
    pub end_time: f64,
    pub report_offset: f64, // subtracted from |x| when writing rows
}

impl PendulumRun {
    /// Lab defaults: 30 ms camera frames, 100 integration steps per frame,
    /// 1000 frames
    pub fn for_rig(rig: &PendulumRig) -> Self {
        let real_dt = 0.03;
        Self {
            dt: 1e-2 * real_dt,
            sample_every: real_dt,
            end_time: 1000.0 * real_dt,
            report_offset: rig.attachment_offset(),
        }
    }
}

/// Integrate `pendulum` over `run`, writing energies every step and a
/// position row every `sample_every`. Returns the number of rows written.
pub fn run_pendulum<E, T>(pendulum: &mut SpringPendulum, run: &PendulumRun, energy: &mut E, table: &mut T) -> Result<usize>
where
    E: EnergySink + ?Sized,
    T: TableSink + ?Sized,
{
    if !run.dt.is_finite() || run.dt <= 0.0 || run.sample_every < run.dt {
        return Err(Error::InvalidConfig("pendulum run needs 0 < dt <= sample_every".into()));
    }

    table.header(&[
        ("effective mass", pendulum.effective_mass),
        ("spring constant", pendulum.spring_constant),
        ("equilibrium length", pendulum.equilibrium_length),
    ])?;

    let mut t = 0.0;
    let mut rows = 0;
    let mut next_sample = 0.0;
    while t <= run.end_time + run.dt {
        if t >= next_sample - 0.5 * run.dt {
            let reported = with_length(pendulum.x, pendulum.x.norm() - run.report_offset);
            table.row(reported, (t * 100.0).round() / 100.0)?;
            rows += 1;
            next_sample += run.sample_every;
        }

        t += run.dt;
        pendulum.step(run.dt);

        let e = pendulum.energy();
        energy.record(&EnergySample::new(t, e.kinetic, e.potential()))?;
    }

    table.finish()?;
    energy.flush()?;
    log::info!("pendulum run: {rows} samples up to t = {t:.3}");
    Ok(rows)
}
