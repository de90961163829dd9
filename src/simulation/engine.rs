//! Runtime simulation loop
//!
//! `Engine` owns the system and drives one step as:
//! dt -> forces from the committed snapshot -> Euler into the staging
//! buffer -> commit -> merge -> energy sample -> state transition

use crate::error::Result;
use crate::output::energy::EnergySink;
use crate::simulation::energy::EnergySample;
use crate::simulation::forces::ForceSet;
use crate::simulation::integrator::euler_step;
use crate::simulation::merge::{try_merge_all, MergeEvent};
use crate::simulation::params::Parameters;
use crate::simulation::states::{Boundary, NVec3, Particle, System};
use crate::simulation::timestep::{Phase, TimestepController};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Running,
    Settled, // total kinetic energy dropped under the threshold
    Stopped, // time or step budget exhausted
}

/// What happened during one step
#[derive(Debug, Clone)]
pub struct StepReport {
    pub step: u64,
    pub dt: f64,
    pub energy: EnergySample,
    pub merges: Vec<MergeEvent>,
    pub settled_particles: usize,
    pub damped_particles: usize,
    pub reflections: usize,
    pub state: RunState,
}

/// Totals of a finished (or interrupted) run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub steps: u64,
    pub t: f64,
    pub merges: usize,
    pub particles_left: usize,
    pub state: RunState,
    pub final_energy: Option<EnergySample>,
}

pub struct Engine {
    system: System,
    forces: ForceSet,
    boundary: Option<Boundary>,
    parameters: Parameters,
    timestep: TimestepController,
    state: RunState,
    steps: u64,
    merges: usize,
    force_buf: Vec<NVec3>,
}

impl Engine {
    /// Build an engine over a particle set.
    ///
    /// Every particle is re-validated here; an empty set or bad parameters
    /// are rejected too.
    pub fn new(
        particles: Vec<Particle>,
        forces: ForceSet,
        boundary: Option<Boundary>,
        parameters: Parameters,
    ) -> Result<Self> {
        if particles.is_empty() {
            return Err(crate::error::Error::InvalidConfig("particle set is empty".into()));
        }
        for p in &particles {
            p.validate()?;
        }
        parameters.validate()?;

        let n = particles.len();
        log::info!(
            "engine: {} particles, {} force terms, boundary = {}",
            n,
            forces.len(),
            boundary.is_some()
        );

        Ok(Self {
            system: System::new(particles),
            forces,
            boundary,
            timestep: TimestepController::new(parameters.step.clone()),
            parameters,
            state: RunState::Running,
            steps: 0,
            merges: 0,
            force_buf: vec![NVec3::zeros(); n],
        })
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn time(&self) -> f64 {
        self.system.t
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn particles(&self) -> &[Particle] {
        self.system.bodies()
    }

    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    pub fn timestep_phase(&self) -> Phase {
        self.timestep.phase()
    }

    /// Caller-side stop; later `step` calls do nothing
    pub fn stop(&mut self) {
        self.state = RunState::Stopped;
    }

    /// Advance one step. `None` once the run is no longer `Running`.
    pub fn step(&mut self) -> Option<StepReport> {
        if self.state != RunState::Running {
            return None;
        }

        // 1. step size from the committed configuration
        let dt = self.timestep.next_dt(self.system.bodies(), self.system.t);

        // 2. forces, all from the same snapshot
        let n = self.system.particles.len();
        self.force_buf.resize(n, NVec3::zeros());
        self.forces.accumulate_forces(self.system.bodies(), &mut self.force_buf);

        // integrate into the staging buffer
        let mut settled_particles = 0;
        let mut damped_particles = 0;
        let mut reflections = 0;
        {
            let (front, back) = self.system.particles.begin_stage();
            for (p, f) in front.iter().zip(self.force_buf.iter()) {
                let out = euler_step(p, *f, dt, self.boundary.as_ref(), &self.parameters.limits);
                settled_particles += out.settled as usize;
                damped_particles += out.damped as usize;
                reflections += out.reflected as usize;
                back.push(out.particle);
            }
        }

        // 3. commit
        self.system.particles.commit();
        self.system.t += dt;
        self.system.dt = dt;
        self.steps += 1;

        // 4. fusion between steps
        let merges = try_merge_all(
            self.system.particles.front_mut(),
            self.parameters.fusion_radius,
            self.parameters.conserve_kinetic_on_merge,
        );
        self.merges += merges.len();

        // 5. energy
        let energy = EnergySample::measure(self.system.t, self.system.bodies());

        // 6. transitions
        if self.system.t >= self.parameters.settle_after && energy.kinetic < self.parameters.settle_energy {
            log::info!("settled at t = {:.6} after {} steps", self.system.t, self.steps);
            self.state = RunState::Settled;
        } else if self.system.t >= self.parameters.t_end
            || self.parameters.max_steps.is_some_and(|max| self.steps >= max)
        {
            log::info!("budget reached at t = {:.6} after {} steps", self.system.t, self.steps);
            self.state = RunState::Stopped;
        }

        Some(StepReport {
            step: self.steps,
            dt,
            energy,
            merges,
            settled_particles,
            damped_particles,
            reflections,
            state: self.state,
        })
    }

    /// Step until the run settles or stops, pushing every energy sample to
    /// `sink`
    pub fn run<S: EnergySink + ?Sized>(&mut self, sink: &mut S) -> Result<RunSummary> {
        let mut last = None;
        while let Some(report) = self.step() {
            sink.record(&report.energy)?;
            last = Some(report.energy);
        }
        sink.flush()?;

        let summary = self.summary(last);
        log::info!(
            "run finished: {:?}, t = {:.6}, {} steps, {} merges, {} particles left",
            summary.state,
            summary.t,
            summary.steps,
            summary.merges,
            summary.particles_left
        );
        Ok(summary)
    }

    pub fn summary(&self, final_energy: Option<EnergySample>) -> RunSummary {
        RunSummary {
            steps: self.steps,
            t: self.system.t,
            merges: self.merges,
            particles_left: self.system.particles.len(),
            state: self.state,
            final_energy,
        }
    }
}
