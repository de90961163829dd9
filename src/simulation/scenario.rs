//! Build fully-initialized simulation scenarios from configuration
//!
//! Takes a `ScenarioConfig` (YAML-facing) and produces the runtime bundle
//! `Scenario` containing:
//! - numerical parameters (`Parameters`)
//! - the reflecting box (`Boundary`), if any
//! - the validated particles at t = 0
//! - the active force set (`ForceSet`)
//!
//! `Scenario::into_engine` hands everything to the simulation loop.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::configuration::config::{BodyConfig, RegimeConfig, ScenarioConfig, SlabConfig, StepConfig};
use crate::error::{Error, Result};
use crate::simulation::engine::Engine;
use crate::simulation::forces::{ContactRepulsion, Coulomb, ForceSet};
use crate::simulation::params::{Limits, Parameters};
use crate::simulation::states::{Boundary, ChargeRole, NVec3, Particle};
use crate::simulation::timestep::{AdaptiveConfig, EnergyRegime, StepPolicy};

/// Scale between a slab's nominal charge density and a member's charge
const SLAB_CHARGE_SCALE: f64 = 1e-7;

pub struct Scenario {
    pub name: String,
    pub parameters: Parameters,
    pub boundary: Option<Boundary>,
    pub particles: Vec<Particle>,
    pub forces: ForceSet,
}

impl Scenario {
    pub fn build(cfg: ScenarioConfig) -> Result<Self> {
        let parameters = build_parameters(&cfg)?;

        // Bodies first, then every slab's members; ids follow that order
        let mut particles: Vec<Particle> = Vec::new();
        for bc in &cfg.bodies {
            let id = particles.len() as u32;
            particles.push(build_body(id, bc)?);
        }

        let mut rng = StdRng::seed_from_u64(parameters.seed);
        let mut slab_boxes = Vec::with_capacity(cfg.slabs.len());
        for sc in &cfg.slabs {
            let slab_box = populate_slab(sc, &mut rng, &mut particles)?;
            slab_boxes.push(slab_box);
        }

        if particles.is_empty() {
            return Err(Error::InvalidConfig("scenario has no bodies and no slab members".into()));
        }

        // Explicit box wins, otherwise the box spanning every slab
        let boundary = match cfg.boundary {
            Some(b) => Some(Boundary::new(b.x, b.y, b.z)?),
            None => slab_boxes.iter().copied().reduce(|acc, b| acc.union(&b)),
        };

        // Forces: Coulomb always, contact repulsion when configured
        let mut forces = ForceSet::new().with(Coulomb);
        if let Some(spring_const) = parameters.contact_spring {
            forces = forces.with(ContactRepulsion { spring_const });
        }

        let name = cfg.name.unwrap_or_else(|| "unnamed".to_string());
        log::info!(
            "scenario '{}': {} particles ({} bodies, {} slabs)",
            name,
            particles.len(),
            cfg.bodies.len(),
            cfg.slabs.len()
        );

        Ok(Self {
            name,
            parameters,
            boundary,
            particles,
            forces,
        })
    }

    pub fn into_engine(self) -> Result<Engine> {
        Engine::new(self.particles, self.forces, self.boundary, self.parameters)
    }
}

fn vec3(what: &str, v: &[f64]) -> Result<NVec3> {
    match v {
        [x, y, z] => Ok(NVec3::new(*x, *y, *z)),
        _ => Err(Error::InvalidConfig(format!(
            "{what} needs exactly 3 components, got {}",
            v.len()
        ))),
    }
}

fn build_step_policy(step: &StepConfig) -> Result<StepPolicy> {
    let policy = match step {
        StepConfig::Fixed { dt } => StepPolicy::Fixed(*dt),
        StepConfig::Adaptive {
            floor,
            ceiling,
            energy_gain,
            regimes,
        } => {
            let defaults = AdaptiveConfig::default();
            let regimes = match regimes {
                None => defaults.regimes,
                Some(list) => build_regimes(list)?,
            };
            StepPolicy::Adaptive(AdaptiveConfig {
                floor: floor.unwrap_or(defaults.floor),
                ceiling: ceiling.unwrap_or(defaults.ceiling),
                energy_gain: energy_gain.unwrap_or(defaults.energy_gain),
                regimes,
            })
        }
    };
    policy.validate()?;
    Ok(policy)
}

fn build_regimes(list: &[RegimeConfig]) -> Result<[EnergyRegime; 3]> {
    let regimes: Vec<EnergyRegime> = list
        .iter()
        .map(|r| EnergyRegime {
            until: r.until.unwrap_or(f64::INFINITY),
            floor: r.floor,
            ceiling: r.ceiling,
        })
        .collect();
    regimes
        .try_into()
        .map_err(|v: Vec<EnergyRegime>| Error::InvalidConfig(format!("expected 3 energy regimes, got {}", v.len())))
}

fn build_parameters(cfg: &ScenarioConfig) -> Result<Parameters> {
    let p_cfg = &cfg.parameters;
    let parameters = Parameters {
        t_end: p_cfg.t_end,
        max_steps: p_cfg.max_steps,
        limits: Limits {
            runaway_speed: p_cfg.runaway_speed,
            settle_speed: p_cfg.settle_speed,
            restitution: p_cfg.restitution,
        },
        fusion_radius: p_cfg.fusion_radius,
        conserve_kinetic_on_merge: p_cfg.conserve_kinetic_on_merge,
        contact_spring: cfg.engine.contact_spring,
        settle_energy: p_cfg.settle_energy,
        settle_after: p_cfg.settle_after,
        step: build_step_policy(&cfg.engine.step)?,
        seed: p_cfg.seed,
    };
    parameters.validate()?;
    Ok(parameters)
}

fn build_body(id: u32, bc: &BodyConfig) -> Result<Particle> {
    let x = vec3("body position", &bc.x)?;
    let v = match &bc.v {
        Some(v) => vec3("body velocity", v)?,
        None => NVec3::zeros(),
    };
    Particle::new(id, x, v, bc.m, bc.q, bc.radius)
}

/// Fill a slab with `count` charges at uniformly random positions.
///
/// Each member carries `sign * 1e-7 * charge / volume` and a radius of
/// `2 * volume / count`; the sign is flipped with probability
/// `minority_fraction`. Returns the slab's box.
pub fn populate_slab(sc: &SlabConfig, rng: &mut StdRng, out: &mut Vec<Particle>) -> Result<Boundary> {
    let center = vec3("slab center", &sc.center)?;
    let size = vec3("slab size", &sc.size)?;
    let slab_box = Boundary::from_center_size(center, size)?;
    if sc.count == 0 {
        return Err(Error::InvalidConfig("slab count must be > 0".into()));
    }
    if !(0.0..=1.0).contains(&sc.minority_fraction) {
        return Err(Error::InvalidConfig("slab minority_fraction must lie in [0, 1]".into()));
    }

    let volume = slab_box.volume();
    let magnitude = SLAB_CHARGE_SCALE * sc.charge / volume;
    let radius = 2.0 * volume / sc.count as f64;

    for _ in 0..sc.count {
        let sign = if rng.random_bool(sc.minority_fraction) { -1.0 } else { 1.0 };
        let x = NVec3::new(
            rng.random_range(slab_box.x[0]..slab_box.x[1]),
            rng.random_range(slab_box.y[0]..slab_box.y[1]),
            rng.random_range(slab_box.z[0]..slab_box.z[1]),
        );
        let id = out.len() as u32;
        let p = Particle::new(id, x, NVec3::zeros(), sc.particle_mass, sign * magnitude, radius)?
            .with_role(ChargeRole::SlabMember);
        out.push(p);
    }
    Ok(slab_box)
}
