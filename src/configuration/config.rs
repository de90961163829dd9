//! Configuration types for loading simulation scenarios from YAML.
//!
//! This module defines a thin, `serde`-deserializable representation of a
//! simulation scenario. A scenario consists of:
//!
//! - [`EngineConfig`]     – step policy and optional contact repulsion
//! - [`ParametersConfig`] – run budget, integrator limits, merge settings
//! - [`BoundaryConfig`]   – reflecting box (optional)
//! - [`BodyConfig`]       – explicitly placed charges
//! - [`SlabConfig`]       – boxes filled with random charges
//! - [`ScenarioConfig`]   – top-level wrapper used to load a scenario from YAML
//!
//! # YAML format
//! An example matching these types:
//!
//! ```yaml
//! name: two charges
//! engine:
//!   step:
//!     policy: fixed       # or "adaptive"
//!     dt: 1.0e-4
//!
//! parameters:
//!   t_end: 1.0            # total simulation time
//!   restitution: 0.7      # wall restitution
//!   fusion_radius: 0.008  # merge distance threshold
//!   seed: 42              # slab population seed
//!
//! boundary:
//!   x: [-5.0, 5.0]
//!   y: [-5.0, 5.0]
//!   z: [-5.0, 5.0]
//!
//! bodies:
//!   - x: [ -2.0, 0.0, 0.0 ]
//!     q: 1.0
//!     m: 1.0
//!     radius: 0.5
//!   - x: [  2.0, 0.0, 0.0 ]
//!     q: -1.0
//!     m: 1.0
//!     radius: 0.5
//!
//! slabs:
//!   - center: [0.0, 0.0, 0.0]
//!     size: [1.0, 1.0, 1.0]
//!     charge: 100.0
//!     count: 100
//! ```
//!
//! Every field except the particle sources may be omitted; the defaults are
//! the ones the slab runs used. [`crate::simulation::scenario::Scenario`]
//! maps this into the validated runtime types.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::Deserialize;

use crate::error::Result;
use crate::simulation::params::{Limits, Parameters};

/// Which step policy the engine uses.
/// `policy: "fixed"` with `dt`, or `policy: "adaptive"` with optional bounds
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "policy")]
pub enum StepConfig {
    #[serde(rename = "fixed")] // constant dt for the whole run
    Fixed { dt: f64 },

    #[serde(rename = "adaptive")] // pairwise-minimum, then energy-based once no negative charge is left
    Adaptive {
        floor: Option<f64>,
        ceiling: Option<f64>,
        energy_gain: Option<f64>,
        regimes: Option<Vec<RegimeConfig>>,
    },
}

impl Default for StepConfig {
    fn default() -> Self {
        StepConfig::Adaptive {
            floor: None,
            ceiling: None,
            energy_gain: None,
            regimes: None,
        }
    }
}

/// One time regime of the energy-based policy
#[derive(Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct RegimeConfig {
    pub until: Option<f64>, // omitted on the last regime = open-ended
    pub floor: f64,
    pub ceiling: f64,
}

/// Engine-level configuration
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct EngineConfig {
    pub step: StepConfig, // how dt is chosen
    pub contact_spring: Option<f64>, // `Some(k)` registers the short-range contact repulsion
}

/// Global numerical and physical parameters for a scenario
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ParametersConfig {
    pub t_end: f64, // time end
    pub max_steps: Option<u64>, // step budget
    pub restitution: f64, // fraction of velocity kept on a wall hit
    pub runaway_speed: f64, // velocity damper threshold
    pub settle_speed: f64, // per-particle "at rest" threshold
    pub fusion_radius: f64, // merge threshold
    pub conserve_kinetic_on_merge: bool,
    pub settle_energy: f64, // total Ek under which the run settles
    pub settle_after: f64, // earliest settle time
    pub seed: u64, // deterministic seed to make slab runs reproducible
}

impl Default for ParametersConfig {
    fn default() -> Self {
        let p = Parameters::default();
        let l = Limits::default();
        Self {
            t_end: p.t_end,
            max_steps: p.max_steps,
            restitution: l.restitution,
            runaway_speed: l.runaway_speed,
            settle_speed: l.settle_speed,
            fusion_radius: p.fusion_radius,
            conserve_kinetic_on_merge: p.conserve_kinetic_on_merge,
            settle_energy: p.settle_energy,
            settle_after: p.settle_after,
            seed: p.seed,
        }
    }
}

/// Reflecting box, `[min, max]` per axis
#[derive(Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct BoundaryConfig {
    pub x: [f64; 2],
    pub y: [f64; 2],
    pub z: [f64; 2],
}

/// Configuration for a single charge's initial state
#[derive(Deserialize, Debug, Clone)]
pub struct BodyConfig {
    pub x: Vec<f64>, // Initial position vector `x`
    #[serde(default)]
    pub v: Option<Vec<f64>>, // Initial velocity, at rest when omitted
    #[serde(default = "default_mass")]
    pub m: f64, // Mass of the body
    pub q: f64, // Charge
    pub radius: f64, // Radius, used for contact and merged volume
}

/// A box filled with `count` random charges whose magnitudes add up to a
/// density set by `charge`; a `minority_fraction` of them carries the
/// opposite sign
#[derive(Deserialize, Debug, Clone)]
pub struct SlabConfig {
    pub center: Vec<f64>,
    pub size: Vec<f64>,
    pub charge: f64,
    pub count: usize,
    #[serde(default = "default_minority")]
    pub minority_fraction: f64,
    #[serde(default = "default_mass")]
    pub particle_mass: f64,
}

fn default_mass() -> f64 {
    1.0
}

fn default_minority() -> f64 {
    0.1
}

/// Top-level scenario configuration loaded from YAML.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct ScenarioConfig {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub engine: EngineConfig, // step policy and extra force terms
    #[serde(default)]
    pub parameters: ParametersConfig, // Global numerical and physical parameters
    #[serde(default)]
    pub boundary: Option<BoundaryConfig>, // reflecting box; defaults to the box spanning every slab
    #[serde(default)]
    pub bodies: Vec<BodyConfig>, // explicitly placed charges
    #[serde(default)]
    pub slabs: Vec<SlabConfig>, // randomly populated slabs
}

impl ScenarioConfig {
    pub fn from_yaml_str(s: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(s)?)
    }

    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        Ok(serde_yaml::from_reader(reader)?)
    }
}
