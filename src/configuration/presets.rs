//! Canned scenarios selectable by name
//!
//! - `two-charges`        +1 C and -1 C four units apart in a 10 m box
//! - `single-box`         one slab of 100 mixed charges confined to itself
//! - `two-opposing-slabs` two slabs of opposite net charge facing each other

use std::fmt;
use std::str::FromStr;

use crate::configuration::config::{
    BodyConfig, BoundaryConfig, EngineConfig, ParametersConfig, ScenarioConfig, SlabConfig, StepConfig,
};
use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    TwoCharges,
    SingleBox,
    TwoOpposingSlabs,
}

impl Preset {
    pub const ALL: [Preset; 3] = [Preset::TwoCharges, Preset::SingleBox, Preset::TwoOpposingSlabs];

    pub fn name(&self) -> &'static str {
        match self {
            Preset::TwoCharges => "two-charges",
            Preset::SingleBox => "single-box",
            Preset::TwoOpposingSlabs => "two-opposing-slabs",
        }
    }

    pub fn config(&self) -> ScenarioConfig {
        match self {
            Preset::TwoCharges => two_charges(),
            Preset::SingleBox => single_box(),
            Preset::TwoOpposingSlabs => two_opposing_slabs(),
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Preset {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Preset::ALL
            .into_iter()
            .find(|p| p.name() == s)
            .ok_or_else(|| {
                let known: Vec<&str> = Preset::ALL.iter().map(Preset::name).collect();
                Error::InvalidConfig(format!("unknown preset '{s}', expected one of {}", known.join(", ")))
            })
    }
}

fn ten_metre_box() -> BoundaryConfig {
    BoundaryConfig {
        x: [-5.0, 5.0],
        y: [-5.0, 5.0],
        z: [-5.0, 5.0],
    }
}

fn two_charges() -> ScenarioConfig {
    let body = |x: f64, q: f64| BodyConfig {
        x: vec![x, 0.0, 0.0],
        v: None,
        m: 1.0,
        q,
        radius: 0.5,
    };
    ScenarioConfig {
        name: Some("two charges".into()),
        engine: EngineConfig {
            step: StepConfig::Fixed { dt: 1e-4 },
            contact_spring: None,
        },
        parameters: ParametersConfig {
            t_end: 1.0,
            fusion_radius: 0.008,
            ..ParametersConfig::default()
        },
        boundary: Some(ten_metre_box()),
        bodies: vec![body(-2.0, 1.0), body(2.0, -1.0)],
        slabs: Vec::new(),
    }
}

fn slab_at(x: f64, charge: f64) -> SlabConfig {
    SlabConfig {
        center: vec![x, 0.0, 0.0],
        size: vec![1.0, 1.0, 1.0],
        charge,
        count: 100,
        minority_fraction: 0.1,
        particle_mass: 1.0,
    }
}

fn slab_engine() -> EngineConfig {
    EngineConfig {
        step: StepConfig::default(),
        contact_spring: Some(1e-20),
    }
}

fn single_box() -> ScenarioConfig {
    ScenarioConfig {
        name: Some("single box".into()),
        engine: slab_engine(),
        parameters: ParametersConfig {
            restitution: 0.9,
            ..ParametersConfig::default()
        },
        boundary: None,
        bodies: Vec::new(),
        slabs: vec![slab_at(0.0, 100.0)],
    }
}

fn two_opposing_slabs() -> ScenarioConfig {
    ScenarioConfig {
        name: Some("two opposing slabs".into()),
        engine: slab_engine(),
        parameters: ParametersConfig {
            restitution: 0.9,
            ..ParametersConfig::default()
        },
        boundary: Some(ten_metre_box()),
        bodies: Vec::new(),
        slabs: vec![slab_at(-1.5, 100.0), slab_at(1.5, -100.0)],
    }
}
