pub mod error;
pub mod simulation;
pub mod configuration;
pub mod output;
pub mod benchmark;

pub use error::{Error, Result};

pub use simulation::states::{Particle, Boundary, System, NVec3, ChargeRole, Polarity};
pub use simulation::params::{Parameters, Limits, K_COULOMB};
pub use simulation::forces::{ForceTerm, ForceSet, Coulomb, ContactRepulsion};
pub use simulation::integrator::{euler_step, reflect};
pub use simulation::timestep::{TimestepController, StepPolicy, AdaptiveConfig};
pub use simulation::merge::{try_merge_all, merge_pair, MergeEvent};
pub use simulation::engine::{Engine, RunState, StepReport, RunSummary};
pub use simulation::scenario::Scenario;
pub use simulation::tracker::{track_test_charge, Track, TrackExit, TrackSettings};
pub use simulation::pendulum::{PendulumRig, SpringPendulum, PendulumRun, run_pendulum};

pub use configuration::config::{ScenarioConfig, EngineConfig, ParametersConfig, BodyConfig, SlabConfig, BoundaryConfig, StepConfig};
pub use configuration::presets::Preset;

pub use output::energy::{EnergySink, EnergySeries, CsvEnergyWriter, NullSink};
pub use output::table::{TableSink, PositionTable, CsvTableWriter};

pub use benchmark::benchmark::{bench_forces, bench_steps};
