pub mod states;
pub mod params;
pub mod forces;
pub mod integrator;
pub mod timestep;
pub mod energy;
pub mod merge;
pub mod engine;
pub mod scenario;
pub mod tracker;
pub mod pendulum;
