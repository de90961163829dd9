use approx::assert_relative_eq;

use chargesim::simulation::energy::{kinetic_energy, potential_energy};
use chargesim::simulation::timestep::Phase;
use chargesim::{euler_step, merge_pair, reflect, try_merge_all};
use chargesim::{Boundary, Coulomb, Engine, ForceSet, ForceTerm, Limits, NVec3, Parameters, Particle, Polarity};
use chargesim::{EnergySeries, Preset, RunState, Scenario, ScenarioConfig, StepPolicy, K_COULOMB};
use chargesim::{run_pendulum, PendulumRig, PendulumRun, PositionTable, SpringPendulum};

/// Build a charge at `x` with unit mass
pub fn charge(id: u32, x: NVec3, q: f64) -> Particle {
    Particle::new(id, x, NVec3::zeros(), 1.0, q, 0.001).unwrap()
}

/// Two charges separated along the x-axis, centred on the origin
pub fn two_charges(dist: f64, q1: f64, q2: f64) -> Vec<Particle> {
    vec![
        charge(0, NVec3::new(-dist / 2.0, 0.0, 0.0), q1),
        charge(1, NVec3::new(dist / 2.0, 0.0, 0.0), q2),
    ]
}

pub fn ten_metre_box() -> Boundary {
    Boundary::new([-5.0, 5.0], [-5.0, 5.0], [-5.0, 5.0]).unwrap()
}

/// Coulomb-only engine with a fixed step
pub fn fixed_engine(particles: Vec<Particle>, dt: f64) -> Engine {
    let params = Parameters {
        step: StepPolicy::Fixed(dt),
        fusion_radius: 0.008,
        ..Parameters::default()
    };
    Engine::new(particles, ForceSet::new().with(Coulomb), Some(ten_metre_box()), params).unwrap()
}

/// Same setup as `fixed_engine` with a 1e-3 step, error left to the caller
pub fn fixed_engine_result(particles: Vec<Particle>) -> chargesim::Result<Engine> {
    let params = Parameters {
        step: StepPolicy::Fixed(1e-3),
        ..Parameters::default()
    };
    Engine::new(particles, ForceSet::new().with(Coulomb), Some(ten_metre_box()), params)
}

// ==================================================================================
// Force tests
// ==================================================================================

#[test]
fn coulomb_newton_third_law() {
    let cases = [(1.0, -1.0), (2e-6, 3e-6), (-5.0, 0.25)];
    for (q1, q2) in cases {
        let a = charge(0, NVec3::new(0.3, -1.2, 0.7), q1);
        let b = charge(1, NVec3::new(-0.4, 0.5, 2.0), q2);

        let f_ab = Coulomb.force(&a, std::slice::from_ref(&b));
        let f_ba = Coulomb.force(&b, std::slice::from_ref(&a));

        let net = f_ab + f_ba;
        assert!(net.norm() <= 1e-12 * f_ab.norm(), "Net force not zero: {:?}", net);
    }
}

#[test]
fn coulomb_inverse_square_law() {
    let near = two_charges(1.0, 1e-6, 1e-6);
    let far = two_charges(2.0, 1e-6, 1e-6);

    let f_near = Coulomb.force(&near[0], &near);
    let f_far = Coulomb.force(&far[0], &far);

    let ratio = f_near.norm() / f_far.norm();
    assert_relative_eq!(ratio, 4.0, max_relative = 1e-12);
    assert_relative_eq!(f_near.norm(), K_COULOMB * 1e-12, max_relative = 1e-12);
}

#[test]
fn opposite_charges_attract_across_four_units() {
    let ps = two_charges(4.0, 1.0, -1.0);

    let f0 = Coulomb.force(&ps[0], &ps);
    let f1 = Coulomb.force(&ps[1], &ps);
    let toward_1 = ps[1].x - ps[0].x;

    assert!(f0.dot(&toward_1) > 0.0, "force on 0 does not point at 1");
    assert!(f1.dot(&-toward_1) > 0.0, "force on 1 does not point at 0");
}

// ==================================================================================
// Integrator tests
// ==================================================================================

#[test]
fn damper_lowers_kinetic_energy() {
    let mut p = charge(0, NVec3::zeros(), 1.0);
    p.v = NVec3::new(120.0, -80.0, 30.0);
    let before = p.kinetic_energy();

    let out = euler_step(&p, NVec3::new(1.0, 0.0, 0.0), 1e-4, None, &Limits::default());

    assert!(out.damped);
    assert!(out.particle.kinetic_energy() < before);
}

#[test]
fn reflection_always_contains() {
    let b = Boundary::new([-1.0, 2.0], [0.0, 1.0], [-3.0, -2.0]).unwrap();
    let coords = [-100.0, -3.5, -1.0, 0.0, 0.5, 1.5, 2.0, 7.0, 1e6];

    for &x in &coords {
        for &y in &coords {
            for &z in &coords {
                let mut pos = NVec3::new(x, y, z);
                let mut vel = NVec3::new(1.0, -2.0, 3.0);
                reflect(&mut pos, &mut vel, &b, 0.8);
                for k in 0..3 {
                    let [lo, hi] = b.axis(k);
                    assert!(pos[k] >= lo && pos[k] <= hi, "axis {k} escaped: {:?}", pos);
                }
            }
        }
    }
}

// ==================================================================================
// Merge tests
// ==================================================================================

#[test]
fn merge_conserves_momentum() {
    let mut a = Particle::new(0, NVec3::zeros(), NVec3::new(1.0, 2.0, -3.0), 2.0, 1.0, 0.01).unwrap();
    let b = Particle::new(1, NVec3::new(0.001, 0.0, 0.0), NVec3::new(-4.0, 0.5, 1.0), 5.0, -2.0, 0.02).unwrap();
    let p_before = a.momentum() + b.momentum();

    merge_pair(&mut a, &b, false);

    assert_relative_eq!(a.m, 7.0);
    assert!((a.momentum() - p_before).norm() < 1e-12);
}

#[test]
fn plus_minus_pair_merges_to_neutral() {
    let mut ps = two_charges(0.005, 1.0, -1.0);

    let events = try_merge_all(&mut ps, 0.008, false);

    assert_eq!(events.len(), 1);
    assert_eq!(ps.len(), 1);
    assert_eq!(ps[0].q, 0.0);
    assert_eq!(ps[0].polarity(), Polarity::Neutral);
    assert_relative_eq!(ps[0].stored_energy, K_COULOMB * 1.0 * -1.0 / 0.005, max_relative = 1e-12);
}

#[test]
fn merge_keeps_potential_energy_books_balanced() {
    let mut ps = two_charges(0.004, 2e-6, -1e-6);
    let before = potential_energy(&ps);

    try_merge_all(&mut ps, 0.008, false);

    assert_eq!(ps.len(), 1);
    assert_relative_eq!(potential_energy(&ps), before, max_relative = 1e-12);
}

// ==================================================================================
// Engine tests
// ==================================================================================

#[test]
fn one_step_moves_opposite_charges_toward_each_other() {
    let mut engine = Scenario::build(Preset::TwoCharges.config()).unwrap().into_engine().unwrap();

    let report = engine.step().unwrap();
    assert_relative_eq!(report.dt, 1e-4);

    let ps = engine.particles();
    assert_eq!(ps.len(), 2);
    assert!(ps[0].v.x > 0.0, "left charge should move right");
    assert!(ps[1].v.x < 0.0, "right charge should move left");
    assert_eq!(ps[0].v.y, 0.0);
    assert_eq!(ps[1].v.z, 0.0);
}

#[test]
fn step_result_does_not_depend_on_particle_order() {
    let forward = vec![
        charge(0, NVec3::new(-1.0, 0.0, 0.0), 1e-5),
        charge(1, NVec3::new(0.5, 0.3, 0.0), -2e-5),
        charge(2, NVec3::new(0.2, -0.8, 0.4), 3e-5),
    ];
    let reversed: Vec<Particle> = forward.iter().rev().cloned().collect();

    let mut e1 = fixed_engine(forward, 1e-3);
    let mut e2 = fixed_engine(reversed, 1e-3);
    for _ in 0..3 {
        e1.step();
        e2.step();
    }

    for p in e1.particles() {
        let q = e2.particles().iter().find(|q| q.id == p.id).unwrap();
        assert!((p.x - q.x).norm() < 1e-12, "particle {} diverged", p.id);
        assert!((p.v - q.v).norm() < 1e-9);
    }
}

#[test]
fn time_strictly_increases_with_positive_dt() {
    let mut cfg = Preset::SingleBox.config();
    cfg.parameters.max_steps = Some(40);
    let mut engine = Scenario::build(cfg).unwrap().into_engine().unwrap();

    let mut last_t = engine.time();
    while let Some(report) = engine.step() {
        assert!(report.dt > 0.0);
        assert!(report.energy.t > last_t);
        last_t = report.energy.t;
    }
    assert_eq!(engine.state(), RunState::Stopped);
    assert_eq!(engine.steps(), 40);
}

#[test]
fn slab_run_only_loses_particles_by_merging() {
    let mut cfg = Preset::SingleBox.config();
    cfg.parameters.max_steps = Some(25);
    let mut engine = Scenario::build(cfg).unwrap().into_engine().unwrap();
    let start = engine.particles().len();

    let mut series = EnergySeries::default();
    let summary = engine.run(&mut series).unwrap();

    assert_eq!(summary.particles_left + summary.merges, start);
    assert_eq!(series.samples().len(), 25);
    assert!(series.samples().iter().all(|s| s.total.is_finite()));
}

#[test]
fn neutralised_pair_lets_the_run_settle() {
    let params = Parameters {
        step: StepPolicy::Fixed(1e-4),
        fusion_radius: 0.008,
        settle_energy: 1e-6,
        settle_after: 0.0,
        ..Parameters::default()
    };
    let mut engine = Engine::new(two_charges(0.005, 1e-9, -1e-9), ForceSet::new().with(Coulomb), None, params).unwrap();

    let report = engine.step().unwrap();
    assert_eq!(report.merges.len(), 1);
    assert!(kinetic_energy(engine.particles()) < 1e-6);
    assert_eq!(report.state, RunState::Settled);
    assert!(engine.step().is_none());
}

#[test]
fn tampered_particle_rejected_at_setup() {
    let mut ps = two_charges(1.0, 1e-6, -1e-6);
    ps[1].m = 0.0;
    let err = fixed_engine_result(ps).err().unwrap();
    assert!(err.to_string().contains("mass"));

    let mut ps = two_charges(1.0, 1e-6, -1e-6);
    ps[0].radius = -0.5;
    let err = fixed_engine_result(ps).err().unwrap();
    assert!(err.to_string().contains("radius"));

    let mut ps = two_charges(1.0, 1e-6, -1e-6);
    ps[0].x.z = f64::INFINITY;
    assert!(fixed_engine_result(ps).is_err());
}

#[test]
fn merging_the_last_negative_charge_switches_to_energy_steps() {
    let params = Parameters {
        fusion_radius: 0.008,
        ..Parameters::default()
    };
    let mut engine = Engine::new(two_charges(0.005, 1e-9, -1e-9), ForceSet::new().with(Coulomb), None, params).unwrap();
    assert_eq!(engine.timestep_phase(), Phase::PairwiseMinimum);

    // pairwise-minimum step from d = 0.005, then the pair fuses
    let first = engine.step().unwrap();
    assert_relative_eq!(first.dt, 0.005 * 0.005, max_relative = 1e-9);
    assert_eq!(first.merges.len(), 1);
    assert_eq!(engine.timestep_phase(), Phase::PairwiseMinimum);

    // no negative charge left: the next step is energy based and stays so
    engine.step().unwrap();
    assert_eq!(engine.timestep_phase(), Phase::EnergyBased);
    engine.step().unwrap();
    assert_eq!(engine.timestep_phase(), Phase::EnergyBased);
}

// ==================================================================================
// Spring pendulum tests
// ==================================================================================

#[test]
fn unforced_pendulum_keeps_its_energy() {
    let rig = PendulumRig::default();
    let mut p = SpringPendulum::from_rig(&rig, NVec3::new(0.0, -0.425, -0.003), NVec3::new(-0.02333, 0.33167, -0.105))
        .unwrap();
    let e0 = p.energy().total();
    let run = PendulumRun {
        end_time: 3.0,
        ..PendulumRun::for_rig(&rig)
    };

    let mut series = EnergySeries::with_stride(10);
    run_pendulum(&mut p, &run, &mut series, &mut PositionTable::default()).unwrap();

    for s in series.samples() {
        assert!((s.total - e0).abs() < 0.01 * e0.abs(), "t = {}: {} vs {}", s.t, s.total, e0);
    }
    assert!(series.max_total_drift() < 0.02 * e0.abs());
}

// ==================================================================================
// Configuration tests
// ==================================================================================

#[test]
fn yaml_scenario_builds_an_engine() {
    let yaml = r#"
name: yaml pair
engine:
  step:
    policy: fixed
    dt: 1.0e-4
parameters:
  t_end: 0.001
boundary:
  x: [-5.0, 5.0]
  y: [-5.0, 5.0]
  z: [-5.0, 5.0]
bodies:
  - x: [-2.0, 0.0, 0.0]
    q: 1.0e-6
    radius: 0.1
  - x: [2.0, 0.0, 0.0]
    v: [0.0, 1.0, 0.0]
    q: -1.0e-6
    radius: 0.1
"#;
    let cfg = ScenarioConfig::from_yaml_str(yaml).unwrap();
    let mut engine = Scenario::build(cfg).unwrap().into_engine().unwrap();
    let summary = engine.run(&mut EnergySeries::default()).unwrap();

    assert_eq!(summary.state, RunState::Stopped);
    assert!(summary.steps >= 10 && summary.steps <= 11);
}

#[test]
fn non_positive_mass_fails_at_setup() {
    let yaml = "bodies:\n  - x: [0.0, 0.0, 0.0]\n    m: -1.0\n    q: 1.0\n    radius: 0.1\n";
    let cfg = ScenarioConfig::from_yaml_str(yaml).unwrap();
    let err = Scenario::build(cfg).err().unwrap();
    assert!(err.to_string().contains("mass"));
}

#[test]
fn bundled_scenarios_load() {
    let dir = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("scenarios");
    for file in ["two_charges.yaml", "opposing_slabs.yaml"] {
        let cfg = ScenarioConfig::from_yaml_file(dir.join(file)).unwrap();
        let s = Scenario::build(cfg).unwrap();
        assert!(s.boundary.is_some(), "{file} has no boundary");
    }
}
