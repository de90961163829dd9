use chargesim::{bench_forces, bench_steps, run_pendulum, track_test_charge};
use chargesim::{Boundary, NVec3, Particle, Preset, Scenario, ScenarioConfig, TrackSettings};
use chargesim::{CsvEnergyWriter, CsvTableWriter, EnergySink, NullSink, PositionTable, TableSink};
use chargesim::{PendulumRig, PendulumRun, SpringPendulum};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "chargesim", about = "Point-charge, charged-slab and spring-pendulum simulations")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a particle scenario until it settles or its budget runs out
    Run {
        /// Named preset: two-charges, single-box, two-opposing-slabs
        #[arg(short, long, conflicts_with = "file")]
        preset: Option<String>,
        /// Scenario YAML file
        #[arg(short, long)]
        file: Option<PathBuf>,
        /// Write `t,kinetic,potential,total` per step
        #[arg(long)]
        energy_csv: Option<PathBuf>,
        /// Write final particle positions
        #[arg(long)]
        positions_csv: Option<PathBuf>,
    },
    /// Release a unit test charge next to the two-charges preset and follow it
    Track {
        #[arg(long, allow_hyphen_values = true)]
        x: f64,
        #[arg(long, allow_hyphen_values = true, default_value_t = 0.0)]
        y: f64,
        #[arg(long, allow_hyphen_values = true, default_value_t = 0.0)]
        z: f64,
        #[arg(long, default_value_t = 1e-3)]
        dt: f64,
    },
    /// Spring pendulum with the lab rig constants
    Pendulum {
        /// Write the `x,y,z,t` sample table
        #[arg(long)]
        samples_csv: Option<PathBuf>,
        /// Write `t,kinetic,potential,total` per step
        #[arg(long)]
        energy_csv: Option<PathBuf>,
        /// Amplitude of the random kick, off when omitted
        #[arg(long)]
        random_force: Option<f64>,
    },
    /// Time force evaluation and full steps over growing particle counts
    Bench,
}

// load here to keep main clean
fn load_scenario(preset: Option<String>, file: Option<PathBuf>) -> Result<ScenarioConfig> {
    match (preset, file) {
        (Some(name), None) => Ok(name.parse::<Preset>()?.config()),
        (None, Some(path)) => {
            // bare names resolve against the bundled scenarios/ dir
            let path = if path.exists() {
                path
            } else {
                PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("scenarios").join(&path)
            };
            ScenarioConfig::from_yaml_file(&path)
                .with_context(|| format!("failed to load scenario {}", path.display()))
        }
        (None, None) => Ok(Preset::TwoCharges.config()),
        (Some(_), Some(_)) => bail!("pass either --preset or --file, not both"),
    }
}

fn energy_sink(path: Option<PathBuf>) -> Result<Box<dyn EnergySink>> {
    let sink: Box<dyn EnergySink> = match path {
        Some(p) => Box::new(CsvEnergyWriter::create(&p).with_context(|| format!("cannot create {}", p.display()))?),
        None => Box::new(NullSink),
    };
    Ok(sink)
}

fn run_scenario(cfg: ScenarioConfig, energy_csv: Option<PathBuf>, positions_csv: Option<PathBuf>) -> Result<()> {
    let scenario = Scenario::build(cfg)?;
    let name = scenario.name.clone();
    let mut engine = scenario.into_engine()?;
    let mut sink = energy_sink(energy_csv)?;

    let summary = engine.run(sink.as_mut())?;
    println!(
        "{name}: {:?} at t = {:.6} after {} steps, {} merges, {} particles left",
        summary.state, summary.t, summary.steps, summary.merges, summary.particles_left
    );
    if let Some(e) = summary.final_energy {
        println!("Ek = {:.6e}, Ep = {:.6e}, Etot = {:.6e}", e.kinetic, e.potential, e.total);
    }

    if let Some(path) = positions_csv {
        let mut table = CsvTableWriter::create(&path)?;
        table.header(&[("particles", engine.particles().len() as f64)])?;
        for p in engine.particles() {
            table.row(p.x, engine.time())?;
        }
        table.finish()?;
    }
    Ok(())
}

fn run_track(x: f64, y: f64, z: f64, dt: f64) -> Result<()> {
    let cfg = Preset::TwoCharges.config();
    let sources: Vec<Particle> = Scenario::build(cfg)?.particles;
    let region = Boundary::new([-5.0, 5.0], [-5.0, 5.0], [-5.0, 5.0])?;
    let settings = TrackSettings { dt, ..TrackSettings::default() };

    let track = track_test_charge(&sources, NVec3::new(x, y, z), &region, &settings)?;
    for p in &track.points {
        println!("{:.6},{:.6},{:.6}", p.x, p.y, p.z);
    }
    println!("{:?} after t = {:.4} ({} points)", track.exit, track.t, track.points.len());
    Ok(())
}

fn run_spring_pendulum(samples_csv: Option<PathBuf>, energy_csv: Option<PathBuf>, random_force: Option<f64>) -> Result<()> {
    let rig = PendulumRig::default();
    println!(
        "Eq. length: {:.3}[m], effective mass: {:.3}[kg]",
        rig.spring_equilibrium_length(),
        rig.effective_mass()
    );

    let mut pendulum = SpringPendulum::from_rig(
        &rig,
        NVec3::new(0.0, -0.425, -0.003),
        NVec3::new(-0.02333, 0.33167, -0.105),
    )?;
    if let Some(amp) = random_force {
        pendulum = pendulum.with_random_force(amp, 42);
    }

    let run = PendulumRun::for_rig(&rig);
    let mut energy = energy_sink(energy_csv)?;
    let rows = match samples_csv {
        Some(path) => {
            let mut table = CsvTableWriter::create(&path)?;
            let rows = run_pendulum(&mut pendulum, &run, energy.as_mut(), &mut table)?;
            println!("Saved file to {}", path.display());
            rows
        }
        None => run_pendulum(&mut pendulum, &run, energy.as_mut(), &mut PositionTable::default())?,
    };
    println!("{rows} samples, final angular momentum {:.6e}", pendulum.angular_momentum());
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    match args.command {
        Command::Run { preset, file, energy_csv, positions_csv } => {
            let cfg = load_scenario(preset, file)?;
            run_scenario(cfg, energy_csv, positions_csv)
        }
        Command::Track { x, y, z, dt } => run_track(x, y, z, dt),
        Command::Pendulum { samples_csv, energy_csv, random_force } => {
            run_spring_pendulum(samples_csv, energy_csv, random_force)
        }
        Command::Bench => {
            bench_forces(&[100, 200, 400, 800, 1600]);
            bench_steps(&[100, 200, 400, 800], 10);
            Ok(())
        }
    }
}
