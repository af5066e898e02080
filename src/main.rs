use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use ring_traffic::{export, Policy, Session, SimulationConfig};
use std::path::PathBuf;
use std::time::Instant;

/// Sweeps vehicle counts on a ring road and writes the fundamental diagram.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Use the intelligent driver model
    #[arg(long, conflicts_with = "run_custom")]
    run_idm: bool,

    /// Use the safety-augmented driver model
    #[arg(long)]
    run_custom: bool,

    /// TOML configuration file; defaults are used for anything it omits
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory to write the data files into
    #[arg(short, long, default_value = "data")]
    output: PathBuf,

    /// Override the session seed
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => SimulationConfig::load(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => SimulationConfig::default(),
    };
    if args.run_idm {
        config.policy = Policy::Idm;
    } else if args.run_custom {
        config.policy = Policy::Custom;
    }
    if let Some(seed) = args.seed {
        config.session.seed = seed;
    }

    let policy = config.policy;
    let mut session = Session::new(config).context("Invalid configuration")?;
    // Only the IDM trajectories are kept for separate analysis.
    session.set_record_trajectory(policy == Policy::Idm);
    info!("Starting the simulator with run order {:?}", session.run_order());

    let start = Instant::now();
    let diagram = session.run().context("Simulation failed")?;
    info!("Simulated {} runs in {:?}", diagram.runs().len(), start.elapsed());
    if let Some((lo, hi)) = diagram.density_range() {
        info!("Densities range from {lo:.3} to {hi:.3} veh/m");
    }
    if let Some(capacity) = diagram.capacity() {
        info!(
            "Highest flow of {:.3} veh/s at density {:.3} veh/m",
            capacity.flow, capacity.density
        );
    }

    for path in export::write_diagram(&args.output, diagram)? {
        info!("Wrote {}", path.display());
    }
    if policy == Policy::Idm {
        let path = args.output.join(export::TRAJECTORY_FILE);
        export::write_trajectory(&path, session.trajectory())?;
        info!("Wrote {}", path.display());
    }
    Ok(())
}
