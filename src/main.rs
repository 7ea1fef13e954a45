use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use rflock::{fastest, run_variant, time_variants, FlockParams, RunConfig, Variant};
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "rflock",
    version,
    about = "Time the boids neighbor searches, then run the fastest one"
)]
struct Cli {
    /// Number of agents.
    #[arg(long, default_value_t = 50)]
    flock_size: usize,

    /// Recorded frames, the initial state included.
    #[arg(long, default_value_t = 100)]
    steps: usize,

    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Skip timing and run this variant (brute-force, grid or kd-tree).
    #[arg(long)]
    variant: Option<Variant>,

    /// JSON file with flock parameters; missing fields keep their defaults.
    #[arg(long)]
    params: Option<PathBuf>,

    /// Steps integrated per timing probe.
    #[arg(long, default_value_t = 1)]
    probe_steps: usize,

    /// Timing probes per variant.
    #[arg(long, default_value_t = 3)]
    repeat: usize,

    /// Write the trajectory JSON here instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let params = load_params(cli.params.as_ref())?;
    params.validate().context("invalid flock parameters")?;

    let run = RunConfig {
        flock_size: cli.flock_size,
        steps: cli.steps,
        seed: cli.seed,
    };

    let variant = match cli.variant {
        Some(variant) => {
            info!(%variant, "using requested variant");
            variant
        }
        None => select_variant(&params, &run, cli.probe_steps, cli.repeat)?,
    };

    info!(
        %variant,
        flock_size = run.flock_size,
        steps = run.steps,
        seed = run.seed,
        "running simulation"
    );
    let history = run_variant(variant, &params, &run)?;

    let json = serde_json::to_string(&history)?;
    match &cli.output {
        Some(path) => {
            fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
            info!(path = %path.display(), frames = history.len(), "trajectory written");
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(json.as_bytes())?;
            stdout.write_all(b"\n")?;
        }
    }
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .try_init();
}

fn load_params(path: Option<&PathBuf>) -> Result<FlockParams> {
    let Some(path) = path else {
        return Ok(FlockParams::default());
    };
    let raw = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}

fn select_variant(params: &FlockParams, run: &RunConfig, probe_steps: usize, repeat: usize) -> Result<Variant> {
    let probe = RunConfig {
        steps: probe_steps + 1,
        ..run.clone()
    };
    let timings = time_variants(params, &probe, repeat)?;
    for timing in &timings {
        info!(variant = %timing.variant, mean = ?timing.mean, "probe timing");
    }
    let variant = fastest(&timings).unwrap_or(Variant::Grid);
    info!(%variant, "selected fastest variant");
    Ok(variant)
}
