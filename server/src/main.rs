//! Headless host for the fragment-fall simulation.
//!
//! Reads article text, turns it into sentences, drops them into a Rapier world
//! and streams one snapshot per tick to stdout (JSON lines) or logs a summary.

mod driver;
mod emit;
mod input;

use std::fs;
use std::io::{self, BufWriter, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use fragfall_shared::{RapierWorld, Simulation, SimulationSettings, Viewport};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing_subscriber::EnvFilter;

use crate::driver::{DriverConfig, RunOutcome};
use crate::emit::{JsonLines, SnapshotSink, Summary};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Output {
    /// One JSON object per tick on stdout
    Jsonl,
    /// Periodic progress lines in the log only
    Summary,
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Falling text fragments that split on impact")]
struct Args {
    /// Article text to segment into sentences; reads stdin when omitted or "-"
    #[arg(long)]
    input: Option<PathBuf>,
    /// Viewport width in pixels
    #[arg(long, default_value_t = 800.0)]
    width: f32,
    /// Viewport height in pixels
    #[arg(long, default_value_t = 600.0)]
    height: f32,
    /// Seed for spawn placement, split jitter and sentence shuffling
    #[arg(long)]
    seed: Option<u64>,
    /// Stop after this many ticks
    #[arg(long)]
    max_ticks: Option<u64>,
    /// JSON file overriding simulation settings (missing keys keep defaults)
    #[arg(long)]
    settings: Option<PathBuf>,
    #[arg(long, value_enum, default_value_t = Output::Jsonl)]
    output: Output,
    /// Pace ticks at the simulation timestep instead of running flat out
    #[arg(long)]
    realtime: bool,
    /// Keep ticking after every fragment has left the viewport
    #[arg(long)]
    keep_running: bool,
    /// Ticks between progress lines in summary mode
    #[arg(long, default_value_t = 60)]
    summary_every: u64,
}

fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) if path != Path::new("-") => fs::read_to_string(path)
            .with_context(|| format!("reading input text from {}", path.display())),
        _ => {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .context("reading input text from stdin")?;
            Ok(text)
        }
    }
}

fn load_settings(path: Option<&Path>) -> Result<SimulationSettings> {
    let Some(path) = path else {
        return Ok(SimulationSettings::default());
    };
    let raw = fs::read_to_string(path)
        .with_context(|| format!("reading settings from {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing settings in {}", path.display()))
}

/// Run one simulation over `text`, feeding every tick to `sink`.
///
/// A simulation that refuses to start (zero-area viewport, invalid settings)
/// is logged and yields `Ok(None)`; only I/O failures are errors.
fn simulate(args: &Args, text: &str, sink: &mut dyn SnapshotSink) -> Result<Option<RunOutcome>> {
    let mut settings = load_settings(args.settings.as_deref())?;
    let seed = args
        .seed
        .or(settings.seed)
        .unwrap_or_else(rand::random);
    settings.seed = Some(seed);

    let sentences = input::prepare_sentences(text, &mut StdRng::seed_from_u64(seed));
    tracing::info!(sentences = sentences.len(), seed, "input prepared");

    let physics = RapierWorld::from_settings(&settings);
    let viewport = Viewport::new(args.width, args.height);
    let mut sim = match Simulation::start(physics, &sentences, viewport, settings) {
        Ok(sim) => sim,
        Err(err) => {
            tracing::error!(%err, "simulation not started");
            return Ok(None);
        }
    };

    let config = DriverConfig {
        max_ticks: args.max_ticks,
        realtime: args.realtime,
        stop_when_empty: !args.keep_running,
    };
    let outcome = driver::run(&mut sim, config, sink);

    // Release the world before reporting, whatever the outcome.
    sim.teardown();
    outcome.map(Some)
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Logs go to stderr so the snapshot stream on stdout stays parseable.
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let text = read_input(args.input.as_deref())?;
    let mut sink: Box<dyn SnapshotSink> = match args.output {
        Output::Jsonl => Box::new(JsonLines::new(BufWriter::new(io::stdout().lock()))),
        Output::Summary => Box::new(Summary::new(args.summary_every)),
    };

    simulate(&args, &text, sink.as_mut())?;
    Ok(())
}
