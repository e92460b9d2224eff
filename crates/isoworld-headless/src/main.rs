//! Headless chapter runner.
//!
//! Loads a chapter catalog, steps the simulation with a fixed delta and a
//! constant player input, and prints one snapshot per tick as a JSON line on
//! stdout. Logs, including the closing grid and state hashes, go to stderr.

use std::fs;
use std::io::{self, BufWriter, Write};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use glam::Vec2;
use isoworld_core::{hash_simulation, terra, ChapterCatalog, LoopConfig, PlayerInput, Simulation};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const DEFAULT_DT: f32 = 1.0 / 60.0;

/// Step an isoworld chapter headlessly and print per-tick snapshots.
///
/// Snapshots are written to stdout as JSON lines. Set `RUST_LOG` to adjust
/// log verbosity; logs are written to stderr.
#[derive(Debug, Clone, PartialEq, Parser)]
#[command(name = "isoworld-headless")]
struct RunOptions {
    /// Path to the chapter catalog JSON
    #[arg(long)]
    catalog: String,
    /// Chapter id to load from the catalog
    #[arg(long)]
    chapter: String,
    /// Number of ticks to run
    #[arg(long)]
    ticks: u64,
    /// Fixed frame delta in seconds
    #[arg(long, default_value_t = DEFAULT_DT, value_parser = parse_dt)]
    dt: f32,
    /// Constant player movement direction
    #[arg(
        long,
        value_name = "X,Y",
        default_value = "0,0",
        allow_hyphen_values = true,
        value_parser = parse_vec2
    )]
    input: Vec2,
    /// Simulation RNG seed
    #[arg(long, default_value_t = 0)]
    seed: u64,
}

fn main() -> ExitCode {
    let options = RunOptions::parse();
    init_tracing();

    match run(&options) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %format!("{err:#}"), "run_failed");
            ExitCode::from(1)
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .with_writer(io::stderr)
        .init();
}

fn run(options: &RunOptions) -> Result<()> {
    let raw = fs::read_to_string(&options.catalog)
        .with_context(|| format!("reading catalog '{}'", options.catalog))?;
    let catalog = ChapterCatalog::from_json(&raw)
        .with_context(|| format!("parsing catalog '{}'", options.catalog))?;
    let world = catalog
        .load(&options.chapter)
        .with_context(|| format!("loading chapter '{}'", options.chapter))?;
    let grid_hash = terra::hash_grid(world.grid());

    let loop_config = LoopConfig {
        seed: options.seed,
        ..LoopConfig::default()
    };
    let mut sim = Simulation::new(Arc::new(world), loop_config);
    let input = PlayerInput::moving(options.input);

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    for _ in 0..options.ticks {
        sim.step(options.dt, &input);
        serde_json::to_writer(&mut out, &sim.snapshot()).context("writing snapshot")?;
        out.write_all(b"\n").context("writing snapshot")?;
    }

    out.flush().context("flushing stdout")?;

    let state_hash = hash_simulation(&sim);
    info!(
        chapter = %options.chapter,
        ticks = sim.tick(),
        seed = sim.seed(),
        entities = sim.registry().entity_count(),
        grid_hash,
        state_hash,
        "run_finished"
    );
    Ok(())
}

fn parse_dt(raw: &str) -> Result<f32, String> {
    let dt = raw
        .parse::<f32>()
        .map_err(|_| format!("invalid delta '{raw}' (expected seconds)"))?;
    if !dt.is_finite() || dt < 0.0 {
        return Err(format!("invalid delta '{raw}' (expected non-negative seconds)"));
    }
    Ok(dt)
}

fn parse_vec2(raw: &str) -> Result<Vec2, String> {
    let (x, y) = raw
        .split_once(',')
        .ok_or_else(|| format!("invalid vector '{raw}' (expected x,y)"))?;
    let x = x
        .trim()
        .parse::<f32>()
        .map_err(|_| format!("invalid x component '{x}'"))?;
    let y = y
        .trim()
        .parse::<f32>()
        .map_err(|_| format!("invalid y component '{y}'"))?;
    if !x.is_finite() || !y.is_finite() {
        return Err(format!("invalid vector '{raw}' (components must be finite)"));
    }
    Ok(Vec2::new(x, y))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    fn parse(args: &[&str]) -> Result<RunOptions, clap::Error> {
        RunOptions::try_parse_from(std::iter::once("isoworld-headless").chain(args.iter().copied()))
    }

    #[test]
    fn parses_required_and_optional_flags() {
        let options = parse(&[
            "--catalog",
            "chapters.json",
            "--chapter",
            "cave",
            "--ticks",
            "120",
            "--dt",
            "0.02",
            "--input",
            "-1, 0.5",
            "--seed",
            "9",
        ])
        .unwrap();

        assert_eq!(options.catalog, "chapters.json");
        assert_eq!(options.chapter, "cave");
        assert_eq!(options.ticks, 120);
        assert!((options.dt - 0.02).abs() < f32::EPSILON);
        assert_eq!(options.input, Vec2::new(-1.0, 0.5));
        assert_eq!(options.seed, 9);
    }

    #[test]
    fn defaults_apply_when_optional_flags_missing() {
        let options = parse(&["--catalog", "c.json", "--chapter", "a", "--ticks", "1"]).unwrap();
        assert!((options.dt - DEFAULT_DT).abs() < 1e-6);
        assert_eq!(options.input, Vec2::ZERO);
        assert_eq!(options.seed, 0);
    }

    #[test]
    fn missing_required_flag_is_rejected() {
        let err = parse(&["--catalog", "c.json", "--ticks", "1"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
        assert!(err.to_string().contains("--chapter"));
    }

    #[test]
    fn malformed_values_are_rejected() {
        let base = ["--catalog", "c.json", "--chapter", "a"];
        let with = |extra: &[&str]| {
            let args: Vec<&str> = base.iter().chain(extra).copied().collect();
            parse(&args)
        };
        assert!(with(&["--ticks", "many"]).is_err());
        assert!(with(&["--ticks", "1", "--dt", "-1"]).is_err());
        assert!(with(&["--ticks", "1", "--dt", "inf"]).is_err());
        assert!(with(&["--ticks", "1", "--input", "1;2"]).is_err());
        assert!(with(&["--ticks", "1", "--input", "NaN,0"]).is_err());
    }

    #[test]
    fn unknown_flag_is_rejected() {
        let err = parse(&["--speed", "2"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownArgument);
    }

    #[test]
    fn vector_parser_trims_components() {
        assert_eq!(parse_vec2(" 2 ,-3 "), Ok(Vec2::new(2.0, -3.0)));
        assert!(parse_vec2("1,2,3").is_err());
    }
}
