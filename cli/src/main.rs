//! `crowdtrack` CLI: scenario runs, replay import/export, seed sweeps.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use crowd_core::config::{EngineConfig, InputMapping};
use crowd_core::metrics::TrackingMetrics;
use crowd_core::pipeline::Engine;
use crowd_core::sink::TrackSink;
use crowd_core::types::{ClusterHandle, SlotIndex};
use rayon::prelude::*;
use sim::replay::{load_replay, save_replay, GroundTruthFrame, ReplayLog};
use sim::scenarios::{Scenario, ScenarioKind};
use sim::sensor::{DetectionSimulator, SensorFrame};
use std::path::{Path, PathBuf};
use tracing::info;

/// Truth ↔ track distance under which a track counts as a hit.
const MATCH_DISTANCE: f32 = 0.5;

#[derive(Parser)]
#[command(name = "crowdtrack", about = "Crowd tracking and clustering engine CLI")]
struct Cli {
    /// Engine configuration JSON; missing fields keep their defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a named scenario in batch mode and output metrics.
    RunScenario {
        #[arg(value_enum)]
        scenario: ScenarioKind,
        /// Random seed for reproducibility
        #[arg(long, default_value_t = 42)]
        seed: u64,
        /// Sensor emits [0, 1]-normalized coordinates
        #[arg(long)]
        normalized: bool,
        /// Output metrics to a JSON file
        #[arg(long)]
        output: Option<PathBuf>,
        /// Also save the full replay log
        #[arg(long)]
        save_replay: Option<PathBuf>,
    },
    /// Load and replay a previously recorded scenario log.
    Replay {
        /// Path to replay JSON file
        input: PathBuf,
        /// Output metrics to a JSON file
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Run one scenario over many seeds in parallel.
    Sweep {
        #[arg(value_enum)]
        scenario: ScenarioKind,
        /// First seed
        #[arg(long, default_value_t = 0)]
        seed: u64,
        /// Number of consecutive seeds
        #[arg(long, default_value_t = 16)]
        count: u64,
        /// Output per-seed metrics to a JSON file
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Print the effective engine configuration as JSON.
    PrintConfig,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::RunScenario {
            scenario,
            seed,
            normalized,
            output,
            save_replay: save_path,
        } => {
            run_scenario(
                config,
                scenario,
                seed,
                normalized,
                output.as_deref(),
                save_path.as_deref(),
            )?;
        }
        Commands::Replay { input, output } => {
            run_replay(config, &input, output.as_deref())?;
        }
        Commands::Sweep {
            scenario,
            seed,
            count,
            output,
        } => {
            run_sweep(config, scenario, seed, count, output.as_deref())?;
        }
        Commands::PrintConfig => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }

    Ok(())
}

/// Defaults, overlaid with the JSON file if given, then validated.
fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    let config = match path {
        Some(p) => {
            let text = std::fs::read_to_string(p)
                .with_context(|| format!("reading config {}", p.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("parsing config {}", p.display()))?
        }
        None => EngineConfig::default(),
    };
    config.validate()?;
    Ok(config)
}

// ---------------------------------------------------------------------------
// Sink: counts side effects for the run summary
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct EventTally {
    track_appear: u64,
    track_disappear: u64,
    track_update: u64,
    cluster_appear: u64,
    cluster_disappear: u64,
}

impl TrackSink for EventTally {
    fn on_track_appear(&mut self, _index: SlotIndex) {
        self.track_appear += 1;
    }
    fn on_track_update(&mut self, _index: SlotIndex, _position: crowd_core::Vec2) {
        self.track_update += 1;
    }
    fn on_track_disappear(&mut self, _index: SlotIndex) {
        self.track_disappear += 1;
    }
    fn on_cluster_appear(&mut self, _handle: ClusterHandle) {
        self.cluster_appear += 1;
    }
    fn on_cluster_disappear(&mut self, _handle: ClusterHandle) {
        self.cluster_disappear += 1;
    }
}

// ---------------------------------------------------------------------------
// Simulation
// ---------------------------------------------------------------------------

struct RunResult {
    engine: Engine<EventTally>,
    metrics: TrackingMetrics,
    frames: Vec<SensorFrame>,
    ground_truth: Vec<GroundTruthFrame>,
    max_clusters_seen: usize,
    elapsed_s: f64,
}

/// Step the scenario; submit detections when the sensor fires and tick the
/// engine every step.
fn simulate(config: EngineConfig, mut scenario: Scenario, record: bool) -> Result<RunResult> {
    let mut sensor =
        DetectionSimulator::new(scenario.sensor.clone(), scenario.bounds, scenario.seed);
    let mut engine = Engine::new(config, EventTally::default())?;
    let mut metrics = TrackingMetrics::new();
    let mut frames = Vec::new();
    let mut ground_truth = Vec::new();
    let mut max_clusters_seen = 0;

    let dt = scenario.sim_dt;
    let duration = scenario.duration;
    let mut sim_time = 0.0f64;
    let start = std::time::Instant::now();

    while sim_time < duration {
        scenario.step(dt);
        sim_time += dt;

        let truth = scenario.ground_truth(sim_time);
        if let Some(frame) = sensor.generate(&scenario.walkers, sim_time) {
            engine.submit_flat(&frame.payload, frame.time);
            if record {
                frames.push(frame);
            }
        }
        let clusters = engine.advance(sim_time);
        max_clusters_seen = max_clusters_seen.max(clusters.len());
        metrics.accumulate(&engine.active_tracks(), &truth, MATCH_DISTANCE);

        if record {
            ground_truth.push(GroundTruthFrame {
                time: sim_time,
                targets: truth,
            });
        }
    }

    Ok(RunResult {
        engine,
        metrics,
        frames,
        ground_truth,
        max_clusters_seen,
        elapsed_s: start.elapsed().as_secs_f64(),
    })
}

fn summary_json(name: &str, seed: u64, run: &RunResult) -> serde_json::Value {
    let tally = run.engine.sink();
    serde_json::json!({
        "scenario": name,
        "seed": seed,
        "elapsed_s": run.elapsed_s,
        "final_tracks": run.engine.active_count(),
        "final_clusters": run.engine.clusters().len(),
        "max_clusters": run.max_clusters_seen,
        "track_appear": tally.track_appear,
        "track_disappear": tally.track_disappear,
        "track_update": tally.track_update,
        "cluster_appear": tally.cluster_appear,
        "cluster_disappear": tally.cluster_disappear,
        "rmse_position": run.metrics.rmse_position(),
        "precision": run.metrics.precision(),
        "recall": run.metrics.recall(),
        "id_switches": run.metrics.id_switches,
    })
}

fn run_scenario(
    mut config: EngineConfig,
    kind: ScenarioKind,
    seed: u64,
    normalized: bool,
    output_path: Option<&Path>,
    replay_path: Option<&Path>,
) -> Result<()> {
    let mut scenario = Scenario::build(kind, seed);
    if normalized {
        scenario.sensor.normalized = true;
        config.input_mapping = InputMapping::Normalized;
    }
    let name = scenario.name.clone();
    let sim_dt = scenario.sim_dt;
    let duration = scenario.duration;

    println!(
        "Running scenario '{}' (seed={}, duration={:.0}s, strategy={:?})...",
        name, seed, duration, config.clustering.mode
    );

    let run = simulate(config, scenario, replay_path.is_some())?;

    println!(
        "Done: {} ticks, {} tracks alive, {} clusters, elapsed={:.2}s",
        (duration / sim_dt) as u64,
        run.engine.active_count(),
        run.engine.clusters().len(),
        run.elapsed_s,
    );
    println!(
        "Metrics: rmse={:.3} precision={:.3} recall={:.3} id_switches={}",
        run.metrics.rmse_position(),
        run.metrics.precision(),
        run.metrics.recall(),
        run.metrics.id_switches,
    );

    let summary = summary_json(&name, seed, &run);

    // Save replay if requested
    if let Some(rpath) = replay_path {
        let log = ReplayLog {
            scenario_name: name,
            seed,
            sim_dt,
            duration,
            normalized,
            frames: run.frames,
            ground_truth: run.ground_truth,
        };
        save_replay(&log, rpath)?;
        println!("Replay saved to {}", rpath.display());
    }

    // Output metrics
    if let Some(opath) = output_path {
        std::fs::write(opath, serde_json::to_string_pretty(&summary)?)?;
        println!("Metrics saved to {}", opath.display());
    }

    Ok(())
}

fn run_replay(mut config: EngineConfig, input: &Path, output_path: Option<&Path>) -> Result<()> {
    let log = load_replay(input)?;
    println!(
        "Replaying '{}' ({} frames)...",
        log.scenario_name,
        log.frames.len()
    );
    if log.normalized {
        config.input_mapping = InputMapping::Normalized;
    }

    let mut engine = Engine::new(config, EventTally::default())?;
    let mut metrics = TrackingMetrics::new();
    let start = std::time::Instant::now();

    let mut pending = log.frames.iter().peekable();
    for gt in &log.ground_truth {
        while let Some(frame) = pending.next_if(|f| f.time <= gt.time) {
            engine.submit_flat(&frame.payload, frame.time);
        }
        engine.advance(gt.time);
        metrics.accumulate(&engine.active_tracks(), &gt.targets, MATCH_DISTANCE);
    }

    let elapsed = start.elapsed();
    println!(
        "Replay done: {} tracks alive, {} clusters, elapsed={:.2}s",
        engine.active_count(),
        engine.clusters().len(),
        elapsed.as_secs_f64()
    );

    if let Some(opath) = output_path {
        let json = serde_json::json!({
            "scenario": log.scenario_name,
            "seed": log.seed,
            "elapsed_s": elapsed.as_secs_f64(),
            "final_tracks": engine.active_count(),
            "rmse_position": metrics.rmse_position(),
            "precision": metrics.precision(),
            "recall": metrics.recall(),
            "id_switches": metrics.id_switches,
        });
        std::fs::write(opath, serde_json::to_string_pretty(&json)?)?;
    }

    Ok(())
}

/// `count` consecutive seeds starting at `first`.
fn seed_range(first: u64, count: u64) -> Result<std::ops::Range<u64>> {
    let end = first
        .checked_add(count)
        .with_context(|| format!("seed range {first} + {count} overflows u64"))?;
    Ok(first..end)
}

fn run_sweep(
    config: EngineConfig,
    kind: ScenarioKind,
    first_seed: u64,
    count: u64,
    output_path: Option<&Path>,
) -> Result<()> {
    println!("Sweeping {:?} over {} seeds...", kind, count);

    // Each seed gets its own single-threaded engine.
    let results: Vec<serde_json::Value> = seed_range(first_seed, count)?
        .into_par_iter()
        .map(|seed| -> Result<serde_json::Value> {
            let scenario = Scenario::build(kind, seed);
            let name = scenario.name.clone();
            let run = simulate(config.clone(), scenario, false)?;
            info!(seed, recall = run.metrics.recall(), "seed finished");
            Ok(summary_json(&name, seed, &run))
        })
        .collect::<Result<_>>()?;

    let mean = |key: &str| {
        let sum: f64 = results.iter().filter_map(|r| r[key].as_f64()).sum();
        sum / results.len().max(1) as f64
    };
    println!(
        "Mean over {} seeds: rmse={:.3} precision={:.3} recall={:.3} id_switches={:.1}",
        results.len(),
        mean("rmse_position"),
        mean("precision"),
        mean("recall"),
        mean("id_switches"),
    );

    if let Some(opath) = output_path {
        std::fs::write(opath, serde_json::to_string_pretty(&results)?)?;
        println!("Sweep saved to {}", opath.display());
    }

    Ok(())
}
