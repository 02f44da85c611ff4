//! Subcommand implementations: config/model assembly, replay, live run,
//! libsvm export and self-check.

use crate::cli::{Activity, JSON_MODE};
use crate::error_fmt::ConfigError;
use crate::sink::JsonLinesSink;
use eyre::WrapErr;
use serde_json::json;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tripmode_config::{Config, LinearModel, SimActivity};
use tripmode_core::conversions::runner_timing;
use tripmode_core::{
    ActivityLabel, ClassificationEngine, EngineCfg, EngineError, Ingestor, NormalizationParams,
    RecordCommand, Recorder, Runner, WindowSpec,
};
use tripmode_sensors::{Motion, SimulatedImu, SimulationSettings};
use tripmode_traits::clock::{Clock, MonotonicClock};
use tripmode_traits::Channel;

fn json_mode() -> bool {
    JSON_MODE.get().copied().unwrap_or(false)
}

fn relative_to(base: &Path, p: &Path) -> PathBuf {
    if p.is_absolute() { p.to_path_buf() } else { base.join(p) }
}

/// Read, parse and validate the config. Relative paths inside it resolve
/// against the config file's directory.
pub fn load_config(path: &Path) -> eyre::Result<Config> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::wrap(&format!("read {}", path.display()), e))?;
    let mut cfg = tripmode_config::load_toml(&text)
        .map_err(|e| ConfigError::wrap(&format!("parse {}", path.display()), e))?;
    cfg.validate()
        .map_err(|e| ConfigError::wrap(&path.display().to_string(), e))?;

    let base = path.parent().unwrap_or_else(|| Path::new("."));
    cfg.normalization.file = cfg.normalization.file.map(|p| relative_to(base, &p));
    cfg.model.path = cfg.model.path.map(|p| relative_to(base, &p));
    Ok(cfg)
}

pub fn load_classifier(cfg: &Config) -> eyre::Result<LinearModel> {
    let path = cfg
        .model
        .path
        .as_deref()
        .ok_or_else(|| ConfigError::wrap("[model]", "path is not set"))?;
    let model = tripmode_config::load_model(path)
        .map_err(|e| ConfigError::wrap(&format!("model {}", path.display()), e))?;
    // Refuse to start with a model that can emit codes outside the label set.
    if let Some(code) = model.codes().find(|c| ActivityLabel::from_code(*c).is_none()) {
        return Err(EngineError::ModelMismatch { code }.into());
    }
    tracing::info!(path = %path.display(), classes = model.classes.len(), "model loaded");
    Ok(model)
}

pub fn normalization(cfg: &Config) -> eyre::Result<NormalizationParams> {
    let raw = cfg
        .resolve_normalization()
        .map_err(|e| ConfigError::wrap("[normalization]", e))?;
    Ok(NormalizationParams::try_from(raw)?)
}

fn build_engine(cfg: &Config) -> eyre::Result<ClassificationEngine<LinearModel>> {
    let engine = ClassificationEngine::builder()
        .with_classifier(load_classifier(cfg)?)
        .with_cfg(EngineCfg::from(cfg))
        .with_normalization(normalization(cfg)?)
        .build()?;
    Ok(engine)
}

fn tick_us(cfg: &Config, override_ms: Option<u64>) -> u64 {
    override_ms.unwrap_or(cfg.runner.tick_ms).max(1) * 1_000
}

fn motion_of(activity: SimActivity) -> Motion {
    match activity {
        SimActivity::Still => Motion::Still,
        SimActivity::Walking => Motion::Walking,
        SimActivity::Running => Motion::Running,
        SimActivity::Cycling => Motion::Cycling,
        SimActivity::Vehicle => Motion::Vehicle,
    }
}

impl From<Activity> for Motion {
    fn from(a: Activity) -> Self {
        match a {
            Activity::Still => Motion::Still,
            Activity::Walking => Motion::Walking,
            Activity::Running => Motion::Running,
            Activity::Cycling => Motion::Cycling,
            Activity::Vehicle => Motion::Vehicle,
        }
    }
}

fn sim_settings(cfg: &Config, activity: Option<Activity>) -> SimulationSettings {
    SimulationSettings {
        rate_hz: cfg.sampling.rate_hz,
        motion: activity.map_or_else(|| motion_of(cfg.simulation.activity), Motion::from),
        noise: cfg.simulation.noise,
        seed: cfg.simulation.seed,
    }
}

pub fn replay(cfg: &Config, recording: &Path, tick_ms: Option<u64>, print_ticks: bool) -> eyre::Result<()> {
    let rec = tripmode_config::load_recording_dir(recording)?;
    let engine = build_engine(cfg)?;
    let report = tripmode_core::replay_recording(&engine, &rec, tick_us(cfg, tick_ms))?;
    let stats = engine.stats();

    let mut out = std::io::stdout().lock();
    if print_ticks {
        for t in &report.ticks {
            let label = t.outcome.as_ref().map_or("ERROR", |l| l.name());
            let expected = t.expected.map(ActivityLabel::name);
            if json_mode() {
                writeln!(
                    out,
                    "{}",
                    json!({ "timestamp_us": t.now_us, "label": label, "expected": expected })
                )?;
            } else {
                writeln!(out, "{:>12} {:<8} {}", t.now_us, label, expected.unwrap_or("-"))?;
            }
        }
    }

    if json_mode() {
        writeln!(
            out,
            "{}",
            json!({
                "ticks": report.ticks.len(),
                "insufficient": report.insufficient(),
                "scored": report.scored(),
                "correct": report.correct(),
                "accuracy": report.accuracy(),
                "dropped_samples": stats.dropped_samples,
            })
        )?;
    } else {
        writeln!(
            out,
            "ticks: {}  insufficient: {}  scored: {}  correct: {}",
            report.ticks.len(),
            report.insufficient(),
            report.scored(),
            report.correct()
        )?;
        match report.accuracy() {
            Some(a) => writeln!(out, "accuracy: {:.1}%", a * 100.0)?,
            None => writeln!(out, "accuracy: n/a (no labelled ticks)")?,
        }
    }
    Ok(())
}

pub fn export_svm(cfg: &Config, recording: &Path, out: Option<&Path>, tick_ms: Option<u64>) -> eyre::Result<()> {
    let rec = tripmode_config::load_recording_dir(recording)?;
    let lines = tripmode_core::export_svm(
        &rec,
        WindowSpec::from(cfg),
        cfg.buffer_capacity(),
        &normalization(cfg)?,
        tick_us(cfg, tick_ms),
    )?;
    let mut text = lines.join("\n");
    if !text.is_empty() {
        text.push('\n');
    }
    match out {
        Some(path) => std::fs::write(path, text).wrap_err_with(|| format!("write {}", path.display()))?,
        None => std::io::stdout().lock().write_all(text.as_bytes())?,
    }
    tracing::info!(rows = lines.len(), "svm export complete");
    Ok(())
}

pub struct RunOptions {
    pub duration_s: Option<f64>,
    pub activity: Option<Activity>,
    pub record: bool,
    pub interactive: bool,
}

pub fn run_live(cfg: &Config, opts: &RunOptions, shutdown: Arc<AtomicBool>) -> eyre::Result<()> {
    let engine = Arc::new(build_engine(cfg)?);
    let (period, sensor_timeout) = runner_timing(&cfg.runner);

    let clock = MonotonicClock::new();
    let epoch = clock.now();
    let imu = SimulatedImu::new(sim_settings(cfg, opts.activity), clock, epoch)?;
    let ingest = Ingestor::spawn(imu, engine.buffers(), sensor_timeout, clock);

    let (recorder, handle) = Recorder::new();
    if opts.record {
        handle.send(RecordCommand::Start);
    }
    if opts.interactive {
        let handle = handle.clone();
        // Detached: stdin reads block and end with the process.
        std::thread::spawn(move || {
            for line in std::io::stdin().lock().lines() {
                if line.is_err() || !handle.toggle() {
                    break;
                }
            }
        });
    }

    let mut runner = Runner::new(Arc::clone(&engine), recorder, JsonLinesSink::new(std::io::stdout()), period);
    if let Some(secs) = opts.duration_s {
        let deadline = Duration::try_from_secs_f64(secs.max(0.0)).unwrap_or(Duration::MAX);
        runner = runner.with_deadline(deadline);
    }
    let summary = runner.run(&clock, epoch, &shutdown);
    drop(ingest);
    let summary = summary?;

    let stats = engine.stats();
    if json_mode() {
        eprintln!(
            "{}",
            json!({
                "ticks": summary.ticks,
                "posted": summary.posted,
                "skipped": summary.skipped,
                "last": summary.last.map(ActivityLabel::name),
                "classified": stats.classified,
                "insufficient": stats.insufficient,
                "dropped_samples": stats.dropped_samples,
            })
        );
    } else {
        eprintln!(
            "ticks: {}  classified: {}  insufficient: {}  posted: {}  dropped samples: {}",
            summary.ticks, stats.classified, stats.insufficient, summary.posted, stats.dropped_samples
        );
        if let Some(last) = summary.last {
            eprintln!("last activity: {last}");
        }
    }
    Ok(())
}

/// Feed one window of simulated data straight into a fresh engine and
/// classify it once, without threads or real time.
pub fn self_check(cfg: &Config) -> eyre::Result<()> {
    let engine = build_engine(cfg)?;
    let clock = MonotonicClock::new();
    let mut imu = SimulatedImu::new(sim_settings(cfg, None), clock, clock.now())?;
    let spec = engine.spec();
    let events = (spec.expected_count + 1) * Channel::ALL.len();
    for _ in 0..events {
        engine.push(imu.next_event());
    }
    let now_us = spec.duration_us;
    let label = engine.classify(now_us)?;

    if json_mode() {
        println!(
            "{}",
            json!({
                "status": "ok",
                "rate_hz": cfg.sampling.rate_hz,
                "window_us": spec.duration_us,
                "min_samples": spec.min_samples(),
                "label": label.name(),
            })
        );
    } else {
        println!("ok: window {} us, min {} samples/channel, sample label {label}", spec.duration_us, spec.min_samples());
    }
    Ok(())
}

/// Wire Ctrl-C to the shared shutdown flag.
pub fn install_ctrlc(shutdown: &Arc<AtomicBool>) {
    let flag = Arc::clone(shutdown);
    if let Err(e) = ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst)) {
        tracing::warn!(error = %e, "failed to install Ctrl-C handler; continuing without it");
    }
}
