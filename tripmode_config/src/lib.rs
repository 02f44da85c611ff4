#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schemas and file loaders for the activity classifier.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//! - Normalization parameters come from a one-line `scale,offset` file.
//! - `LinearModel` is the trained classifier handed to the engine.
//! - `Recording` loads labelled per-channel CSV captures for replay/export.
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub mod model;
pub mod recording;

pub use model::{ClassWeights, LinearModel, load_model};
pub use recording::{Recording, RecordingRow, load_channel_csv, load_recording_dir};

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SamplingCfg {
    /// Requested sensor delivery rate per channel.
    pub rate_hz: u32,
}

impl Default for SamplingCfg {
    fn default() -> Self {
        Self { rate_hz: 100 }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct WindowCfg {
    /// Length of the classification window in seconds.
    pub duration_s: f64,
    /// How many samples a channel may fall short of the nominal count.
    pub slack: usize,
    /// Ring capacity per channel; derived from rate and window when absent.
    pub buffer_capacity: Option<usize>,
}

impl Default for WindowCfg {
    fn default() -> Self {
        Self {
            duration_s: 2.0,
            slack: 10,
            buffer_capacity: None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RunnerCfg {
    /// Prediction tick period.
    pub tick_ms: u64,
    /// Per-read timeout handed to the sensor source.
    pub sensor_timeout_ms: u64,
}

impl Default for RunnerCfg {
    fn default() -> Self {
        Self {
            tick_ms: 1000,
            sensor_timeout_ms: 100,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct NormalizationCfg {
    pub scale: f64,
    pub offset: f64,
    /// Optional `scale,offset` file; wins over the inline values.
    pub file: Option<PathBuf>,
}

impl Default for NormalizationCfg {
    fn default() -> Self {
        Self {
            scale: 1.0,
            offset: 0.0,
            file: None,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct ModelCfg {
    /// Path to the linear model TOML.
    pub path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SimActivity {
    Still,
    #[default]
    Walking,
    Running,
    Cycling,
    Vehicle,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SimulationCfg {
    pub activity: SimActivity,
    /// Gaussian-ish noise amplitude added to every axis.
    pub noise: f32,
    pub seed: u64,
}

impl Default for SimulationCfg {
    fn default() -> Self {
        Self {
            activity: SimActivity::Walking,
            noise: 0.05,
            seed: 7,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub sampling: SamplingCfg,
    #[serde(default)]
    pub window: WindowCfg,
    #[serde(default)]
    pub runner: RunnerCfg,
    #[serde(default)]
    pub normalization: NormalizationCfg,
    #[serde(default)]
    pub model: ModelCfg,
    #[serde(default)]
    pub logging: Logging,
    #[serde(default)]
    pub simulation: SimulationCfg,
}

/// Affine normalization pair as stored on disk.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormParams {
    pub scale: f64,
    pub offset: f64,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

/// Parse a `scale,offset` pair, e.g. the content of `norm_param.txt`.
pub fn parse_norm_params(s: &str) -> eyre::Result<NormParams> {
    let parts: Vec<&str> = s.trim().split(',').map(str::trim).collect();
    if parts.len() != 2 {
        eyre::bail!(
            "normalization params must be 'scale,offset', got {} field(s)",
            parts.len()
        );
    }
    let scale: f64 = parts[0]
        .parse()
        .map_err(|e| eyre::eyre!("invalid normalization scale {:?}: {}", parts[0], e))?;
    let offset: f64 = parts[1]
        .parse()
        .map_err(|e| eyre::eyre!("invalid normalization offset {:?}: {}", parts[1], e))?;
    if !scale.is_finite() || !offset.is_finite() {
        eyre::bail!("normalization params must be finite");
    }
    Ok(NormParams { scale, offset })
}

pub fn load_norm_params(path: &Path) -> eyre::Result<NormParams> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| eyre::eyre!("open normalization params {:?}: {}", path, e))?;
    parse_norm_params(&text)
}

/// Nominal samples per channel for a window: `rate_hz * window_secs`,
/// rounded to the nearest integer so `100 * 0.29` yields 29, not 28.
/// Non-positive or non-finite windows map to 0.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn expected_count(rate_hz: u32, window_secs: f64) -> usize {
    if !(window_secs.is_finite() && window_secs > 0.0) {
        return 0;
    }
    (f64::from(rate_hz) * window_secs).round() as usize
}

impl Config {
    /// Nominal sample count per channel for one window.
    pub fn expected_count(&self) -> usize {
        expected_count(self.sampling.rate_hz, self.window.duration_s)
    }

    /// Effective ring capacity per channel.
    pub fn buffer_capacity(&self) -> usize {
        self.window
            .buffer_capacity
            .unwrap_or_else(|| self.expected_count() * 4 + self.window.slack)
    }

    /// Normalization pair from `[normalization] file` when set, else the inline values.
    pub fn resolve_normalization(&self) -> eyre::Result<NormParams> {
        match &self.normalization.file {
            Some(path) => load_norm_params(path),
            None => Ok(NormParams {
                scale: self.normalization.scale,
                offset: self.normalization.offset,
            }),
        }
    }

    pub fn validate(&self) -> eyre::Result<()> {
        // Sampling
        if self.sampling.rate_hz == 0 {
            eyre::bail!("sampling.rate_hz must be > 0");
        }
        if self.sampling.rate_hz > 1000 {
            eyre::bail!("sampling.rate_hz is unreasonably large (>1000)");
        }

        // Window
        let d = self.window.duration_s;
        if !(d.is_finite() && d > 0.0) {
            eyre::bail!("window.duration_s must be > 0");
        }
        if d > 60.0 {
            eyre::bail!("window.duration_s is unreasonably large (>60s)");
        }
        let expected = self.expected_count();
        if expected == 0 {
            eyre::bail!("window.duration_s * sampling.rate_hz must cover at least one sample");
        }
        if self.window.slack >= expected {
            eyre::bail!("window.slack must be < expected samples per window ({expected})");
        }
        if let Some(cap) = self.window.buffer_capacity
            && cap < expected * 2
        {
            eyre::bail!(
                "window.buffer_capacity must hold two windows (>= {})",
                expected * 2
            );
        }

        // Runner
        if self.runner.tick_ms < 10 {
            eyre::bail!("runner.tick_ms must be >= 10");
        }
        if self.runner.sensor_timeout_ms == 0 {
            eyre::bail!("runner.sensor_timeout_ms must be >= 1");
        }

        // Normalization (inline values; file values are checked on load)
        if !self.normalization.scale.is_finite() || !self.normalization.offset.is_finite() {
            eyre::bail!("normalization.scale and normalization.offset must be finite");
        }

        // Simulation
        if !(self.simulation.noise.is_finite() && self.simulation.noise >= 0.0) {
            eyre::bail!("simulation.noise must be >= 0");
        }

        // Logging
        if let Some(rot) = self.logging.rotation.as_deref()
            && !matches!(rot, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly");
        }

        Ok(())
    }
}
