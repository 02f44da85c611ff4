#![allow(dead_code)]
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

pub const MODEL: &str = include_str!("../../../etc/model.toml");

/// Config + model + normalization file in `dir`; returns the config path.
pub fn write_config(dir: &Path, extra: &str) -> PathBuf {
    fs::write(dir.join("model.toml"), MODEL).unwrap();
    fs::write(dir.join("norm_param.txt"), "1.0,0.0\n").unwrap();
    let toml = format!(
        r#"
[sampling]
rate_hz = 100

[window]
duration_s = 2.0
slack = 10

[runner]
tick_ms = 100
sensor_timeout_ms = 50

[normalization]
file = "norm_param.txt"

[model]
path = "model.toml"

[simulation]
activity = "walking"
noise = 0.05
seed = 7
{extra}
"#
    );
    let path = dir.join("cfg.toml");
    fs::write(&path, toml).unwrap();
    path
}

/// Five seconds of walking-like motion labelled WALKING (class 2).
pub fn write_walking_recording(dir: &Path) -> PathBuf {
    let rec = dir.join("rec");
    fs::create_dir_all(&rec).unwrap();
    let mut linear = String::new();
    let mut gravity = String::new();
    let mut gyro = String::new();
    for i in 0..500u64 {
        let t = i as f64 / 100.0;
        let phase = std::f64::consts::TAU * 1.8 * t;
        let ts = i * 10_000;
        writeln!(linear, "2,{ts},{:.6},{:.6},{:.6}", 1.5 * phase.sin(), 0.75 * (phase + 1.0).sin(), 0.0).unwrap();
        writeln!(gravity, "2,{ts},0.0,0.0,9.806650").unwrap();
        writeln!(gyro, "2,{ts},{:.6},{:.6},0.0", 0.6 * phase.cos(), 0.3 * phase.sin()).unwrap();
    }
    fs::write(rec.join("linear.csv"), linear).unwrap();
    fs::write(rec.join("gravity.csv"), gravity).unwrap();
    fs::write(rec.join("gyro.csv"), gyro).unwrap();
    rec
}
