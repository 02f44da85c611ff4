//! Bridges from `tripmode_config` file types to core types.

use crate::engine::EngineCfg;
use crate::error::BuildError;
use crate::normalize::NormalizationParams;
use crate::window::WindowSpec;
use std::time::Duration;

impl From<&tripmode_config::Config> for EngineCfg {
    fn from(c: &tripmode_config::Config) -> Self {
        Self {
            rate_hz: c.sampling.rate_hz,
            window_s: c.window.duration_s,
            slack: c.window.slack,
            buffer_capacity: c.window.buffer_capacity,
        }
    }
}

impl From<&tripmode_config::Config> for WindowSpec {
    fn from(c: &tripmode_config::Config) -> Self {
        WindowSpec::new(c.sampling.rate_hz, c.window.duration_s, c.window.slack)
    }
}

impl TryFrom<tripmode_config::NormParams> for NormalizationParams {
    type Error = BuildError;

    fn try_from(p: tripmode_config::NormParams) -> Result<Self, Self::Error> {
        NormalizationParams::new(p.scale, p.offset)
    }
}

/// Tick period and sensor read timeout from the `[runner]` section.
pub fn runner_timing(c: &tripmode_config::RunnerCfg) -> (Duration, Duration) {
    (
        Duration::from_millis(c.tick_ms),
        Duration::from_millis(c.sensor_timeout_ms),
    )
}
