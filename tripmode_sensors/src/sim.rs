//! Simulated three-channel IMU.
use crate::error::{Result, SensorError};
use crate::motion::{G, Motion};
use std::f32::consts::TAU;
use std::time::{Duration, Instant};
use tripmode_traits::clock::Clock;
use tripmode_traits::{BoxError, Channel, Sample, SensorEvent, SensorSource};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationSettings {
    /// Per-channel delivery rate.
    pub rate_hz: u32,
    pub motion: Motion,
    /// Half-width of the uniform noise added to every axis.
    pub noise: f32,
    pub seed: u64,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            rate_hz: 100,
            motion: Motion::Walking,
            noise: 0.05,
            seed: 7,
        }
    }
}

// xorshift64*
#[derive(Debug, Clone)]
struct Rng(u64);

impl Rng {
    fn new(seed: u64) -> Self {
        Self(if seed == 0 { 0x9E37_79B9_7F4A_7C15 } else { seed })
    }

    fn next_u64(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.0 = x;
        x.wrapping_mul(0x2545_F491_4F6C_DD1D)
    }

    /// Uniform in `[-amp, amp)`.
    fn symmetric(&mut self, amp: f32) -> f32 {
        let unit = (self.next_u64() >> 40) as f32 / (1u64 << 24) as f32;
        (unit * 2.0 - 1.0) * amp
    }
}

/// Emits the three channels round-robin at every sample instant
/// `epoch + k / rate_hz`; all three events of instant `k` share its timestamp.
pub struct SimulatedImu<C: Clock> {
    clock: C,
    epoch: Instant,
    period_us: u64,
    settings: SimulationSettings,
    rng: Rng,
    index: u64,
    cursor: usize,
}

impl<C: Clock> SimulatedImu<C> {
    pub fn new(settings: SimulationSettings, clock: C, epoch: Instant) -> Result<Self> {
        if settings.rate_hz == 0 || settings.rate_hz > 1_000_000 {
            return Err(SensorError::Invalid("rate_hz must be in 1..=1000000"));
        }
        if !(settings.noise.is_finite() && settings.noise >= 0.0) {
            return Err(SensorError::Invalid("noise must be >= 0"));
        }
        tracing::debug!(
            rate_hz = settings.rate_hz,
            motion = %settings.motion,
            noise = settings.noise,
            seed = settings.seed,
            "simulated imu ready"
        );
        Ok(Self {
            clock,
            epoch,
            period_us: 1_000_000 / u64::from(settings.rate_hz),
            rng: Rng::new(settings.seed),
            settings,
            index: 0,
            cursor: 0,
        })
    }

    pub fn motion(&self) -> Motion {
        self.settings.motion
    }

    /// Switch the simulated activity from the next event on.
    pub fn set_motion(&mut self, motion: Motion) {
        if motion != self.settings.motion {
            tracing::info!(from = %self.settings.motion, to = %motion, "simulated motion changed");
            self.settings.motion = motion;
        }
    }

    fn due_us(&self) -> u64 {
        self.index.saturating_mul(self.period_us)
    }

    /// Next event without pacing; its timestamp is the scheduled instant.
    pub fn next_event(&mut self) -> SensorEvent {
        let ts = self.due_us();
        let channel = Channel::ALL[self.cursor];
        let (x, y, z) = self.signal(channel, ts);
        self.cursor += 1;
        if self.cursor == Channel::ALL.len() {
            self.cursor = 0;
            self.index += 1;
        }
        SensorEvent::new(channel, Sample::new(ts, x, y, z))
    }

    fn signal(&mut self, channel: Channel, ts_us: u64) -> (f32, f32, f32) {
        let p = self.settings.motion.profile();
        let t = (ts_us as f64 / 1e6) as f32;
        let phase = TAU * p.cadence_hz * t;
        let n = self.settings.noise;
        match channel {
            Channel::LinearAcceleration => (
                p.linear_amp * phase.sin() + self.rng.symmetric(n),
                0.5 * p.linear_amp * (phase + 1.0).sin() + self.rng.symmetric(n),
                0.8 * p.linear_amp * (2.0 * phase).sin() + self.rng.symmetric(n),
            ),
            Channel::Gravity => {
                let tilt = p.tilt * phase.sin();
                (
                    G * tilt.sin() + self.rng.symmetric(n * 0.1),
                    self.rng.symmetric(n * 0.1),
                    G * tilt.cos() + self.rng.symmetric(n * 0.1),
                )
            }
            Channel::Gyroscope => (
                p.gyro_amp * phase.cos() + self.rng.symmetric(n),
                0.5 * p.gyro_amp * phase.sin() + self.rng.symmetric(n),
                0.2 * p.gyro_amp * (2.0 * phase).cos() + self.rng.symmetric(n),
            ),
        }
    }
}

impl<C: Clock> SensorSource for SimulatedImu<C> {
    fn read(&mut self, timeout: Duration) -> std::result::Result<SensorEvent, BoxError> {
        let due_at = self.epoch + Duration::from_micros(self.due_us());
        let wait = due_at.saturating_duration_since(self.clock.now());
        if wait > timeout {
            self.clock.sleep(timeout);
            return Err(Box::new(SensorError::Timeout));
        }
        self.clock.sleep(wait);
        Ok(self.next_event())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tripmode_traits::clock::ManualClock;

    fn imu(motion: Motion, seed: u64) -> SimulatedImu<ManualClock> {
        let clock = ManualClock::new();
        let epoch = clock.origin();
        SimulatedImu::new(
            SimulationSettings {
                motion,
                seed,
                ..SimulationSettings::default()
            },
            clock,
            epoch,
        )
        .unwrap()
    }

    #[test]
    fn channels_rotate_and_share_instants() {
        let mut s = imu(Motion::Walking, 1);
        let evs: Vec<_> = (0..6).map(|_| s.next_event()).collect();
        let chans: Vec<_> = evs.iter().map(|e| e.channel).collect();
        assert_eq!(&chans[..3], &Channel::ALL);
        assert_eq!(&chans[3..], &Channel::ALL);
        assert!(evs[..3].iter().all(|e| e.sample.timestamp_us == 0));
        assert!(evs[3..].iter().all(|e| e.sample.timestamp_us == 10_000));
    }

    #[test]
    fn same_seed_same_stream() {
        let mut a = imu(Motion::Running, 42);
        let mut b = imu(Motion::Running, 42);
        for _ in 0..30 {
            assert_eq!(a.next_event(), b.next_event());
        }
    }

    #[test]
    fn still_gravity_points_down() {
        let mut s = imu(Motion::Still, 3);
        for _ in 0..30 {
            let e = s.next_event();
            if e.channel == Channel::Gravity {
                assert!((e.sample.z - G).abs() < 0.01);
            } else {
                assert!(e.sample.x.abs() <= 0.05 && e.sample.y.abs() <= 0.05);
            }
        }
    }

    #[test]
    fn zero_rate_is_rejected() {
        let clock = ManualClock::new();
        let epoch = clock.origin();
        let r = SimulatedImu::new(
            SimulationSettings {
                rate_hz: 0,
                ..SimulationSettings::default()
            },
            clock,
            epoch,
        );
        assert!(matches!(r, Err(SensorError::Invalid(_))));
    }
}
