//! Time-aligned multi-channel windows cut from the buffer set.
use crate::buffer::BufferSet;
use crate::util::{expected_count, secs_to_micros};
use tripmode_traits::{CHANNEL_COUNT, Channel, Sample};

/// A closed interval `[begin_us, end_us]` with one filtered sample run per channel.
#[derive(Debug, Clone, PartialEq)]
pub struct Window {
    pub begin_us: u64,
    pub end_us: u64,
    channels: [Vec<Sample>; CHANNEL_COUNT],
}

impl Window {
    /// Build a window from per-channel samples, dropping anything outside
    /// the interval so the containment invariant always holds.
    pub fn from_channels(begin_us: u64, end_us: u64, channels: [Vec<Sample>; CHANNEL_COUNT]) -> Self {
        let channels = channels.map(|mut samples| {
            samples.retain(|s| (begin_us..=end_us).contains(&s.timestamp_us));
            samples
        });
        Self {
            begin_us,
            end_us,
            channels,
        }
    }

    #[inline]
    pub fn samples(&self, channel: Channel) -> &[Sample] {
        &self.channels[channel.index()]
    }

    #[inline]
    pub fn contains(&self, timestamp_us: u64) -> bool {
        (self.begin_us..=self.end_us).contains(&timestamp_us)
    }

    pub fn counts(&self) -> [usize; CHANNEL_COUNT] {
        std::array::from_fn(|i| self.channels[i].len())
    }

    /// Channel with the fewest samples and its count.
    pub fn sparsest(&self) -> (Channel, usize) {
        Channel::ALL
            .into_iter()
            .map(|ch| (ch, self.samples(ch).len()))
            .min_by_key(|&(_, n)| n)
            .unwrap_or((Channel::LinearAcceleration, 0))
    }
}

/// Smallest per-channel count a usable window may have. Never below 1.
#[inline]
pub fn min_samples(expected_count_per_channel: usize, slack: usize) -> usize {
    expected_count_per_channel.saturating_sub(slack).max(1)
}

/// Cut `[now_us - window_us, now_us]` out of every channel. Does not mutate buffers.
pub fn extract(buffers: &BufferSet, now_us: u64, window_us: u64) -> Window {
    let begin_us = now_us.saturating_sub(window_us);
    let channels = Channel::ALL.map(|ch| buffers.get(ch).snapshot_filtered(begin_us, now_us));
    Window {
        begin_us,
        end_us: now_us,
        channels,
    }
}

/// True iff every channel holds at least `expected - slack` samples.
pub fn is_valid(window: &Window, expected_count_per_channel: usize, slack: usize) -> bool {
    let min = min_samples(expected_count_per_channel, slack);
    window.channels.iter().all(|c| c.len() >= min)
}

/// Window geometry derived from the sampling configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSpec {
    pub duration_us: u64,
    pub expected_count: usize,
    pub slack: usize,
}

impl WindowSpec {
    pub fn new(rate_hz: u32, duration_s: f64, slack: usize) -> Self {
        Self {
            duration_us: secs_to_micros(duration_s),
            expected_count: expected_count(rate_hz, duration_s),
            slack,
        }
    }

    #[inline]
    pub fn min_samples(&self) -> usize {
        min_samples(self.expected_count, self.slack)
    }

    /// Eviction horizon: one spare window beyond what extraction needs.
    #[inline]
    pub fn eviction_threshold(&self, now_us: u64) -> u64 {
        now_us.saturating_sub(self.duration_us.saturating_mul(2))
    }

    #[inline]
    pub fn extract(&self, buffers: &BufferSet, now_us: u64) -> Window {
        extract(buffers, now_us, self.duration_us)
    }

    #[inline]
    pub fn is_valid(&self, window: &Window) -> bool {
        is_valid(window, self.expected_count, self.slack)
    }
}

impl Default for WindowSpec {
    fn default() -> Self {
        Self::new(100, 2.0, 10)
    }
}
