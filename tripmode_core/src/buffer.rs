//! Per-channel sample storage shared by the sensor producer and the tick consumer.
//!
//! Each channel owns a fixed-capacity ring guarded by its own mutex. Locks are
//! held for a single call only, never across a classification tick, so the
//! producer's latency stays bounded by one ring operation.
//!
//! Samples stay sorted by timestamp. In-order delivery is a push to the back;
//! late samples are inserted at their sorted position. A full ring displaces
//! its oldest sample, and a late sample older than everything in a full ring
//! is rejected.
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tripmode_traits::{CHANNEL_COUNT, Channel, Sample, SensorEvent};

/// What `append` did with a sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    /// Pushed at the back (the common in-order case).
    Appended,
    /// Inserted before newer samples.
    Reordered,
    /// Stored, but the ring was full and its oldest sample was dropped.
    Displaced,
    /// Not stored: non-finite, or older than a full ring's oldest sample.
    Rejected,
}

#[derive(Debug)]
pub struct SampleBuffer {
    ring: Mutex<VecDeque<Sample>>,
    capacity: usize,
    dropped: AtomicU64,
}

impl SampleBuffer {
    /// `capacity` is clamped to at least 1.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            ring: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
            dropped: AtomicU64::new(0),
        }
    }

    #[inline]
    fn lock(&self) -> MutexGuard<'_, VecDeque<Sample>> {
        // A panic while holding the lock cannot leave the deque half-mutated
        // in a way that breaks ordering, so keep serving the data.
        self.ring.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn append(&self, sample: Sample) -> AppendOutcome {
        if !sample.is_finite() {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            return AppendOutcome::Rejected;
        }
        let mut ring = self.lock();
        let mut displaced = false;
        if ring.len() >= self.capacity {
            if ring
                .front()
                .is_some_and(|oldest| sample.timestamp_us < oldest.timestamp_us)
            {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                return AppendOutcome::Rejected;
            }
            ring.pop_front();
            self.dropped.fetch_add(1, Ordering::Relaxed);
            displaced = true;
        }
        let late = ring
            .back()
            .is_some_and(|newest| sample.timestamp_us < newest.timestamp_us);
        if late {
            let idx = ring.partition_point(|s| s.timestamp_us <= sample.timestamp_us);
            ring.insert(idx, sample);
        } else {
            ring.push_back(sample);
        }
        match (displaced, late) {
            (true, _) => AppendOutcome::Displaced,
            (false, true) => AppendOutcome::Reordered,
            (false, false) => AppendOutcome::Appended,
        }
    }

    /// Remove every sample with `timestamp_us < threshold_us`; returns how many went.
    pub fn evict_before(&self, threshold_us: u64) -> usize {
        let mut ring = self.lock();
        let n = ring.partition_point(|s| s.timestamp_us < threshold_us);
        ring.drain(..n);
        n
    }

    /// Copy of the samples with `begin_us <= timestamp_us <= end_us`, in order.
    pub fn snapshot_filtered(&self, begin_us: u64, end_us: u64) -> Vec<Sample> {
        if begin_us > end_us {
            return Vec::new();
        }
        let ring = self.lock();
        let lo = ring.partition_point(|s| s.timestamp_us < begin_us);
        let hi = ring.partition_point(|s| s.timestamp_us <= end_us);
        ring.range(lo..hi).copied().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Samples lost to rejection or displacement since creation.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// One `SampleBuffer` per channel, indexed by `Channel`.
#[derive(Debug)]
pub struct BufferSet {
    buffers: [SampleBuffer; CHANNEL_COUNT],
}

impl BufferSet {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffers: std::array::from_fn(|_| SampleBuffer::with_capacity(capacity)),
        }
    }

    #[inline]
    pub fn get(&self, channel: Channel) -> &SampleBuffer {
        &self.buffers[channel.index()]
    }

    /// Sensor ingestion boundary. Never fails; outcomes are only counted.
    pub fn push_sample(&self, channel: Channel, timestamp_us: u64, x: f32, y: f32, z: f32) {
        self.push(SensorEvent::new(channel, Sample::new(timestamp_us, x, y, z)));
    }

    pub fn push(&self, event: SensorEvent) -> AppendOutcome {
        let outcome = self.get(event.channel).append(event.sample);
        if outcome == AppendOutcome::Rejected {
            tracing::trace!(
                channel = %event.channel,
                timestamp_us = event.sample.timestamp_us,
                "sample rejected"
            );
        }
        outcome
    }

    /// Evict stale samples on every channel; returns the total removed.
    pub fn evict_before(&self, threshold_us: u64) -> usize {
        self.buffers
            .iter()
            .map(|b| b.evict_before(threshold_us))
            .sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Channel, &SampleBuffer)> {
        Channel::ALL.into_iter().map(|ch| (ch, self.get(ch)))
    }

    pub fn dropped(&self) -> u64 {
        self.buffers.iter().map(SampleBuffer::dropped).sum()
    }
}

impl core::ops::Index<Channel> for BufferSet {
    type Output = SampleBuffer;

    fn index(&self, channel: Channel) -> &SampleBuffer {
        self.get(channel)
    }
}
