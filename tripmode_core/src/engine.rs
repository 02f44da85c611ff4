//! The per-tick classification pipeline.
//!
//! evict → extract → validate → encode → normalize → predict → map code.
//!
//! The engine owns no I/O. Producers write through [`BufferSet`] (shared via
//! `Arc`), and the tick driver calls [`ClassificationEngine::classify`]. At
//! most one pipeline runs at a time; an overlapping call returns
//! [`EngineError::Busy`] instead of queueing behind the running one.
use crate::buffer::BufferSet;
use crate::error::{BuildError, EngineError};
use crate::features::{FeatureVector, encode};
use crate::normalize::{NormalizationParams, normalize};
use crate::types::ActivityLabel;
use crate::window::WindowSpec;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use tripmode_traits::{CHANNEL_COUNT, Channel, Classifier, SensorEvent};

/// Sampling and window configuration.
#[derive(Debug, Clone)]
pub struct EngineCfg {
    /// Requested per-channel sensor rate in Hz.
    pub rate_hz: u32,
    /// Window length in seconds.
    pub window_s: f64,
    /// Allowed shortfall below the nominal per-channel count.
    pub slack: usize,
    /// Ring capacity per channel; `None` derives `4 * expected + slack`.
    pub buffer_capacity: Option<usize>,
}

impl Default for EngineCfg {
    fn default() -> Self {
        Self {
            rate_hz: 100,
            window_s: 2.0,
            slack: 10,
            buffer_capacity: None,
        }
    }
}

/// Result of one tick with the intermediate data kept for diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub now_us: u64,
    pub label: ActivityLabel,
    /// Samples per channel inside the window.
    pub counts: [usize; CHANNEL_COUNT],
    /// Samples evicted at the start of this tick.
    pub evicted: usize,
    /// Normalized features; `None` when the window was insufficient.
    pub features: Option<FeatureVector>,
}

#[derive(Debug, Default)]
struct Counters {
    ticks: AtomicU64,
    classified: AtomicU64,
    insufficient: AtomicU64,
    failed: AtomicU64,
    busy: AtomicU64,
}

/// Point-in-time copy of the engine counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineStats {
    pub ticks: u64,
    pub classified: u64,
    pub insufficient: u64,
    pub failed: u64,
    pub busy: u64,
    pub dropped_samples: u64,
}

/// Clears the in-flight flag when a tick ends, including by early return.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct ClassificationEngine<C: Classifier> {
    buffers: Arc<BufferSet>,
    classifier: C,
    normalization: NormalizationParams,
    spec: WindowSpec,
    in_flight: AtomicBool,
    // Latched on the first unknown label code; classification stays halted.
    mismatch: OnceLock<i32>,
    counters: Counters,
}

impl<C: Classifier> core::fmt::Debug for ClassificationEngine<C> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ClassificationEngine")
            .field("spec", &self.spec)
            .field("normalization", &self.normalization)
            .field("halted", &self.mismatch.get().is_some())
            .finish()
    }
}

impl ClassificationEngine<Missing> {
    pub fn builder() -> EngineBuilder<Missing> {
        EngineBuilder::default()
    }
}

impl<C: Classifier> ClassificationEngine<C> {
    /// Shared handle for producers (sensor callbacks, the ingest thread).
    pub fn buffers(&self) -> Arc<BufferSet> {
        Arc::clone(&self.buffers)
    }

    pub fn spec(&self) -> WindowSpec {
        self.spec
    }

    pub fn normalization(&self) -> NormalizationParams {
        self.normalization
    }

    /// Sensor ingestion boundary; see [`BufferSet::push_sample`].
    #[inline]
    pub fn push_sample(&self, channel: Channel, timestamp_us: u64, x: f32, y: f32, z: f32) {
        self.buffers.push_sample(channel, timestamp_us, x, y, z);
    }

    #[inline]
    pub fn push(&self, event: SensorEvent) {
        self.buffers.push(event);
    }

    /// Unknown label code that halted classification, if any.
    pub fn halted_by(&self) -> Option<i32> {
        self.mismatch.get().copied()
    }

    pub fn stats(&self) -> EngineStats {
        let c = &self.counters;
        EngineStats {
            ticks: c.ticks.load(Ordering::Relaxed),
            classified: c.classified.load(Ordering::Relaxed),
            insufficient: c.insufficient.load(Ordering::Relaxed),
            failed: c.failed.load(Ordering::Relaxed),
            busy: c.busy.load(Ordering::Relaxed),
            dropped_samples: self.buffers.dropped(),
        }
    }

    /// Current activity at `now_us`. Insufficient data yields `ActivityLabel::None`.
    pub fn classify(&self, now_us: u64) -> Result<ActivityLabel, EngineError> {
        self.evaluate(now_us).map(|c| c.label)
    }

    /// Run one tick and keep the intermediate results.
    pub fn evaluate(&self, now_us: u64) -> Result<Classification, EngineError> {
        if let Some(&code) = self.mismatch.get() {
            return Err(EngineError::ModelMismatch { code });
        }
        let Some(_guard) = InFlight::acquire(&self.in_flight) else {
            self.counters.busy.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(now_us, "tick skipped: previous classification still running");
            return Err(EngineError::Busy);
        };
        self.counters.ticks.fetch_add(1, Ordering::Relaxed);

        let result = self.run_pipeline(now_us);
        match &result {
            Ok(c) if c.features.is_none() => {
                self.counters.insufficient.fetch_add(1, Ordering::Relaxed);
            }
            Ok(_) => {
                self.counters.classified.fetch_add(1, Ordering::Relaxed);
            }
            Err(_) => {
                self.counters.failed.fetch_add(1, Ordering::Relaxed);
            }
        }
        result
    }

    fn run_pipeline(&self, now_us: u64) -> Result<Classification, EngineError> {
        let evicted = self
            .buffers
            .evict_before(self.spec.eviction_threshold(now_us));
        let window = self.spec.extract(&self.buffers, now_us);
        let counts = window.counts();

        if !self.spec.is_valid(&window) {
            let (channel, count) = window.sparsest();
            tracing::debug!(
                now_us,
                %channel,
                count,
                min = self.spec.min_samples(),
                "insufficient data"
            );
            return Ok(Classification {
                now_us,
                label: ActivityLabel::None,
                counts,
                evicted,
                features: None,
            });
        }

        let raw = encode(&window).inspect_err(|e| {
            tracing::error!(now_us, error = %e, ?counts, "encoding failed on a validated window");
        })?;
        let features = normalize(&raw, &self.normalization);

        let code = self.classifier.predict(features.as_slice()).map_err(|e| {
            tracing::warn!(now_us, error = %e, "classifier failed");
            EngineError::Classifier(e.to_string())
        })?;

        let Some(label) = ActivityLabel::from_code(code) else {
            let _ = self.mismatch.set(code);
            tracing::error!(code, "classifier returned an unknown label code; halting classification");
            return Err(EngineError::ModelMismatch { code });
        };

        tracing::debug!(now_us, %label, ?counts, "classified");
        Ok(Classification {
            now_us,
            label,
            counts,
            evicted,
            features: Some(features),
        })
    }
}

// Type-state marker for a builder without a classifier.
pub struct Missing;

impl Classifier for Missing {
    fn predict(&self, _features: &[f64]) -> Result<i32, tripmode_traits::BoxError> {
        Err("no classifier configured".into())
    }
}

/// Builder for `ClassificationEngine`. All fields are validated on `build()`.
pub struct EngineBuilder<C> {
    classifier: Option<C>,
    cfg: Option<EngineCfg>,
    normalization: Option<NormalizationParams>,
}

impl<C> Default for EngineBuilder<C> {
    fn default() -> Self {
        Self {
            classifier: None,
            cfg: None,
            normalization: None,
        }
    }
}

impl<C> EngineBuilder<C> {
    pub fn with_cfg(mut self, cfg: EngineCfg) -> Self {
        self.cfg = Some(cfg);
        self
    }

    pub fn with_normalization(mut self, params: NormalizationParams) -> Self {
        self.normalization = Some(params);
        self
    }

    pub fn with_classifier<K: Classifier>(self, classifier: K) -> EngineBuilder<K> {
        EngineBuilder {
            classifier: Some(classifier),
            cfg: self.cfg,
            normalization: self.normalization,
        }
    }
}

impl<C: Classifier> EngineBuilder<C> {
    pub fn build(self) -> Result<ClassificationEngine<C>, BuildError> {
        let EngineBuilder {
            classifier,
            cfg,
            normalization,
        } = self;

        let classifier = classifier.ok_or(BuildError::MissingClassifier)?;
        let cfg = cfg.unwrap_or_default();
        let normalization = normalization.unwrap_or_default();

        if cfg.rate_hz == 0 {
            return Err(BuildError::InvalidConfig("rate_hz must be > 0"));
        }
        if !(cfg.window_s.is_finite() && cfg.window_s > 0.0) {
            return Err(BuildError::InvalidConfig("window_s must be > 0"));
        }
        let spec = WindowSpec::new(cfg.rate_hz, cfg.window_s, cfg.slack);
        if spec.expected_count == 0 || spec.duration_us == 0 {
            return Err(BuildError::InvalidConfig(
                "window must cover at least one sample",
            ));
        }
        if cfg.slack >= spec.expected_count {
            return Err(BuildError::InvalidConfig(
                "slack must be below the expected sample count",
            ));
        }
        let capacity = cfg
            .buffer_capacity
            .unwrap_or(spec.expected_count * 4 + cfg.slack);
        if capacity < spec.expected_count * 2 {
            return Err(BuildError::InvalidConfig(
                "buffer_capacity must hold two windows",
            ));
        }

        tracing::debug!(
            rate_hz = cfg.rate_hz,
            window_us = spec.duration_us,
            expected = spec.expected_count,
            slack = spec.slack,
            capacity,
            "classification engine built"
        );

        Ok(ClassificationEngine {
            buffers: Arc::new(BufferSet::with_capacity(capacity)),
            classifier,
            normalization,
            spec,
            in_flight: AtomicBool::new(false),
            mismatch: OnceLock::new(),
            counters: Counters::default(),
        })
    }
}
