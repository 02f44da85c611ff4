#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Activity classification core (sensor-agnostic).
//!
//! Sensor events go into per-channel ring buffers; a periodic tick cuts a
//! time-aligned window out of them, turns it into a fixed-length feature
//! vector, normalizes it and asks a pre-trained [`Classifier`] for a label.
//! Sensors, clocks and report sinks are reached only through the
//! `tripmode_traits` seams.
//!
//! ## Architecture
//!
//! - **Buffers**: `SampleBuffer` / `BufferSet`, timestamp-ordered and bounded (`buffer` module)
//! - **Windows**: `[now - W, now]` extraction and the sufficiency check (`window` module)
//! - **Features**: per-axis means and count-weighted bucket entropies (`features` module)
//! - **Engine**: the tick pipeline, its builder and counters (`engine` module)
//! - **Recording**: `Recorder` state machine and the `Runner` tick loop
//! - **Offline**: event-time replay with accuracy, libsvm export (`replay` module)
//!
//! ## Timestamps
//!
//! All timestamps are `u64` microseconds on one monotonic epoch shared by the
//! producer and the tick driver.
//!
//! [`Classifier`]: tripmode_traits::Classifier

pub mod buffer;
pub mod conversions;
pub mod engine;
pub mod error;
pub mod features;
pub mod ingest;
pub mod mocks;
pub mod normalize;
pub mod recorder;
pub mod replay;
pub mod runner;
pub mod types;
pub mod util;
pub mod window;

pub use buffer::{AppendOutcome, BufferSet, SampleBuffer};
pub use engine::{Classification, ClassificationEngine, EngineBuilder, EngineCfg, EngineStats};
pub use error::{BuildError, EngineError, RecorderError, Report, Result};
pub use features::{FeatureVector, encode};
pub use ingest::{IngestStats, Ingestor};
pub use normalize::{NormalizationParams, normalize};
pub use recorder::{RecordCommand, RecordState, Recorder, RecorderHandle};
pub use replay::{ReplayReport, ReplayTick, export_svm, replay_events, replay_recording};
pub use runner::{ActivityReport, RunSummary, Runner, TickOutcome};
pub use types::ActivityLabel;
pub use window::{Window, WindowSpec, extract, is_valid};
