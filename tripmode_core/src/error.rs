use thiserror::Error;
use tripmode_traits::Channel;

/// Failures of a single classification tick. None of them touch buffer state.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    /// Encoding saw data the validity check should have rejected.
    #[error("invalid input on {channel}: {reason}")]
    InvalidInput {
        channel: Channel,
        reason: &'static str,
    },
    /// The classifier answered with a code outside the label set.
    #[error("model mismatch: classifier returned unknown label code {code}")]
    ModelMismatch { code: i32 },
    #[error("classifier error: {0}")]
    Classifier(String),
    /// Another tick is still running on this engine.
    #[error("classification already in progress")]
    Busy,
}

impl EngineError {
    /// Errors that must stop classification rather than skip one tick.
    pub fn is_fatal(&self) -> bool {
        matches!(self, EngineError::ModelMismatch { .. })
    }
}

#[derive(Debug, Error, Clone)]
pub enum BuildError {
    #[error("missing classifier")]
    MissingClassifier,
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RecorderError {
    #[error("report sink rejected {op}: {message}")]
    Sink { op: &'static str, message: String },
    #[error("recording already in progress")]
    AlreadyCollecting,
    #[error("no recording in progress")]
    NotCollecting,
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
