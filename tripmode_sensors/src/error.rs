use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SensorError {
    /// No event became due within the read timeout.
    #[error("sensor timeout")]
    Timeout,
    /// A finite source has delivered everything it had.
    #[error("sensor stream exhausted")]
    Exhausted,
    #[error("invalid sensor setting: {0}")]
    Invalid(&'static str),
}

pub type Result<T> = std::result::Result<T, SensorError>;
