//! Seams shared by the tripmode crates.
//!
//! Sensor data types live here so that sensor backends never depend on the
//! classification core, and the core never depends on a concrete backend.
pub mod clock;
pub mod sample;

pub use clock::{Clock, MonotonicClock};
pub use sample::{CHANNEL_COUNT, Channel, FEATURE_LEN, Sample, SensorEvent};

/// Boxed error used across trait boundaries.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A pre-trained model evaluated at production time.
///
/// The feature slice has exactly [`FEATURE_LEN`] normalized components.
/// The returned value is the model's raw class code; mapping it to a label
/// is the caller's job.
pub trait Classifier {
    fn predict(&self, features: &[f64]) -> Result<i32, BoxError>;
}

impl<T: Classifier + ?Sized> Classifier for Box<T> {
    fn predict(&self, features: &[f64]) -> Result<i32, BoxError> {
        (**self).predict(features)
    }
}

impl<T: Classifier + ?Sized> Classifier for std::sync::Arc<T> {
    fn predict(&self, features: &[f64]) -> Result<i32, BoxError> {
        (**self).predict(features)
    }
}

/// Platform sensor delivery.
///
/// `read` blocks until the next event is ready or `timeout` expires.
pub trait SensorSource {
    fn read(&mut self, timeout: std::time::Duration) -> Result<SensorEvent, BoxError>;
}

/// Outgoing travel reports (start/post/end of a recording).
pub trait ReportSink {
    fn start_record(&mut self, travel_id: &str) -> Result<(), BoxError>;
    fn post(&mut self, travel_id: &str, timestamp_us: u64, activity: &str) -> Result<(), BoxError>;
    fn end_record(&mut self, travel_id: &str) -> Result<(), BoxError>;
}
