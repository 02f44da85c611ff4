//! Test and helper doubles for tripmode_core
use std::sync::atomic::{AtomicUsize, Ordering};
use tripmode_traits::{BoxError, Classifier, ReportSink};

/// A classifier that answers the same code for every window.
#[derive(Debug, Clone, Copy)]
pub struct FixedClassifier(pub i32);

impl Classifier for FixedClassifier {
    fn predict(&self, _features: &[f64]) -> Result<i32, BoxError> {
        Ok(self.0)
    }
}

/// A classifier that always fails; counts how often it was asked.
#[derive(Debug, Default)]
pub struct FailingClassifier {
    pub calls: AtomicUsize,
}

impl Classifier for FailingClassifier {
    fn predict(&self, _features: &[f64]) -> Result<i32, BoxError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        Err(Box::new(std::io::Error::other("model unavailable")))
    }
}

/// One call observed by [`MemorySink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkCall {
    Start(String),
    Post {
        travel_id: String,
        timestamp_us: u64,
        activity: String,
    },
    End(String),
}

/// Records every report call; individual operations can be made to fail.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub calls: Vec<SinkCall>,
    pub fail_start: bool,
    pub fail_post: bool,
    pub fail_end: bool,
}

impl MemorySink {
    pub fn posts(&self) -> impl Iterator<Item = (&str, u64, &str)> {
        self.calls.iter().filter_map(|c| match c {
            SinkCall::Post {
                travel_id,
                timestamp_us,
                activity,
            } => Some((travel_id.as_str(), *timestamp_us, activity.as_str())),
            _ => None,
        })
    }
}

fn refused(op: &str) -> BoxError {
    Box::new(std::io::Error::other(format!("{op} refused")))
}

impl ReportSink for MemorySink {
    fn start_record(&mut self, travel_id: &str) -> Result<(), BoxError> {
        if self.fail_start {
            return Err(refused("start"));
        }
        self.calls.push(SinkCall::Start(travel_id.to_owned()));
        Ok(())
    }

    fn post(&mut self, travel_id: &str, timestamp_us: u64, activity: &str) -> Result<(), BoxError> {
        if self.fail_post {
            return Err(refused("post"));
        }
        self.calls.push(SinkCall::Post {
            travel_id: travel_id.to_owned(),
            timestamp_us,
            activity: activity.to_owned(),
        });
        Ok(())
    }

    fn end_record(&mut self, travel_id: &str) -> Result<(), BoxError> {
        if self.fail_end {
            return Err(refused("end"));
        }
        self.calls.push(SinkCall::End(travel_id.to_owned()));
        Ok(())
    }
}
