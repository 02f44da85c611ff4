//! Report sink writing one JSON object per line.
//!
//! Stands in for the travel server: `start`, `activity` and `end` events go to
//! any `Write` (stdout for `run`).

use serde_json::json;
use std::io::Write;
use tripmode_traits::{BoxError, ReportSink};

pub struct JsonLinesSink<W: Write> {
    out: W,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, value: &serde_json::Value) -> Result<(), BoxError> {
        writeln!(self.out, "{value}")?;
        self.out.flush()?;
        Ok(())
    }
}

impl<W: Write> ReportSink for JsonLinesSink<W> {
    fn start_record(&mut self, travel_id: &str) -> Result<(), BoxError> {
        self.emit(&json!({ "event": "start", "travel_id": travel_id }))
    }

    fn post(&mut self, travel_id: &str, timestamp_us: u64, activity: &str) -> Result<(), BoxError> {
        self.emit(&json!({
            "event": "activity",
            "travel_id": travel_id,
            "timestamp_us": timestamp_us,
            "activity": activity,
        }))
    }

    fn end_record(&mut self, travel_id: &str) -> Result<(), BoxError> {
        self.emit(&json!({ "event": "end", "travel_id": travel_id }))
    }
}
