//! Labelled sensor recordings.
//!
//! A recording is a directory with one CSV per channel (`linear.csv`,
//! `gravity.csv`, `gyro.csv`). Rows have no header:
//!
//! class_no,timestamp_us,x,y,z
//!
//! `class_no` is the ground-truth activity code; 0 marks unlabelled data.
use serde::Deserialize;
use std::path::Path;
use tripmode_traits::{CHANNEL_COUNT, Channel, Sample, SensorEvent};

#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct RecordingRow {
    pub class_no: i32,
    pub timestamp_us: u64,
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl RecordingRow {
    #[inline]
    pub fn sample(&self) -> Sample {
        Sample::new(self.timestamp_us, self.x, self.y, self.z)
    }
}

#[derive(Debug, Default, Clone)]
pub struct Recording {
    rows: [Vec<RecordingRow>; CHANNEL_COUNT],
}

impl Recording {
    pub fn from_rows(rows: [Vec<RecordingRow>; CHANNEL_COUNT]) -> Self {
        let mut rec = Self { rows };
        for ch in &mut rec.rows {
            ch.sort_by_key(|r| r.timestamp_us);
        }
        rec
    }

    pub fn rows(&self, channel: Channel) -> &[RecordingRow] {
        &self.rows[channel.index()]
    }

    pub fn len(&self) -> usize {
        self.rows.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.iter().all(Vec::is_empty)
    }

    /// All samples merged across channels in timestamp order.
    /// Equal timestamps keep channel order.
    pub fn events(&self) -> Vec<SensorEvent> {
        let mut out: Vec<SensorEvent> = Channel::ALL
            .iter()
            .flat_map(|&ch| {
                self.rows[ch.index()]
                    .iter()
                    .map(move |r| SensorEvent::new(ch, r.sample()))
            })
            .collect();
        out.sort_by_key(|e| e.sample.timestamp_us);
        out
    }

    /// First and last timestamp across all channels.
    pub fn span(&self) -> Option<(u64, u64)> {
        let first = self
            .rows
            .iter()
            .filter_map(|r| r.first())
            .map(|r| r.timestamp_us)
            .min()?;
        let last = self
            .rows
            .iter()
            .filter_map(|r| r.last())
            .map(|r| r.timestamp_us)
            .max()?;
        Some((first, last))
    }

    /// Ground-truth class at `timestamp_us`: the label of the latest
    /// linear-acceleration row at or before it. None when unlabelled.
    pub fn class_at(&self, timestamp_us: u64) -> Option<i32> {
        let rows = self.rows(Channel::LinearAcceleration);
        let idx = rows.partition_point(|r| r.timestamp_us <= timestamp_us);
        if idx == 0 {
            return None;
        }
        match rows[idx - 1].class_no {
            0 => None,
            c => Some(c),
        }
    }
}

pub fn load_channel_csv(path: &Path) -> eyre::Result<Vec<RecordingRow>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| eyre::eyre!("open recording CSV {:?}: {}", path, e))?;

    let mut rows = Vec::new();
    for (idx, rec) in rdr.deserialize::<RecordingRow>().enumerate() {
        match rec {
            Ok(row) => rows.push(row),
            Err(e) => {
                eyre::bail!("invalid recording row {} in {:?}: {}", idx + 1, path, e);
            }
        }
    }
    Ok(rows)
}

pub fn load_recording_dir(dir: &Path) -> eyre::Result<Recording> {
    let mut rows: [Vec<RecordingRow>; CHANNEL_COUNT] = Default::default();
    for ch in Channel::ALL {
        rows[ch.index()] = load_channel_csv(&dir.join(ch.file_name()))?;
    }
    Ok(Recording::from_rows(rows))
}
