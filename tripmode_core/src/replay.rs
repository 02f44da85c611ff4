//! Offline evaluation: feed a recorded event stream through the engine on
//! event time and score the labels against the recording's ground truth.
use crate::buffer::BufferSet;
use crate::engine::ClassificationEngine;
use crate::error::EngineError;
use crate::features::encode;
use crate::normalize::{NormalizationParams, normalize};
use crate::types::ActivityLabel;
use crate::window::WindowSpec;
use tripmode_config::Recording;
use tripmode_traits::{Classifier, SensorEvent};

#[derive(Debug, Clone, PartialEq)]
pub struct ReplayTick {
    pub now_us: u64,
    pub outcome: Result<ActivityLabel, EngineError>,
    /// Ground truth at `now_us`, when the recording is labelled.
    pub expected: Option<ActivityLabel>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReplayReport {
    pub ticks: Vec<ReplayTick>,
}

impl ReplayReport {
    /// Ticks that produced a real label and have ground truth.
    pub fn scored(&self) -> usize {
        self.scorable().count()
    }

    pub fn correct(&self) -> usize {
        self.scorable().filter(|(got, want)| got == want).count()
    }

    /// Fraction of scored ticks labelled correctly; `None` without any.
    #[allow(clippy::cast_precision_loss)]
    pub fn accuracy(&self) -> Option<f64> {
        let scored = self.scored();
        (scored > 0).then(|| self.correct() as f64 / scored as f64)
    }

    pub fn insufficient(&self) -> usize {
        self.ticks
            .iter()
            .filter(|t| t.outcome == Ok(ActivityLabel::None))
            .count()
    }

    fn scorable(&self) -> impl Iterator<Item = (ActivityLabel, ActivityLabel)> + '_ {
        self.ticks.iter().filter_map(|t| match (&t.outcome, t.expected) {
            (Ok(got), Some(want)) if *got != ActivityLabel::None => Some((*got, want)),
            _ => None,
        })
    }
}

/// Walk a time-ordered event stream, calling `on_tick` at every `tick_us`
/// boundary of event time, starting one tick after the first event. A tick
/// at `t` runs after every event with timestamp `<= t` was pushed.
fn drive<I, E>(
    events: I,
    tick_us: u64,
    mut push: impl FnMut(SensorEvent),
    mut on_tick: impl FnMut(u64) -> Result<(), E>,
) -> Result<(), E>
where
    I: IntoIterator<Item = SensorEvent>,
{
    let tick_us = tick_us.max(1);
    let mut next_tick: Option<u64> = None;
    let mut last_ts = 0;

    for event in events {
        let ts = event.sample.timestamp_us;
        let mut due = *next_tick.get_or_insert(ts.saturating_add(tick_us));
        while ts > due {
            on_tick(due)?;
            due = due.saturating_add(tick_us);
        }
        next_tick = Some(due);
        last_ts = last_ts.max(ts);
        push(event);
    }

    if let Some(mut due) = next_tick {
        while due <= last_ts {
            on_tick(due)?;
            due = due.saturating_add(tick_us);
        }
    }
    Ok(())
}

/// Push `events` into `engine` and classify on every tick of event time.
/// Stops at the first fatal error.
pub fn replay_events<C, I, F>(
    engine: &ClassificationEngine<C>,
    events: I,
    tick_us: u64,
    mut truth: F,
) -> Result<ReplayReport, EngineError>
where
    C: Classifier,
    I: IntoIterator<Item = SensorEvent>,
    F: FnMut(u64) -> Option<ActivityLabel>,
{
    let mut report = ReplayReport::default();
    drive(
        events,
        tick_us,
        |event| engine.push(event),
        |now_us| {
            let outcome = engine.classify(now_us);
            if let Err(e) = &outcome
                && e.is_fatal()
            {
                return Err(e.clone());
            }
            report.ticks.push(ReplayTick {
                now_us,
                outcome,
                expected: truth(now_us),
            });
            Ok(())
        },
    )?;
    tracing::debug!(ticks = report.ticks.len(), "replay finished");
    Ok(report)
}

/// Training rows in libsvm format for every labelled tick of `recording`
/// whose window is sufficient. Unlabelled ticks are skipped.
///
/// `capacity` is the per-channel ring size, the same one the live engine
/// runs with, so exported windows match what the classifier sees.
pub fn export_svm(
    recording: &Recording,
    spec: WindowSpec,
    capacity: usize,
    normalization: &NormalizationParams,
    tick_us: u64,
) -> Result<Vec<String>, EngineError> {
    let buffers = BufferSet::with_capacity(capacity);
    let mut lines = Vec::new();
    let mut skipped = 0usize;
    drive(
        recording.events(),
        tick_us,
        |event| {
            buffers.push(event);
        },
        |now_us| {
            buffers.evict_before(spec.eviction_threshold(now_us));
            let Some(class_no) = recording.class_at(now_us) else {
                return Ok(());
            };
            let window = spec.extract(&buffers, now_us);
            if !spec.is_valid(&window) {
                skipped += 1;
                return Ok(());
            }
            let features = normalize(&encode(&window)?, normalization);
            lines.push(features.to_svm_line(class_no));
            Ok(())
        },
    )?;
    tracing::debug!(rows = lines.len(), skipped, "svm export finished");
    Ok(lines)
}

/// Replay a labelled recording; ground truth comes from its linear channel.
pub fn replay_recording<C: Classifier>(
    engine: &ClassificationEngine<C>,
    recording: &Recording,
    tick_us: u64,
) -> Result<ReplayReport, EngineError> {
    replay_events(engine, recording.events(), tick_us, |ts| {
        recording.class_at(ts).and_then(ActivityLabel::from_class_no)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EngineCfg;
    use crate::mocks::FixedClassifier;
    use tripmode_traits::{Channel, Sample};

    fn engine(code: i32) -> ClassificationEngine<FixedClassifier> {
        ClassificationEngine::builder()
            .with_classifier(FixedClassifier(code))
            .with_cfg(EngineCfg {
                rate_hz: 10,
                window_s: 1.0,
                slack: 2,
                buffer_capacity: None,
            })
            .build()
            .unwrap()
    }

    fn stream(secs: u64) -> Vec<SensorEvent> {
        let mut out = Vec::new();
        for i in 0..secs * 10 {
            for ch in Channel::ALL {
                out.push(SensorEvent::new(ch, Sample::new(i * 100_000, 0.0, 0.1, 0.2)));
            }
        }
        out
    }

    #[test]
    fn ticks_follow_event_time() {
        let report = replay_events(&engine(3), stream(3), 1_000_000, |_| None).unwrap();
        let times: Vec<u64> = report.ticks.iter().map(|t| t.now_us).collect();
        assert_eq!(times, [1_000_000, 2_000_000]);
        // first window holds 0.0..=1.0 s → 11 samples, enough
        assert_eq!(report.ticks[0].outcome, Ok(ActivityLabel::Running));
    }

    #[test]
    fn accuracy_ignores_unlabelled_ticks() {
        let report = replay_events(&engine(2), stream(4), 1_000_000, |ts| {
            (ts >= 2_000_000).then_some(ActivityLabel::Walking)
        })
        .unwrap();
        assert_eq!(report.scored(), 2);
        assert_eq!(report.accuracy(), Some(1.0));
    }

    #[test]
    fn fatal_error_stops_replay() {
        let err = replay_events(&engine(9), stream(3), 1_000_000, |_| None).unwrap_err();
        assert!(err.is_fatal());
    }

    fn class_four_recording() -> Recording {
        use tripmode_config::RecordingRow;
        let rows = Channel::ALL.map(|_| {
            (0..40u64)
                .map(|i| RecordingRow {
                    class_no: if i < 20 { 0 } else { 4 },
                    timestamp_us: i * 100_000,
                    x: 0.05,
                    y: 0.0,
                    z: -0.05,
                })
                .collect::<Vec<_>>()
        });
        Recording::from_rows(rows)
    }

    #[test]
    fn svm_export_skips_unlabelled_and_sparse_ticks() {
        let spec = WindowSpec::new(10, 1.0, 2);
        let lines = export_svm(&class_four_recording(), spec, 42, &NormalizationParams::identity(), 1_000_000).unwrap();
        // ticks at 1, 2, 3 s; only 2 s and 3 s carry class 4
        assert_eq!(lines.len(), 2);
        assert!(lines.iter().all(|l| l.starts_with("4 0:")));
    }

    #[test]
    fn svm_export_buffers_with_the_given_capacity() {
        let spec = WindowSpec::new(10, 1.0, 2);
        // a 5-sample ring never holds the 8 samples a window needs
        let lines = export_svm(&class_four_recording(), spec, 5, &NormalizationParams::identity(), 1_000_000).unwrap();
        assert!(lines.is_empty());
    }

    #[test]
    fn empty_stream_has_no_ticks() {
        let report = replay_events(&engine(1), Vec::new(), 1_000_000, |_| None).unwrap();
        assert!(report.ticks.is_empty());
        assert_eq!(report.accuracy(), None);
    }
}
