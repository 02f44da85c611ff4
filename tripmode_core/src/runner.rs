//! Periodic tick driver: classify, post while recording, apply record commands.
use crate::engine::ClassificationEngine;
use crate::error::{EngineError, Result as CoreResult};
use crate::recorder::{RecordCommand, RecordState, Recorder};
use crate::types::ActivityLabel;
use crossbeam_channel as xch;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tripmode_traits::clock::Clock;
use tripmode_traits::{Classifier, ReportSink};

/// Upper bound on how long a shutdown request goes unnoticed.
const SHUTDOWN_POLL: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityReport {
    pub travel_id: String,
    pub timestamp_us: u64,
    pub label: ActivityLabel,
}

/// What a single tick did.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// Classified while not recording.
    Classified(ActivityLabel),
    Posted(ActivityReport),
    /// Classified, but the sink refused the post.
    PostFailed(ActivityLabel),
    /// A non-fatal engine error; the next tick proceeds normally.
    Skipped(EngineError),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub ticks: u64,
    pub posted: u64,
    pub post_failures: u64,
    pub skipped: u64,
    pub last: Option<ActivityLabel>,
}

pub struct Runner<C: Classifier, K: ReportSink> {
    engine: Arc<ClassificationEngine<C>>,
    recorder: Recorder,
    sink: K,
    period: Duration,
    deadline: Option<Duration>,
    summary: RunSummary,
}

impl<C: Classifier, K: ReportSink> Runner<C, K> {
    pub fn new(engine: Arc<ClassificationEngine<C>>, recorder: Recorder, sink: K, period: Duration) -> Self {
        Self {
            engine,
            recorder,
            sink,
            period: period.max(Duration::from_millis(1)),
            deadline: None,
            summary: RunSummary::default(),
        }
    }

    /// Stop `run` once this much clock time has passed since its epoch.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn recorder(&self) -> &Recorder {
        &self.recorder
    }

    pub fn recorder_mut(&mut self) -> &mut Recorder {
        &mut self.recorder
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    pub fn into_sink(self) -> K {
        self.sink
    }

    pub fn summary(&self) -> RunSummary {
        self.summary
    }

    /// Apply every queued record command now.
    pub fn handle_commands(&mut self) -> usize {
        self.recorder.drain(&mut self.sink)
    }

    /// One tick at `now_us`. Only fatal engine errors are returned as `Err`.
    pub fn tick(&mut self, now_us: u64) -> Result<TickOutcome, EngineError> {
        self.summary.ticks += 1;
        let label = match self.engine.classify(now_us) {
            Ok(label) => label,
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                self.summary.skipped += 1;
                match &e {
                    EngineError::Busy => tracing::debug!(now_us, "tick dropped: engine busy"),
                    _ => tracing::warn!(now_us, error = %e, "tick skipped"),
                }
                return Ok(TickOutcome::Skipped(e));
            }
        };
        self.summary.last = Some(label);

        let RecordState::Collecting { travel_id } = self.recorder.state() else {
            return Ok(TickOutcome::Classified(label));
        };
        let travel_id = travel_id.clone();
        match self.sink.post(&travel_id, now_us, label.name()) {
            Ok(()) => {
                self.summary.posted += 1;
                tracing::debug!(%travel_id, now_us, %label, "posted");
                Ok(TickOutcome::Posted(ActivityReport {
                    travel_id,
                    timestamp_us: now_us,
                    label,
                }))
            }
            Err(e) => {
                self.summary.post_failures += 1;
                tracing::warn!(%travel_id, now_us, error = %e, "post failed");
                Ok(TickOutcome::PostFailed(label))
            }
        }
    }

    /// Drive ticks until `shutdown` is set, the deadline passes, or the engine
    /// halts on a model mismatch. Timestamps are `clock.micros_since(epoch)`.
    ///
    /// Ticks come from a capacity-1 ticker: a tick that overruns the period
    /// causes the missed ones to be dropped, never queued.
    pub fn run<Cl: Clock>(&mut self, clock: &Cl, epoch: Instant, shutdown: &AtomicBool) -> CoreResult<RunSummary> {
        let ticker = xch::tick(self.period);
        let mut commands = self.recorder.commands().clone();
        tracing::info!(period_ms = u64::try_from(self.period.as_millis()).unwrap_or(u64::MAX), "runner start");

        let result = loop {
            if shutdown.load(Ordering::Relaxed) {
                tracing::info!("runner shutdown requested");
                break Ok(());
            }
            if let Some(deadline) = self.deadline
                && u128::from(clock.ms_since(epoch)) >= deadline.as_millis()
            {
                tracing::info!("runner deadline reached");
                break Ok(());
            }

            let mut disconnected = false;
            xch::select! {
                recv(commands) -> msg => match msg {
                    Ok(cmd) => self.apply_logged(cmd),
                    Err(_) => disconnected = true,
                },
                recv(ticker) -> _ => {
                    let now_us = clock.micros_since(epoch);
                    if let Err(e) = self.tick(now_us) {
                        tracing::error!(now_us, error = %e, "runner halted");
                        break Err(e);
                    }
                },
                default(SHUTDOWN_POLL) => {}
            }
            if disconnected {
                // every handle dropped; keep ticking without commands
                commands = xch::never();
            }
        };

        if self.recorder.state().is_collecting() {
            self.apply_logged(RecordCommand::Stop);
        }
        tracing::info!(
            ticks = self.summary.ticks,
            posted = self.summary.posted,
            skipped = self.summary.skipped,
            "runner stop"
        );
        result?;
        Ok(self.summary)
    }

    fn apply_logged(&mut self, cmd: RecordCommand) {
        if let Err(e) = self.recorder.apply(cmd, &mut self.sink) {
            tracing::warn!(?cmd, error = %e, "record command not applied");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::{FixedClassifier, MemorySink};

    fn runner(code: i32) -> Runner<FixedClassifier, MemorySink> {
        let engine = ClassificationEngine::builder()
            .with_classifier(FixedClassifier(code))
            .build()
            .unwrap();
        let (rec, _h) = Recorder::with_id_generator(|| "trip".to_owned());
        Runner::new(Arc::new(engine), rec, MemorySink::default(), Duration::from_secs(1))
    }

    #[test]
    fn idle_ticks_do_not_post() {
        let mut r = runner(1);
        assert_eq!(
            r.tick(1_000_000),
            Ok(TickOutcome::Classified(ActivityLabel::None))
        );
        assert!(r.sink().calls.is_empty());
    }

    #[test]
    fn collecting_ticks_post_label_name() {
        let mut r = runner(1);
        let mut sink = MemorySink::default();
        r.recorder_mut()
            .apply(RecordCommand::Start, &mut sink)
            .unwrap();
        let out = r.tick(3_000_000).unwrap();
        assert!(matches!(out, TickOutcome::Posted(ref rep) if rep.travel_id == "trip"));
        let posts: Vec<_> = r.sink().posts().collect();
        assert_eq!(posts, [("trip", 3_000_000, "NONE")]);
    }

    #[test]
    fn failed_post_is_counted_not_fatal() {
        let mut r = runner(1);
        r.sink.fail_post = true;
        r.recorder.apply(RecordCommand::Start, &mut r.sink).unwrap();
        assert_eq!(
            r.tick(0),
            Ok(TickOutcome::PostFailed(ActivityLabel::None))
        );
        assert_eq!(r.summary().post_failures, 1);
    }
}
