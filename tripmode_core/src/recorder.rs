//! Recording lifecycle: STOPPED ⇄ COLLECTING.
//!
//! Commands arrive on a channel from any thread ([`RecorderHandle`]); the
//! owner applies them against a [`ReportSink`]. A transition is committed
//! only after the sink accepted the matching start/end call, so a failed
//! request leaves the state untouched. Subscribers see every committed state.
use crate::error::RecorderError;
use crossbeam_channel as xch;
use tripmode_traits::ReportSink;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordCommand {
    Start,
    Stop,
    /// Start when stopped, stop when collecting.
    Toggle,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RecordState {
    #[default]
    Stopped,
    Collecting {
        travel_id: String,
    },
}

impl RecordState {
    pub fn travel_id(&self) -> Option<&str> {
        match self {
            RecordState::Stopped => None,
            RecordState::Collecting { travel_id } => Some(travel_id),
        }
    }

    pub fn is_collecting(&self) -> bool {
        matches!(self, RecordState::Collecting { .. })
    }
}

impl core::fmt::Display for RecordState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            RecordState::Stopped => f.write_str("STOP"),
            RecordState::Collecting { .. } => f.write_str("COLLECTING"),
        }
    }
}

/// Cloneable command sender for UI/signal threads.
#[derive(Debug, Clone)]
pub struct RecorderHandle {
    tx: xch::Sender<RecordCommand>,
}

impl RecorderHandle {
    /// Queue a command. Returns false once the recorder is gone.
    pub fn send(&self, cmd: RecordCommand) -> bool {
        self.tx.send(cmd).is_ok()
    }

    pub fn toggle(&self) -> bool {
        self.send(RecordCommand::Toggle)
    }
}

type IdGen = Box<dyn FnMut() -> String + Send>;

/// A fresh travel id: random UUID in its 32-digit hex form.
pub fn new_travel_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

pub struct Recorder {
    state: RecordState,
    commands: xch::Receiver<RecordCommand>,
    observers: Vec<xch::Sender<RecordState>>,
    next_id: IdGen,
}

impl core::fmt::Debug for Recorder {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Recorder")
            .field("state", &self.state)
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl Recorder {
    pub fn new() -> (Self, RecorderHandle) {
        Self::with_id_generator(new_travel_id)
    }

    /// Same as `new` with a custom travel id source (deterministic tests).
    pub fn with_id_generator<F>(next_id: F) -> (Self, RecorderHandle)
    where
        F: FnMut() -> String + Send + 'static,
    {
        let (tx, rx) = xch::unbounded();
        let recorder = Self {
            state: RecordState::Stopped,
            commands: rx,
            observers: Vec::new(),
            next_id: Box::new(next_id),
        };
        (recorder, RecorderHandle { tx })
    }

    pub fn state(&self) -> &RecordState {
        &self.state
    }

    /// Receiver of committed states, primed with the current one.
    pub fn subscribe(&mut self) -> xch::Receiver<RecordState> {
        let (tx, rx) = xch::unbounded();
        let _ = tx.send(self.state.clone());
        self.observers.push(tx);
        rx
    }

    pub(crate) fn commands(&self) -> &xch::Receiver<RecordCommand> {
        &self.commands
    }

    /// Apply one command against `sink`.
    ///
    /// On error the state is unchanged and nothing is published.
    pub fn apply<K: ReportSink + ?Sized>(
        &mut self,
        cmd: RecordCommand,
        sink: &mut K,
    ) -> Result<&RecordState, RecorderError> {
        let start = match (cmd, &self.state) {
            (RecordCommand::Start, RecordState::Collecting { .. }) => {
                return Err(RecorderError::AlreadyCollecting);
            }
            (RecordCommand::Stop, RecordState::Stopped) => {
                return Err(RecorderError::NotCollecting);
            }
            (RecordCommand::Start | RecordCommand::Toggle, RecordState::Stopped) => true,
            (RecordCommand::Stop | RecordCommand::Toggle, RecordState::Collecting { .. }) => false,
        };

        let next = if start {
            let travel_id = (self.next_id)();
            sink.start_record(&travel_id)
                .map_err(|e| RecorderError::Sink {
                    op: "start_record",
                    message: e.to_string(),
                })?;
            tracing::info!(%travel_id, "recording started");
            RecordState::Collecting { travel_id }
        } else {
            let travel_id = self.state.travel_id().unwrap_or_default().to_owned();
            sink.end_record(&travel_id).map_err(|e| RecorderError::Sink {
                op: "end_record",
                message: e.to_string(),
            })?;
            tracing::info!(%travel_id, "recording stopped");
            RecordState::Stopped
        };

        self.state = next;
        self.publish();
        Ok(&self.state)
    }

    /// Apply every queued command; failures are logged and skipped.
    pub fn drain<K: ReportSink + ?Sized>(&mut self, sink: &mut K) -> usize {
        let pending: Vec<RecordCommand> = self.commands.try_iter().collect();
        let mut applied = 0;
        for cmd in pending {
            match self.apply(cmd, sink) {
                Ok(_) => applied += 1,
                Err(e) => tracing::warn!(?cmd, error = %e, "record command not applied"),
            }
        }
        applied
    }

    fn publish(&mut self) {
        let state = &self.state;
        self.observers.retain(|tx| tx.send(state.clone()).is_ok());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::{MemorySink, SinkCall};

    fn counter_ids() -> impl FnMut() -> String + Send {
        let mut n = 0;
        move || {
            n += 1;
            format!("t{n}")
        }
    }

    #[test]
    fn travel_ids_are_32_hex_digits() {
        let id = new_travel_id();
        assert_eq!(id.len(), 32);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(id, new_travel_id());
    }

    #[test]
    fn toggle_cycles_through_states() {
        let (mut rec, _h) = Recorder::with_id_generator(counter_ids());
        let mut sink = MemorySink::default();
        assert_eq!(
            rec.apply(RecordCommand::Toggle, &mut sink).unwrap().travel_id(),
            Some("t1")
        );
        assert_eq!(
            rec.apply(RecordCommand::Toggle, &mut sink).unwrap(),
            &RecordState::Stopped
        );
        assert_eq!(
            sink.calls,
            vec![SinkCall::Start("t1".into()), SinkCall::End("t1".into())]
        );
    }

    #[test]
    fn sink_failure_keeps_state() {
        let (mut rec, _h) = Recorder::with_id_generator(counter_ids());
        let mut sink = MemorySink {
            fail_start: true,
            ..MemorySink::default()
        };
        let err = rec.apply(RecordCommand::Start, &mut sink).unwrap_err();
        assert!(matches!(err, RecorderError::Sink { op: "start_record", .. }));
        assert_eq!(rec.state(), &RecordState::Stopped);

        sink.fail_start = false;
        sink.fail_end = true;
        rec.apply(RecordCommand::Start, &mut sink).unwrap();
        assert!(rec.apply(RecordCommand::Stop, &mut sink).is_err());
        assert!(rec.state().is_collecting());
    }

    #[test]
    fn redundant_commands_are_rejected() {
        let (mut rec, _h) = Recorder::with_id_generator(counter_ids());
        let mut sink = MemorySink::default();
        assert_eq!(
            rec.apply(RecordCommand::Stop, &mut sink),
            Err(RecorderError::NotCollecting)
        );
        rec.apply(RecordCommand::Start, &mut sink).unwrap();
        assert_eq!(
            rec.apply(RecordCommand::Start, &mut sink),
            Err(RecorderError::AlreadyCollecting)
        );
        assert_eq!(sink.calls.len(), 1);
    }

    #[test]
    fn subscribers_see_committed_states_only() {
        let (mut rec, handle) = Recorder::with_id_generator(counter_ids());
        let states = rec.subscribe();
        let mut sink = MemorySink::default();

        assert!(handle.toggle());
        assert!(handle.send(RecordCommand::Start));
        assert!(handle.toggle());
        assert_eq!(rec.drain(&mut sink), 2);

        let seen: Vec<String> = states.try_iter().map(|s| s.to_string()).collect();
        assert_eq!(seen, ["STOP", "COLLECTING", "STOP"]);
    }
}
