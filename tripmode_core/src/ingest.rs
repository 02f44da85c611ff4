//! Background sensor ingestion.
//!
//! Spawns a thread that owns the `SensorSource` and appends every event into
//! the shared [`BufferSet`]. It tracks the last-ok timestamp so callers can
//! detect a stalled sensor. The thread is shut down and joined on drop.
use crate::buffer::{AppendOutcome, BufferSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tripmode_traits::SensorSource;
use tripmode_traits::clock::Clock;

#[derive(Debug, Default)]
struct IngestCounters {
    received: AtomicU64,
    rejected: AtomicU64,
    errors: AtomicU64,
}

/// Counter snapshot of an [`Ingestor`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    pub received: u64,
    pub rejected: u64,
    pub errors: u64,
}

pub struct Ingestor {
    last_ok: Arc<AtomicU64>,
    counters: Arc<IngestCounters>,
    // milliseconds since spawn on the ingestor's clock
    elapsed_ms: Box<dyn Fn() -> u64 + Send + Sync>,
    shutdown: Arc<AtomicBool>,
    join_handle: Option<std::thread::JoinHandle<()>>,
}

impl Ingestor {
    /// `source.read(timeout)` is expected to block until the next event; the
    /// thread adds no pacing of its own. After a read error it backs off for
    /// one `timeout` before retrying.
    pub fn spawn<S, C>(mut source: S, buffers: Arc<BufferSet>, timeout: Duration, clock: C) -> Self
    where
        S: SensorSource + Send + 'static,
        C: Clock + Send + Sync + 'static,
    {
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = Arc::clone(&shutdown);
        let last_ok = Arc::new(AtomicU64::new(0));
        let last_ok_clone = Arc::clone(&last_ok);
        let counters = Arc::new(IngestCounters::default());
        let counters_clone = Arc::clone(&counters);
        let clock = Arc::new(clock);
        let epoch = clock.now();
        let elapsed_ms: Box<dyn Fn() -> u64 + Send + Sync> = {
            let clock = Arc::clone(&clock);
            Box::new(move || clock.ms_since(epoch))
        };

        let join_handle = std::thread::spawn(move || {
            loop {
                if shutdown_clone.load(Ordering::Relaxed) {
                    tracing::debug!("ingest thread received shutdown signal");
                    break;
                }
                match source.read(timeout) {
                    Ok(event) => {
                        last_ok_clone.store(clock.ms_since(epoch), Ordering::Relaxed);
                        if buffers.push(event) == AppendOutcome::Rejected {
                            counters_clone.rejected.fetch_add(1, Ordering::Relaxed);
                        }
                        counters_clone.received.fetch_add(1, Ordering::Release);
                    }
                    Err(e) => {
                        let n = counters_clone.errors.fetch_add(1, Ordering::Relaxed) + 1;
                        // first failure and then every 100th, to keep a dead sensor quiet
                        if n == 1 || n % 100 == 0 {
                            tracing::warn!(error = %e, errors = n, "sensor read failed");
                        }
                        if shutdown_clone.load(Ordering::Relaxed) {
                            break;
                        }
                        clock.sleep(timeout);
                    }
                }
            }
            tracing::trace!("ingest thread exiting cleanly");
        });

        Self {
            last_ok,
            counters,
            elapsed_ms,
            shutdown,
            join_handle: Some(join_handle),
        }
    }

    pub fn stats(&self) -> IngestStats {
        IngestStats {
            received: self.counters.received.load(Ordering::Acquire),
            rejected: self.counters.rejected.load(Ordering::Relaxed),
            errors: self.counters.errors.load(Ordering::Relaxed),
        }
    }

    /// Milliseconds since the last accepted read, measured against `now_ms`
    /// on the clock the ingestor was spawned with.
    pub fn stalled_for(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.last_ok.load(Ordering::Relaxed))
    }

    /// Same as `stalled_for`, reading the current time from the ingestor's clock.
    pub fn stalled_for_now(&self) -> u64 {
        self.stalled_for((self.elapsed_ms)())
    }

    pub fn is_running(&self) -> bool {
        self.join_handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for Ingestor {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        // Returns once the in-flight read completes, at most one sensor timeout.
        if let Some(handle) = self.join_handle.take() {
            match handle.join() {
                Ok(()) => tracing::trace!("ingest thread joined"),
                Err(e) => tracing::warn!(?e, "ingest thread panicked during shutdown"),
            }
        }
    }
}
