//! The ingest thread fills the shared buffers and is joined on drop.
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tripmode_core::{BufferSet, Ingestor};
use tripmode_traits::clock::{Clock, ManualClock, MonotonicClock};
use tripmode_traits::{BoxError, Channel, Sample, SensorEvent, SensorSource};

/// Yields a fixed script of events, then times out forever.
struct ScriptSource(VecDeque<SensorEvent>);

impl SensorSource for ScriptSource {
    fn read(&mut self, timeout: Duration) -> Result<SensorEvent, BoxError> {
        match self.0.pop_front() {
            Some(ev) => Ok(ev),
            None => {
                std::thread::sleep(timeout);
                Err("timeout".into())
            }
        }
    }
}

fn script(n: u64) -> ScriptSource {
    ScriptSource(
        (0..n)
            .map(|i| SensorEvent::new(Channel::ALL[(i % 3) as usize], Sample::new(i * 1_000, 0.0, 0.0, 0.0)))
            .collect(),
    )
}

fn wait_for(mut cond: impl FnMut() -> bool) -> bool {
    let start = Instant::now();
    while start.elapsed() < Duration::from_secs(2) {
        if cond() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(2));
    }
    false
}

#[test]
fn events_land_in_the_shared_buffers() {
    let buffers = Arc::new(BufferSet::with_capacity(64));
    let ing = Ingestor::spawn(script(30), Arc::clone(&buffers), Duration::from_millis(5), MonotonicClock::new());
    assert!(wait_for(|| ing.stats().received == 30));
    for (_, buf) in buffers.iter() {
        assert_eq!(buf.len(), 10);
    }
    assert!(wait_for(|| ing.stats().errors > 0));
    assert!(ing.is_running());
    drop(ing);
}

#[test]
fn rejected_events_are_counted() {
    let buffers = Arc::new(BufferSet::with_capacity(64));
    let mut src = script(0);
    src.0.push_back(SensorEvent::new(Channel::Gravity, Sample::new(1, f32::INFINITY, 0.0, 0.0)));
    let ing = Ingestor::spawn(src, Arc::clone(&buffers), Duration::from_millis(5), MonotonicClock::new());
    assert!(wait_for(|| ing.stats().received == 1));
    assert_eq!(ing.stats().rejected, 1);
    assert!(buffers.get(Channel::Gravity).is_empty());
}

#[test]
fn repeated_spawn_and_drop_does_not_hang() {
    for _ in 0..10 {
        let buffers = Arc::new(BufferSet::with_capacity(16));
        let ing = Ingestor::spawn(script(5), buffers, Duration::from_millis(5), MonotonicClock::new());
        std::thread::sleep(Duration::from_millis(5));
        drop(ing);
    }
}

/// Yields its script, then blocks until `open` is set so the clock stays put.
struct GatedSource {
    events: VecDeque<SensorEvent>,
    open: Arc<AtomicBool>,
}

impl SensorSource for GatedSource {
    fn read(&mut self, timeout: Duration) -> Result<SensorEvent, BoxError> {
        if let Some(ev) = self.events.pop_front() {
            return Ok(ev);
        }
        while !self.open.load(Ordering::Relaxed) {
            std::thread::sleep(Duration::from_millis(1));
        }
        std::thread::sleep(timeout);
        Err("closed".into())
    }
}

#[test]
fn stall_is_measured_on_the_injected_clock() {
    let clock = ManualClock::new();
    let open = Arc::new(AtomicBool::new(false));
    let src = GatedSource {
        events: script(1).0,
        open: Arc::clone(&open),
    };
    let buffers = Arc::new(BufferSet::with_capacity(16));
    let ing = Ingestor::spawn(src, buffers, Duration::from_millis(5), clock.clone());
    assert!(wait_for(|| ing.stats().received == 1));
    assert_eq!(ing.stalled_for_now(), 0);

    clock.advance(Duration::from_millis(750));
    assert_eq!(ing.stalled_for_now(), 750);
    assert_eq!(ing.stalled_for(clock.ms_since(clock.origin())), 750);

    open.store(true, Ordering::Relaxed);
    drop(ing);
}
