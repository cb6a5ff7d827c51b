//! Elapsed-time stopwatch with a per-frame display ticker.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::debug;
use vault_core::format_clock;

/// Display refresh period, roughly one frame at 60 Hz.
pub const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// Timer operations a level attempt depends on.
pub trait Timer: Send {
    /// Begin measuring. No-op while already running.
    fn start(&mut self);

    /// Freeze the reading. No-op while stopped.
    fn stop(&mut self);

    /// Zero the reading and rebase the reference instant to now.
    fn reset(&mut self);

    /// Current reading in milliseconds.
    fn elapsed_ms(&self) -> i64;

    /// Whether the timer is advancing.
    fn is_running(&self) -> bool;

    /// Whole seconds elapsed, rounded down.
    fn elapsed_seconds(&self) -> i64 {
        self.elapsed_ms().div_euclid(1000)
    }

    /// Reading rendered as `MM:SS`.
    fn formatted(&self) -> String {
        format_clock(self.elapsed_seconds().max(0) as u64)
    }
}

/// One published stopwatch reading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopwatchReading {
    /// Elapsed milliseconds
    pub elapsed_ms: u64,

    /// `MM:SS` rendering
    pub formatted: String,

    /// Whether the stopwatch was running when this was published
    pub running: bool,
}

impl StopwatchReading {
    fn new(elapsed_ms: u64, running: bool) -> Self {
        Self {
            elapsed_ms,
            formatted: format_clock(elapsed_ms / 1000),
            running,
        }
    }
}

/// Measures one level attempt.
///
/// While running, a ticker task republishes the reading every frame on a
/// watch channel (see [`Stopwatch::subscribe`]). The ticker is cancelled on
/// [`stop`](Timer::stop) and when the stopwatch is dropped.
pub struct Stopwatch {
    running: bool,
    reference: Option<Instant>,
    frozen_ms: u64,
    frame_interval: Duration,
    display: Arc<watch::Sender<StopwatchReading>>,
    ticker: Option<Ticker>,
}

impl Stopwatch {
    /// Create a stopped stopwatch reading zero.
    pub fn new() -> Self {
        Self::with_frame_interval(DEFAULT_FRAME_INTERVAL)
    }

    /// Create a stopwatch with a custom display refresh period.
    pub fn with_frame_interval(frame_interval: Duration) -> Self {
        let (display, _) = watch::channel(StopwatchReading::new(0, false));
        Self {
            running: false,
            reference: None,
            frozen_ms: 0,
            frame_interval,
            display: Arc::new(display),
            ticker: None,
        }
    }

    /// Receive display readings.
    pub fn subscribe(&self) -> watch::Receiver<StopwatchReading> {
        self.display.subscribe()
    }

    /// Whether a display ticker is currently scheduled.
    pub fn has_ticker(&self) -> bool {
        self.ticker.is_some()
    }

    fn current_ms(&self) -> u64 {
        match (self.running, self.reference) {
            (true, Some(reference)) => reference.elapsed().as_millis() as u64,
            _ => self.frozen_ms,
        }
    }

    fn publish(&self) {
        self.display
            .send_replace(StopwatchReading::new(self.current_ms(), self.running));
    }

    fn cancel_ticker(&mut self) {
        // Dropping the handle cancels the task.
        self.ticker = None;
    }

    fn schedule_ticker(&mut self) {
        self.cancel_ticker();
        if let Some(reference) = self.reference {
            self.ticker = Ticker::spawn(reference, self.frame_interval, Arc::clone(&self.display));
        }
    }
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self::new()
    }
}

impl Timer for Stopwatch {
    fn start(&mut self) {
        if self.running {
            return;
        }
        self.reference = Some(Instant::now());
        self.frozen_ms = 0;
        self.running = true;
        self.schedule_ticker();
        self.publish();
        debug!("Stopwatch started");
    }

    fn stop(&mut self) {
        self.cancel_ticker();
        if !self.running {
            return;
        }
        self.frozen_ms = self.current_ms();
        self.running = false;
        self.publish();
        debug!("Stopwatch stopped at {}ms", self.frozen_ms);
    }

    fn reset(&mut self) {
        self.frozen_ms = 0;
        self.reference = Some(Instant::now());
        if self.running {
            self.schedule_ticker();
        }
        self.publish();
    }

    fn elapsed_ms(&self) -> i64 {
        self.current_ms().min(i64::MAX as u64) as i64
    }

    fn is_running(&self) -> bool {
        self.running
    }
}

impl Drop for Stopwatch {
    fn drop(&mut self) {
        self.cancel_ticker();
    }
}

/// Cancellable repeating task that republishes the running reading.
struct Ticker {
    handle: JoinHandle<()>,
    cancelled: Arc<AtomicBool>,
}

impl Ticker {
    /// Spawn on the current runtime. Without one the display simply isn't
    /// refreshed; elapsed time is still measured.
    fn spawn(
        reference: Instant,
        frame_interval: Duration,
        display: Arc<watch::Sender<StopwatchReading>>,
    ) -> Option<Self> {
        let runtime = match Handle::try_current() {
            Ok(runtime) => runtime,
            Err(_) => {
                debug!("No async runtime; stopwatch display ticker disabled");
                return None;
            }
        };

        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancelled);

        let handle = runtime.spawn(async move {
            let mut frames = tokio::time::interval(frame_interval);
            frames.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                frames.tick().await;
                let reading = StopwatchReading::new(reference.elapsed().as_millis() as u64, true);
                // The flag is checked under the channel lock so a stop() that
                // already published its frozen reading is never overwritten.
                display.send_if_modified(|current| {
                    if flag.load(Ordering::SeqCst) {
                        return false;
                    }
                    *current = reading;
                    true
                });
                if flag.load(Ordering::SeqCst) {
                    break;
                }
            }
        });

        Some(Self { handle, cancelled })
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.handle.abort();
    }
}
