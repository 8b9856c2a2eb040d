//! Heartbeat driver
//!
//! Each session gets a dedicated OS thread that wakes every ping interval and
//! asks the session (over its command channel) to send a heartbeat. The thread
//! never touches the socket or the cache itself.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self as std_mpsc, RecvTimeoutError};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use tokio::sync::mpsc;

use super::SessionCommand;

const UNKNOWN_LATENCY: u64 = u64::MAX;

/// Heartbeat round-trip time of one session
#[derive(Debug)]
pub struct LatencyGauge {
    last_ping: Mutex<Option<Instant>>,
    latency_nanos: AtomicU64,
}

impl LatencyGauge {
    pub fn new() -> Self {
        Self {
            last_ping: Mutex::new(None),
            latency_nanos: AtomicU64::new(UNKNOWN_LATENCY),
        }
    }

    pub fn record_ping(&self) {
        *self.last_ping.lock() = Some(Instant::now());
    }

    /// Complete the round-trip started by the last ping
    pub fn record_pong(&self) -> Option<Duration> {
        let sent = self.last_ping.lock().take()?;
        let rtt = sent.elapsed();
        let nanos = u64::try_from(rtt.as_nanos()).unwrap_or(UNKNOWN_LATENCY - 1);
        self.latency_nanos.store(nanos, Ordering::Relaxed);
        Some(rtt)
    }

    /// `None` until the first heartbeat round-trip completes
    pub fn latency(&self) -> Option<Duration> {
        match self.latency_nanos.load(Ordering::Relaxed) {
            UNKNOWN_LATENCY => None,
            nanos => Some(Duration::from_nanos(nanos)),
        }
    }
}

impl Default for LatencyGauge {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Default)]
struct StopSignal {
    stopped: Mutex<bool>,
    wake: Condvar,
}

impl StopSignal {
    /// Returns `false` if the signal was already raised
    fn raise(&self) -> bool {
        let mut stopped = self.stopped.lock();
        let first = !*stopped;
        *stopped = true;
        self.wake.notify_all();
        first
    }

    fn is_raised(&self) -> bool {
        *self.stopped.lock()
    }

    /// Sleep for `timeout` or until raised. Returns whether it was raised.
    fn sleep(&self, timeout: Duration) -> bool {
        let deadline = Instant::now().checked_add(timeout);
        let mut stopped = self.stopped.lock();
        while !*stopped {
            match deadline {
                Some(deadline) => {
                    if self.wake.wait_until(&mut stopped, deadline).timed_out() {
                        break;
                    }
                }
                // Too far out to represent; only a raise ends it
                None => self.wake.wait(&mut stopped),
            }
        }
        *stopped
    }
}

/// A running heartbeat thread
pub struct Heartbeat {
    label: String,
    stop: Arc<StopSignal>,
    thread: Option<JoinHandle<()>>,
}

impl Heartbeat {
    /// Spawn the heartbeat thread `heartbeat-<label>`.
    ///
    /// Every `interval` it sends a [`SessionCommand::Heartbeat`] and waits for the
    /// reply in `block_warn` slices, warning each time a slice elapses.
    pub(crate) fn start(
        label: impl Into<String>,
        interval: Duration,
        block_warn: Duration,
        commands: mpsc::UnboundedSender<SessionCommand>,
    ) -> std::io::Result<Self> {
        let label = label.into();
        let stop = Arc::new(StopSignal::default());

        let thread = std::thread::Builder::new()
            .name(format!("heartbeat-{label}"))
            .spawn({
                let label = label.clone();
                let stop = stop.clone();
                move || run(&label, interval, block_warn, &commands, &stop)
            })?;

        Ok(Self {
            label,
            stop,
            thread: Some(thread),
        })
    }

    /// Halt before the next tick. Safe to call more than once.
    ///
    /// Does not join: a send already in flight finishes on its own.
    pub fn stop(&self) {
        if self.stop.raise() {
            tracing::debug!(session = %self.label, "Heartbeat stop requested");
        }
    }

    pub fn is_running(&self) -> bool {
        self.thread.as_ref().is_some_and(|thread| !thread.is_finished())
    }
}

impl Drop for Heartbeat {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for Heartbeat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Heartbeat")
            .field("label", &self.label)
            .field("running", &self.is_running())
            .finish()
    }
}

fn run(
    label: &str,
    interval: Duration,
    block_warn: Duration,
    commands: &mpsc::UnboundedSender<SessionCommand>,
    stop: &StopSignal,
) {
    tracing::debug!(session = %label, interval_ms = interval.as_millis() as u64, "Heartbeat started");

    while !stop.sleep(interval) {
        let (reply, outcome) = std_mpsc::sync_channel(1);
        if commands.send(SessionCommand::Heartbeat { reply }).is_err() {
            tracing::debug!(session = %label, "Session gone, stopping heartbeat");
            break;
        }

        if let Err(reason) = await_send(label, &outcome, block_warn, stop) {
            tracing::warn!(session = %label, error = %reason, "Heartbeat send failed, stopping");
            break;
        }
    }

    tracing::debug!(session = %label, "Heartbeat stopped");
}

/// Wait for the session to report the send, warning every `slice`
fn await_send(
    label: &str,
    outcome: &std_mpsc::Receiver<Result<(), String>>,
    slice: Duration,
    stop: &StopSignal,
) -> Result<(), String> {
    let mut waited = Duration::ZERO;
    loop {
        match outcome.recv_timeout(slice) {
            Ok(result) => return result,
            Err(RecvTimeoutError::Timeout) => {
                if stop.is_raised() {
                    return Ok(());
                }
                waited = waited.saturating_add(slice);
                let current = std::thread::current();
                tracing::warn!(
                    session = %label,
                    thread = current.name().unwrap_or("heartbeat"),
                    blocked_secs = waited.as_secs(),
                    "Heartbeat blocked for more than {} seconds",
                    waited.as_secs()
                );
            }
            Err(RecvTimeoutError::Disconnected) => {
                return Err("session dropped the heartbeat request".to_string());
            }
        }
    }
}
