use crate::client::constants::SLEEP_SLICE_MS;
use crate::client::error::{ClientError, FailureKind, MeasurementFailure};
use crate::client::probe::{LatencyProbe, ThroughputMeter};
use crate::client::sample::{bytes_per_sec_to_mbps, duration_to_ms, Sample};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::Sender;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Whether a periodic loop is active
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollerState {
    Idle,
    Running,
}

/// Messages from a measurement worker to the UI thread
#[derive(Debug, Clone, PartialEq)]
pub enum MonitorEvent {
    CycleStarted,
    Completed(Sample),
    Failed(MeasurementFailure),
    /// Sent after `Completed` or `Failed`, whatever the outcome
    CycleFinished,
    /// The periodic loop observed a stop request and exited
    Stopped,
}

/// Runs measurement cycles against a throughput meter and a latency probe
pub struct Poller<M, P> {
    meter: M,
    probe: P,
}

impl<M: ThroughputMeter, P: LatencyProbe> Poller<M, P> {
    pub fn new(meter: M, probe: P) -> Self {
        Self { meter, probe }
    }

    /// Runs one cycle: download, upload, then latency.
    ///
    /// Any collaborator error aborts the cycle and comes back as a
    /// [`MeasurementFailure`]. A probe without an answer still yields a
    /// sample, with latency 0.
    pub fn measure_once(&mut self) -> Result<Sample, MeasurementFailure> {
        let start = Instant::now();

        let download = self
            .meter
            .download()
            .and_then(checked_rate)
            .map_err(|e| failure(FailureKind::Throughput, &e))?;
        let upload = self
            .meter
            .upload()
            .and_then(checked_rate)
            .map_err(|e| failure(FailureKind::Throughput, &e))?;
        let rtt = self
            .probe
            .probe()
            .map_err(|e| failure(FailureKind::Latency, &e))?;

        if rtt.is_none() {
            warn!("Latency probe got no answer, recording 0 ms");
        }

        let sample = Sample::now(
            bytes_per_sec_to_mbps(download),
            bytes_per_sec_to_mbps(upload),
            rtt.map(duration_to_ms),
        );

        info!(
            download_mbps = sample.download_mbps,
            upload_mbps = sample.upload_mbps,
            latency_ms = sample.latency_ms,
            probe_answered = sample.probe_answered,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Measurement cycle completed"
        );
        Ok(sample)
    }

    /// Runs one cycle and reports it on `events`
    pub fn measure_and_send(&mut self, events: &Sender<MonitorEvent>) {
        send(events, MonitorEvent::CycleStarted);
        let event = match self.measure_once() {
            Ok(sample) => MonitorEvent::Completed(sample),
            Err(failure) => MonitorEvent::Failed(failure),
        };
        send(events, event);
        send(events, MonitorEvent::CycleFinished);
    }
}

/// A poller shared between worker threads.
///
/// The mutex serializes cycles. `in_flight` counts cycles that are running
/// or queued on the mutex, so a one-off check can be refused up front.
pub struct SharedPoller<M, P> {
    poller: Mutex<Poller<M, P>>,
    in_flight: AtomicUsize,
}

impl<M: ThroughputMeter, P: LatencyProbe> SharedPoller<M, P> {
    pub fn new(poller: Poller<M, P>) -> Self {
        Self {
            poller: Mutex::new(poller),
            in_flight: AtomicUsize::new(0),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Poller<M, P>> {
        self.poller.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// True while any cycle is running or waiting for the poller
    pub fn is_checking(&self) -> bool {
        self.in_flight.load(Ordering::Acquire) > 0
    }

    /// Claims the poller for a one-off cycle; false if any cycle is in flight.
    ///
    /// A successful reservation must be followed by [`Self::run_reserved`]
    /// or [`Self::release`].
    pub fn try_reserve(&self) -> bool {
        self.in_flight
            .compare_exchange(0, 1, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Drops a reservation whose cycle will never run
    pub fn release(&self) {
        self.in_flight.fetch_sub(1, Ordering::AcqRel);
    }

    /// Runs the cycle claimed by [`Self::try_reserve`]
    pub fn run_reserved(&self, events: &Sender<MonitorEvent>) {
        let _slot = InFlight(&self.in_flight);
        self.lock().measure_and_send(events);
    }

    /// Runs one cycle unconditionally, waiting for any cycle ahead of it
    pub fn run_cycle(&self, events: &Sender<MonitorEvent>) {
        self.in_flight.fetch_add(1, Ordering::AcqRel);
        let _slot = InFlight(&self.in_flight);
        self.lock().measure_and_send(events);
    }

    /// Measures every `interval` until `should_continue` returns false.
    ///
    /// Meant to run on a dedicated thread; all outcomes go to `events`,
    /// followed by [`MonitorEvent::Stopped`]. The poller is locked per
    /// cycle, never across the sleep. Returns the number of cycles run.
    pub fn run_periodic<C>(
        &self,
        interval: Duration,
        should_continue: C,
        events: &Sender<MonitorEvent>,
    ) -> usize
    where
        C: FnMut() -> bool,
    {
        let cycles = repeat_every(interval, should_continue, || self.run_cycle(events));
        send(events, MonitorEvent::Stopped);
        cycles
    }
}

/// Releases one in-flight slot on drop, even if the cycle panics
struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Calls `cycle` every `interval` until `should_continue` returns false.
///
/// The stop flag is checked before every cycle and while sleeping, never
/// during a cycle, so an in-flight cycle always completes.
fn repeat_every<C, F>(interval: Duration, mut should_continue: C, mut cycle: F) -> usize
where
    C: FnMut() -> bool,
    F: FnMut(),
{
    let mut cycles = 0usize;
    debug!(interval_ms = interval.as_millis() as u64, "Periodic loop started");

    while should_continue() {
        cycle();
        cycles += 1;

        if !sleep_while(interval, &mut should_continue) {
            break;
        }
    }

    debug!(cycles = cycles, "Periodic loop stopped");
    cycles
}

/// Sleeps for `duration` in short slices; false if stopped early
fn sleep_while<C: FnMut() -> bool>(duration: Duration, should_continue: &mut C) -> bool {
    let deadline = Instant::now() + duration;
    let slice = Duration::from_millis(SLEEP_SLICE_MS);

    loop {
        let now = Instant::now();
        if now >= deadline {
            return true;
        }
        thread::sleep(slice.min(deadline - now));
        if !should_continue() {
            return false;
        }
    }
}

fn checked_rate(bytes_per_sec: f64) -> Result<f64, ClientError> {
    if bytes_per_sec.is_finite() && bytes_per_sec >= 0.0 {
        Ok(bytes_per_sec)
    } else {
        Err(ClientError::Measurement(format!(
            "invalid rate reported: {}",
            bytes_per_sec
        )))
    }
}

fn failure(kind: FailureKind, error: &ClientError) -> MeasurementFailure {
    warn!(kind = %kind, error = %error, "Measurement cycle failed");
    MeasurementFailure::new(kind, error)
}

fn send(events: &Sender<MonitorEvent>, event: MonitorEvent) {
    if events.send(event).is_err() {
        debug!("Event receiver dropped");
    }
}
