//! Monitor context owned by the presentation layer
//!
//! Holds the history, the shared poller and the worker handles. Measurement
//! runs on background threads that only talk back through a channel; the
//! history is mutated exclusively on the thread that drains events.

use crate::client::error::{ClientError, Result};
use crate::client::history::BoundedHistory;
use crate::client::poller::{MonitorEvent, Poller, PollerState, SharedPoller};
use crate::client::probe::{LatencyProbe, ThroughputMeter};
use crate::client::statistics::HistoryStats;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info, warn};

pub struct Monitor<M, P> {
    poller: Arc<SharedPoller<M, P>>,
    history: BoundedHistory,
    interval: Duration,
    running: Arc<AtomicBool>,
    periodic: Option<JoinHandle<()>>,
    oneshots: Vec<JoinHandle<()>>,
    events_tx: Sender<MonitorEvent>,
    events_rx: Receiver<MonitorEvent>,
}

impl<M, P> Monitor<M, P>
where
    M: ThroughputMeter + 'static,
    P: LatencyProbe + 'static,
{
    pub fn new(poller: Poller<M, P>, history_capacity: usize, interval: Duration) -> Self {
        let (events_tx, events_rx) = mpsc::channel();
        Self {
            poller: Arc::new(SharedPoller::new(poller)),
            history: BoundedHistory::new(history_capacity),
            interval,
            running: Arc::new(AtomicBool::new(false)),
            periodic: None,
            oneshots: Vec::new(),
            events_tx,
            events_rx,
        }
    }

    /// Starts a single measurement cycle in the background.
    ///
    /// Rejected with [`ClientError::Busy`] while another cycle is in flight.
    pub fn check_now(&mut self) -> Result<()> {
        if !self.poller.try_reserve() {
            debug!("Check requested while a cycle is in flight");
            return Err(ClientError::Busy("a network check is already running".into()));
        }

        let poller = Arc::clone(&self.poller);
        let events = self.events_tx.clone();

        let handle = thread::Builder::new()
            .name("bandwatch-check".into())
            .spawn(move || poller.run_reserved(&events))
            .map_err(|e| {
                self.poller.release();
                ClientError::Io(e)
            })?;

        self.oneshots.retain(|h| !h.is_finished());
        self.oneshots.push(handle);
        info!("Network check started");
        Ok(())
    }

    /// Starts continuous monitoring on a worker thread
    pub fn start_monitoring(&mut self) -> Result<()> {
        if self.running.load(Ordering::Acquire) {
            return Err(ClientError::Busy("monitoring is already running".into()));
        }
        if self.periodic.as_ref().is_some_and(|h| !h.is_finished()) {
            return Err(ClientError::Busy(
                "monitoring is still finishing its last check".into(),
            ));
        }

        self.running.store(true, Ordering::Release);
        let poller = Arc::clone(&self.poller);
        let running = Arc::clone(&self.running);
        let events = self.events_tx.clone();
        let interval = self.interval;

        let handle = thread::Builder::new()
            .name("bandwatch-monitor".into())
            .spawn(move || {
                let cycles =
                    poller.run_periodic(interval, || running.load(Ordering::Acquire), &events);
                debug!(cycles = cycles, "Monitoring worker exiting");
            })
            .map_err(|e| {
                self.running.store(false, Ordering::Release);
                ClientError::Io(e)
            })?;

        self.periodic = Some(handle);
        info!(
            interval_secs = self.interval.as_secs_f64(),
            "Continuous monitoring started"
        );
        Ok(())
    }

    /// Asks the periodic worker to stop; an in-flight cycle still completes
    pub fn stop_monitoring(&mut self) {
        if self.running.swap(false, Ordering::AcqRel) {
            info!("Continuous monitoring stopping");
        }
    }

    /// Starts or stops monitoring; returns the new state
    pub fn toggle_monitoring(&mut self) -> Result<PollerState> {
        if self.state() == PollerState::Running {
            self.stop_monitoring();
        } else {
            self.start_monitoring()?;
        }
        Ok(self.state())
    }

    pub fn state(&self) -> PollerState {
        if self.running.load(Ordering::Acquire) {
            PollerState::Running
        } else {
            PollerState::Idle
        }
    }

    /// True while a measurement cycle is in flight
    pub fn is_checking(&self) -> bool {
        self.poller.is_checking()
    }

    /// Waits up to `timeout` for the next event from a worker
    pub fn next_event(&mut self, timeout: Duration) -> Option<MonitorEvent> {
        match self.events_rx.recv_timeout(timeout) {
            Ok(event) => Some(self.apply(event)),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => {
                warn!("Event channel disconnected");
                None
            }
        }
    }

    /// Returns every event already queued, without blocking
    pub fn drain_events(&mut self) -> Vec<MonitorEvent> {
        let pending: Vec<MonitorEvent> = self.events_rx.try_iter().collect();
        pending.into_iter().map(|e| self.apply(e)).collect()
    }

    fn apply(&mut self, event: MonitorEvent) -> MonitorEvent {
        if let MonitorEvent::Completed(sample) = &event {
            self.history.add(sample.clone());
            debug!(retained = self.history.len(), "Sample added to history");
        }
        event
    }

    /// Replaces the history with an empty one of the same capacity
    pub fn clear_history(&mut self) {
        self.history = BoundedHistory::new(self.history.capacity());
        info!("History cleared");
    }

    pub fn history(&self) -> &BoundedHistory {
        &self.history
    }

    pub fn stats(&self) -> Option<HistoryStats> {
        self.history.stats()
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Stops monitoring and waits for every worker to exit
    pub fn join(&mut self) {
        self.stop_monitoring();
        let oneshots = std::mem::take(&mut self.oneshots);
        for handle in self.periodic.take().into_iter().chain(oneshots) {
            if handle.join().is_err() {
                warn!("Measurement worker panicked");
            }
        }
    }
}
