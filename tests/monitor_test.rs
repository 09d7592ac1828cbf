use bandwatch::client::{
    BoundedHistory, ClientError, Config, FailureKind, LatencyProbe, Monitor, MonitorEvent, Poller,
    PollerState, Result, TcpConnectProbe, TcpThroughputMeter, ThroughputMeter,
};
use bandwatch::server::{serve, ServerMonitor};
use clap::Parser;
use std::net::TcpListener;
use std::thread;
use std::time::Duration;

const TRANSFER_BYTES: u64 = 256 * 1024;

/// Test helper: start a throughput server on an ephemeral port
fn start_test_server() -> (String, ServerMonitor) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind test server");
    let addr = listener.local_addr().unwrap().to_string();
    let monitor = ServerMonitor::new(100);
    let counters = monitor.counters();
    thread::spawn(move || serve(listener, counters, 1 << 30));
    (addr, monitor)
}

fn local_poller(addr: &str) -> Poller<TcpThroughputMeter, TcpConnectProbe> {
    Poller::new(
        TcpThroughputMeter::new(addr, TRANSFER_BYTES, Duration::from_secs(5)),
        TcpConnectProbe::new(addr, Duration::from_secs(1)),
    )
}

fn wait_for_finish<M, P>(monitor: &mut Monitor<M, P>) -> Vec<MonitorEvent>
where
    M: ThroughputMeter + 'static,
    P: LatencyProbe + 'static,
{
    let mut seen = Vec::new();
    for _ in 0..100 {
        if let Some(event) = monitor.next_event(Duration::from_millis(100)) {
            let finished = event == MonitorEvent::CycleFinished;
            seen.push(event);
            if finished {
                break;
            }
        }
    }
    seen
}

#[test]
fn test_measure_once_against_local_server() {
    let (addr, server) = start_test_server();
    let mut poller = local_poller(&addr);

    let sample = poller.measure_once().expect("measurement should succeed");
    assert!(sample.download_mbps > 0.0);
    assert!(sample.upload_mbps > 0.0);
    assert!(sample.probe_answered);
    assert!(sample.latency_ms >= 0.0);

    // The upload is acked only after the server has counted it
    assert_eq!(server.stats().bytes_received, TRANSFER_BYTES);

    // Sent bytes are tallied just after the last write returns
    for _ in 0..50 {
        if server.stats().bytes_sent == TRANSFER_BYTES {
            return;
        }
        thread::sleep(Duration::from_millis(10));
    }
    panic!("download bytes were not counted");
}

#[test]
fn test_unreachable_server_is_a_measurement_failure() {
    // Bind then drop to get a port nothing listens on
    let addr = TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .to_string();
    let mut poller = local_poller(&addr);

    let failure = poller.measure_once().unwrap_err();
    assert_eq!(failure.kind, FailureKind::Throughput);
    assert!(failure.to_string().contains("Network check failed"));
}

#[test]
fn test_monitor_check_now_end_to_end() {
    let (addr, _) = start_test_server();
    let mut monitor = Monitor::new(local_poller(&addr), 20, Duration::from_secs(30));

    monitor.check_now().unwrap();
    let events = wait_for_finish(&mut monitor);
    monitor.join();

    assert_eq!(events.first(), Some(&MonitorEvent::CycleStarted));
    assert!(matches!(events.get(1), Some(MonitorEvent::Completed(_))));
    assert_eq!(events.last(), Some(&MonitorEvent::CycleFinished));
    assert_eq!(monitor.history().len(), 1);

    let stats = monitor.stats().unwrap();
    assert_eq!(stats.count, 1);
    assert_eq!(stats.download.min, stats.download.max);
}

#[test]
fn test_monitoring_stops_after_in_flight_cycle() {
    let (addr, _) = start_test_server();
    let mut monitor = Monitor::new(local_poller(&addr), 20, Duration::from_secs(30));

    monitor.start_monitoring().unwrap();
    assert_eq!(monitor.state(), PollerState::Running);
    assert!(matches!(
        monitor.start_monitoring(),
        Err(ClientError::Busy(_))
    ));

    let events = wait_for_finish(&mut monitor);
    assert!(events.contains(&MonitorEvent::CycleFinished));
    monitor.stop_monitoring();
    assert_eq!(monitor.state(), PollerState::Idle);

    // The worker leaves its 30 s sleep promptly once stopped
    let mut stopped = false;
    for _ in 0..20 {
        if monitor.next_event(Duration::from_millis(100)) == Some(MonitorEvent::Stopped) {
            stopped = true;
            break;
        }
    }
    assert!(stopped);
    monitor.join();
    assert_eq!(monitor.history().len(), 1);
}

#[test]
fn test_history_collects_live_samples() -> Result<()> {
    let (addr, _) = start_test_server();
    let mut poller = local_poller(&addr);
    let mut history = BoundedHistory::default();

    for _ in 0..3 {
        let sample = poller
            .measure_once()
            .map_err(|f| ClientError::Measurement(f.message))?;
        history.add(sample);
    }
    assert_eq!(history.len(), 3);
    assert_eq!(history.capacity(), 20);
    assert_eq!(history.time_labels().len(), 3);
    Ok(())
}

#[test]
fn test_config_caps_transfer_size() {
    let config = Config::parse_from(["bandwatch", "--transfer-mb", "1024"]);
    assert!(config.validate().is_ok());

    let config = Config::parse_from([
        "bandwatch",
        "--backend",
        "http",
        "--transfer-mb",
        "18446744073709",
    ]);
    assert!(matches!(config.validate(), Err(ClientError::Config(_))));
}

#[test]
fn test_config_defaults() {
    let config = Config::parse_from(["bandwatch", "--server", "127.0.0.1:1"]);
    assert_eq!(config.history, 20);
    assert_eq!(config.interval(), Duration::from_secs(30));
    assert!(config.validate().is_ok());
}
