use anyhow::{Context, Result};
use bandwatch::client::{
    init_logging_with_config, Backend, ClientError, Config, CycleSpinner, HttpThroughputMeter,
    Mode, Monitor, MonitorEvent, Poller, PollerState, Reporter, Status, TcpConnectProbe,
    TcpThroughputMeter, ThroughputMeter,
};
use clap::Parser;
use colored::*;
use std::io::{self, BufRead};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;
use tracing::{debug, error, info};

/// How long the UI thread waits for a worker event before polling commands
const EVENT_POLL_MS: u64 = 100;

type BandMonitor = Monitor<Box<dyn ThroughputMeter>, TcpConnectProbe>;

/// User commands, from stdin or the Ctrl-C handler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Check,
    ToggleMonitoring,
    Clear,
    Stats,
    Help,
    Quit,
}

fn parse_command(line: &str) -> Option<Command> {
    match line.trim().to_lowercase().as_str() {
        "c" | "check" => Some(Command::Check),
        "m" | "monitor" => Some(Command::ToggleMonitoring),
        "x" | "clear" => Some(Command::Clear),
        "s" | "stats" => Some(Command::Stats),
        "h" | "help" | "?" => Some(Command::Help),
        "q" | "quit" | "exit" => Some(Command::Quit),
        _ => None,
    }
}

fn main() {
    // Parse CLI arguments
    let config = Config::parse();

    // Initialize structured logging with config options
    init_logging_with_config(&config.log_level, config.is_json_format());

    // Validate configuration
    if let Err(e) = config.validate() {
        error!(error = %e, "Invalid configuration");
        eprintln!("Configuration error: {}", e);
        std::process::exit(1);
    }

    match run(config) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            error!(error = %e, "Client failed");
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Returns false when a single check (once mode) failed or never finished
fn run(config: Config) -> Result<bool> {
    let meter: Box<dyn ThroughputMeter> = match config.backend {
        Backend::Tcp => Box::new(TcpThroughputMeter::new(
            config.server.clone(),
            config.transfer_bytes(),
            config.timeout(),
        )),
        Backend::Http => Box::new(HttpThroughputMeter::new(
            config.http_base.clone(),
            config.transfer_bytes(),
            config.timeout(),
        )),
    };
    let probe = TcpConnectProbe::new(config.ping_host.clone(), config.ping_timeout());
    let monitor = Monitor::new(Poller::new(meter, probe), config.history, config.interval());

    info!(
        mode = ?config.mode,
        backend = ?config.backend,
        interval_secs = config.interval_secs,
        history = config.history,
        "bandwatch starting"
    );

    let (commands_tx, commands_rx) = mpsc::channel();
    let ctrlc_tx = commands_tx.clone();
    ctrlc::set_handler(move || {
        let _ = ctrlc_tx.send(Command::Quit);
    })
    .context("Failed to install Ctrl-C handler")?;

    if config.mode == Mode::Interactive {
        spawn_stdin_reader(commands_tx).context("Failed to start input thread")?;
    }

    let mut app = App {
        monitor,
        reporter: Reporter::new(config.ping_host.clone(), config.quiet),
        spinner: CycleSpinner::new(config.quiet)?,
        mode: config.mode,
        cycle_limit: config.cycles,
        cycles: 0,
        failures: 0,
    };
    app.run(&commands_rx)
}

fn spawn_stdin_reader(commands: Sender<Command>) -> io::Result<()> {
    thread::Builder::new()
        .name("bandwatch-input".into())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                if line.trim().is_empty() {
                    continue;
                }
                match parse_command(&line) {
                    Some(command) => {
                        if commands.send(command).is_err() {
                            return;
                        }
                    }
                    None => eprintln!("Unknown command: {} (h for help)", line.trim()),
                }
            }
            debug!("stdin closed");
            let _ = commands.send(Command::Quit);
        })?;
    Ok(())
}

struct App {
    monitor: BandMonitor,
    reporter: Reporter,
    spinner: CycleSpinner,
    mode: Mode,
    cycle_limit: Option<usize>,
    cycles: usize,
    failures: usize,
}

impl App {
    fn run(&mut self, commands: &Receiver<Command>) -> Result<bool> {
        println!("{}", "bandwatch - bandwidth and latency monitor".bold());

        match self.mode {
            Mode::Interactive => print_help(),
            Mode::Once => self.check()?,
            Mode::Watch => self.toggle_monitoring()?,
        }

        'ui: loop {
            while let Ok(command) = commands.try_recv() {
                if !self.handle_command(command)? {
                    break 'ui;
                }
            }

            let Some(event) = self.monitor.next_event(Duration::from_millis(EVENT_POLL_MS))
            else {
                continue;
            };
            if !self.handle_event(event) {
                break;
            }
        }

        self.spinner.stop();
        self.monitor.stop_monitoring();
        if self.monitor.is_checking() {
            // Workers are detached; a check in flight dies with the process
            info!("Abandoning the check in flight");
        }
        info!(cycles = self.cycles, failures = self.failures, "bandwatch exiting");

        Ok(run_succeeded(self.mode, self.cycles, self.failures))
    }

    /// Returns false when the UI loop should exit
    fn handle_command(&mut self, command: Command) -> Result<bool> {
        debug!(command = ?command, "Command received");
        match command {
            Command::Check => self.check()?,
            Command::ToggleMonitoring => self.toggle_monitoring()?,
            Command::Clear => {
                self.monitor.clear_history();
                self.reporter.print_cleared();
            }
            Command::Stats => self.reporter.print_summary(self.monitor.history()),
            Command::Help => print_help(),
            Command::Quit => return Ok(false),
        }
        Ok(true)
    }

    fn check(&mut self) -> Result<()> {
        match self.monitor.check_now() {
            Err(ClientError::Busy(reason)) => {
                self.reporter.status(&format!("Busy: {}", reason), Status::Warning);
                Ok(())
            }
            other => other.context("Failed to start network check"),
        }
    }

    fn toggle_monitoring(&mut self) -> Result<()> {
        match self.monitor.toggle_monitoring() {
            Ok(PollerState::Running) => {
                self.reporter.status(
                    &format!(
                        "Continuous monitoring started (every {}s)",
                        self.monitor.interval().as_secs()
                    ),
                    Status::Success,
                );
                Ok(())
            }
            Ok(PollerState::Idle) => {
                self.reporter.status("Stopping monitoring...", Status::Info);
                Ok(())
            }
            Err(ClientError::Busy(reason)) => {
                self.reporter.status(&format!("Busy: {}", reason), Status::Warning);
                Ok(())
            }
            Err(e) => Err(e).context("Failed to start monitoring"),
        }
    }

    /// Returns false when the UI loop should exit
    fn handle_event(&mut self, event: MonitorEvent) -> bool {
        match event {
            MonitorEvent::CycleStarted => self.spinner.start("Checking network..."),
            MonitorEvent::Completed(sample) => {
                self.spinner.stop();
                self.reporter.print_reading(&sample);
                self.reporter.print_summary(self.monitor.history());
                self.reporter.status("Network check completed!", Status::Success);
            }
            MonitorEvent::Failed(failure) => {
                self.spinner.stop();
                self.failures += 1;
                self.reporter.print_failure(&failure);
            }
            MonitorEvent::CycleFinished => {
                self.spinner.stop();
                self.cycles += 1;
                match self.mode {
                    Mode::Once => return false,
                    Mode::Watch if self.cycle_limit.is_some_and(|n| self.cycles >= n) => {
                        self.monitor.stop_monitoring();
                    }
                    _ => {}
                }
            }
            MonitorEvent::Stopped => {
                self.reporter.status("Monitoring stopped", Status::Info);
                if self.mode == Mode::Watch {
                    return false;
                }
            }
        }
        true
    }
}

/// A single check only succeeds if it finished without failing
fn run_succeeded(mode: Mode, cycles: usize, failures: usize) -> bool {
    mode != Mode::Once || (cycles > 0 && failures == 0)
}

fn print_help() {
    println!();
    println!("Commands:");
    println!("  c  check now");
    println!("  m  start/stop continuous monitoring");
    println!("  x  clear history");
    println!("  s  show charts and statistics");
    println!("  h  help");
    println!("  q  quit");
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_command() {
        assert_eq!(parse_command("c"), Some(Command::Check));
        assert_eq!(parse_command(" Monitor \n"), Some(Command::ToggleMonitoring));
        assert_eq!(parse_command("x"), Some(Command::Clear));
        assert_eq!(parse_command("stats"), Some(Command::Stats));
        assert_eq!(parse_command("?"), Some(Command::Help));
        assert_eq!(parse_command("q"), Some(Command::Quit));
        assert_eq!(parse_command("reboot"), None);
    }

    #[test]
    fn test_once_mode_exit_status() {
        assert!(run_succeeded(Mode::Once, 1, 0));
        assert!(!run_succeeded(Mode::Once, 1, 1));
        // Interrupted before the check finished
        assert!(!run_succeeded(Mode::Once, 0, 0));

        assert!(run_succeeded(Mode::Watch, 0, 0));
        assert!(run_succeeded(Mode::Interactive, 3, 2));
    }
}
