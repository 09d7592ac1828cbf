use anyhow::{Context, Result};
use bandwatch::client::init_logging_with_config;
use bandwatch::server::{serve, ServerConfig, ServerMonitor, ServerStats};
use clap::Parser;
use colored::*;
use std::io::ErrorKind;
use std::net::TcpListener;
use std::sync::Arc;
use tracing::{error, info};

fn main() {
    let config = ServerConfig::parse();
    init_logging_with_config(&config.log_level, config.is_json_format());

    if let Err(e) = config.validate() {
        error!(error = %e, "Invalid server configuration");
        eprintln!("Configuration error: {}", e);
        std::process::exit(1);
    }

    if let Err(e) = run(&config) {
        error!(error = %e, "bandwatch-server failed");
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn bind(addr: &str) -> Result<TcpListener> {
    match TcpListener::bind(addr) {
        Ok(listener) => Ok(listener),
        Err(e) if e.kind() == ErrorKind::AddrInUse => Err(anyhow::anyhow!(
            "{} is already in use; pick another --port or stop the process holding it",
            addr
        )),
        Err(e) => Err(e).with_context(|| format!("Failed to bind {}", addr)),
    }
}

fn run(config: &ServerConfig) -> Result<()> {
    let addr = config.address();
    let listener = bind(&addr)?;
    let monitor = Arc::new(ServerMonitor::new(config.update_interval));

    info!(
        address = %addr,
        max_transfer_bytes = config.max_transfer_bytes(),
        quiet = config.quiet,
        "bandwatch-server accepting transfers"
    );

    let on_exit = Arc::clone(&monitor);
    ctrlc::set_handler(move || {
        print_totals(&on_exit.stats());
        std::process::exit(0);
    })
    .context("Failed to install Ctrl-C handler")?;

    if config.quiet {
        info!("Quiet mode, status line disabled");
    } else {
        monitor.start_display();
    }

    serve(listener, monitor.counters(), config.max_transfer_bytes());
    Ok(())
}

fn print_totals(stats: &ServerStats) {
    println!();
    println!("{}", "bandwatch-server totals".bold());
    println!("  Sessions: {} ({} errors)", stats.sessions, stats.errors);
    println!(
        "  Received: {:.1} MB, sent: {:.1} MB",
        stats.bytes_received as f64 / 1e6,
        stats.bytes_sent as f64 / 1e6
    );
    println!("  Uptime: {:.0}s", stats.elapsed.as_secs_f64());
    info!(
        sessions = stats.sessions,
        errors = stats.errors,
        bytes_received = stats.bytes_received,
        bytes_sent = stats.bytes_sent,
        "bandwatch-server shutting down"
    );
}
