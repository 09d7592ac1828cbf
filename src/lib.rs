//! Bandwatch - periodic bandwidth and latency monitor
//!
//! This library measures download/upload throughput and round-trip latency,
//! keeps a bounded history of recent samples, and renders live readings,
//! sparkline charts and summary statistics in the terminal. A small
//! companion server provides the far end of the TCP throughput test.

pub mod client;
pub mod protocol;
pub mod server;
