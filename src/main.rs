//! # AquaLog
//!
//! Unattended serial data logger for water-quality sensor nodes.
//!
//! Reads line-oriented telemetry frames from a serial link, validates and
//! extracts sensor readings, and appends timestamped records to a durable
//! local file. Built to run indefinitely on field hardware with an
//! unreliable serial connection.

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tracing::info;

use aqualog::config::Config;
use aqualog::frame::processor::FrameProcessor;
use aqualog::serial::SensorLink;
use aqualog::session::{run_session, SessionEnd, SessionStats};
use aqualog::sink::LogSink;

/// Configuration file consulted when no path is given on the command line
const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Main entry point for the AquaLog logger
///
/// Initializes the application and runs the connection state machine until
/// interrupted.
///
/// # Control Flow
///
/// 1. **Initialization**
///    - Set up logging with tracing subscriber
///    - Load configuration (optional CLI argument, else the default path)
///    - Open the output file in append mode (fatal on failure)
///    - Spawn the Ctrl+C forwarder feeding the shutdown channel
///
/// 2. **Connection State Machine**
///    - Disconnected: acquire the serial port, retrying forever, racing
///      the shutdown signal
///    - Connected: pump lines through the frame processor into the sink
///      until the transport drops (back to Disconnected) or shutdown fires
///    - Session state (current node) lives in the processor and survives
///      every reconnect
///
/// 3. **Graceful Shutdown**
///    - Close the open port handle
///    - Log the session summary (lines read, records logged, discards,
///      reconnects)
///
/// # Errors
///
/// Returns error if:
/// - The configuration file cannot be loaded or fails validation
/// - The output file cannot be opened
/// - A record append fails mid-run (storage failure is fatal)
///
/// # Examples
///
/// Run with the shipped defaults:
/// ```bash
/// cargo run --release
/// ```
///
/// Expected output:
/// ```text
/// INFO aqualog: AquaLog v0.1.0 starting...
/// INFO aqualog: Appending records to datos_offline.txt
/// INFO aqualog::serial: Waiting for serial port /dev/ttyAMA0: ...
/// INFO aqualog::serial: Serial port /dev/ttyAMA0 connected at 115200 baud
/// INFO aqualog::session: Active node: A1
/// INFO aqualog::session: 2024-05-17 14:30:00; Nodo: A1; Lat: ...
/// ```
#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into())
        )
        .init();

    info!("AquaLog v{} starting...", env!("CARGO_PKG_VERSION"));

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load configuration from {}", config_path))?;

    let mut sink = LogSink::open(&config.log.output_file)
        .await
        .with_context(|| format!("Failed to open output file {}", config.log.output_file))?;
    info!("Appending records to {}", sink.path().display());

    // Forward Ctrl+C into a channel so both loop states can race it
    let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        let _ = shutdown_tx.send(()).await;
    });

    let mut processor = FrameProcessor::new();
    let mut stats = SessionStats::default();

    info!(
        "Logging from {} at {} baud; press Ctrl+C to exit",
        config.serial.port, config.serial.baud_rate
    );

    // Connection state machine: Disconnected -> Connected -> (lost) -> ...
    loop {
        // Disconnected: wait for the port, unless shutdown wins first
        let mut link = tokio::select! {
            biased;
            _ = shutdown_rx.recv() => break,
            link = SensorLink::acquire(&config.serial) => link,
        };

        // Connected: pump lines; the processor carries the session across
        // any number of these iterations
        match run_session(&mut link, &mut processor, &mut sink, &mut stats, &mut shutdown_rx).await? {
            SessionEnd::TransportLost => {
                link.close();
                stats.reconnects += 1;
            }
            SessionEnd::Shutdown => {
                link.close();
                break;
            }
        }
    }

    info!(
        "Logger stopped: {} lines read, {} records logged, {} discarded, {} reconnects",
        stats.lines_read, stats.records_logged, stats.lines_discarded, stats.reconnects
    );

    Ok(())
}
