//! # Serial Connection Module
//!
//! Owns the serial link to the sensor node transmitter.
//!
//! This module handles:
//! - Acquiring the configured port with unbounded retry (field deployments
//!   must survive unplugged devices and driver resets without operator help)
//! - Reading one line at a time with a bounded timeout and a capped line
//!   length
//! - Permissive decoding of noisy bytes
//! - Reporting mid-session link loss as a distinguished condition so the
//!   caller can re-enter acquisition

use std::fmt;
use std::time::Duration;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::time;
use tokio_serial::SerialPortBuilderExt;
use tracing::{debug, info};

use crate::config::SerialConfig;
use crate::error::{AquaLogError, Result};

pub mod source;

/// Upper bound for one reassembled line. A stream that never delivers a
/// terminator (stuck transmitter, break condition held at the wrong baud
/// rate) is handed up in chunks of at most this size instead of
/// accumulating in memory.
const MAX_LINE_BYTES: usize = 8192;

/// Serial link to a sensor node.
///
/// Wraps the port in a buffered reader and keeps the bytes of a partially
/// received line across read timeouts, so slow transmitters are reassembled
/// rather than cut at every timeout. Reassembly is capped at
/// `MAX_LINE_BYTES`; anything longer is handed up truncated.
pub struct SensorLink {
    /// Buffered serial stream
    reader: BufReader<tokio_serial::SerialStream>,
    /// Bytes of the line currently being assembled
    pending: Vec<u8>,
    /// Device path (e.g., /dev/ttyAMA0)
    device_path: String,
    /// Upper bound for a single line read
    read_timeout: Duration,
}

impl fmt::Debug for SensorLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SensorLink")
            .field("device_path", &self.device_path)
            .field("read_timeout", &self.read_timeout)
            .finish_non_exhaustive()
    }
}

impl SensorLink {
    /// Acquire the configured port, retrying forever.
    ///
    /// Blocks (asynchronously) until the port opens; never fails outward.
    /// While the port is absent, the waiting state is announced once per
    /// acquisition round and each further attempt is logged at debug level.
    /// Callers that need to abandon acquisition race this future against a
    /// shutdown signal.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use aqualog::config::SerialConfig;
    /// use aqualog::serial::SensorLink;
    ///
    /// #[tokio::main]
    /// async fn main() {
    ///     let config = SerialConfig {
    ///         port: "/dev/ttyAMA0".to_string(),
    ///         baud_rate: 115200,
    ///         timeout_ms: 1000,
    ///         reconnect_interval_ms: 2000,
    ///     };
    ///
    ///     let link = SensorLink::acquire(&config).await;
    ///     println!("Connected to {}", link.device_path());
    /// }
    /// ```
    pub async fn acquire(config: &SerialConfig) -> Self {
        let retry_delay = Duration::from_millis(config.reconnect_interval_ms);
        let mut announced = false;

        loop {
            match Self::open_port(config) {
                Ok(stream) => {
                    info!("Serial port {} connected at {} baud", config.port, config.baud_rate);
                    return Self {
                        reader: BufReader::new(stream),
                        pending: Vec::new(),
                        device_path: config.port.clone(),
                        read_timeout: Duration::from_millis(config.timeout_ms),
                    };
                }
                Err(e) => {
                    if announced {
                        debug!("Serial port {} still unavailable: {}", config.port, e);
                    } else {
                        info!("Waiting for serial port {}: {}", config.port, e);
                        announced = true;
                    }
                    time::sleep(retry_delay).await;
                }
            }
        }
    }

    /// Open the configured serial port with 8N1 framing
    ///
    /// # Arguments
    ///
    /// * `config` - Port path and baud rate to open
    ///
    /// # Returns
    ///
    /// * `Result<SerialStream>` - Opened serial port
    fn open_port(config: &SerialConfig) -> Result<tokio_serial::SerialStream> {
        let stream = tokio_serial::new(&config.port, config.baud_rate)
            .data_bits(tokio_serial::DataBits::Eight)
            .parity(tokio_serial::Parity::None)
            .stop_bits(tokio_serial::StopBits::One)
            .flow_control(tokio_serial::FlowControl::None)
            .open_native_async()
            .map_err(|e| AquaLogError::Transport(format!("Failed to open {}: {}", config.port, e)))?;

        Ok(stream)
    }

    /// Read one line from the link.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(line))` - A complete line, terminator stripped, decoded
    ///   permissively (undecodable byte sequences dropped); or the
    ///   truncated front of a line that reached `MAX_LINE_BYTES` without a
    ///   terminator
    /// * `Ok(None)` - The read timeout elapsed; any bytes received so far
    ///   stay buffered for the next call
    /// * `Err(TransportLost)` - The device reached end of stream or the
    ///   read failed; the link is unusable and must be reacquired
    pub async fn read_line(&mut self) -> Result<Option<String>> {
        read_line_from(
            &mut self.reader,
            &mut self.pending,
            self.read_timeout,
            &self.device_path,
        )
        .await
    }

    /// Get the device path of the opened serial port
    #[must_use]
    pub fn device_path(&self) -> &str {
        &self.device_path
    }

    /// Close the link, releasing the port handle
    pub fn close(self) {
        debug!("Closing serial port {}", self.device_path);
    }
}

/// How one bounded fill attempt ended
enum LineRead {
    /// A terminator arrived, or the stream ended with buffered bytes
    Complete,
    /// The cap was hit before any terminator
    Overflow,
    /// End of stream with nothing buffered
    EndOfStream,
}

/// Fill `pending` from the reader until a newline, the line cap, or end of
/// stream.
///
/// Bytes are copied into `pending` before they are consumed from the
/// reader, so cancelling this future at its await point loses nothing; the
/// next call resumes the same line.
async fn fill_line<R>(reader: &mut R, pending: &mut Vec<u8>) -> std::io::Result<LineRead>
where
    R: AsyncBufRead + Unpin,
{
    loop {
        let available = reader.fill_buf().await?;
        if available.is_empty() {
            return Ok(if pending.is_empty() {
                LineRead::EndOfStream
            } else {
                LineRead::Complete
            });
        }

        if let Some(newline) = available.iter().position(|&b| b == b'\n') {
            pending.extend_from_slice(&available[..=newline]);
            reader.consume(newline + 1);
            return Ok(LineRead::Complete);
        }

        let room = MAX_LINE_BYTES.saturating_sub(pending.len());
        if available.len() >= room {
            pending.extend_from_slice(&available[..room]);
            reader.consume(room);
            return Ok(LineRead::Overflow);
        }

        pending.extend_from_slice(available);
        let taken = available.len();
        reader.consume(taken);
    }
}

/// Timeout-bounded line read over any buffered byte source.
///
/// Partial bytes survive a timeout in `pending` and the next call resumes
/// the same line. A line that reaches `MAX_LINE_BYTES` without a terminator
/// is handed up truncated (the processor discards such junk); reading then
/// continues from the byte after the cut, so the stream re-synchronizes at
/// the next real terminator.
async fn read_line_from<R>(
    reader: &mut R,
    pending: &mut Vec<u8>,
    read_timeout: Duration,
    device_path: &str,
) -> Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    match time::timeout(read_timeout, fill_line(reader, pending)).await {
        // Timeout: not an error, the caller loops and stays responsive
        Err(_elapsed) => Ok(None),

        Ok(Ok(LineRead::Complete)) => {
            if pending.last() == Some(&b'\n') {
                pending.pop();
                if pending.last() == Some(&b'\r') {
                    pending.pop();
                }
            }
            let line = decode_dropping_invalid(pending);
            pending.clear();
            Ok(Some(line))
        }

        Ok(Ok(LineRead::Overflow)) => {
            debug!(
                "Line from {} exceeded {} bytes without a terminator, truncating",
                device_path, MAX_LINE_BYTES
            );
            let line = decode_dropping_invalid(pending);
            pending.clear();
            Ok(Some(line))
        }

        // End of stream with nothing buffered: the device is gone
        Ok(Ok(LineRead::EndOfStream)) => Err(AquaLogError::TransportLost(format!(
            "{}: end of stream",
            device_path
        ))),

        Ok(Err(e)) => Err(AquaLogError::TransportLost(format!(
            "{}: {}",
            device_path, e
        ))),
    }
}

/// Decode bytes as UTF-8, dropping undecodable sequences entirely.
///
/// Valid multi-byte characters (the degree sign in temperature readings)
/// survive; radio noise does not. The frame sanitizer applies the stricter
/// allow-list later.
fn decode_dropping_invalid(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .chars()
        .filter(|&c| c != char::REPLACEMENT_CHARACTER)
        .collect()
}
