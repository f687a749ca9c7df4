//! # Session Loop
//!
//! Pumps lines from a serial source through the frame processor into the
//! sink, for the lifetime of one connection. Transport loss ends the
//! session with a value (the caller reconnects and calls again, carrying
//! the same processor so the logical session survives); a storage failure
//! propagates as an error and ends the process.
//!
//! The shutdown channel is polled with priority on every iteration, so a
//! pending interrupt wins over pending data and the loop never stops
//! mid-append.

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::frame::processor::{FrameProcessor, Outcome};
use crate::serial::source::LineSource;
use crate::sink::LogSink;

/// Counters accumulated across all sessions of one process run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SessionStats {
    /// Complete lines handed to the processor
    pub lines_read: u64,
    /// Records appended to the sink
    pub records_logged: u64,
    /// Lines dropped with a named discard reason
    pub lines_discarded: u64,
    /// Node announcements observed
    pub node_updates: u64,
    /// Times the transport was lost and reacquired
    pub reconnects: u64,
}

/// Why a connected session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The transport dropped; the caller should reacquire and resume
    TransportLost,
    /// The shutdown signal fired; the caller should exit
    Shutdown,
}

/// Drive one connected session until the transport drops or shutdown fires.
///
/// Every accepted record is appended to the sink (flush-on-write) and
/// echoed at INFO; every discard is logged at DEBUG with its named reason.
/// Idle read timeouts just loop, which is what keeps the session responsive
/// to shutdown while the link is quiet.
///
/// # Errors
///
/// Returns the sink's `Storage` error unchanged; storage failure is fatal
/// and must not be swallowed here.
pub async fn run_session<S: LineSource>(
    source: &mut S,
    processor: &mut FrameProcessor,
    sink: &mut LogSink,
    stats: &mut SessionStats,
    shutdown: &mut mpsc::Receiver<()>,
) -> Result<SessionEnd> {
    loop {
        tokio::select! {
            biased;

            _ = shutdown.recv() => {
                info!("Received shutdown signal, ending session");
                return Ok(SessionEnd::Shutdown);
            }

            read = source.next_line() => match read {
                Ok(Some(raw)) => {
                    stats.lines_read += 1;

                    match processor.process_line(&raw) {
                        Outcome::RecordEmitted(record) => {
                            sink.append(&record).await?;
                            stats.records_logged += 1;
                            info!("{}", record);
                        }
                        Outcome::NodeUpdated => {
                            stats.node_updates += 1;
                            info!("Active node: {}", processor.current_node());
                        }
                        Outcome::Discarded(reason) => {
                            stats.lines_discarded += 1;
                            debug!("Discarded line ({:?}): {:?}", reason, raw);
                        }
                    }
                }

                // Idle timeout; nothing arrived within the read window
                Ok(None) => {}

                Err(e) => {
                    warn!("Serial link lost: {}", e);
                    return Ok(SessionEnd::TransportLost);
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serial::source::mocks::{ScriptedRead, ScriptedSource};

    async fn open_sink(dir: &tempfile::TempDir) -> LogSink {
        LogSink::open(dir.path().join("out.txt")).await.unwrap()
    }

    fn sink_contents(dir: &tempfile::TempDir) -> String {
        std::fs::read_to_string(dir.path().join("out.txt")).unwrap()
    }

    #[tokio::test]
    async fn test_session_logs_valid_frames_until_transport_loss() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = open_sink(&dir).await;
        let mut processor = FrameProcessor::new();
        let mut stats = SessionStats::default();
        let (_shutdown_tx, mut shutdown_rx) = mpsc::channel(1);

        let mut source = ScriptedSource::new(vec![
            ScriptedRead::Line("Nodo: A1"),
            ScriptedRead::Idle,
            ScriptedRead::Line(
                "Datos: Lat=10.5 Lon=-66.9 Sat=7 Msg=Bat: 3.70 Temp:25.30 pH:7.10 EC:1.20 DO:6.00",
            ),
            ScriptedRead::Lost,
        ]);

        let end = run_session(&mut source, &mut processor, &mut sink, &mut stats, &mut shutdown_rx)
            .await
            .unwrap();

        assert_eq!(end, SessionEnd::TransportLost);
        assert_eq!(stats.lines_read, 2);
        assert_eq!(stats.records_logged, 1);
        assert_eq!(stats.node_updates, 1);
        assert_eq!(stats.lines_discarded, 0);

        let contents = sink_contents(&dir);
        assert!(contents.contains("Nodo: A1; Lat: 10.5; Lon: -66.9; Sat: 7; "));
        assert!(contents.contains("Temp: 25.30; pH: 7.10; EC: 1.20; DO: 6.00"));
    }

    #[tokio::test]
    async fn test_session_state_survives_reconnect() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = open_sink(&dir).await;
        let mut processor = FrameProcessor::new();
        let mut stats = SessionStats::default();
        let (_shutdown_tx, mut shutdown_rx) = mpsc::channel(1);

        // First session: node announced, then the link dies
        let mut first = ScriptedSource::new(vec![
            ScriptedRead::Line("Nodo: N7"),
            ScriptedRead::Lost,
        ]);
        let end = run_session(&mut first, &mut processor, &mut sink, &mut stats, &mut shutdown_rx)
            .await
            .unwrap();
        assert_eq!(end, SessionEnd::TransportLost);

        // Second session on a fresh link: data arrives before any new
        // announcement and must still carry the pre-failure node
        let mut second = ScriptedSource::new(vec![
            ScriptedRead::Line("Datos: Msg=Temp:19.50 DO:6.10"),
            ScriptedRead::Lost,
        ]);
        run_session(&mut second, &mut processor, &mut sink, &mut stats, &mut shutdown_rx)
            .await
            .unwrap();

        assert_eq!(stats.records_logged, 1);
        assert!(sink_contents(&dir).contains("Nodo: N7;"));
    }

    #[tokio::test]
    async fn test_session_ends_on_shutdown_signal() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = open_sink(&dir).await;
        let mut processor = FrameProcessor::new();
        let mut stats = SessionStats::default();
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel(1);

        // Shutdown is already pending; the biased select must prefer it
        // over the endless supply of pending lines
        shutdown_tx.send(()).await.unwrap();

        let mut source = ScriptedSource::new(vec![
            ScriptedRead::Line("Datos: Msg=Temp:25.30 pH:7.10"),
            ScriptedRead::Line("Datos: Msg=Temp:25.40 pH:7.10"),
        ]);

        let end = run_session(&mut source, &mut processor, &mut sink, &mut stats, &mut shutdown_rx)
            .await
            .unwrap();

        assert_eq!(end, SessionEnd::Shutdown);
        assert_eq!(stats.lines_read, 0);
        assert_eq!(sink_contents(&dir), "");
    }

    #[tokio::test]
    async fn test_session_discards_noise_and_keeps_going() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = open_sink(&dir).await;
        let mut processor = FrameProcessor::new();
        let mut stats = SessionStats::default();
        let (_shutdown_tx, mut shutdown_rx) = mpsc::channel(1);

        let mut source = ScriptedSource::new(vec![
            ScriptedRead::Line("boot: radio ready"),
            ScriptedRead::Line(""),
            ScriptedRead::Line("Datos: Msg=Temp:20.00"),
            ScriptedRead::Line("Datos: Msg=Temp:20.00 pH:6.90"),
            ScriptedRead::Lost,
        ]);

        run_session(&mut source, &mut processor, &mut sink, &mut stats, &mut shutdown_rx)
            .await
            .unwrap();

        assert_eq!(stats.lines_read, 4);
        assert_eq!(stats.lines_discarded, 3);
        assert_eq!(stats.records_logged, 1);

        let contents = sink_contents(&dir);
        assert_eq!(contents.lines().count(), 1);
        assert!(contents.contains("pH: 6.90"));
    }

    #[tokio::test]
    async fn test_exhausted_source_reports_transport_loss() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = open_sink(&dir).await;
        let mut processor = FrameProcessor::new();
        let mut stats = SessionStats::default();
        let (_shutdown_tx, mut shutdown_rx) = mpsc::channel(1);

        let mut source = ScriptedSource::new(vec![]);
        let end = run_session(&mut source, &mut processor, &mut sink, &mut stats, &mut shutdown_rx)
            .await
            .unwrap();
        assert_eq!(end, SessionEnd::TransportLost);
    }
}
