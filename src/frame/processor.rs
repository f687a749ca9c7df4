//! # Frame Processor
//!
//! The per-line processing state machine. Consumes raw lines from the
//! serial link, tracks the logical session state (which node is currently
//! transmitting), and turns valid data frames into sink-ready records.
//!
//! Processing is first-match-wins:
//! 1. Empty line → discarded
//! 2. `Nodo:` announcement → session state updated, no record
//! 3. Anything not starting with `Datos:` → discarded as chatter
//! 4. Data frame → sanitize, extract, and validate against the
//!    temperature + primary-metric gate
//!
//! Every discard carries a named [`DiscardReason`] so dropped input is an
//! auditable decision rather than a silent catch-all.

use chrono::Local;

use super::extract::Frame;
use super::grammar::{sanitize, DATA_MARKER, NODE_MARKER};
use crate::record::Record;

/// Sentinel node identifier used before any announcement is seen
pub const UNKNOWN_NODE: &str = "UNKNOWN";

/// Why a line was dropped without producing a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscardReason {
    /// Nothing left after trimming
    Empty,
    /// Neither a node announcement nor a data frame (noise, partial lines,
    /// unrelated chatter)
    UnrecognizedPrefix,
    /// A data frame without the `Msg=` payload marker
    MissingPayload,
    /// Payload present but no temperature capture
    MissingTemperature,
    /// Temperature present but neither pH nor dissolved oxygen
    MissingPrimaryMetric,
}

/// Result of feeding one raw line to the processor
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// A node announcement updated the session state
    NodeUpdated,
    /// A data frame passed validation
    RecordEmitted(Record),
    /// The line was dropped for the given reason
    Discarded(DiscardReason),
}

/// Line processor holding the logical session state.
///
/// The current node is a session property, not a transport property: it is
/// owned here, survives serial reconnects, and changes only when a node
/// announcement arrives.
///
/// # Examples
///
/// ```
/// use aqualog::frame::processor::{FrameProcessor, Outcome};
///
/// let mut processor = FrameProcessor::new();
/// processor.process_line("Nodo: A1");
/// let outcome = processor.process_line("Datos: Msg=Temp:25.30 pH:7.10");
/// assert!(matches!(outcome, Outcome::RecordEmitted(_)));
/// ```
#[derive(Debug, Clone)]
pub struct FrameProcessor {
    /// Most recently announced node identifier
    current_node: String,
}

impl FrameProcessor {
    /// Create a processor with the unknown-node sentinel
    pub fn new() -> Self {
        Self {
            current_node: UNKNOWN_NODE.to_string(),
        }
    }

    /// The node identifier records are currently attributed to
    #[must_use]
    pub fn current_node(&self) -> &str {
        &self.current_node
    }

    /// Process one raw line from the serial link.
    ///
    /// The line is trimmed and classified by its prefix; data frames are
    /// then sanitized, extracted, and validated. Validation requires a
    /// temperature capture plus at least one of pH / dissolved oxygen;
    /// everything else is optional and logged as an empty field.
    ///
    /// Records carry the wall-clock time of validation and the current
    /// session node.
    pub fn process_line(&mut self, raw: &str) -> Outcome {
        let line = raw.trim();

        if line.is_empty() {
            return Outcome::Discarded(DiscardReason::Empty);
        }

        if let Some(rest) = line.strip_prefix(NODE_MARKER) {
            self.current_node = rest.trim().to_string();
            return Outcome::NodeUpdated;
        }

        if !line.starts_with(DATA_MARKER) {
            return Outcome::Discarded(DiscardReason::UnrecognizedPrefix);
        }

        let clean = sanitize(line);

        let Some(frame) = Frame::extract(&clean) else {
            return Outcome::Discarded(DiscardReason::MissingPayload);
        };

        let Frame {
            latitude,
            longitude,
            satellites,
            battery,
            temperature,
            ph,
            conductivity,
            dissolved_oxygen,
        } = frame;

        // The data-quality gate: temperature plus at least one primary
        // water-quality metric is the minimum viable reading
        let Some(temperature) = temperature else {
            return Outcome::Discarded(DiscardReason::MissingTemperature);
        };

        if ph.is_none() && dissolved_oxygen.is_none() {
            return Outcome::Discarded(DiscardReason::MissingPrimaryMetric);
        }

        Outcome::RecordEmitted(Record {
            timestamp: Local::now(),
            node: self.current_node.clone(),
            latitude,
            longitude,
            satellites,
            battery,
            temperature,
            ph,
            conductivity,
            dissolved_oxygen,
        })
    }
}

impl Default for FrameProcessor {
    fn default() -> Self {
        Self::new()
    }
}
