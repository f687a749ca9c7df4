//! # Record Type
//!
//! The validated, timestamped entry the sink persists. The `Display`
//! implementation is the single source of truth for the on-disk line
//! format; sink, console echo, and tests all render through it.

use chrono::{DateTime, Local};
use std::fmt;

/// A validated reading ready for the log sink.
///
/// Temperature is non-optional by construction (the processor never builds
/// a record without it); every other field may be absent and renders as an
/// empty string. Field values are the verbatim decimal captures from the
/// frame; this type never reinterprets them numerically.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Wall-clock time the frame passed validation
    pub timestamp: DateTime<Local>,
    /// Node the reading is attributed to (`UNKNOWN` before any
    /// announcement)
    pub node: String,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    pub satellites: Option<String>,
    pub battery: Option<String>,
    pub temperature: String,
    pub ph: Option<String>,
    pub conductivity: Option<String>,
    pub dissolved_oxygen: Option<String>,
}

impl fmt::Display for Record {
    /// Render the fixed semicolon-delimited line format:
    ///
    /// ```text
    /// YYYY-MM-DD HH:MM:SS; Nodo: <id>; Lat: <v>; Lon: <v>; Sat: <v>; Bat: <v>; Temp: <v>; pH: <v>; EC: <v>; DO: <v>
    /// ```
    ///
    /// Absent optional fields render as empty strings. No trailing newline;
    /// the sink appends the terminator.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn opt(field: &Option<String>) -> &str {
            field.as_deref().unwrap_or("")
        }

        write!(
            f,
            "{}; Nodo: {}; Lat: {}; Lon: {}; Sat: {}; Bat: {}; Temp: {}; pH: {}; EC: {}; DO: {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S"),
            self.node,
            opt(&self.latitude),
            opt(&self.longitude),
            opt(&self.satellites),
            opt(&self.battery),
            self.temperature,
            opt(&self.ph),
            opt(&self.conductivity),
            opt(&self.dissolved_oxygen),
        )
    }
}
