//! # Frame Extraction
//!
//! Turns one sanitized data line into a [`Frame`] of optional field
//! captures. Extraction never fails on a missing sensor field (validation
//! is the processor's job), but a line without a `Msg=` payload yields no
//! frame at all.

use super::grammar::{capture_decimal, capture_integer, Separator, MSG_MARKER};

/// Field captures from a single sanitized data line.
///
/// Every field is a raw decimal-string capture, never parsed into a numeric
/// type, so the original precision and formatting survive into the log.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frame {
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    pub satellites: Option<String>,
    pub battery: Option<String>,
    pub temperature: Option<String>,
    pub ph: Option<String>,
    pub conductivity: Option<String>,
    pub dissolved_oxygen: Option<String>,
}

impl Frame {
    /// Extract all field captures from a sanitized data line.
    ///
    /// GPS fields (`Lat=`, `Lon=`, `Sat=`) are searched across the whole
    /// line; sensor fields only within the `Msg=` payload. Latitude and
    /// longitude may carry a leading sign, sensor values may not, and the
    /// sensor keywords accept colon, space, or no separator (`Bat` alone
    /// requires its colon).
    ///
    /// Returns `None` when the line carries no payload marker.
    pub fn extract(line: &str) -> Option<Self> {
        let payload = payload_of(line)?;

        Some(Self {
            latitude: capture_decimal(line, "Lat=", Separator::Adjacent, true)
                .map(str::to_owned),
            longitude: capture_decimal(line, "Lon=", Separator::Adjacent, true)
                .map(str::to_owned),
            satellites: capture_integer(line, "Sat=").map(str::to_owned),
            battery: capture_decimal(payload, "Bat:", Separator::Spaces, false)
                .map(str::to_owned),
            temperature: capture_decimal(payload, "Temp", Separator::ColonOrSpaces, false)
                .map(str::to_owned),
            ph: capture_decimal(payload, "pH", Separator::ColonOrSpaces, false)
                .map(str::to_owned),
            conductivity: capture_decimal(payload, "EC", Separator::ColonOrSpaces, false)
                .map(str::to_owned),
            dissolved_oxygen: capture_decimal(payload, "DO", Separator::ColonOrSpaces, false)
                .map(str::to_owned),
        })
    }
}

/// The message payload: everything after the first `Msg=` marker
pub fn payload_of(line: &str) -> Option<&str> {
    line.find(MSG_MARKER).map(|i| &line[i + MSG_MARKER.len()..])
}
