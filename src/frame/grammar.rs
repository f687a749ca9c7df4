//! # Line Grammar Primitives
//!
//! Markers, sanitization, and keyword-scan capture primitives for the
//! telemetry line grammar.
//!
//! The transmitters speak a loose plain-text protocol; fields are located by
//! scanning for a keyword and capturing the decimal string that follows it.
//! A keyword occurrence not followed by a valid capture does not abort the
//! search; scanning continues at the next occurrence, so
//! `"Temp:x Temp:25.30"` still captures `25.30`.

/// Prefix of a node-announcement line
pub const NODE_MARKER: &str = "Nodo:";

/// Prefix of a data-frame line
pub const DATA_MARKER: &str = "Datos:";

/// Marker introducing the sensor payload within a data frame
pub const MSG_MARKER: &str = "Msg=";

/// Strip every character outside the frame allow-list.
///
/// The allow-list is printable ASCII (0x20-0x7E) plus the degree sign used
/// in temperature annotations. Everything else is line noise from the radio
/// link and would corrupt keyword scanning downstream.
///
/// # Examples
///
/// ```
/// use aqualog::frame::grammar::sanitize;
///
/// assert_eq!(sanitize("Temp:25.30\u{1}\u{7f}"), "Temp:25.30");
/// assert_eq!(sanitize("agua 27.5°C"), "agua 27.5°C");
/// ```
pub fn sanitize(line: &str) -> String {
    line.chars().filter(|&c| is_allowed(c)).collect()
}

/// True for characters the frame grammar may contain
fn is_allowed(c: char) -> bool {
    matches!(c, ' '..='~') || c == '°'
}

/// Separator accepted between a field keyword and its capture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Separator {
    /// The keyword abuts the capture directly (`Lat=10.5`)
    Adjacent,
    /// Any run of whitespace, including none (`Bat: 3.70` after its colon)
    Spaces,
    /// Any run of colons and whitespace, including none (accepts
    /// `Temp:25.3`, `Temp: 25.3`, and bare `Temp25.3`)
    ColonOrSpaces,
}

impl Separator {
    /// Byte length of the separator run at the start of `s`
    fn skip_len(self, s: &str) -> usize {
        let accept: fn(char) -> bool = match self {
            Separator::Adjacent => return 0,
            Separator::Spaces => |c| c.is_ascii_whitespace(),
            Separator::ColonOrSpaces => |c| c == ':' || c.is_ascii_whitespace(),
        };
        s.chars().take_while(|&c| accept(c)).map(char::len_utf8).sum()
    }
}

/// Scan `haystack` for `key` and capture the decimal string that follows.
///
/// The capture is `digits '.' digits`, with a leading `-` accepted only when
/// `signed` is set. Returns the first successful capture over all
/// occurrences of the keyword, or `None`.
///
/// # Arguments
///
/// * `haystack` - Sanitized line or payload to scan
/// * `key` - Field keyword, including any mandatory punctuation (`"Bat:"`,
///   `"Lat="`, bare `"Temp"`)
/// * `sep` - Separator policy applied between keyword and capture
/// * `signed` - Whether a leading minus sign is part of the capture
///
/// # Examples
///
/// ```
/// use aqualog::frame::grammar::{capture_decimal, Separator};
///
/// let line = "Datos: Lat=-66.9 Msg=Temp 25.30";
/// assert_eq!(capture_decimal(line, "Lat=", Separator::Adjacent, true), Some("-66.9"));
/// assert_eq!(capture_decimal(line, "Temp", Separator::ColonOrSpaces, false), Some("25.30"));
/// assert_eq!(capture_decimal(line, "pH", Separator::ColonOrSpaces, false), None);
/// ```
pub fn capture_decimal<'a>(
    haystack: &'a str,
    key: &str,
    sep: Separator,
    signed: bool,
) -> Option<&'a str> {
    for (index, _) in haystack.match_indices(key) {
        let rest = &haystack[index + key.len()..];
        let start = sep.skip_len(rest);
        if let Some(len) = decimal_len(&rest[start..], signed) {
            return Some(&rest[start..start + len]);
        }
    }
    None
}

/// Scan `haystack` for `key` and capture the unsigned integer that follows.
///
/// The capture is a maximal digit run directly after the keyword; trailing
/// non-digits are left behind (`"Sat=7x"` captures `"7"`).
pub fn capture_integer<'a>(haystack: &'a str, key: &str) -> Option<&'a str> {
    for (index, _) in haystack.match_indices(key) {
        let rest = &haystack[index + key.len()..];
        let len = count_digits(rest.as_bytes());
        if len > 0 {
            return Some(&rest[..len]);
        }
    }
    None
}

/// Byte length of a decimal capture (`digits '.' digits`, optional sign) at
/// the start of `s`, or `None` if `s` does not begin with one
fn decimal_len(s: &str, signed: bool) -> Option<usize> {
    let bytes = s.as_bytes();
    let mut i = 0;

    if signed && bytes.first() == Some(&b'-') {
        i += 1;
    }

    let whole = count_digits(&bytes[i..]);
    if whole == 0 {
        return None;
    }
    i += whole;

    if bytes.get(i) != Some(&b'.') {
        return None;
    }
    i += 1;

    let frac = count_digits(&bytes[i..]);
    if frac == 0 {
        return None;
    }

    Some(i + frac)
}

/// Length of the leading ASCII digit run
fn count_digits(bytes: &[u8]) -> usize {
    bytes.iter().take_while(|b| b.is_ascii_digit()).count()
}
