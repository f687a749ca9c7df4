//! # Frame Module
//!
//! Parsing and validation of telemetry lines.
//!
//! This module handles:
//! - Sanitizing noisy lines against the grammar allow-list
//! - Locating fields by keyword scanning and capturing their decimal
//!   strings verbatim
//! - Tracking the logical session state (current node)
//! - Enforcing the temperature + primary-metric data-quality gate

pub mod extract;
pub mod grammar;
pub mod processor;
