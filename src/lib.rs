//! # AquaLog Library
//!
//! Unattended serial data logger for water-quality sensor nodes.
//!
//! This library provides the pieces of the logging pipeline: a
//! self-healing serial connection, a frame processor that turns noisy
//! plain-text telemetry into validated records, and an append-only file
//! sink. The binary wires them into a single sequential loop.

pub mod config;
pub mod error;
pub mod frame;
pub mod record;
pub mod serial;
pub mod session;
pub mod sink;
