//! Trait abstraction over the serial line source to enable testing the
//! session loop without hardware

use async_trait::async_trait;

use super::SensorLink;
use crate::error::Result;

/// One-line-at-a-time read contract shared by the live link and test doubles
#[async_trait]
pub trait LineSource: Send {
    /// Read the next line.
    ///
    /// `Ok(Some(line))` is a complete line, `Ok(None)` an idle timeout, and
    /// `Err` a lost transport that requires reacquisition.
    async fn next_line(&mut self) -> Result<Option<String>>;
}

#[async_trait]
impl LineSource for SensorLink {
    async fn next_line(&mut self) -> Result<Option<String>> {
        self.read_line().await
    }
}
