//! Transport layer for the configuration menu
//!
//! Provides serial and TCP byte streams to devices. A TCP transport reaches
//! boards whose console is exposed through a serial-to-network bridge.

pub mod error;
pub mod serial;
pub mod tcp;
#[cfg(any(test, feature = "test-util"))]
pub mod scripted;

pub use error::{Error, Result};
pub use serial::{available_ports, SerialTransport};
pub use tcp::TcpTransport;
#[cfg(any(test, feature = "test-util"))]
pub use scripted::{ScriptedTransport, WriteLog};

use std::time::Duration;

use async_trait::async_trait;
use bytes::BytesMut;

/// Transport trait for different communication methods
#[async_trait]
pub trait Transport: Send + Sync {
    /// Open the link
    async fn connect(&mut self) -> Result<()>;

    /// Close the link
    async fn disconnect(&mut self) -> Result<()>;

    /// Check if connected
    fn is_connected(&self) -> bool;

    /// Send raw bytes
    async fn send(&mut self, data: &[u8]) -> Result<()>;

    /// Receive whatever bytes arrive first
    ///
    /// Fails with [`Error::ReadTimeout`] when nothing arrives within `timeout`.
    async fn receive(&mut self, timeout: Duration) -> Result<BytesMut>;

    /// Discard input that arrived but has not been read yet
    async fn discard_input(&mut self) -> Result<()>;

    /// Port path or remote address, for logging
    fn remote_addr(&self) -> String;
}
