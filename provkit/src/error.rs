//! High-level error types

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Core protocol error: {0}")]
    Core(#[from] provkit_core::Error),

    #[error("Transport error: {0}")]
    Transport(#[from] provkit_transport::Error),

    #[error("Type error: {0}")]
    Types(#[from] provkit_types::Error),

    #[error("Device not connected")]
    NotConnected,

    #[error("Invalid response from device: {0}")]
    InvalidResponse(String),
}
