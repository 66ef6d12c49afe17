//! Error types for the GPR streaming client

use thiserror::Error;

/// Main error type for the crate
#[derive(Error, Debug)]
pub enum Error {
    #[error("connection error: {0}")]
    Connect(#[from] ConnectError),

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("stream error: {0}")]
    Stream(#[from] StreamError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// TCP connection establishment errors
#[derive(Error, Debug)]
pub enum ConnectError {
    #[error("failed to resolve address: {0}")]
    Resolve(String),

    #[error("connect to {addr} failed: {source}")]
    Tcp {
        addr: std::net::SocketAddr,
        source: std::io::Error,
    },
}

/// Command/acknowledgement protocol errors
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("bad ack: expected {expected:02x?}, got {got:02x?}")]
    BadAck { expected: [u8; 4], got: [u8; 4] },
}

/// Errors on the continuous trace stream
#[derive(Error, Debug)]
pub enum StreamError {
    #[error("socket closed mid-trace")]
    SocketClosed,

    #[error("read deadline expired waiting for trace data")]
    ReadTimeout,

    #[error("read failed: {0}")]
    Read(std::io::Error),
}

/// Result type alias for the crate
pub type Result<T> = std::result::Result<T, Error>;
