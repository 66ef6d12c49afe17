//! # GPR Stream
//!
//! Streaming client for the Cobra Zond-12e ground-penetrating radar.
//!
//! The device speaks a bit-packed ASCII command protocol over a raw TCP
//! socket: the client sends a 34-character setup word and a `P1` start
//! command, the device acknowledges with a fixed 4-byte constant and then
//! streams fixed-size binary trace records indefinitely. Framing is purely
//! length-based, derived from the negotiated sample quantity.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                         Cobra Zond-12e                           │
//! │        (TCP server, port 23, continuous trace stream)            │
//! └───────────────────────────────┬──────────────────────────────────┘
//!                                 │ setup word / P1 / ACK
//!                                 │ then trace records
//!                                 ▼
//! ┌──────────────────────────────────────────────────────────────────┐
//! │ Session (session::Session)                                       │
//! │   ┌──────────────┐    ┌───────────────┐    ┌──────────────────┐  │
//! │   │  Handshake   │──▶ │  Pump Thread  │──▶ │  SlidingWindow   │  │
//! │   │  (one-shot)  │    │ (blocking I/O)│    │ (last N traces)  │  │
//! │   └──────────────┘    └───────┬───────┘    └────────┬─────────┘  │
//! │                               │                     │ snapshot   │
//! │                               ▼                     ▼            │
//! │                       ┌───────────────┐    ┌──────────────────┐  │
//! │                       │   FrameSlot   │    │    consumers     │  │
//! │                       │ (capacity 1,  │──▶ │ (renderers, CLI, │  │
//! │                       │  drop-oldest) │    │  broadcasters)   │  │
//! │                       └───────────────┘    └──────────────────┘  │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The pump thread is the only component that touches the socket after the
//! handshake. Consumers never block it: the sliding window hands out copies,
//! and the single-slot frame handoff replaces an unconsumed frame instead of
//! waiting for a slow reader.

pub mod buffer;
pub mod config;
pub mod error;
pub mod protocol;
pub mod session;

pub use error::{Error, Result};

/// Application-wide constants
pub mod constants {
    /// Default TCP port the radar listens on
    pub const DEFAULT_PORT: u16 = 23;

    /// Default sample quantity per trace
    pub const DEFAULT_SAMPLE_QUANTITY: u16 = 512;

    /// Default time range in nanoseconds
    pub const DEFAULT_TIME_RANGE_NS: u16 = 100;

    /// Default sliding-window capacity in traces (one B-scan batch)
    pub const DEFAULT_WINDOW_CAPACITY: usize = 700;

    /// Default TCP connect timeout in milliseconds
    pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 5_000;

    /// Default per-read deadline in milliseconds; guards against a stalled
    /// device hanging the pump forever
    pub const DEFAULT_READ_TIMEOUT_MS: u64 = 5_000;

    /// Service-data divisor: 1/16th of each trace is transport overhead,
    /// not signal
    pub const SERVICE_DIVISOR: u16 = 16;
}
