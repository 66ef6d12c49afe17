//! Trace framing and decoding
//!
//! A trace record is `quantity * 2` bytes: the signal samples as big-endian
//! signed 16-bit values, followed by the service values (same encoding,
//! discarded). There is no frame delimiter; framing is purely length-based.

use std::io::{ErrorKind, Read};

use crate::error::{Error, Result, StreamError};
use crate::protocol::setup::SampleQuantity;

/// One scan line's worth of signal samples.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trace {
    /// Decoded samples, length = `quantity.main_count()`
    pub samples: Vec<i16>,
}

impl Trace {
    pub fn new(samples: Vec<i16>) -> Self {
        Self { samples }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Read exactly one trace record from the stream.
///
/// Partial reads are accumulated; a short read is never treated as success.
/// Connection closure mid-record is fatal to the session and surfaces as
/// [`StreamError::SocketClosed`].
pub fn read_trace<R: Read>(stream: &mut R, quantity: SampleQuantity) -> Result<Trace> {
    let main_count = quantity.main_count();
    let service_bytes = quantity.service_count() * 2;

    let mut raw = vec![0u8; main_count * 2];
    stream.read_exact(&mut raw).map_err(map_read_err)?;

    let samples = raw
        .chunks_exact(2)
        .map(|pair| i16::from_be_bytes([pair[0], pair[1]]))
        .collect();

    // Service data is transport overhead; read it off the wire and drop it.
    let mut service = vec![0u8; service_bytes];
    stream.read_exact(&mut service).map_err(map_read_err)?;

    Ok(Trace::new(samples))
}

fn map_read_err(e: std::io::Error) -> Error {
    match e.kind() {
        ErrorKind::UnexpectedEof => StreamError::SocketClosed.into(),
        ErrorKind::WouldBlock | ErrorKind::TimedOut => StreamError::ReadTimeout.into(),
        _ => StreamError::Read(e).into(),
    }
}
