//! Connection establishment and the setup/start handshake
//!
//! The exchange is strictly sequential: send the setup word, send `P1`,
//! read the 4-byte acknowledgement, read one dummy byte. Any mismatch is
//! fatal to the session; retry policy belongs to the caller.

use std::io::{Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use socket2::{SockRef, TcpKeepalive};

use crate::error::{ConnectError, Error, ProtocolError, Result};
use crate::protocol::setup::{setup_word, SampleQuantity, TimeRange};

/// Acknowledgement the device sends after accepting setup and start.
pub const ACK: [u8; 4] = [0x00, 0x7f, 0x00, 0x7f];

/// Start-transmission command.
const START_COMMAND: &[u8] = b"P1\n";

/// Open a TCP connection to the device.
///
/// `read_timeout` becomes the per-read deadline for everything that follows,
/// handshake included; `None` blocks forever like the original firmware
/// tooling.
pub fn connect(
    host: &str,
    port: u16,
    connect_timeout: Duration,
    read_timeout: Option<Duration>,
) -> Result<TcpStream> {
    let target = format!("{}:{}", host, port);
    let addr = target
        .to_socket_addrs()
        .map_err(|e| ConnectError::Resolve(format!("{}: {}", target, e)))?
        .next()
        .ok_or_else(|| ConnectError::Resolve(target.clone()))?;

    tracing::info!("connecting to {}", addr);
    let stream = TcpStream::connect_timeout(&addr, connect_timeout)
        .map_err(|source| ConnectError::Tcp { addr, source })?;

    stream.set_nodelay(true)?;
    stream.set_read_timeout(read_timeout)?;
    let keepalive = TcpKeepalive::new().with_time(Duration::from_secs(30));
    SockRef::from(&stream).set_tcp_keepalive(&keepalive)?;

    Ok(stream)
}

/// Run the setup/start exchange on an established connection.
pub fn negotiate<S: Read + Write>(
    stream: &mut S,
    quantity: SampleQuantity,
    range: TimeRange,
) -> Result<()> {
    let word = setup_word(quantity, range);
    tracing::debug!("sending setup word {:?}", word);
    stream.write_all(word.as_bytes())?;
    stream.write_all(b"\n")?;
    stream.write_all(START_COMMAND)?;
    stream.flush()?;

    let mut ack = [0u8; 4];
    stream.read_exact(&mut ack)?;
    if ack != ACK {
        return Err(Error::Protocol(ProtocolError::BadAck {
            expected: ACK,
            got: ack,
        }));
    }

    // Trailing dummy byte before the trace stream starts.
    let mut dummy = [0u8; 1];
    stream.read_exact(&mut dummy)?;

    tracing::info!(
        "handshake complete: {} samples, {} ns range",
        quantity.as_u16(),
        range.as_ns()
    );
    Ok(())
}
