//! Zond-12e command protocol: setup-word encoding, handshake, trace framing

pub mod handshake;
pub mod setup;
pub mod trace;

pub use handshake::{connect, negotiate, ACK};
pub use setup::{setup_word, SampleQuantity, TimeRange, SETUP_WORD_LEN};
pub use trace::{read_trace, Trace};
