//! Setup-word encoding
//!
//! The radar is configured with a single ASCII command: a leading literal
//! `T`, a mode character, then 32 bit positions packed as `'0'`/`'1'`
//! characters. Most positions are fixed for this hardware revision; the
//! sample quantity and time range map to small bit groups in the middle.

use crate::constants::SERVICE_DIVISOR;

/// Total length of the setup word: `T` + mode space + 32 bit positions.
pub const SETUP_WORD_LEN: usize = 34;

/// Samples per trace the firmware accepts.
///
/// Any other requested value silently falls back to 512, matching the
/// firmware and preserving wire compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleQuantity {
    Q128,
    Q256,
    Q512,
    Q1024,
}

impl SampleQuantity {
    /// Map a raw requested value onto a supported quantity.
    pub fn from_raw(raw: u16) -> Self {
        match raw {
            128 => Self::Q128,
            256 => Self::Q256,
            512 => Self::Q512,
            1024 => Self::Q1024,
            other => {
                tracing::warn!("unsupported sample quantity {}, falling back to 512", other);
                Self::Q512
            }
        }
    }

    pub fn as_u16(self) -> u16 {
        match self {
            Self::Q128 => 128,
            Self::Q256 => 256,
            Self::Q512 => 512,
            Self::Q1024 => 1024,
        }
    }

    /// Trailing service values per trace (transport overhead, discarded).
    pub fn service_count(self) -> usize {
        (self.as_u16() / SERVICE_DIVISOR) as usize
    }

    /// Signal samples per trace.
    pub fn main_count(self) -> usize {
        self.as_u16() as usize - self.service_count()
    }

    /// Total record size on the wire in bytes.
    pub fn record_bytes(self) -> usize {
        self.as_u16() as usize * 2
    }

    /// Bit positions 05-06.
    fn bits(self) -> &'static str {
        match self {
            Self::Q128 => "00",
            Self::Q256 => "10",
            Self::Q512 => "01",
            Self::Q1024 => "11",
        }
    }
}

/// Sounding time range in nanoseconds.
///
/// Unsupported values fall back to the 50 ns bit pair, again matching the
/// firmware's silent-default behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeRange {
    Ns25,
    Ns50,
    Ns100,
    Ns200,
    Ns300,
    Ns2000,
}

impl TimeRange {
    /// Map a raw requested value onto a supported range.
    pub fn from_raw(raw: u16) -> Self {
        match raw {
            25 => Self::Ns25,
            50 => Self::Ns50,
            100 => Self::Ns100,
            200 => Self::Ns200,
            300 => Self::Ns300,
            2000 => Self::Ns2000,
            other => {
                tracing::warn!("unsupported time range {} ns, falling back to 50 ns", other);
                Self::Ns50
            }
        }
    }

    pub fn as_ns(self) -> u16 {
        match self {
            Self::Ns25 => 25,
            Self::Ns50 => 50,
            Self::Ns100 => 100,
            Self::Ns200 => 200,
            Self::Ns300 => 300,
            Self::Ns2000 => 2000,
        }
    }

    /// Bit positions 02-04 and 13-14.
    fn bits(self) -> (&'static str, &'static str) {
        match self {
            Self::Ns25 => ("000", "10"),
            Self::Ns50 => ("000", "00"),
            Self::Ns100 => ("100", "00"),
            Self::Ns200 => ("010", "00"),
            Self::Ns300 => ("110", "00"),
            Self::Ns2000 => ("111", "00"),
        }
    }
}

/// Build the setup command for the given configuration.
///
/// Pure and infallible: unsupported inputs were already normalized by the
/// enum constructors. The returned string is always [`SETUP_WORD_LEN`]
/// characters and starts with `T`.
pub fn setup_word(quantity: SampleQuantity, range: TimeRange) -> String {
    let (range_coarse, range_fine) = range.bits();

    let mut word = String::with_capacity(SETUP_WORD_LEN);
    word.push('T');
    word.push(' '); // mode
    word.push('1'); // 00: Tx off
    word.push('1'); // 01: cables combined
    word.push_str(range_coarse); // 02-04
    word.push_str(quantity.bits()); // 05-06
    word.push('0'); // 07
    word.push_str("000"); // 08-10
    word.push_str("00"); // 11-12
    word.push_str(range_fine); // 13-14
    word.push('0'); // 15
    word.push_str("1010"); // 16-19: sounding regime
    word.push_str("00"); // 20-21: single channel
    word.push_str("1010110010"); // 22-31

    debug_assert_eq!(word.len(), SETUP_WORD_LEN);
    word
}
