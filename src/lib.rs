//! This crate is a digital-baseband testbench for QPSK symbol-timing recovery. The transmit
//! chain packs text into bits, optionally prepends a Barker-13 synchronization word, maps bit
//! pairs to QPSK symbols, oversamples them, and shapes them with a boxcar filter; a coarse
//! channel emulator can then bury the signal in white Gaussian noise and apply a random
//! amplitude scale and phase rotation. The receive side recovers symbol timing from the noisy
//! oversampled I/Q stream with a matched boxcar filter, a selectable timing-error detector,
//! and a second-order proportional-integral loop filter, emitting the synchronized symbol
//! stream together with per-symbol diagnostics.

#![warn(
    clippy::complexity,
    clippy::pedantic,
    clippy::perf,
    clippy::style,
    clippy::suspicious,
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    trivial_casts,
    trivial_numeric_casts,
    unused_allocation,
    unused_import_braces,
    unused_qualifications
)]

pub mod bits;
pub mod channel;
pub mod io;
pub mod qpsk;
pub mod shaping;
pub mod sim;
pub mod timing;

pub use crate::timing::{recover, LoopConfig, Recovery, TauStrategy, TedVariant};

/// Enumeration of binary symbol values
#[derive(Clone, Eq, PartialEq, Debug, Copy)]
pub enum Bit {
    /// Binary symbol `0`
    Zero = 0,
    /// Binary symbol `1`
    One = 1,
}

/// Custom error type
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Invalid input error
    #[error("{0}")]
    InvalidInput(String),
    /// File read/write error
    #[error("{0}")]
    FileReadWriteError(#[from] std::io::Error),
    /// Serde read/write error
    #[error("{0}")]
    SerdeReadWriteError(#[from] serde_json::Error),
}
