//! # Pulse shaping
//!
//! The transmit side zero-stuffs the symbol stream ([`oversample`]) and convolves it with an
//! all-ones boxcar of the same length as the oversampling factor ([`shape`]), which turns
//! each symbol into an NRZ-like rectangular pulse spanning one symbol period. The receive
//! side applies the normalized counterpart ([`matched_filter`]) to the I and Q streams
//! independently before timing recovery.
//!
//! Oversampling places the gap of `n - 1` zeros after every symbol, including the last one,
//! so the shaped signal of `k` symbols spans `k * n` samples before the convolution tail.

use num_complex::Complex;

/// Returns the zero-stuffed sample stream for a symbol sequence.
///
/// # Parameters
///
/// - `symbols`: Symbols to be oversampled.
///
/// - `n`: Oversampling factor; `n - 1` zero samples follow every symbol.
///
/// # Returns
///
/// - `samples`: Stream of `symbols.len() * n` samples.
#[must_use]
pub fn oversample(symbols: &[Complex<f64>], n: usize) -> Vec<Complex<f64>> {
    let mut samples = Vec::with_capacity(symbols.len() * n);
    for &symbol in symbols {
        samples.push(symbol);
        samples.resize(samples.len() + (n - 1), Complex::new(0.0, 0.0));
    }
    samples
}

/// Returns the full convolution of a sample stream with an all-ones boxcar of length `n`.
///
/// # Parameters
///
/// - `samples`: Samples to be shaped.
///
/// - `n`: Boxcar length (equal to the oversampling factor on the transmit side).
///
/// # Returns
///
/// - `pulses`: Shaped stream of `samples.len() + n - 1` samples (empty for empty input).
#[must_use]
pub fn shape(samples: &[Complex<f64>], n: usize) -> Vec<Complex<f64>> {
    if samples.is_empty() {
        return Vec::new();
    }
    let out_len = samples.len() + n - 1;
    let mut pulses = Vec::with_capacity(out_len);
    for k in 0 .. out_len {
        let lo = k.saturating_sub(n - 1);
        let hi = std::cmp::min(k, samples.len() - 1);
        pulses.push(samples[lo ..= hi].iter().sum());
    }
    pulses
}

/// Returns the full convolution of a real sample stream with a normalized boxcar of length
/// `n` (all coefficients `1/n`).
///
/// The loop-filter detector gain is quoted for this normalization; see
/// [`crate::timing::LoopConfig`].
///
/// # Parameters
///
/// - `samples`: Real-valued (I or Q) stream to be filtered.
///
/// - `n`: Filter length, equal to the number of samples per symbol.
///
/// # Returns
///
/// - `filtered`: Filtered stream of `samples.len() + n - 1` samples (empty for empty input).
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn matched_filter(samples: &[f64], n: usize) -> Vec<f64> {
    if samples.is_empty() {
        return Vec::new();
    }
    let out_len = samples.len() + n - 1;
    let mut filtered = Vec::with_capacity(out_len);
    for k in 0 .. out_len {
        let lo = k.saturating_sub(n - 1);
        let hi = std::cmp::min(k, samples.len() - 1);
        filtered.push(samples[lo ..= hi].iter().sum::<f64>() / n as f64);
    }
    filtered
}
