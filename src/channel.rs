//! # Coarse channel emulator
//!
//! [`impair`] stress-tests the timing recovery loop: it builds a complex white-Gaussian
//! noise buffer twice as long as the clean signal, embeds the signal in its middle, and
//! applies one random amplitude scale and one random phase rotation to the whole buffer.
//! The order of operations is fixed: noise, then embed, then scale, then rotate, so the
//! scale and rotation act on noise and signal together.
//!
//! The noise amplitude knob is applied twice by design (samples are drawn with standard
//! deviation `noise_level` and then multiplied by `noise_level` again, for an effective
//! standard deviation of `noise_level²`); this reproduces the behavior the recovery loop
//! was tuned against and must not be "corrected" silently.
//!
//! This is not a physical channel model: there is no filtering, no frequency offset, and
//! the amplitude/phase draws are constant over the whole buffer.

use num_complex::Complex;
use rand::Rng;
use rand_distr::StandardNormal;

/// Returns the sample index at which [`impair`] embeds a signal of the given length.
#[must_use]
pub fn embed_offset(signal_len: usize) -> usize {
    signal_len - signal_len / 2
}

/// Returns an impaired copy of a signal, embedded in a noise buffer of twice its length.
///
/// # Parameters
///
/// - `signal`: Clean complex baseband signal.
///
/// - `noise_level`: Noise amplitude knob; the effective per-component standard deviation
///   is `noise_level²` (see the module docs).
///
/// - `amp_var`: Half-width of the uniform amplitude factor range `[1 - amp_var, 1 + amp_var]`.
///
/// - `phase_var`: Half-width (radians) of the uniform phase rotation range
///   `[-phase_var, phase_var]`.
///
/// # Returns
///
/// - `noisy_signal`: Buffer of `2 * signal.len()` samples with the signal starting at
///   [`embed_offset`]`(signal.len())`.
#[must_use]
pub fn impair(
    signal: &[Complex<f64>],
    noise_level: f64,
    amp_var: f64,
    phase_var: f64,
) -> Vec<Complex<f64>> {
    let mut rng = rand::rng();
    let noise_len = 2 * signal.len();
    let mut noisy_signal: Vec<Complex<f64>> = (0 .. noise_len)
        .map(|_| {
            Complex::new(
                noise_level * noise_level * rng.sample::<f64, _>(StandardNormal),
                noise_level * noise_level * rng.sample::<f64, _>(StandardNormal),
            )
        })
        .collect();
    let start = embed_offset(signal.len());
    for (noisy, &clean) in noisy_signal[start ..].iter_mut().zip(signal.iter()) {
        *noisy += clean;
    }
    let amplitude_factor = rng.random_range(1.0 - amp_var ..= 1.0 + amp_var);
    let phase_shift = rng.random_range(-phase_var ..= phase_var);
    let rotation = amplitude_factor * Complex::from_polar(1.0, phase_shift);
    for sample in &mut noisy_signal {
        *sample *= rotation;
    }
    noisy_signal
}
