//! # QPSK symbol mapping
//!
//! The [`map_bits`] function maps bit pairs to symbols from the 4-point alphabet `{±1±j}`
//! (modulus `sqrt(2)`), and [`demap_symbols`] slices symbols back to bit pairs by quadrant.
//! The two functions use one fixed table, so a mapped stream always demaps to the original
//! bits; the table itself is a crate-internal convention, not a wire contract.

use itertools::Itertools;
use num_complex::Complex;

use crate::Bit;

/// Modulus of every point in the QPSK alphabet.
pub const SYMBOL_MODULUS: f64 = std::f64::consts::SQRT_2;

/// Returns QPSK symbols for a bit sequence, two bits per symbol.
///
/// # Parameters
///
/// - `bits`: Bits to be mapped. Pairs map as `00 → 1+1j`, `01 → -1+1j`, `10 → -1-1j`,
///   `11 → 1-1j`. A trailing unpaired bit is dropped; callers that must not lose bits pad
///   to even length first (see [`crate::bits::packetize`]).
///
/// # Returns
///
/// - `symbols`: One symbol per bit pair, `bits.len() / 2` in total.
///
/// # Examples
///
/// ```
/// use num_complex::Complex;
/// use symsync::qpsk::map_bits;
/// use symsync::Bit::{One, Zero};
///
/// let symbols = map_bits(&[Zero, Zero, One, Zero]);
/// assert_eq!(symbols, [Complex::new(1.0, 1.0), Complex::new(-1.0, -1.0)]);
/// ```
#[must_use]
pub fn map_bits(bits: &[Bit]) -> Vec<Complex<f64>> {
    bits.iter()
        .tuples()
        .map(|(first, second)| match (first, second) {
            (Bit::Zero, Bit::Zero) => Complex::new(1.0, 1.0),
            (Bit::Zero, Bit::One) => Complex::new(-1.0, 1.0),
            (Bit::One, Bit::Zero) => Complex::new(-1.0, -1.0),
            (Bit::One, Bit::One) => Complex::new(1.0, -1.0),
        })
        .collect()
}

/// Returns the bit pairs for a symbol sequence, sliced by quadrant.
///
/// Inverse of [`map_bits`] for any symbols with nonzero components; a component equal to
/// zero is treated as positive.
///
/// # Parameters
///
/// - `symbols`: Symbols to be sliced.
///
/// # Returns
///
/// - `bits`: Two bits per symbol, `2 * symbols.len()` in total.
#[must_use]
pub fn demap_symbols(symbols: &[Complex<f64>]) -> Vec<Bit> {
    symbols
        .iter()
        .flat_map(|symbol| match (symbol.re >= 0.0, symbol.im >= 0.0) {
            (true, true) => [Bit::Zero, Bit::Zero],
            (false, true) => [Bit::Zero, Bit::One],
            (false, false) => [Bit::One, Bit::Zero],
            (true, false) => [Bit::One, Bit::One],
        })
        .collect()
}
