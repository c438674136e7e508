//! # Bit packing and packetization
//!
//! The [`pack_text`] function turns a text payload into its bit sequence (8 bits per byte,
//! most significant bit first), and [`unpack_bytes`] inverts it. The [`packetize`] function
//! assembles the transmit bit stream: it optionally prepends the 13-chip Barker
//! synchronization word returned by [`barker13`], and pads an odd-length stream with a single
//! trailing `Zero` so that the stream can be consumed two bits at a time by the QPSK mapper.

use crate::Bit;

/// Returns the bit sequence for a text payload, 8 bits per byte, MSB first.
///
/// # Parameters
///
/// - `text`: Text payload (its UTF-8 bytes are packed).
///
/// # Returns
///
/// - `bits`: Bit sequence of length `8 * text.len()` for ASCII text.
///
/// # Examples
///
/// ```
/// use symsync::bits::pack_text;
/// use symsync::Bit::{One, Zero};
///
/// let bits = pack_text("H");
/// assert_eq!(bits, [Zero, One, Zero, Zero, One, Zero, Zero, Zero]);
/// ```
#[must_use]
pub fn pack_text(text: &str) -> Vec<Bit> {
    text.bytes()
        .flat_map(|byte| {
            (0 .. 8).rev().map(move |shift| {
                if byte & (1 << shift) == 0 {
                    Bit::Zero
                } else {
                    Bit::One
                }
            })
        })
        .collect()
}

/// Returns the bytes encoded by a bit sequence, 8 bits per byte, MSB first.
///
/// Inverse of [`pack_text`]. Trailing bits that do not fill a whole byte (such as the padding
/// bit added by [`packetize`]) are dropped.
///
/// # Parameters
///
/// - `bits`: Bit sequence to be unpacked.
///
/// # Returns
///
/// - `bytes`: Bytes reconstructed from the bit sequence.
#[must_use]
pub fn unpack_bytes(bits: &[Bit]) -> Vec<u8> {
    bits.chunks_exact(8)
        .map(|chunk| {
            chunk
                .iter()
                .fold(0u8, |acc, &bit| (acc << 1) | u8::from(bit == Bit::One))
        })
        .collect()
}

/// Returns the 13-chip Barker synchronization sequence `1 1 1 1 1 0 0 1 1 0 1 0 1`.
#[must_use]
pub fn barker13() -> [Bit; 13] {
    use Bit::{One, Zero};
    [
        One, One, One, One, One, Zero, Zero, One, One, Zero, One, Zero, One,
    ]
}

/// Returns the transmit bit stream for a payload.
///
/// # Parameters
///
/// - `payload`: Payload bits.
///
/// - `with_sync`: Whether to prepend the Barker-13 synchronization word.
///
/// # Returns
///
/// - `packet`: Packet bits, padded with a single trailing `Zero` if their count is odd, so
///   that the stream length is always even.
///
/// # Examples
///
/// ```
/// use symsync::bits::{barker13, packetize};
/// use symsync::Bit::One;
///
/// let packet = packetize(&[One], true);
/// assert_eq!(packet.len(), 14);
/// assert_eq!(packet[.. 13], barker13());
/// ```
#[must_use]
pub fn packetize(payload: &[Bit], with_sync: bool) -> Vec<Bit> {
    let mut packet = Vec::with_capacity(payload.len() + 14);
    if with_sync {
        packet.extend_from_slice(&barker13());
    }
    packet.extend_from_slice(payload);
    if packet.len() % 2 != 0 {
        packet.push(Bit::Zero);
    }
    packet
}

/// Returns number of errors in a bit sequence with respect to a reference sequence.
///
/// If the two sequences are of different lengths, then the longer one is effectively
/// truncated to the length of the shorter one.
pub fn error_count(seq: &[Bit], ref_seq: &[Bit]) -> usize {
    ref_seq
        .iter()
        .zip(seq.iter())
        .filter(|&(x, y)| x != y)
        .count()
}

#[cfg(test)]
mod tests_of_functions {
    use super::*;
    use Bit::{One, Zero};

    #[test]
    fn test_pack_text_length() {
        assert!(pack_text("").is_empty());
        for text in ["A", "HI", "This is a text ? Yes !!"] {
            assert_eq!(pack_text(text).len(), 8 * text.len());
        }
    }

    #[test]
    fn test_pack_text_msb_first() {
        // 'H' = 0x48 = 0b01001000
        assert_eq!(
            pack_text("H"),
            [Zero, One, Zero, Zero, One, Zero, Zero, Zero]
        );
    }

    #[test]
    fn test_pack_unpack_round_trip() {
        let text = "The five boxing wizards jump quickly?!";
        let bits = pack_text(text);
        assert_eq!(unpack_bytes(&bits), text.as_bytes());
    }

    #[test]
    fn test_unpack_bytes_drops_partial_byte() {
        let mut bits = pack_text("K");
        bits.push(Zero);
        assert_eq!(unpack_bytes(&bits), b"K");
    }

    #[test]
    fn test_barker13() {
        let seq = barker13();
        assert_eq!(seq.len(), 13);
        // Chip count: eight ones, five zeros.
        assert_eq!(seq.iter().filter(|&&b| b == One).count(), 8);
    }

    #[test]
    fn test_packetize_without_sync() {
        let payload = [One, Zero, One, One];
        assert_eq!(packetize(&payload, false), payload);
    }

    #[test]
    fn test_packetize_pads_odd_length() {
        let payload = [One, Zero, One];
        assert_eq!(packetize(&payload, false), [One, Zero, One, Zero]);
        // Sync word (13 chips) plus odd payload gives an even packet with no padding.
        let packet = packetize(&payload, true);
        assert_eq!(packet.len(), 16);
        assert_eq!(packet[13 ..], payload);
    }

    #[test]
    fn test_error_count() {
        assert_eq!(error_count(&[], &[One, Zero]), 0);
        let ref_seq = [One, Zero, Zero, One, One, One, Zero, Zero];
        let seq = [One, One, Zero, Zero, One, One, Zero, Zero];
        assert_eq!(error_count(&seq, &ref_seq), 2);
    }
}
