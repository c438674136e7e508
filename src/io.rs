//! # Signal file input/output
//!
//! Shaped baseband signals are exchanged with external tools as interleaved 16-bit
//! little-endian I/Q samples ([`write_samples_i16`], [`read_samples_i16`]) after scaling by
//! a caller-chosen factor (conventionally `1024`). A human-readable variant writes one
//! `I, Q` pair per line ([`write_samples_text`]), and the synchronization word can be
//! exported as a string of `0`/`1` characters ([`write_sync_word`]). Simulation results are
//! persisted as JSON through [`write_json`].

use std::fs::File;
use std::io::{BufWriter, Write};

use num_complex::Complex;
use serde::Serialize;

use crate::{Bit, Error};

/// Saves a complex sample stream to a binary file as interleaved 16-bit little-endian I/Q
/// values.
///
/// # Parameters
///
/// - `filename`: Name of the file to save the samples to.
///
/// - `samples`: Samples to be saved.
///
/// - `scale`: Factor each component is multiplied by before the integer cast; values
///   outside the 16-bit range saturate.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written to.
#[allow(clippy::cast_possible_truncation)]
pub fn write_samples_i16(
    filename: &str,
    samples: &[Complex<f64>],
    scale: f64,
) -> Result<(), Error> {
    let mut writer = BufWriter::new(File::create(filename)?);
    for sample in samples {
        writer.write_all(&((sample.re * scale) as i16).to_le_bytes())?;
        writer.write_all(&((sample.im * scale) as i16).to_le_bytes())?;
    }
    writer.flush()?;
    Ok(())
}

/// Loads a complex sample stream from a binary file of interleaved 16-bit little-endian
/// I/Q values.
///
/// The returned components are the raw integer values as `f64`; undoing the scale applied
/// by [`write_samples_i16`] is up to the caller.
///
/// # Parameters
///
/// - `filename`: Name of the file to load the samples from.
///
/// # Errors
///
/// Returns an error if the file cannot be read, or if its size is not a multiple of 4
/// bytes (one I/Q pair).
pub fn read_samples_i16(filename: &str) -> Result<Vec<Complex<f64>>, Error> {
    let bytes = std::fs::read(filename)?;
    if bytes.len() % 4 != 0 {
        return Err(Error::InvalidInput(format!(
            "File {} holds {} bytes, not a whole number of I/Q pairs",
            filename,
            bytes.len()
        )));
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|chunk| {
            let i = i16::from_le_bytes([chunk[0], chunk[1]]);
            let q = i16::from_le_bytes([chunk[2], chunk[3]]);
            Complex::new(f64::from(i), f64::from(q))
        })
        .collect())
}

/// Saves a complex sample stream to a text file, one scaled `I, Q` pair per line.
///
/// # Parameters
///
/// - `filename`: Name of the file to save the samples to.
///
/// - `samples`: Samples to be saved.
///
/// - `scale`: Factor each component is multiplied by before the integer cast; values
///   outside the 16-bit range saturate.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written to.
#[allow(clippy::cast_possible_truncation)]
pub fn write_samples_text(
    filename: &str,
    samples: &[Complex<f64>],
    scale: f64,
) -> Result<(), Error> {
    let mut writer = BufWriter::new(File::create(filename)?);
    for sample in samples {
        writeln!(
            writer,
            "{}, {}",
            (sample.re * scale) as i16,
            (sample.im * scale) as i16
        )?;
    }
    writer.flush()?;
    Ok(())
}

/// Saves a bit sequence to a text file as a contiguous string of `0`/`1` characters.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written to.
pub fn write_sync_word(filename: &str, bits: &[Bit]) -> Result<(), Error> {
    let mut writer = BufWriter::new(File::create(filename)?);
    for &bit in bits {
        write!(writer, "{}", if bit == Bit::One { '1' } else { '0' })?;
    }
    writer.flush()?;
    Ok(())
}

/// Saves a serializable value to a JSON file.
///
/// # Errors
///
/// Returns an error if the file cannot be created, or if serialization fails.
pub fn write_json<T: Serialize>(filename: &str, value: &T) -> Result<(), Error> {
    let writer = BufWriter::new(File::create(filename)?);
    serde_json::to_writer_pretty(writer, value)?;
    Ok(())
}
