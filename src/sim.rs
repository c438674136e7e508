//! # End-to-end simulator for the timing recovery loop
//!
//! One simulation run ([`run_sim`]) pushes a text payload through the whole chain: bit
//! packing and packetization, QPSK mapping, oversampling and boxcar pulse shaping, the
//! channel emulator, and finally the timing recovery loop. The run is scored against the
//! transmitted packet and condensed into a [`RunSummary`]. The [`run_sims`] function
//! executes a batch of runs in parallel and saves all summaries to a JSON file.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::bits::{error_count, pack_text, packetize};
use crate::channel::{embed_offset, impair};
use crate::qpsk::{demap_symbols, map_bits};
use crate::shaping::{oversample, shape};
use crate::timing::{recover, LoopConfig, TauStrategy, TedVariant};
use crate::{io, Error};

/// Parameters for one end-to-end timing recovery simulation run
#[derive(Clone, PartialEq, Debug, Deserialize, Serialize)]
pub struct SimParams {
    /// Text payload to be transmitted
    pub text: String,
    /// Whether the Barker-13 synchronization word is prepended to the payload
    pub with_sync: bool,
    /// Number of samples per symbol
    pub nsps: usize,
    /// Normalized loop bandwidth `BnTs`
    pub bn_ts: f64,
    /// Detector gain the loop filter is normalized by
    pub ted_gain: f64,
    /// Timing-error detector variant
    pub ted: TedVariant,
    /// Accumulator strategy
    pub tau_strategy: TauStrategy,
    /// Channel noise amplitude knob (effective standard deviation is its square)
    pub noise_level: f64,
    /// Half-width of the channel amplitude variation range
    pub amp_var: f64,
    /// Half-width (radians) of the channel phase rotation range
    pub phase_var: f64,
}

impl SimParams {
    /// Returns the loop configuration for a clean signal of the given length embedded by
    /// the channel emulator; the loop starts at the embedding offset plus the
    /// matched-filter group delay.
    fn loop_config(&self, signal_len: usize) -> LoopConfig {
        LoopConfig::new(self.nsps, self.bn_ts, self.ted_gain)
            .with_ted(self.ted)
            .with_tau_strategy(self.tau_strategy)
            .with_start_sample(embed_offset(signal_len) + self.nsps - 1)
    }
}

/// Summary of one simulation run
#[derive(Clone, PartialEq, Debug, Deserialize, Serialize)]
pub struct RunSummary {
    /// Parameters of the run
    pub params: SimParams,
    /// Number of symbols the loop emitted
    pub num_symbols: usize,
    /// Number of bit errors between the sliced symbol stream and the transmitted packet
    pub num_bit_errors: usize,
    /// Mean absolute detector error over the run
    pub mean_abs_error: f64,
    /// Timing offset (samples) after the last iteration
    pub final_tau: i64,
    /// Smallest timing offset seen during the run
    pub tau_min: i64,
    /// Largest timing offset seen during the run
    pub tau_max: i64,
    /// Number of iterations in which the loop accumulator was clamped or wrapped
    pub clamp_events: usize,
}

impl std::fmt::Display for RunSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "noise {:.3}: {} symbols, {} bit errors, final tau {}, mean |e| {:.6}",
            self.params.noise_level,
            self.num_symbols,
            self.num_bit_errors,
            self.final_tau,
            self.mean_abs_error
        )
    }
}

/// Checks validity of simulation parameters.
fn check_sim_params(params: &SimParams) -> Result<(), Error> {
    if params.text.is_empty() {
        return Err(Error::InvalidInput(
            "Text payload cannot be empty".to_string(),
        ));
    }
    if params.noise_level < 0.0 {
        return Err(Error::InvalidInput(format!(
            "Noise level cannot be negative (found {})",
            params.noise_level
        )));
    }
    if !(0.0 ..= 1.0).contains(&params.amp_var) {
        return Err(Error::InvalidInput(format!(
            "Amplitude variation must be between 0 and 1 (found {})",
            params.amp_var
        )));
    }
    if params.phase_var < 0.0 {
        return Err(Error::InvalidInput(format!(
            "Phase variation cannot be negative (found {})",
            params.phase_var
        )));
    }
    LoopConfig::new(params.nsps, params.bn_ts, params.ted_gain).validate()
}

/// Returns the clean oversampled transmit signal for a set of simulation parameters.
///
/// The chain is bit packing, packetization, QPSK mapping, oversampling by `nsps`, and
/// boxcar pulse shaping. The parameters are validated before any samples are produced.
///
/// # Errors
///
/// Returns an error if the simulation parameters are invalid (in particular when `nsps`
/// is below 2).
pub fn synthesize(params: &SimParams) -> Result<Vec<num_complex::Complex<f64>>, Error> {
    check_sim_params(params)?;
    let packet = packetize(&pack_text(&params.text), params.with_sync);
    let symbols = map_bits(&packet);
    Ok(shape(&oversample(&symbols, params.nsps), params.nsps))
}

/// Runs one end-to-end simulation and returns its summary.
///
/// # Parameters
///
/// - `params`: Simulation parameters, validated before anything is transmitted.
///
/// # Returns
///
/// - `summary`: Score of the run against the transmitted packet.
///
/// # Errors
///
/// Returns an error if the simulation parameters are invalid.
///
/// # Examples
///
/// ```
/// use symsync::sim::{run_sim, SimParams};
/// use symsync::{TauStrategy, TedVariant};
///
/// let params = SimParams {
///     text: "HI".to_string(),
///     with_sync: false,
///     nsps: 10,
///     bn_ts: 0.01,
///     ted_gain: 2.4,
///     ted: TedVariant::GardnerAmplitude,
///     tau_strategy: TauStrategy::RoundClamp,
///     noise_level: 0.0,
///     amp_var: 0.0,
///     phase_var: 0.0,
/// };
/// let summary = run_sim(&params)?;
/// assert_eq!(summary.num_bit_errors, 0);
/// # Ok::<(), symsync::Error>(())
/// ```
#[allow(clippy::cast_precision_loss)]
pub fn run_sim(params: &SimParams) -> Result<RunSummary, Error> {
    let signal = synthesize(params)?;
    let packet = packetize(&pack_text(&params.text), params.with_sync);
    let noisy_signal = impair(&signal, params.noise_level, params.amp_var, params.phase_var);
    let recovery = recover(&noisy_signal, &params.loop_config(signal.len()))?;
    let num_bit_errors = error_count(&demap_symbols(&recovery.symbols), &packet);
    let mean_abs_error = if recovery.errors.is_empty() {
        0.0
    } else {
        recovery.errors.iter().map(|e| e.abs()).sum::<f64>() / recovery.errors.len() as f64
    };
    Ok(RunSummary {
        params: params.clone(),
        num_symbols: recovery.symbols.len(),
        num_bit_errors,
        mean_abs_error,
        final_tau: recovery.taus.last().copied().unwrap_or(0),
        tau_min: recovery.taus.iter().copied().min().unwrap_or(0),
        tau_max: recovery.taus.iter().copied().max().unwrap_or(0),
        clamp_events: recovery.clamp_events,
    })
}

/// Runs a batch of simulations in parallel and saves all summaries to a JSON file.
///
/// Runs are independent (each draws its own channel), so they execute on the rayon thread
/// pool. One summary line per run is printed to `stderr` in batch order.
///
/// # Parameters
///
/// - `all_params`: Parameters for each run in the batch.
///
/// - `json_filename`: Name of the JSON file to which all summaries must be saved.
///
/// # Errors
///
/// Returns an error if any parameter set is invalid, or if the JSON file cannot be written.
pub fn run_sims(all_params: &[SimParams], json_filename: &str) -> Result<(), Error> {
    let all_summaries = all_params
        .par_iter()
        .map(run_sim)
        .collect::<Result<Vec<RunSummary>, Error>>()?;
    for summary in &all_summaries {
        eprintln!("{summary}");
    }
    io::write_json(json_filename, &all_summaries)
}

#[cfg(test)]
mod tests_of_functions {
    use super::*;

    fn params_for_test() -> SimParams {
        SimParams {
            text: "This is a text ? Yes !!".to_string(),
            with_sync: true,
            nsps: 10,
            bn_ts: 0.01,
            ted_gain: 2.4,
            ted: TedVariant::GardnerAmplitude,
            tau_strategy: TauStrategy::RoundClamp,
            noise_level: 0.0,
            amp_var: 0.0,
            phase_var: 0.0,
        }
    }

    #[test]
    fn test_check_sim_params() {
        // Invalid input
        let mut params = params_for_test();
        params.text = String::new();
        assert!(check_sim_params(&params).is_err());
        let mut params = params_for_test();
        params.nsps = 1;
        assert!(check_sim_params(&params).is_err());
        let mut params = params_for_test();
        params.ted_gain = 0.0;
        assert!(check_sim_params(&params).is_err());
        let mut params = params_for_test();
        params.noise_level = -0.1;
        assert!(check_sim_params(&params).is_err());
        let mut params = params_for_test();
        params.amp_var = 1.5;
        assert!(check_sim_params(&params).is_err());
        let mut params = params_for_test();
        params.phase_var = -0.1;
        assert!(check_sim_params(&params).is_err());
        // Valid input
        assert!(check_sim_params(&params_for_test()).is_ok());
    }

    #[test]
    fn test_synthesize() {
        // Invalid input
        let mut params = params_for_test();
        params.nsps = 0;
        assert!(synthesize(&params).is_err());
        params.nsps = 1;
        assert!(synthesize(&params).is_err());
        // Valid input
        let params = params_for_test();
        let packet = packetize(&pack_text(&params.text), params.with_sync);
        let signal = synthesize(&params).unwrap();
        assert_eq!(signal.len(), (packet.len() / 2) * params.nsps + params.nsps - 1);
    }

    #[test]
    fn test_run_sim_noiseless() {
        // With a clean channel the loop starts aligned, never moves, and slices every
        // packet bit correctly.
        let summary = run_sim(&params_for_test()).unwrap();
        let packet = packetize(&pack_text(&params_for_test().text), true);
        assert!(summary.num_symbols >= packet.len() / 2);
        assert_eq!(summary.num_bit_errors, 0);
        assert_eq!(summary.final_tau, 0);
        assert_eq!(summary.tau_min, 0);
        assert_eq!(summary.tau_max, 0);
        assert_eq!(summary.clamp_events, 0);
        assert!(summary.mean_abs_error < 0.05);
    }

    #[test]
    fn test_run_sim_rejects_bad_params() {
        let mut params = params_for_test();
        params.ted_gain = 0.0;
        assert!(run_sim(&params).is_err());
    }

    #[test]
    fn test_run_sim_with_noise_is_bounded() {
        let mut params = params_for_test();
        params.noise_level = 0.3;
        params.amp_var = 0.1;
        params.phase_var = 0.2;
        let summary = run_sim(&params).unwrap();
        assert!(summary.num_symbols > 0);
        assert!(summary.mean_abs_error.is_finite());
        let nsps = i64::try_from(params.nsps).unwrap();
        assert!(summary.tau_min >= -nsps && summary.tau_max <= nsps);
    }

    #[test]
    fn test_run_sims_writes_json() {
        let filename = std::env::temp_dir()
            .join("symsync_test_summaries.json")
            .to_string_lossy()
            .into_owned();
        let mut noisier = params_for_test();
        noisier.noise_level = 0.2;
        run_sims(&[params_for_test(), noisier], &filename).unwrap();
        let contents = std::fs::read_to_string(&filename).unwrap();
        let summaries: Vec<RunSummary> = serde_json::from_str(&contents).unwrap();
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].num_bit_errors, 0);
        std::fs::remove_file(&filename).unwrap();
    }
}
