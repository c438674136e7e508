//! This crate simulates QPSK symbol-timing recovery over a coarse noise/amplitude/phase
//! channel. A text message is packetized, mapped to QPSK, boxcar-shaped, and impaired, and
//! a Gardner-family timing loop recovers the symbol stream. Simulation parameters are
//! specified on the command line; the clean transmit signal is saved in binary and text
//! form, and the results of a noise sweep are saved to a JSON file.
//!
//! Build the executable with `cargo build --release` and then run
//! `./target/release/symsync -h` for help on the command-line interface.

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

use anyhow::Result;
use clap::{crate_name, crate_version, value_parser, Arg, ArgAction, ArgMatches, Command};
use std::time::Instant;
use symsync::sim::{self, SimParams};
use symsync::{bits, io, TauStrategy, TedVariant};

/// Main function
fn main() -> Result<()> {
    let timer = Instant::now();
    let matches = command_line_parser().get_matches();
    let all_params = all_sim_params(&matches);
    if let Some(params) = all_params.first() {
        save_transmit_files(&matches, params)?;
    }
    sim::run_sims(&all_params, &json_filename_from_matches(&matches))?;
    eprintln!("Elapsed time: {:.3?}", timer.elapsed());
    Ok(())
}

/// Saves the clean transmit signal (binary and text) and the synchronization word.
fn save_transmit_files(matches: &ArgMatches, params: &SimParams) -> Result<()> {
    let signal = sim::synthesize(params)?;
    let scale = scale_from_matches(matches);
    io::write_samples_i16(&signal_bin_filename_from_matches(matches), &signal, scale)?;
    io::write_samples_text(&signal_text_filename_from_matches(matches), &signal, scale)?;
    io::write_sync_word(
        &sync_word_filename_from_matches(matches),
        &bits::barker13(),
    )?;
    Ok(())
}

/// Returns command line parser.
fn command_line_parser() -> Command {
    Command::new(crate_name!())
        .version(crate_version!())
        .about("Simulates QPSK symbol-timing recovery over a noisy channel")
        .arg(message())
        .arg(nsps())
        .arg(bn_ts())
        .arg(ted_gain())
        .arg(ted_name())
        .arg(tau_strategy_name())
        .arg(first_noise_level())
        .arg(noise_level_step())
        .arg(num_noise_levels())
        .arg(amp_var())
        .arg(phase_var())
        .arg(with_sync())
        .arg(scale())
        .arg(signal_bin_filename())
        .arg(signal_text_filename())
        .arg(sync_word_filename())
        .arg(json_filename())
}

/// Returns argument for text message to be transmitted.
fn message() -> Arg {
    Arg::new("message")
        .short('m')
        .default_value("This is a message to test timing recovery !")
        .help("Text message to be transmitted")
}

/// Returns argument for number of samples per symbol.
fn nsps() -> Arg {
    Arg::new("nsps")
        .short('n')
        .value_parser(value_parser!(usize))
        .default_value("10")
        .help("Number of samples per symbol")
}

/// Returns argument for normalized loop bandwidth.
fn bn_ts() -> Arg {
    Arg::new("bn_ts")
        .short('b')
        .value_parser(value_parser!(f64))
        .default_value("0.01")
        .help("Normalized loop bandwidth (BnTs)")
}

/// Returns argument for detector gain.
fn ted_gain() -> Arg {
    Arg::new("ted_gain")
        .short('k')
        .value_parser(value_parser!(f64))
        .allow_negative_numbers(true)
        .default_value("2.4")
        .help("Detector gain the loop filter is normalized by")
}

/// Returns argument for timing-error detector name.
fn ted_name() -> Arg {
    Arg::new("ted_name")
        .short('d')
        .value_parser(["Gardner", "GardnerComplex", "ZeroCrossing"])
        .default_value("Gardner")
        .help("Timing-error detector name")
}

/// Returns argument for accumulator strategy name.
fn tau_strategy_name() -> Arg {
    Arg::new("tau_strategy_name")
        .short('w')
        .value_parser(["RoundClamp", "ModuloWrap"])
        .default_value("RoundClamp")
        .help("Accumulator strategy name")
}

/// Returns argument for first noise level of the sweep.
fn first_noise_level() -> Arg {
    Arg::new("first_noise_level")
        .short('r')
        .value_parser(value_parser!(f64))
        .default_value("0.0")
        .help("First noise level of the sweep")
}

/// Returns argument for noise level step of the sweep.
fn noise_level_step() -> Arg {
    Arg::new("noise_level_step")
        .short('p')
        .value_parser(value_parser!(f64))
        .default_value("0.05")
        .help("Noise level step of the sweep")
}

/// Returns argument for number of noise levels in the sweep.
fn num_noise_levels() -> Arg {
    Arg::new("num_noise_levels")
        .short('s')
        .value_parser(value_parser!(u32))
        .default_value("4")
        .help("Number of noise levels in the sweep")
}

/// Returns argument for channel amplitude variation.
fn amp_var() -> Arg {
    Arg::new("amp_var")
        .short('a')
        .value_parser(value_parser!(f64))
        .default_value("0.0")
        .help("Half-width of the channel amplitude variation range")
}

/// Returns argument for channel phase variation.
fn phase_var() -> Arg {
    Arg::new("phase_var")
        .short('q')
        .value_parser(value_parser!(f64))
        .default_value("0.0")
        .help("Half-width (radians) of the channel phase rotation range")
}

/// Returns argument for prepending the synchronization word.
fn with_sync() -> Arg {
    Arg::new("with_sync")
        .short('y')
        .action(ArgAction::SetTrue)
        .help("Prepend the Barker-13 synchronization word to the payload")
}

/// Returns argument for the file scale factor.
fn scale() -> Arg {
    Arg::new("scale")
        .short('c')
        .value_parser(value_parser!(f64))
        .default_value("1024.0")
        .help("Scale factor applied when saving signal files")
}

/// Returns argument for name of the binary signal file.
fn signal_bin_filename() -> Arg {
    Arg::new("signal_bin_filename")
        .short('o')
        .default_value("signal.bin")
        .help("Name of binary file to which the clean signal must be saved")
}

/// Returns argument for name of the text signal file.
fn signal_text_filename() -> Arg {
    Arg::new("signal_text_filename")
        .short('t')
        .default_value("signal.txt")
        .help("Name of text file to which the clean signal must be saved")
}

/// Returns argument for name of the synchronization word file.
fn sync_word_filename() -> Arg {
    Arg::new("sync_word_filename")
        .short('u')
        .default_value("sync_word.txt")
        .help("Name of file to which the synchronization word must be saved")
}

/// Returns argument for name of JSON file to which results must be saved.
fn json_filename() -> Arg {
    Arg::new("json_filename")
        .short('f')
        .default_value("results.json")
        .help("Name of JSON file to which results must be saved")
}

/// Returns simulation parameters based on command-line arguments.
fn all_sim_params(matches: &ArgMatches) -> Vec<SimParams> {
    let mut all_params = Vec::new();
    for noise_level in all_noise_levels_from_matches(matches) {
        all_params.push(SimParams {
            text: message_from_matches(matches),
            with_sync: with_sync_from_matches(matches),
            nsps: nsps_from_matches(matches),
            bn_ts: bn_ts_from_matches(matches),
            ted_gain: ted_gain_from_matches(matches),
            ted: ted_from_matches(matches),
            tau_strategy: tau_strategy_from_matches(matches),
            noise_level,
            amp_var: amp_var_from_matches(matches),
            phase_var: phase_var_from_matches(matches),
        });
    }
    // OK to unwrap: All command-line arguments have default values, so an error cannot occur
    // in any of the associated functions called above.
    all_params
}

/// Returns text message to be transmitted.
fn message_from_matches(matches: &ArgMatches) -> String {
    matches.get_one::<String>("message").unwrap().to_string()
}

/// Returns number of samples per symbol.
fn nsps_from_matches(matches: &ArgMatches) -> usize {
    *matches.get_one("nsps").unwrap()
}

/// Returns normalized loop bandwidth.
fn bn_ts_from_matches(matches: &ArgMatches) -> f64 {
    *matches.get_one("bn_ts").unwrap()
}

/// Returns detector gain.
fn ted_gain_from_matches(matches: &ArgMatches) -> f64 {
    *matches.get_one("ted_gain").unwrap()
}

/// Returns timing-error detector variant.
fn ted_from_matches(matches: &ArgMatches) -> TedVariant {
    match matches.get_one::<String>("ted_name").unwrap().as_str() {
        "Gardner" => TedVariant::GardnerAmplitude,
        "GardnerComplex" => TedVariant::GardnerComplex,
        "ZeroCrossing" => TedVariant::ZeroCrossing,
        _ => panic!("Invalid timing-error detector name"),
    }
}

/// Returns accumulator strategy.
fn tau_strategy_from_matches(matches: &ArgMatches) -> TauStrategy {
    match matches
        .get_one::<String>("tau_strategy_name")
        .unwrap()
        .as_str()
    {
        "RoundClamp" => TauStrategy::RoundClamp,
        "ModuloWrap" => TauStrategy::ModuloWrap,
        _ => panic!("Invalid accumulator strategy name"),
    }
}

/// Returns all noise levels of the sweep.
fn all_noise_levels_from_matches(matches: &ArgMatches) -> Vec<f64> {
    let first_noise_level: f64 = *matches.get_one("first_noise_level").unwrap();
    let noise_level_step: f64 = *matches.get_one("noise_level_step").unwrap();
    let num_noise_levels: u32 = *matches.get_one("num_noise_levels").unwrap();
    (0 .. num_noise_levels)
        .map(|n| first_noise_level + noise_level_step * f64::from(n))
        .collect()
}

/// Returns channel amplitude variation.
fn amp_var_from_matches(matches: &ArgMatches) -> f64 {
    *matches.get_one("amp_var").unwrap()
}

/// Returns channel phase variation.
fn phase_var_from_matches(matches: &ArgMatches) -> f64 {
    *matches.get_one("phase_var").unwrap()
}

/// Returns whether the synchronization word must be prepended.
fn with_sync_from_matches(matches: &ArgMatches) -> bool {
    matches.get_flag("with_sync")
}

/// Returns file scale factor.
fn scale_from_matches(matches: &ArgMatches) -> f64 {
    *matches.get_one("scale").unwrap()
}

/// Returns name of binary file to which the clean signal must be saved.
fn signal_bin_filename_from_matches(matches: &ArgMatches) -> String {
    matches
        .get_one::<String>("signal_bin_filename")
        .unwrap()
        .to_string()
}

/// Returns name of text file to which the clean signal must be saved.
fn signal_text_filename_from_matches(matches: &ArgMatches) -> String {
    matches
        .get_one::<String>("signal_text_filename")
        .unwrap()
        .to_string()
}

/// Returns name of file to which the synchronization word must be saved.
fn sync_word_filename_from_matches(matches: &ArgMatches) -> String {
    matches
        .get_one::<String>("sync_word_filename")
        .unwrap()
        .to_string()
}

/// Returns name of JSON file to which simulation results must be saved.
fn json_filename_from_matches(matches: &ArgMatches) -> String {
    matches
        .get_one::<String>("json_filename")
        .unwrap()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command_line_for_test() -> Vec<&'static str> {
        vec![
            crate_name!(),
            "-m",
            "HI",
            "-n",
            "10",
            "-b",
            "0.01",
            "-k",
            "2.4",
            "-d",
            "Gardner",
            "-w",
            "ModuloWrap",
            "-r",
            "0.0",
            "-p",
            "0.25",
            "-s",
            "3",
            "-a",
            "0.2",
            "-q",
            "0.1",
            "-y",
            "-c",
            "1024.0",
            "-o",
            "signal.bin",
            "-t",
            "signal.txt",
            "-u",
            "sync_word.txt",
            "-f",
            "results.json",
        ]
    }

    #[test]
    fn test_command_line_parser() {
        assert!(command_line_parser()
            .try_get_matches_from(command_line_for_test())
            .is_ok());
        assert!(command_line_parser()
            .try_get_matches_from([crate_name!(), "-d", "Mueller"])
            .is_err());
    }

    #[test]
    #[allow(clippy::float_cmp)]
    fn test_all_sim_params() {
        let matches = command_line_parser().get_matches_from(command_line_for_test());
        let all_params = all_sim_params(&matches);
        let all_noise_levels = [0.0, 0.25, 0.5];
        assert_eq!(all_params.len(), 3);
        for (idx, params) in all_params.iter().enumerate() {
            assert_eq!(params.text, "HI");
            assert!(params.with_sync);
            assert_eq!(params.nsps, 10);
            assert_eq!(params.bn_ts, 0.01);
            assert_eq!(params.ted_gain, 2.4);
            assert_eq!(params.ted, TedVariant::GardnerAmplitude);
            assert_eq!(params.tau_strategy, TauStrategy::ModuloWrap);
            assert_eq!(params.noise_level, all_noise_levels[idx]);
            assert_eq!(params.amp_var, 0.2);
            assert_eq!(params.phase_var, 0.1);
        }
    }
}
