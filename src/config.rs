use std::path::PathBuf;

use clap::Parser;

use crate::error::AverageError;

fn parse_window_size(value: &str) -> Result<f64, String> {
    let minutes: f64 = value
        .parse()
        .map_err(|e| format!("{value:?} is not a number: {e}"))?;
    // NaN fails this comparison too.
    if !(minutes >= 0.0) {
        return Err(AverageError::NegativeWindow(minutes).to_string());
    }
    Ok(minutes)
}

#[derive(Debug, Parser)]
#[clap(
    name = "delivery-average",
    about = "Moving average of event durations, one value per minute"
)]
pub struct Opt {
    /// JSON array of events with `timestamp` and `duration` fields, sorted by timestamp
    #[clap(long = "input_file", parse(from_os_str))]
    pub input_file: PathBuf,

    /// How many minutes before each tick are averaged
    #[clap(
        long = "window_size",
        allow_hyphen_values = true,
        parse(try_from_str = parse_window_size)
    )]
    pub window_size: f64,

    /// Where to write the averages, overwritten on every run
    #[clap(long = "output_file", parse(from_os_str), default_value = "output.json")]
    pub output_file: PathBuf,
}
