//! Configuration and note selection for the instrument.

use std::time::Duration;

use clap::Parser;
use lyre::Note;
use mcp300::{BusConfig, PinAssignment, ReportingMode};

/// Bus used when neither `--spi` nor `--gpio` is given.
pub const DEFAULT_BUS: &str = "SPI0.0";

/// Width of the summed reading range mapped to one note.
pub const STEP_WIDTH: f32 = 170.;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// SPI bus the MCP3008 is attached to
    #[clap(long, conflicts_with = "gpio")]
    pub spi: Option<String>,
    /// Bit-bang the MCP3008 over these GPIO lines instead of using SPI
    #[clap(long, num_args = 4, value_names = ["CS", "CLK", "DOUT", "DIN"])]
    pub gpio: Option<Vec<String>>,
    /// Channels to sample, in order
    #[clap(short, long = "channel", default_values_t = vec![0, 1])]
    pub channels: Vec<i32>,
    /// Seconds of continuous reporting before dropping to low power
    #[clap(long, default_value_t = 60)]
    pub low_power_after: u64,
    /// Stop and release the converter after this many seconds; run until interrupted otherwise
    #[clap(long)]
    pub run_for: Option<u64>,
    /// Print all log messages and debug information
    #[clap(short, long)]
    pub verbose: bool,
}

/// Where to find the converter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportChoice {
    Spi(BusConfig),
    Gpio(PinAssignment),
}

impl Args {
    pub fn transport(&self) -> TransportChoice {
        match self.gpio.as_deref() {
            Some([chip_select, clock, data_out, data_in]) => TransportChoice::Gpio(
                PinAssignment::new(chip_select, clock, data_out, data_in),
            ),
            _ => TransportChoice::Spi(BusConfig::new(
                self.spi.as_deref().unwrap_or(DEFAULT_BUS),
            )),
        }
    }

    pub fn low_power_after(&self) -> Duration {
        Duration::from_secs(self.low_power_after)
    }

    pub fn run_for(&self) -> Option<Duration> {
        self.run_for.map(Duration::from_secs)
    }

    pub fn log_level(&self) -> log::LevelFilter {
        if self.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        }
    }
}

/// The note selected by the sum of all readings.
pub fn note_for(readings: &[f32]) -> Note {
    let sum: f32 = readings.iter().sum();

    Note::from_step((sum / STEP_WIDTH) as usize)
}

/// How long to wait between polls.
pub fn poll_interval(mode: ReportingMode) -> Duration {
    match mode {
        ReportingMode::Continuous => Duration::from_millis(1),
        ReportingMode::OnChange => Duration::from_millis(100),
    }
}

/// Tracks the selected note and reports changes.
#[derive(Debug, Default)]
pub struct Tuner {
    current: Option<Note>,
}

impl Tuner {
    pub fn current(&self) -> Option<Note> {
        self.current
    }

    /// Returns the new note if `readings` select a different one.
    pub fn update(&mut self, readings: &[f32]) -> Option<Note> {
        let note = note_for(readings);

        if self.current == Some(note) {
            return None;
        }

        self.current = Some(note);

        Some(note)
    }
}
