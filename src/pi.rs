use std::thread;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::Parser;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use log::{info, trace};
use lyre::Lyre;
use mcp300::{Mcp3008, Mcp3008Sensor, ReportingMode};
use mcp3008_lyre::app::{poll_interval, Args, TransportChoice, Tuner};
use mcp3008_lyre::raspberry_pi::{RpiError, RpiPeripherals};

type Sensor = Mcp3008Sensor<fn() -> Result<RpiPeripherals, RpiError>>;

fn main() -> Result<(), anyhow::Error> {
    let args = Args::parse();

    env_logger::Builder::new()
        .filter_level(args.log_level())
        .parse_default_env()
        .init();

    let access: fn() -> Result<RpiPeripherals, RpiError> = RpiPeripherals::new;

    let adc = match args.transport() {
        TransportChoice::Spi(config) => Mcp3008::hardware_bus(config, access),
        TransportChoice::Gpio(pins) => Mcp3008::bit_banged(pins, access),
    };

    let mut sensor = Mcp3008Sensor::new(adc, args.channels.clone());

    sensor.register().context("Failed to register the MCP3008")?;

    let host = cpal::default_host();

    let device = host
        .default_output_device()
        .context("Failed to find a default output device")?;

    let device = Box::leak::<'static>(Box::new(device));

    let supported_config = device.default_output_config()?;

    let mut lyre = Lyre::new();

    let stream_builder = lyre.stream(&*device, &supported_config);

    // Spawn a thread to play the stream
    let _audio_thread = thread::spawn(move || -> Result<(), anyhow::Error> {
        let stream = stream_builder()?;
        stream.play()?;

        thread::sleep(Duration::MAX);

        Ok(())
    });

    let result = play(&mut sensor, &mut lyre, args.low_power_after(), args.run_for());

    let _ = sensor.unregister();

    result
}

/// Polls until `run_for` elapses or a read fails. Without `run_for` this only returns on error;
/// a process killed by a signal leaves releasing its lines and bus to the OS.
fn play(
    sensor: &mut Sensor,
    lyre: &mut Lyre,
    low_power_after: Duration,
    run_for: Option<Duration>,
) -> Result<(), anyhow::Error> {
    let started = Instant::now();
    let mut tuner = Tuner::default();

    while run_for.map_or(true, |limit| started.elapsed() < limit) {
        let mode = sensor.reporting_mode().unwrap_or(ReportingMode::Continuous);

        if mode == ReportingMode::Continuous && started.elapsed() >= low_power_after {
            info!("Switching to low power mode");
            sensor.set_low_power_mode(true);
        }

        let readings = sensor.read()?;

        trace!("{readings:?}");

        if let Some(note) = tuner.update(&readings) {
            info!("{note}");
            lyre.pluck_note(note);
        }

        thread::sleep(poll_interval(mode));
    }

    info!("Session over");

    Ok(())
}
