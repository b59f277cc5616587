//! A plucked-string instrument with a seven note scale.
#![allow(clippy::precedence)]

use std::fmt;

#[cfg(feature = "playback")]
use cpal::traits::DeviceTrait;
#[cfg(feature = "playback")]
use cpal::{Device, FromSample, SizedSample, Stream, SupportedStreamConfig};
use fundsp::hacker::*;
use funutd::Rnd;

/// A note of the C major scale, middle octave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Note {
    C,
    D,
    E,
    F,
    G,
    A,
    B,
}

impl Note {
    pub const SCALE: [Note; 7] = [
        Note::C,
        Note::D,
        Note::E,
        Note::F,
        Note::G,
        Note::A,
        Note::B,
    ];

    /// The note `step` places up the scale, saturating at [`Note::B`].
    pub fn from_step(step: usize) -> Self {
        Self::SCALE[Ord::min(step, Self::SCALE.len() - 1)]
    }

    /// Frequency in Hz, rounded to the nearest whole Hz.
    pub fn hz(self) -> f64 {
        match self {
            Note::C => 262.,
            Note::D => 294.,
            Note::E => 330.,
            Note::F => 349.,
            Note::G => 392.,
            Note::A => 440.,
            Note::B => 494.,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Note::C => "C",
            Note::D => "D",
            Note::E => "E",
            Note::F => "F",
            Note::G => "G",
            Note::A => "A",
            Note::B => "B",
        }
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub struct Lyre {
    sequencer: Sequencer64,
    rnd: Rnd,
}

impl Default for Lyre {
    fn default() -> Self {
        Self {
            sequencer: Sequencer64::new(false, 1),
            rnd: Rnd::from_time(),
        }
    }
}

impl Lyre {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a builder for the output stream. The stream must be built and played on the thread
    /// that keeps it alive.
    #[cfg(feature = "playback")]
    pub fn stream<'a, 'b>(
        &'a mut self,
        device: &'static Device,
        config: &'a SupportedStreamConfig,
    ) -> impl FnOnce() -> Result<Stream, anyhow::Error> + 'b {
        let sequencer_backend = self.sequencer.backend();
        let config = config.clone();

        move || match config.sample_format() {
            cpal::SampleFormat::F32 => Self::run::<f32>(device, &config.into(), sequencer_backend),
            cpal::SampleFormat::I16 => Self::run::<i16>(device, &config.into(), sequencer_backend),
            cpal::SampleFormat::U16 => Self::run::<u16>(device, &config.into(), sequencer_backend),
            format => Err(anyhow::anyhow!("Unsupported sample format {format:?}")),
        }
    }

    /// Pluck a string tuned to `note`.
    pub fn pluck_note(&mut self, note: Note) {
        self.pluck_hz(note.hz());
    }

    pub fn pluck_hz(&mut self, hz: f64) {
        let waveform = Net64::wrap(Box::new(
            (brown() * lfo(|t| exp(-10. * t))) >> pluck(hz, 0.2, 0.2) * 0.5,
        ));

        let mut note = Box::new(waveform);

        note.ping(false, AttoHash::new(self.rnd.u64()));

        self.sequencer
            .push_relative(0.0, 5.0, Fade::Smooth, 0.02, 0.2, note);
    }

    #[cfg(feature = "playback")]
    fn run<T>(
        device: &cpal::Device,
        config: &cpal::StreamConfig,
        sequencer_backend: SequencerBackend64,
    ) -> Result<Stream, anyhow::Error>
    where
        T: SizedSample + FromSample<f64>,
    {
        let sample_rate = config.sample_rate.0 as f64;
        let channels = config.channels as usize;

        let mut net = Net64::wrap(Box::new(sequencer_backend));

        net = net >> resonator_hz(925., 500.) >> pan(0.0);

        net.set_sample_rate(sample_rate);

        net.allocate();

        let mut next_value = move || net.get_stereo();

        let stream = device.build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                for frame in data.chunks_mut(channels) {
                    let sample = next_value();
                    let left = T::from_sample(sample.0);
                    let right: T = T::from_sample(sample.1);

                    for (channel, sample) in frame.iter_mut().enumerate() {
                        if channel & 1 == 0 {
                            *sample = left;
                        } else {
                            *sample = right;
                        }
                    }
                }
            },
            |err| log::error!("an error occurred on stream: {err}"),
            None,
        )?;

        Ok(stream)
    }
}
