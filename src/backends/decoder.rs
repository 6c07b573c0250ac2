//! Reference decoder for WAV (hound) and FLAC (claxon) sources.
//!
//! Bytes are sniffed by their magic number, decoded to normalized `f32`
//! channels and resampled to the requested rate. The duration always comes
//! from the source rate, so a low display rate keeps timing exact.

use futures_util::future::BoxFuture;
use rayon::prelude::*;
use std::io::Cursor;

use crate::error::BoxError;
use crate::player::{DecodedAudio, Decoder};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    Wav,
    Flac,
}

impl AudioFormat {
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        match bytes.get(..4)? {
            b"RIFF" => Some(AudioFormat::Wav),
            b"fLaC" => Some(AudioFormat::Flac),
            _ => None,
        }
    }
}

/// Interleaved samples plus the stream layout.
struct Pcm {
    samples: Vec<f32>,
    channels: usize,
    sample_rate: u32,
}

/// Read only the header and return the duration in seconds.
pub fn probe_duration(bytes: &[u8]) -> Option<f64> {
    match AudioFormat::sniff(bytes)? {
        AudioFormat::Wav => {
            let reader = hound::WavReader::new(Cursor::new(bytes)).ok()?;
            let spec = reader.spec();
            Some(reader.duration() as f64 / spec.sample_rate as f64)
        }
        AudioFormat::Flac => {
            let reader = claxon::FlacReader::new(Cursor::new(bytes)).ok()?;
            let info = reader.streaminfo();
            let frames = info.samples?;
            Some(frames as f64 / info.sample_rate as f64)
        }
    }
}

fn read_wav(bytes: &[u8]) -> Result<Pcm, BoxError> {
    let mut reader = hound::WavReader::new(Cursor::new(bytes))?;
    let spec = reader.spec();

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Int => {
            let max_value = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|s| s as f32 / max_value))
                .collect::<Result<_, _>>()?
        }
        hound::SampleFormat::Float => reader.samples::<f32>().collect::<Result<_, _>>()?,
    };

    log::debug!(
        "WAV: {} Hz, {} channels, {} bits",
        spec.sample_rate,
        spec.channels,
        spec.bits_per_sample
    );

    Ok(Pcm {
        samples,
        channels: spec.channels as usize,
        sample_rate: spec.sample_rate,
    })
}

fn read_flac(bytes: &[u8]) -> Result<Pcm, BoxError> {
    let mut reader = claxon::FlacReader::new(Cursor::new(bytes))?;
    let info = reader.streaminfo();
    let max_value = (1i64 << (info.bits_per_sample - 1)) as f32;

    let mut samples = Vec::with_capacity(info.samples.unwrap_or(0) as usize * info.channels as usize);
    for sample in reader.samples() {
        samples.push(sample? as f32 / max_value);
    }

    log::debug!(
        "FLAC: {} Hz, {} channels, {} bits",
        info.sample_rate,
        info.channels,
        info.bits_per_sample
    );

    Ok(Pcm {
        samples,
        channels: info.channels as usize,
        sample_rate: info.sample_rate,
    })
}

/// Linear-interpolation resample of one channel.
fn resample(data: &[f32], from: u32, to: u32) -> Vec<f32> {
    if from == to || data.is_empty() {
        return data.to_vec();
    }
    let ratio = from as f64 / to as f64;
    let length = ((data.len() as f64) / ratio).round().max(1.0) as usize;
    (0..length)
        .map(|i| {
            let position = i as f64 * ratio;
            let index = position.floor() as usize;
            let frac = (position - index as f64) as f32;
            let a = data[index.min(data.len() - 1)];
            let b = data[(index + 1).min(data.len() - 1)];
            a + (b - a) * frac
        })
        .collect()
}

fn decode_pcm(bytes: &[u8], sample_rate: u32) -> Result<DecodedAudio, BoxError> {
    let pcm = match AudioFormat::sniff(bytes) {
        Some(AudioFormat::Wav) => read_wav(bytes)?,
        Some(AudioFormat::Flac) => read_flac(bytes)?,
        None => return Err("Unsupported audio format".into()),
    };
    if pcm.channels == 0 || pcm.sample_rate == 0 {
        return Err("Audio stream has no channels".into());
    }

    let frames = pcm.samples.len() / pcm.channels;
    let duration = frames as f64 / pcm.sample_rate as f64;
    let target = if sample_rate == 0 {
        pcm.sample_rate
    } else {
        sample_rate
    };

    let channels: Vec<Vec<f32>> = (0..pcm.channels)
        .into_par_iter()
        .map(|channel| {
            let data: Vec<f32> = pcm
                .samples
                .iter()
                .skip(channel)
                .step_by(pcm.channels)
                .copied()
                .collect();
            resample(&data, pcm.sample_rate, target)
        })
        .collect();

    Ok(DecodedAudio::new(channels, duration, target))
}

#[derive(Debug, Clone, Default)]
pub struct SampleDecoder;

impl SampleDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl Decoder for SampleDecoder {
    fn decode(&self, bytes: Vec<u8>, sample_rate: u32) -> BoxFuture<'_, Result<DecodedAudio, BoxError>> {
        Box::pin(async move {
            tokio::task::spawn_blocking(move || decode_pcm(&bytes, sample_rate)).await?
        })
    }
}
