//! In-memory decoded audio: per-channel amplitude samples plus a duration.
//!
//! A [`DecodedAudio`] is produced either by a [`Decoder`](super::Decoder)
//! from raw bytes or by wrapping caller-supplied peaks. It is shared behind an
//! `Arc` between the player and the renderer and never mutated afterwards.

use rayon::prelude::*;

#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAudio {
    channels: Vec<Vec<f32>>,
    duration: f64,
    sample_rate: u32,
}

impl DecodedAudio {
    pub fn new(channels: Vec<Vec<f32>>, duration: f64, sample_rate: u32) -> Self {
        Self {
            channels,
            duration,
            sample_rate,
        }
    }

    /// Wrap precomputed peaks; the sample rate is derived from the first
    /// channel's length so that `length / sample_rate == duration`.
    pub fn from_peaks(channels: Vec<Vec<f32>>, duration: f64) -> Self {
        let length = channels.first().map(Vec::len).unwrap_or(0);
        let sample_rate = if duration > 0.0 && duration.is_finite() {
            (length as f64 / duration).round().max(1.0) as u32
        } else {
            1
        };
        Self::new(channels, duration, sample_rate)
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn number_of_channels(&self) -> usize {
        self.channels.len()
    }

    /// Samples in the first channel
    pub fn length(&self) -> usize {
        self.channels.first().map(Vec::len).unwrap_or(0)
    }

    pub fn channel_data(&self, channel: usize) -> Option<&[f32]> {
        self.channels.get(channel).map(Vec::as_slice)
    }

    pub fn channels(&self) -> &[Vec<f32>] {
        &self.channels
    }

    /// Downsample every channel to at most `max_length` absolute-maximum
    /// peaks, keeping the sign of the loudest sample in each bucket.
    ///
    /// # Arguments
    /// * `channels` - Number of channels to export (clamped to what exists)
    /// * `max_length` - Upper bound on peaks per channel
    /// * `precision` - Decimal places kept in every value, at most 9
    pub fn export_peaks(&self, channels: usize, max_length: usize, precision: u32) -> Vec<Vec<f32>> {
        let scale = 10f32.powi(precision.min(9) as i32);
        let count = channels.min(self.channels.len());

        self.channels[..count]
            .par_iter()
            .map(|data| {
                if data.is_empty() || max_length == 0 {
                    return Vec::new();
                }
                let bucket = data.len().div_ceil(max_length).max(1);
                data.chunks(bucket)
                    .map(|chunk| {
                        let peak = chunk
                            .iter()
                            .copied()
                            .fold(0.0f32, |acc, s| if s.abs() > acc.abs() { s } else { acc });
                        (peak * scale).round() / scale
                    })
                    .collect()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_peaks_derives_rate() {
        let audio = DecodedAudio::from_peaks(vec![vec![0.0; 100], vec![0.0; 100]], 10.0);
        assert_eq!(audio.number_of_channels(), 2);
        assert_eq!(audio.length(), 100);
        assert_eq!(audio.sample_rate(), 10);
        assert_eq!(audio.duration(), 10.0);
    }

    #[test]
    fn test_from_peaks_with_zero_duration() {
        let audio = DecodedAudio::from_peaks(vec![vec![0.5]], 0.0);
        assert_eq!(audio.sample_rate(), 1);
        assert_eq!(audio.channel_data(0), Some(&[0.5][..]));
        assert_eq!(audio.channel_data(1), None);
    }

    #[test]
    fn test_export_peaks_downsamples() {
        let audio = DecodedAudio::new(
            vec![vec![0.1, -0.9, 0.3, 0.4, 0.2, -0.25, 0.05, 0.0]],
            1.0,
            8,
        );
        let peaks = audio.export_peaks(1, 4, 2);
        assert_eq!(peaks, vec![vec![-0.9, 0.4, -0.25, 0.05]]);
    }

    #[test]
    fn test_export_peaks_rounds_to_precision() {
        let audio = DecodedAudio::new(vec![vec![0.123_456], vec![-0.987_654]], 1.0, 1);
        let peaks = audio.export_peaks(5, 10, 3);
        assert_eq!(peaks.len(), 2);
        assert!((peaks[0][0] - 0.123).abs() < 1e-6);
        assert!((peaks[1][0] + 0.988).abs() < 1e-6);
    }

    #[test]
    fn test_export_peaks_shorter_than_max() {
        let audio = DecodedAudio::new(vec![vec![0.5, -0.5]], 1.0, 2);
        let peaks = audio.export_peaks(1, 1000, 2);
        assert_eq!(peaks, vec![vec![0.5, -0.5]]);
    }
}
