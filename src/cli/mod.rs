pub mod config;
pub mod export;
pub mod init;
pub mod peaks;
pub mod play;

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use zim_wave::backends::{ClockPlayer, FileFetcher, SampleDecoder, TextRenderer};
use zim_wave::config::Config;
use zim_wave::constants::AUDIO_EXTENSIONS;
use zim_wave::options::OptionsPatch;
use zim_wave::player::{WavePlayer, WavePlayerParts};

/// On-disk peaks, as written by `zimwave export` and read by `--peaks`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeaksFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    pub channels: Vec<Vec<f32>>,
}

impl PeaksFile {
    pub fn read(path: &str) -> Result<Self, Box<dyn Error>> {
        let path = shellexpand::tilde(path);
        let contents = fs::read_to_string(Path::new(path.as_ref()))
            .map_err(|e| format!("Could not read peaks file {path}: {e}"))?;
        let peaks: PeaksFile = serde_json::from_str(&contents)
            .map_err(|e| format!("Invalid peaks file {path}: {e}"))?;
        if peaks.channels.is_empty() {
            return Err(format!("Peaks file {path} has no channels").into());
        }
        Ok(peaks)
    }
}

/// A player wired to the headless backends, plus handles on the renderer
/// and media clock the commands drive directly.
pub struct Session {
    pub player: WavePlayer,
    pub renderer: Arc<TextRenderer>,
    pub media: Arc<ClockPlayer>,
}

impl Session {
    pub fn new(config: &Config, width: Option<usize>, overrides: OptionsPatch) -> Self {
        let width = width.unwrap_or_else(|| fit_width(config.waveform_width));
        let renderer = Arc::new(TextRenderer::new(width));
        let media = Arc::new(ClockPlayer::new());
        let parts = WavePlayerParts {
            fetcher: Arc::new(FileFetcher::new()),
            decoder: Arc::new(SampleDecoder::new()),
            renderer: renderer.clone(),
            media: media.clone(),
        };
        let options = config.options.clone().layered(overrides);
        let player = WavePlayer::new(options, parts);
        Self {
            player,
            renderer,
            media,
        }
    }

    /// Load `file`, drawing precomputed peaks instead of decoding when given.
    pub async fn load(
        &self,
        file: &str,
        peaks: Option<&str>,
        duration: Option<f64>,
    ) -> Result<(), Box<dyn Error>> {
        match peaks {
            Some(path) => {
                let peaks = PeaksFile::read(path)?;
                let duration = duration.or(peaks.duration);
                self.player.load(file, Some(peaks.channels), duration).await?;
            }
            None => {
                if !is_supported(file) {
                    log::warn!("{file} does not look like a supported audio file");
                }
                self.player.load(file, None, duration).await?
            }
        }
        Ok(())
    }

    pub fn print_waveform(&self) {
        for line in self.renderer.lines() {
            println!("{line}");
        }
    }
}

/// Shrink `width` to the terminal when stdout is one.
fn fit_width(width: usize) -> usize {
    match console::Term::stdout().size_checked() {
        Some((_, columns)) if (columns as usize) < width => (columns as usize).max(1),
        _ => width,
    }
}

fn is_supported(file: &str) -> bool {
    Path::new(file)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| AUDIO_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// File name for status lines.
pub fn display_name(file: &str) -> String {
    Path::new(file)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| file.to_string())
}
