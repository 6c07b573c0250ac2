//! Reference collaborators for running the player headless: local files,
//! WAV/FLAC decoding, a text waveform, a clock-driven media player and a
//! terminal progress plugin.

pub mod clock;
#[cfg(feature = "codecs")]
pub mod decoder;
pub mod fetcher;
pub mod progress;
pub mod renderer;

pub use clock::ClockPlayer;
#[cfg(feature = "codecs")]
pub use decoder::SampleDecoder;
pub use fetcher::FileFetcher;
pub use progress::ProgressPlugin;
pub use renderer::TextRenderer;
