//! Waveform player: load orchestration, playback sync and plugins.

pub mod audio;
pub mod collaborators;
pub mod event;
mod orchestrator;
pub mod plugins;
pub mod schedule;
pub mod timer;
mod wiring;

pub use audio::DecodedAudio;
pub use collaborators::{Blob, Decoder, Fetcher, MediaPlayer, Plugin, Renderer, Wrapper};
pub use event::{MediaEvent, PluginEvent, RendererEvent, RendererEventKind, WaveEvent, WaveEventKind};
pub use orchestrator::{WavePlayer, WavePlayerParts, WeakPlayer};
