//! zim-wave: waveform display and playback synchronization.
//!
//! The [`player::WavePlayer`] orchestrates a fetcher, a decoder, a renderer
//! and a media player behind traits, keeping the drawn cursor, the media
//! clock and user interaction in step. [`backends`] holds headless reference
//! implementations of each collaborator.

pub mod backends;
pub mod config;
pub mod constants;
pub mod error;
pub mod events;
pub mod options;
pub mod player;

pub use error::{BoxError, WaveError};
pub use events::{EventBus, Subscription};
pub use options::{OptionsPatch, WaveOptions};
pub use player::{WaveEvent, WaveEventKind, WavePlayer, WavePlayerParts};
