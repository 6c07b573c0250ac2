//! Traits for the collaborators the player drives.
//!
//! The player never touches the network, decodes bytes, draws pixels or
//! outputs sound itself. Those jobs belong to the implementations of these
//! traits, which are injected through [`WavePlayerParts`](super::WavePlayerParts).
//!
//! All collaborators are `Send + Sync` and take `&self`; implementations keep
//! their mutable state behind their own locks. Async operations return a
//! [`BoxFuture`] so the traits stay object safe.

use futures_util::future::BoxFuture;

use super::WavePlayer;
use super::audio::DecodedAudio;
use super::event::{MediaEvent, PluginEvent, RendererEvent};
use crate::error::BoxError;
use crate::events::EventBus;
use crate::options::{FetchParams, WaveOptions};

/// Raw bytes of an audio source plus its MIME type if known.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Blob {
    pub bytes: Vec<u8>,
    pub mime: Option<String>,
}

impl Blob {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes, mime: None }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

pub trait Fetcher: Send + Sync {
    fn fetch_blob<'a>(
        &'a self,
        url: &'a str,
        params: &'a FetchParams,
    ) -> BoxFuture<'a, Result<Blob, BoxError>>;
}

pub trait Decoder: Send + Sync {
    fn decode(&self, bytes: Vec<u8>, sample_rate: u32) -> BoxFuture<'_, Result<DecodedAudio, BoxError>>;

    /// Wrap precomputed channel data without any decoding work.
    fn create_buffer(&self, channel_data: Vec<Vec<f32>>, duration: f64) -> DecodedAudio {
        DecodedAudio::from_peaks(channel_data, duration)
    }
}

/// Geometry of the drawing surface.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Wrapper {
    /// Visible width
    pub width: f64,
    /// Full width of the rendered waveform
    pub scroll_width: f64,
    pub scroll_left: f64,
}

pub trait Renderer: Send + Sync {
    fn events(&self) -> &EventBus<RendererEvent>;

    fn set_options(&self, options: &WaveOptions);

    fn render(&self, audio: &DecodedAudio);

    /// Move the progress indicator; `animated` is set for timer-driven updates.
    fn render_progress(&self, progress: f64, animated: bool);

    fn zoom(&self, min_px_per_sec: f64);

    fn wrapper(&self) -> Wrapper;

    /// Current horizontal scroll offset
    fn scroll(&self) -> f64;

    fn destroy(&self);
}

pub trait MediaPlayer: Send + Sync {
    fn events(&self) -> &EventBus<MediaEvent>;

    fn set_src(&self, url: &str, blob: Option<&Blob>);

    fn current_time(&self) -> f64;

    fn set_time(&self, time: f64);

    /// Reported duration; 0 while unknown
    fn duration(&self) -> f64;

    fn is_playing(&self) -> bool;

    fn play(&self);

    fn pause(&self);

    fn set_playback_rate(&self, rate: f64);

    fn destroy(&self);
}

/// An extension attached to a [`WavePlayer`].
///
/// A plugin signals its own teardown by emitting [`PluginEvent::Destroy`] on
/// the bus returned from `events`; the player then forgets it.
pub trait Plugin: Send + Sync {
    fn name(&self) -> &str;

    fn events(&self) -> &EventBus<PluginEvent>;

    fn init(&self, host: &WavePlayer);

    fn destroy(&self);
}
