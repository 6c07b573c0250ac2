//! Event vocabularies exchanged between the player and its collaborators.

use crate::events::BusEvent;

/// Public events emitted by [`WavePlayer`](super::WavePlayer).
#[derive(Debug, Clone, PartialEq)]
pub enum WaveEvent {
    /// A load started for this URL
    Load(String),
    /// Channel data is available; carries the resolved duration
    Decode(f64),
    /// The waveform was handed to the renderer; carries the resolved duration
    Ready(f64),
    Redraw,
    Play,
    Pause,
    Finish,
    TimeUpdate(f64),
    /// Fired alongside `TimeUpdate` on every timer tick
    AudioProcess(f64),
    Seeking(f64),
    /// The user moved the playback position; carries the new time
    Interaction(f64),
    Click(f64),
    Drag(f64),
    /// Visible window in seconds (start, end)
    Scroll(f64, f64),
    Zoom(f64),
    Destroy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WaveEventKind {
    Load,
    Decode,
    Ready,
    Redraw,
    Play,
    Pause,
    Finish,
    TimeUpdate,
    AudioProcess,
    Seeking,
    Interaction,
    Click,
    Drag,
    Scroll,
    Zoom,
    Destroy,
}

impl BusEvent for WaveEvent {
    type Kind = WaveEventKind;

    fn kind(&self) -> WaveEventKind {
        match self {
            WaveEvent::Load(_) => WaveEventKind::Load,
            WaveEvent::Decode(_) => WaveEventKind::Decode,
            WaveEvent::Ready(_) => WaveEventKind::Ready,
            WaveEvent::Redraw => WaveEventKind::Redraw,
            WaveEvent::Play => WaveEventKind::Play,
            WaveEvent::Pause => WaveEventKind::Pause,
            WaveEvent::Finish => WaveEventKind::Finish,
            WaveEvent::TimeUpdate(_) => WaveEventKind::TimeUpdate,
            WaveEvent::AudioProcess(_) => WaveEventKind::AudioProcess,
            WaveEvent::Seeking(_) => WaveEventKind::Seeking,
            WaveEvent::Interaction(_) => WaveEventKind::Interaction,
            WaveEvent::Click(_) => WaveEventKind::Click,
            WaveEvent::Drag(_) => WaveEventKind::Drag,
            WaveEvent::Scroll(..) => WaveEventKind::Scroll,
            WaveEvent::Zoom(_) => WaveEventKind::Zoom,
            WaveEvent::Destroy => WaveEventKind::Destroy,
        }
    }
}

/// Signals raised by a [`MediaPlayer`](super::MediaPlayer).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaEvent {
    TimeUpdate,
    Play,
    Pause,
    Ended,
    Seeking,
    LoadedMetadata,
}

impl BusEvent for MediaEvent {
    type Kind = MediaEvent;

    fn kind(&self) -> MediaEvent {
        *self
    }
}

/// User interaction and lifecycle signals raised by a [`Renderer`](super::Renderer).
///
/// Positions are ratios of the full waveform width.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RendererEvent {
    Click(f64),
    Drag(f64),
    Scroll(f64, f64),
    Render,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RendererEventKind {
    Click,
    Drag,
    Scroll,
    Render,
}

impl BusEvent for RendererEvent {
    type Kind = RendererEventKind;

    fn kind(&self) -> RendererEventKind {
        match self {
            RendererEvent::Click(_) => RendererEventKind::Click,
            RendererEvent::Drag(_) => RendererEventKind::Drag,
            RendererEvent::Scroll(..) => RendererEventKind::Scroll,
            RendererEvent::Render => RendererEventKind::Render,
        }
    }
}

/// Lifecycle signal owned by each plugin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PluginEvent {
    Destroy,
}

impl BusEvent for PluginEvent {
    type Kind = PluginEvent;

    fn kind(&self) -> PluginEvent {
        *self
    }
}

/// Payload-less tick of the progress [`Timer`](super::timer::Timer).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tick;

impl BusEvent for Tick {
    type Kind = Tick;

    fn kind(&self) -> Tick {
        *self
    }
}
