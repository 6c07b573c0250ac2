#![allow(dead_code)]

//! Recording doubles for the player's collaborators.

use futures_util::future::BoxFuture;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use zim_wave::BoxError;
use zim_wave::events::EventBus;
use zim_wave::options::{FetchParams, WaveOptions};
use zim_wave::player::{
    Blob, DecodedAudio, Decoder, Fetcher, MediaEvent, MediaPlayer, Plugin, PluginEvent, Renderer,
    RendererEvent, WaveEvent, WaveEventKind, WavePlayer, WavePlayerParts, Wrapper,
};

pub struct FakeFetcher {
    pub calls: AtomicUsize,
    pub fail: AtomicBool,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail: AtomicBool::new(false),
        }
    }
}

impl Fetcher for FakeFetcher {
    fn fetch_blob<'a>(
        &'a self,
        url: &'a str,
        _params: &'a FetchParams,
    ) -> BoxFuture<'a, Result<Blob, BoxError>> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::task::yield_now().await;
            if self.fail.load(Ordering::SeqCst) {
                return Err(format!("404 for {url}").into());
            }
            Ok(Blob::new(vec![1, 2, 3, 4]))
        })
    }
}

/// Decodes any bytes into one channel of `frames` samples lasting `duration`.
pub struct FakeDecoder {
    pub calls: AtomicUsize,
    pub duration: f64,
    pub frames: usize,
    pub fail: AtomicBool,
}

impl FakeDecoder {
    pub fn new(duration: f64) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            duration,
            frames: 100,
            fail: AtomicBool::new(false),
        }
    }
}

impl Decoder for FakeDecoder {
    fn decode(&self, _bytes: Vec<u8>, sample_rate: u32) -> BoxFuture<'_, Result<DecodedAudio, BoxError>> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::task::yield_now().await;
            if self.fail.load(Ordering::SeqCst) {
                return Err("corrupt stream".into());
            }
            Ok(DecodedAudio::new(
                vec![vec![0.5; self.frames]],
                self.duration,
                sample_rate,
            ))
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RenderCall {
    SetOptions,
    Render { duration: f64, channels: usize },
    Progress { ratio: f64, animated: bool },
    Zoom(f64),
    Destroy,
}

pub struct FakeRenderer {
    events: EventBus<RendererEvent>,
    pub calls: Mutex<Vec<RenderCall>>,
    pub options: Mutex<Option<WaveOptions>>,
}

impl FakeRenderer {
    pub fn new() -> Self {
        Self {
            events: EventBus::new(),
            calls: Mutex::new(Vec::new()),
            options: Mutex::new(None),
        }
    }

    fn record(&self, call: RenderCall) {
        self.calls.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<RenderCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn progress_calls(&self) -> Vec<(f64, bool)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                RenderCall::Progress { ratio, animated } => Some((ratio, animated)),
                _ => None,
            })
            .collect()
    }

    pub fn click(&self, x: f64) {
        self.events.emit(RendererEvent::Click(x));
    }

    pub fn drag(&self, x: f64) {
        self.events.emit(RendererEvent::Drag(x));
    }

    pub fn scroll(&self, start: f64, end: f64) {
        self.events.emit(RendererEvent::Scroll(start, end));
    }
}

impl Renderer for FakeRenderer {
    fn events(&self) -> &EventBus<RendererEvent> {
        &self.events
    }

    fn set_options(&self, options: &WaveOptions) {
        *self.options.lock().unwrap() = Some(options.clone());
        self.record(RenderCall::SetOptions);
    }

    fn render(&self, audio: &DecodedAudio) {
        self.record(RenderCall::Render {
            duration: audio.duration(),
            channels: audio.number_of_channels(),
        });
        self.events.emit(RendererEvent::Render);
    }

    fn render_progress(&self, progress: f64, animated: bool) {
        self.record(RenderCall::Progress {
            ratio: progress,
            animated,
        });
    }

    fn zoom(&self, min_px_per_sec: f64) {
        self.record(RenderCall::Zoom(min_px_per_sec));
    }

    fn wrapper(&self) -> Wrapper {
        Wrapper {
            width: 100.0,
            scroll_width: 100.0,
            scroll_left: 0.0,
        }
    }

    fn scroll(&self) -> f64 {
        0.0
    }

    fn destroy(&self) {
        self.record(RenderCall::Destroy);
    }
}

#[derive(Default)]
pub struct MediaState {
    pub src: Option<String>,
    pub had_blob: bool,
    pub current_time: f64,
    pub duration: f64,
    pub playing: bool,
    pub rate: f64,
    pub seeks: Vec<f64>,
    pub destroyed: bool,
}

/// A media element whose clock only moves when the test says so.
///
/// With `metadata_on_src` set, binding a source reports that duration and
/// signals metadata synchronously.
pub struct FakeMedia {
    events: EventBus<MediaEvent>,
    pub state: Mutex<MediaState>,
    pub metadata_on_src: Mutex<Option<f64>>,
}

impl FakeMedia {
    pub fn new() -> Self {
        Self {
            events: EventBus::new(),
            state: Mutex::new(MediaState {
                rate: 1.0,
                ..Default::default()
            }),
            metadata_on_src: Mutex::new(None),
        }
    }

    pub fn with_metadata(duration: f64) -> Self {
        let media = Self::new();
        *media.metadata_on_src.lock().unwrap() = Some(duration);
        media
    }

    /// Report metadata later, as a real element would after buffering.
    pub fn announce(&self, duration: f64) {
        self.state.lock().unwrap().duration = duration;
        self.events.emit(MediaEvent::LoadedMetadata);
    }

    /// Move the clock and raise the element's own coarse timeupdate.
    pub fn advance_to(&self, time: f64) {
        self.state.lock().unwrap().current_time = time;
        self.events.emit(MediaEvent::TimeUpdate);
    }

    /// Move the clock silently.
    pub fn set_clock(&self, time: f64) {
        self.state.lock().unwrap().current_time = time;
    }

    pub fn end(&self) {
        self.state.lock().unwrap().playing = false;
        self.events.emit(MediaEvent::Pause);
        self.events.emit(MediaEvent::Ended);
    }

    pub fn seeks(&self) -> Vec<f64> {
        self.state.lock().unwrap().seeks.clone()
    }

    pub fn listener_count(&self, kind: MediaEvent) -> usize {
        self.events.listener_count(kind)
    }
}

impl MediaPlayer for FakeMedia {
    fn events(&self) -> &EventBus<MediaEvent> {
        &self.events
    }

    fn set_src(&self, url: &str, blob: Option<&Blob>) {
        let metadata = *self.metadata_on_src.lock().unwrap();
        {
            let mut state = self.state.lock().unwrap();
            state.src = Some(url.to_string());
            state.had_blob = blob.is_some();
            state.current_time = 0.0;
            state.duration = 0.0;
        }
        if let Some(duration) = metadata {
            self.announce(duration);
        }
    }

    fn current_time(&self) -> f64 {
        self.state.lock().unwrap().current_time
    }

    fn set_time(&self, time: f64) {
        {
            let mut state = self.state.lock().unwrap();
            state.current_time = time;
            state.seeks.push(time);
        }
        self.events.emit(MediaEvent::Seeking);
    }

    fn duration(&self) -> f64 {
        self.state.lock().unwrap().duration
    }

    fn is_playing(&self) -> bool {
        self.state.lock().unwrap().playing
    }

    fn play(&self) {
        self.state.lock().unwrap().playing = true;
        self.events.emit(MediaEvent::Play);
    }

    fn pause(&self) {
        self.state.lock().unwrap().playing = false;
        self.events.emit(MediaEvent::Pause);
    }

    fn set_playback_rate(&self, rate: f64) {
        self.state.lock().unwrap().rate = rate;
    }

    fn destroy(&self) {
        self.state.lock().unwrap().destroyed = true;
    }
}

/// A plugin that can raise its own destroy signal on demand.
pub struct FakePlugin {
    name: String,
    events: EventBus<PluginEvent>,
    pub inits: AtomicUsize,
    pub destroys: AtomicUsize,
}

impl FakePlugin {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            events: EventBus::new(),
            inits: AtomicUsize::new(0),
            destroys: AtomicUsize::new(0),
        }
    }

    pub fn signal_destroy(&self) {
        self.events.emit(PluginEvent::Destroy);
    }
}

impl Plugin for FakePlugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn events(&self) -> &EventBus<PluginEvent> {
        &self.events
    }

    fn init(&self, _host: &WavePlayer) {
        self.inits.fetch_add(1, Ordering::SeqCst);
    }

    fn destroy(&self) {
        self.destroys.fetch_add(1, Ordering::SeqCst);
        self.events.emit(PluginEvent::Destroy);
    }
}

pub struct Harness {
    pub fetcher: Arc<FakeFetcher>,
    pub decoder: Arc<FakeDecoder>,
    pub renderer: Arc<FakeRenderer>,
    pub media: Arc<FakeMedia>,
}

impl Harness {
    pub fn new(media: FakeMedia) -> Self {
        Self {
            fetcher: Arc::new(FakeFetcher::new()),
            decoder: Arc::new(FakeDecoder::new(4.0)),
            renderer: Arc::new(FakeRenderer::new()),
            media: Arc::new(media),
        }
    }

    pub fn parts(&self) -> WavePlayerParts {
        WavePlayerParts {
            fetcher: self.fetcher.clone(),
            decoder: self.decoder.clone(),
            renderer: self.renderer.clone(),
            media: self.media.clone(),
        }
    }

    pub fn decode_calls(&self) -> usize {
        self.decoder.calls.load(Ordering::SeqCst)
    }
}

/// Record every public event the player emits, in order.
pub fn record_events(player: &WavePlayer) -> Arc<Mutex<Vec<WaveEvent>>> {
    let log = Arc::new(Mutex::new(Vec::new()));
    for kind in [
        WaveEventKind::Load,
        WaveEventKind::Decode,
        WaveEventKind::Ready,
        WaveEventKind::Redraw,
        WaveEventKind::Play,
        WaveEventKind::Pause,
        WaveEventKind::Finish,
        WaveEventKind::TimeUpdate,
        WaveEventKind::AudioProcess,
        WaveEventKind::Seeking,
        WaveEventKind::Interaction,
        WaveEventKind::Click,
        WaveEventKind::Drag,
        WaveEventKind::Scroll,
        WaveEventKind::Zoom,
        WaveEventKind::Destroy,
    ] {
        let log = log.clone();
        player.on(kind, move |event| log.lock().unwrap().push(event.clone()));
    }
    log
}

pub fn kinds(events: &[WaveEvent]) -> Vec<WaveEventKind> {
    use zim_wave::events::BusEvent;
    events.iter().map(|e| e.kind()).collect()
}
