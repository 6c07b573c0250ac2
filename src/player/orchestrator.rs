//! The player: load pipeline and public API.
//!
//! A [`WavePlayer`] composes a fetcher, a decoder, a renderer and a media
//! player. `load` walks a URL (or precomputed peaks) through fetch, duration
//! resolution and decode, then hands the result to the renderer. The wiring
//! that keeps the cursor, the media clock and user interaction consistent
//! lives in `wiring.rs`.
//!
//! `WavePlayer` is a cheap handle; clones share the same state. Callbacks
//! registered with collaborators hold a [`WeakPlayer`] so the player can be
//! dropped while listeners are still attached.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, Weak};

use tokio::sync::oneshot;

use super::audio::DecodedAudio;
use super::collaborators::{Blob, Decoder, Fetcher, MediaPlayer, Plugin, Renderer, Wrapper};
use super::event::{MediaEvent, WaveEvent, WaveEventKind};
use super::plugins::PluginRegistry;
use super::schedule::ScheduledTask;
use super::timer::Timer;
use crate::constants::EMPTY_DURATION;
use crate::error::WaveError;
use crate::events::{EventBus, Subscription};
use crate::options::{OptionsPatch, WaveOptions};

/// The collaborators a player is built from.
#[derive(Clone)]
pub struct WavePlayerParts {
    pub fetcher: Arc<dyn Fetcher>,
    pub decoder: Arc<dyn Decoder>,
    pub renderer: Arc<dyn Renderer>,
    pub media: Arc<dyn MediaPlayer>,
}

#[derive(Default)]
pub(super) struct LoadState {
    /// None falls back to the media-reported duration
    pub(super) duration: Option<f64>,
    pub(super) decoded: Option<Arc<DecodedAudio>>,
}

pub(super) struct Inner {
    pub(super) options: RwLock<Arc<WaveOptions>>,
    pub(super) state: Mutex<LoadState>,
    pub(super) events: EventBus<WaveEvent>,
    pub(super) fetcher: Arc<dyn Fetcher>,
    pub(super) decoder: Arc<dyn Decoder>,
    pub(super) renderer: Arc<dyn Renderer>,
    pub(super) media: Arc<dyn MediaPlayer>,
    pub(super) timer: Timer,
    pub(super) plugins: PluginRegistry,
    pub(super) subscriptions: Mutex<Vec<Subscription>>,
    pub(super) drag_commit: Mutex<ScheduledTask>,
    loads_in_flight: AtomicUsize,
    destroyed: AtomicBool,
}

impl Inner {
    pub(super) fn state(&self) -> MutexGuard<'_, LoadState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(super) fn drag_commit(&self) -> MutexGuard<'_, ScheduledTask> {
        self.drag_commit.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn subscriptions(&self) -> MutexGuard<'_, Vec<Subscription>> {
        self.subscriptions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Clone)]
pub struct WavePlayer {
    pub(super) inner: Arc<Inner>,
}

/// Non-owning handle to a [`WavePlayer`].
#[derive(Clone)]
pub struct WeakPlayer {
    inner: Weak<Inner>,
}

impl WeakPlayer {
    pub fn upgrade(&self) -> Option<WavePlayer> {
        self.inner.upgrade().map(|inner| WavePlayer { inner })
    }
}

/// What a load works from: fetched bytes or caller-supplied peaks.
enum Source {
    Blob(Blob),
    Peaks(Vec<Vec<f32>>),
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// One-shot wait on the media player's metadata signal.
struct MetadataWatch {
    loaded: oneshot::Receiver<()>,
    subscription: Subscription,
}

impl MetadataWatch {
    fn install(media: &dyn MediaPlayer) -> Self {
        let (tx, loaded) = oneshot::channel();
        let tx = Mutex::new(Some(tx));
        let subscription = media.events().once(MediaEvent::LoadedMetadata, move |_| {
            let sender = tx.lock().unwrap_or_else(PoisonError::into_inner).take();
            if let Some(sender) = sender {
                let _ = sender.send(());
            }
        });
        Self {
            loaded,
            subscription,
        }
    }

    /// Returns false when the signal can no longer arrive.
    async fn wait(self) -> bool {
        let Self {
            loaded,
            subscription,
        } = self;
        let fired = loaded.await.is_ok();
        subscription.unsubscribe();
        fired
    }
}

impl WavePlayer {
    /// Build a player from the default options layered with `options`.
    ///
    /// No load is started; see [`WavePlayer::create`] for that.
    pub fn new(options: OptionsPatch, parts: WavePlayerParts) -> Self {
        let options = Arc::new(WaveOptions::from_patch(options));
        parts.renderer.set_options(&options);
        parts.media.set_playback_rate(options.audio_rate);

        let player = Self {
            inner: Arc::new(Inner {
                options: RwLock::new(options),
                state: Mutex::new(LoadState::default()),
                events: EventBus::new(),
                fetcher: parts.fetcher,
                decoder: parts.decoder,
                renderer: parts.renderer,
                media: parts.media,
                timer: Timer::default(),
                plugins: PluginRegistry::new(),
                subscriptions: Mutex::new(Vec::new()),
                drag_commit: Mutex::new(ScheduledTask::new()),
                loads_in_flight: AtomicUsize::new(0),
                destroyed: AtomicBool::new(false),
            }),
        };

        let mut subscriptions = player.init_timer_events();
        subscriptions.extend(player.init_media_events());
        subscriptions.extend(player.init_renderer_events());
        player.inner.subscriptions().extend(subscriptions);

        player
    }

    /// Build a player, register `plugins` in order and, when the options name
    /// a URL or peaks, perform the initial load.
    pub async fn create(
        options: OptionsPatch,
        parts: WavePlayerParts,
        plugins: Vec<Arc<dyn Plugin>>,
    ) -> Result<Self, WaveError> {
        let player = Self::new(options, parts);
        for plugin in plugins {
            player.attach_plugin(plugin);
        }

        let options = player.options();
        if options.url.is_some() || options.peaks.is_some() {
            let url = options.url.clone().unwrap_or_default();
            player
                .load(&url, options.peaks.clone(), options.duration)
                .await?;
        }

        Ok(player)
    }

    pub fn downgrade(&self) -> WeakPlayer {
        WeakPlayer {
            inner: Arc::downgrade(&self.inner),
        }
    }

    pub fn options(&self) -> Arc<WaveOptions> {
        Arc::clone(&self.inner.options.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Merge `patch` over the current options and push the result to the
    /// renderer. A patch carrying `audio_rate` also re-applies the rate.
    pub fn set_options(&self, patch: OptionsPatch) {
        let rate = patch.audio_rate;
        let next = {
            let mut current = self
                .inner
                .options
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            let next = Arc::new(current.merged(patch));
            *current = Arc::clone(&next);
            next
        };

        self.inner.renderer.set_options(&next);
        if let Some(rate) = rate {
            self.inner.media.set_playback_rate(rate);
        }
    }

    pub fn toggle_interaction(&self, enabled: bool) {
        self.set_options(OptionsPatch {
            interact: Some(enabled),
            ..Default::default()
        });
    }

    pub fn on<F>(&self, kind: WaveEventKind, handler: F) -> Subscription
    where
        F: Fn(&WaveEvent) + Send + Sync + 'static,
    {
        self.inner.events.on(kind, handler)
    }

    pub fn once<F>(&self, kind: WaveEventKind, handler: F) -> Subscription
    where
        F: Fn(&WaveEvent) + Send + Sync + 'static,
    {
        self.inner.events.once(kind, handler)
    }

    /// Drop every listener registered through [`WavePlayer::on`].
    pub fn un_all(&self) {
        self.inner.events.un_all();
    }

    pub(super) fn emit(&self, event: WaveEvent) {
        self.inner.events.emit(event);
    }

    /// Load `url`, or draw `peaks` directly when given.
    ///
    /// The duration resolves from `duration`, then from the media player's
    /// report, then from its metadata signal; a decoded duration replaces a
    /// resolved value of zero or infinity. Emits `Load`, `Decode` and
    /// `Ready` in that order.
    ///
    /// Concurrent loads are not cancelled. Each proceeds on its own and the
    /// last one to write wins the shared duration and decoded data.
    pub async fn load(
        &self,
        url: &str,
        peaks: Option<Vec<Vec<f32>>>,
        duration: Option<f64>,
    ) -> Result<(), WaveError> {
        let others = self.inner.loads_in_flight.fetch_add(1, Ordering::SeqCst);
        let _in_flight = InFlight(&self.inner.loads_in_flight);
        if others > 0 {
            log::debug!("load({url}) started while {others} other load(s) are in flight");
        }

        let inner = &self.inner;

        if inner.media.is_playing() {
            inner.media.pause();
        }

        {
            let mut state = inner.state();
            state.decoded = None;
            state.duration = None;
        }
        self.emit(WaveEvent::Load(url.to_string()));

        let source = match peaks {
            Some(peaks) => Source::Peaks(peaks),
            None => {
                let params = self.options().fetch_params.clone();
                let blob = inner
                    .fetcher
                    .fetch_blob(url, &params)
                    .await
                    .map_err(|source| WaveError::Fetch {
                        url: url.to_string(),
                        source,
                    })?;
                log::info!("Fetched {} bytes from {url}", blob.len());
                Source::Blob(blob)
            }
        };

        // Listen before binding the source so an eager signal is not missed
        let metadata = duration
            .is_none()
            .then(|| MetadataWatch::install(inner.media.as_ref()));

        let blob = match &source {
            Source::Blob(blob) => Some(blob),
            Source::Peaks(_) => None,
        };
        inner.media.set_src(url, blob);

        let mut resolved = match (duration, metadata) {
            (Some(explicit), _) => explicit,
            (None, Some(metadata)) => {
                let reported = inner.media.duration();
                if reported != 0.0 && !reported.is_nan() {
                    metadata.subscription.unsubscribe();
                    reported
                } else if metadata.wait().await {
                    inner.media.duration()
                } else {
                    0.0
                }
            }
            (None, None) => 0.0,
        };
        if resolved.is_nan() {
            resolved = 0.0;
        }
        inner.state().duration = Some(resolved);

        let decoded = match source {
            Source::Peaks(peaks) => inner.decoder.create_buffer(peaks, resolved),
            Source::Blob(blob) => {
                let sample_rate = self.options().sample_rate;
                let audio = inner
                    .decoder
                    .decode(blob.bytes, sample_rate)
                    .await
                    .map_err(|source| WaveError::Decode { source })?;
                if resolved == 0.0 || resolved.is_infinite() {
                    log::debug!(
                        "Duration {resolved} replaced by decoded duration {}",
                        audio.duration()
                    );
                    resolved = audio.duration();
                }
                audio
            }
        };

        let decoded = Arc::new(decoded);
        {
            let mut state = inner.state();
            state.duration = Some(resolved);
            state.decoded = Some(Arc::clone(&decoded));
        }
        log::info!(
            "Loaded {url}: {:.3}s, {} channel(s)",
            resolved,
            decoded.number_of_channels()
        );

        self.emit(WaveEvent::Decode(resolved));
        inner.renderer.render(&decoded);
        self.emit(WaveEvent::Ready(resolved));

        if self.options().autoplay {
            self.play();
        }

        Ok(())
    }

    /// Reset the waveform to a single silent sample without a real source.
    pub async fn empty(&self) -> Result<(), WaveError> {
        self.load("", Some(vec![vec![0.0]]), Some(EMPTY_DURATION))
            .await
    }

    pub fn zoom(&self, min_px_per_sec: f64) -> Result<(), WaveError> {
        if self.inner.state().decoded.is_none() {
            return Err(WaveError::NothingLoaded);
        }
        self.inner.renderer.zoom(min_px_per_sec);
        self.emit(WaveEvent::Zoom(min_px_per_sec));
        Ok(())
    }

    pub fn decoded_data(&self) -> Option<Arc<DecodedAudio>> {
        self.inner.state().decoded.clone()
    }

    /// The resolved duration, or the media player's report while unresolved.
    pub fn duration(&self) -> f64 {
        let resolved = self.inner.state().duration;
        resolved.unwrap_or_else(|| self.inner.media.duration())
    }

    pub fn current_time(&self) -> f64 {
        self.inner.media.current_time()
    }

    pub fn is_playing(&self) -> bool {
        self.inner.media.is_playing()
    }

    pub fn play(&self) {
        self.inner.media.play();
    }

    pub fn pause(&self) {
        self.inner.media.pause();
    }

    pub fn play_pause(&self) {
        if self.is_playing() {
            self.pause();
        } else {
            self.play();
        }
    }

    pub fn stop(&self) {
        self.pause();
        self.set_time(0.0);
    }

    pub fn set_time(&self, time: f64) {
        self.inner.media.set_time(time);
    }

    /// Seek to `progress` of the duration. Values outside [0, 1] are not clamped.
    pub fn seek_to(&self, progress: f64) {
        self.set_time(self.duration() * progress);
    }

    /// Move by `seconds`, backwards when negative. The result is not clamped.
    pub fn skip(&self, seconds: f64) {
        self.set_time(self.current_time() + seconds);
    }

    pub fn set_playback_rate(&self, rate: f64) {
        self.inner.media.set_playback_rate(rate);
    }

    pub fn wrapper(&self) -> Wrapper {
        self.inner.renderer.wrapper()
    }

    pub fn scroll(&self) -> f64 {
        self.inner.renderer.scroll()
    }

    /// Downsampled peaks of the decoded audio, suitable for a later
    /// `load(url, Some(peaks), Some(duration))`.
    pub fn export_peaks(
        &self,
        channels: usize,
        max_length: usize,
        precision: u32,
    ) -> Result<Vec<Vec<f32>>, WaveError> {
        let decoded = self.decoded_data().ok_or(WaveError::NothingLoaded)?;
        Ok(decoded.export_peaks(channels, max_length, precision))
    }

    /// Initialize `plugin` with this player and track it until it destroys itself.
    pub fn register_plugin<P: Plugin + 'static>(&self, plugin: Arc<P>) -> Arc<P> {
        self.attach_plugin(plugin.clone());
        plugin
    }

    fn attach_plugin(&self, plugin: Arc<dyn Plugin>) {
        plugin.init(self);
        self.inner.plugins.add(plugin);
    }

    pub fn active_plugins(&self) -> Vec<Arc<dyn Plugin>> {
        self.inner.plugins.active()
    }

    /// Tear everything down: `Destroy` is emitted first, then plugins,
    /// internal subscriptions, the timer, the renderer and the media player
    /// go in that order. Later calls do nothing.
    pub fn destroy(&self) {
        if self.inner.destroyed.swap(true, Ordering::SeqCst) {
            log::debug!("destroy() called on an already destroyed player");
            return;
        }

        self.emit(WaveEvent::Destroy);
        self.inner.plugins.destroy_all();

        let subscriptions: Vec<Subscription> = self.inner.subscriptions().drain(..).collect();
        for subscription in subscriptions {
            subscription.unsubscribe();
        }

        self.inner.timer.destroy();
        self.inner.drag_commit().cancel();
        self.inner.renderer.destroy();
        self.inner.media.destroy();
        log::info!("Player destroyed");
    }

    pub fn is_destroyed(&self) -> bool {
        self.inner.destroyed.load(Ordering::SeqCst)
    }
}
