//! Headless media player driven by a clock.
//!
//! `ClockPlayer` behaves like a media element without an output device: it
//! learns the duration from the source header, advances its position in real
//! time while playing, reports `TimeUpdate` at a coarse rate and raises
//! `Pause` then `Ended` when it reaches the end.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::constants::MEDIA_TIMEUPDATE_INTERVAL;
use crate::events::EventBus;
use crate::player::{Blob, MediaEvent, MediaPlayer};

#[derive(Default)]
struct ClockState {
    src: String,
    duration: f64,
    /// Position at the last anchor point
    offset: f64,
    /// Set while playing
    started_at: Option<Instant>,
    rate: f64,
    ticker: Option<JoinHandle<()>>,
    loader: Option<JoinHandle<()>>,
    generation: u64,
    /// Metadata for the current source has not been reported yet
    pending: bool,
}

impl ClockState {
    fn position(&self) -> f64 {
        let position = match self.started_at {
            Some(started) => self.offset + started.elapsed().as_secs_f64() * self.rate,
            None => self.offset,
        };
        if self.duration > 0.0 {
            position.min(self.duration)
        } else {
            position
        }
    }

    fn reanchor(&mut self) {
        if self.started_at.is_some() {
            self.offset = self.position();
            self.started_at = Some(Instant::now());
        }
    }

    fn halt(&mut self) -> bool {
        if self.started_at.is_none() {
            return false;
        }
        self.offset = self.position();
        self.started_at = None;
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
        true
    }
}

struct Shared {
    events: EventBus<MediaEvent>,
    state: Mutex<ClockState>,
    tick: Duration,
}

impl Shared {
    fn state(&self) -> MutexGuard<'_, ClockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

pub struct ClockPlayer {
    shared: Arc<Shared>,
}

impl Default for ClockPlayer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "codecs")]
fn probe(bytes: &[u8]) -> Option<f64> {
    crate::backends::decoder::probe_duration(bytes)
}

#[cfg(not(feature = "codecs"))]
fn probe(_bytes: &[u8]) -> Option<f64> {
    None
}

async fn read_metadata(url: String, bytes: Option<Vec<u8>>) -> f64 {
    let bytes = match bytes {
        Some(bytes) => Some(bytes),
        None if url.is_empty() => None,
        None => match crate::backends::FileFetcher::resolve(&url) {
            Ok(path) => tokio::fs::read(path).await.ok(),
            Err(_) => None,
        },
    };
    bytes.as_deref().and_then(probe).unwrap_or(0.0)
}

impl ClockPlayer {
    pub fn new() -> Self {
        Self::with_tick(MEDIA_TIMEUPDATE_INTERVAL)
    }

    /// Use a custom interval for the player's own `TimeUpdate` reports.
    pub fn with_tick(tick: Duration) -> Self {
        Self {
            shared: Arc::new(Shared {
                events: EventBus::new(),
                state: Mutex::new(ClockState {
                    rate: 1.0,
                    ..Default::default()
                }),
                tick,
            }),
        }
    }

    pub fn src(&self) -> String {
        self.shared.state().src.clone()
    }

    pub fn playback_rate(&self) -> f64 {
        self.shared.state().rate
    }

    /// Resolve once the current source has reported its metadata.
    pub async fn metadata_loaded(&self) {
        let (tx, loaded) = oneshot::channel();
        let tx = Mutex::new(Some(tx));
        let subscription = self.shared.events.once(MediaEvent::LoadedMetadata, move |_| {
            let sender = tx.lock().unwrap_or_else(PoisonError::into_inner).take();
            if let Some(sender) = sender {
                let _ = sender.send(());
            }
        });
        if self.shared.state().pending {
            let _ = loaded.await;
        }
        subscription.unsubscribe();
    }

    fn finish_metadata(shared: &Shared, generation: u64, duration: f64) {
        {
            let mut state = shared.state();
            if state.generation != generation {
                return;
            }
            state.duration = duration;
            state.loader = None;
            state.pending = false;
        }
        log::debug!("Media metadata loaded: {duration:.3}s");
        shared.events.emit(MediaEvent::LoadedMetadata);
    }

    fn spawn_ticker(shared: &Arc<Shared>) -> Option<JoinHandle<()>> {
        let runtime = tokio::runtime::Handle::try_current().ok()?;
        let shared = Arc::clone(shared);
        Some(runtime.spawn(async move {
            loop {
                let remaining = {
                    let state = shared.state();
                    if state.duration > 0.0 && state.rate > 0.0 {
                        Some((state.duration - state.position()) / state.rate)
                    } else {
                        None
                    }
                };
                // Near-zero rates put the end beyond what a Duration can hold
                let wait = remaining
                    .and_then(|r| Duration::try_from_secs_f64(r.max(0.0)).ok())
                    .map_or(shared.tick, |until_end| shared.tick.min(until_end));
                tokio::time::sleep(wait).await;

                shared.events.emit(MediaEvent::TimeUpdate);

                let ended = {
                    let mut state = shared.state();
                    let done = state.duration > 0.0 && state.position() >= state.duration;
                    if done {
                        state.offset = state.duration;
                        state.started_at = None;
                        state.ticker = None;
                    }
                    done
                };
                if ended {
                    shared.events.emit(MediaEvent::Pause);
                    shared.events.emit(MediaEvent::Ended);
                    break;
                }
            }
        }))
    }
}

impl MediaPlayer for ClockPlayer {
    fn events(&self) -> &EventBus<MediaEvent> {
        &self.shared.events
    }

    fn set_src(&self, url: &str, blob: Option<&Blob>) {
        let (was_playing, generation) = {
            let mut state = self.shared.state();
            let was_playing = state.halt();
            if let Some(loader) = state.loader.take() {
                loader.abort();
            }
            state.src = url.to_string();
            state.duration = 0.0;
            state.offset = 0.0;
            state.generation += 1;
            state.pending = true;
            (was_playing, state.generation)
        };
        if was_playing {
            self.shared.events.emit(MediaEvent::Pause);
        }

        let url = url.to_string();
        let bytes = blob.map(|b| b.bytes.clone());
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                let shared = Arc::clone(&self.shared);
                let loader = runtime.spawn(async move {
                    let duration = read_metadata(url, bytes).await;
                    ClockPlayer::finish_metadata(&shared, generation, duration);
                });
                let mut state = self.shared.state();
                if state.generation == generation {
                    state.loader = Some(loader);
                }
            }
            Err(_) => {
                let duration = bytes.as_deref().and_then(probe).unwrap_or(0.0);
                ClockPlayer::finish_metadata(&self.shared, generation, duration);
            }
        }
    }

    fn current_time(&self) -> f64 {
        self.shared.state().position()
    }

    fn set_time(&self, time: f64) {
        {
            let mut state = self.shared.state();
            let upper = if state.duration > 0.0 {
                state.duration
            } else {
                f64::INFINITY
            };
            state.offset = time.clamp(0.0, upper);
            if state.started_at.is_some() {
                state.started_at = Some(Instant::now());
            }
        }
        self.shared.events.emit(MediaEvent::Seeking);
        self.shared.events.emit(MediaEvent::TimeUpdate);
    }

    fn duration(&self) -> f64 {
        self.shared.state().duration
    }

    fn is_playing(&self) -> bool {
        self.shared.state().started_at.is_some()
    }

    fn play(&self) {
        {
            let mut state = self.shared.state();
            if state.started_at.is_some() {
                return;
            }
            if state.duration > 0.0 && state.offset >= state.duration {
                state.offset = 0.0;
            }
            state.started_at = Some(Instant::now());
            state.ticker = ClockPlayer::spawn_ticker(&self.shared);
        }
        self.shared.events.emit(MediaEvent::Play);
    }

    fn pause(&self) {
        let paused = self.shared.state().halt();
        if paused {
            self.shared.events.emit(MediaEvent::Pause);
        }
    }

    fn set_playback_rate(&self, rate: f64) {
        let mut state = self.shared.state();
        state.reanchor();
        state.rate = rate;
    }

    fn destroy(&self) {
        {
            let mut state = self.shared.state();
            state.halt();
            if let Some(loader) = state.loader.take() {
                loader.abort();
            }
            state.generation += 1;
            state.pending = false;
        }
        self.shared.events.un_all();
    }
}
