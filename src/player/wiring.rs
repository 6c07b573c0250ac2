//! Event wiring between the player, its timer and its collaborators.
//!
//! Every listener installed here holds a [`WeakPlayer`] and is returned as a
//! [`Subscription`] so `destroy` can release it.

use std::time::Duration;

use super::event::{MediaEvent, RendererEvent, RendererEventKind, WaveEvent};
use super::orchestrator::{WavePlayer, WeakPlayer};
use crate::constants::DRAG_COMMIT_DELAY;
use crate::events::Subscription;

/// Run `f` against the player if it is still alive.
fn with_player(weak: &WeakPlayer, f: impl FnOnce(&WavePlayer)) {
    if let Some(player) = weak.upgrade() {
        f(&player);
    }
}

impl WavePlayer {
    /// Progress ratio for `time`; 0 while the duration is unknown.
    pub(super) fn progress_at(&self, time: f64) -> f64 {
        let duration = self.duration();
        if duration > 0.0 { time / duration } else { 0.0 }
    }

    pub(super) fn init_timer_events(&self) -> Vec<Subscription> {
        let weak = self.downgrade();
        vec![self.inner.timer.on_tick(move |_| {
            with_player(&weak, |player| {
                let time = player.current_time();
                player
                    .inner
                    .renderer
                    .render_progress(player.progress_at(time), true);
                player.emit(WaveEvent::TimeUpdate(time));
                player.emit(WaveEvent::AudioProcess(time));
            });
        })]
    }

    pub(super) fn init_media_events(&self) -> Vec<Subscription> {
        vec![
            self.on_media(MediaEvent::TimeUpdate, |player| {
                let time = player.current_time();
                player
                    .inner
                    .renderer
                    .render_progress(player.progress_at(time), player.is_playing());
                player.emit(WaveEvent::TimeUpdate(time));
            }),
            self.on_media(MediaEvent::Play, |player| {
                player.emit(WaveEvent::Play);
                player.inner.timer.start();
            }),
            self.on_media(MediaEvent::Pause, |player| {
                player.emit(WaveEvent::Pause);
                player.inner.timer.stop();
            }),
            self.on_media(MediaEvent::Ended, |player| {
                player.emit(WaveEvent::Finish);
                player.inner.timer.stop();
            }),
            self.on_media(MediaEvent::Seeking, |player| {
                player.emit(WaveEvent::Seeking(player.current_time()));
            }),
        ]
    }

    pub(super) fn init_renderer_events(&self) -> Vec<Subscription> {
        vec![
            self.on_renderer(RendererEventKind::Click, |player, event| {
                let RendererEvent::Click(x) = *event else { return };
                if !player.options().interact {
                    return;
                }
                player.seek_to(x);
                player.emit(WaveEvent::Interaction(player.current_time()));
                player.emit(WaveEvent::Click(x));
            }),
            self.on_renderer(RendererEventKind::Drag, |player, event| {
                let RendererEvent::Drag(x) = *event else { return };
                if !player.options().interact {
                    return;
                }
                // Cursor follows immediately; the audio seek is debounced
                player.inner.renderer.render_progress(x, false);
                player.schedule_drag_commit(x);
                player.emit(WaveEvent::Interaction(x * player.duration()));
                player.emit(WaveEvent::Drag(x));
            }),
            self.on_renderer(RendererEventKind::Scroll, |player, event| {
                let RendererEvent::Scroll(start, end) = *event else { return };
                let duration = player.duration();
                player.emit(WaveEvent::Scroll(start * duration, end * duration));
            }),
            self.on_renderer(RendererEventKind::Render, |player, _| {
                player.emit(WaveEvent::Redraw);
            }),
        ]
    }

    fn on_media(&self, kind: MediaEvent, action: fn(&WavePlayer)) -> Subscription {
        let weak = self.downgrade();
        self.inner
            .media
            .events()
            .on(kind, move |_| with_player(&weak, action))
    }

    fn on_renderer(
        &self,
        kind: RendererEventKind,
        action: fn(&WavePlayer, &RendererEvent),
    ) -> Subscription {
        let weak = self.downgrade();
        self.inner.renderer.events().on(kind, move |event| {
            with_player(&weak, |player| action(player, event))
        })
    }

    /// Replace any pending drag seek with one for `progress`.
    fn schedule_drag_commit(&self, progress: f64) {
        let delay = if self.is_playing() {
            Duration::ZERO
        } else {
            DRAG_COMMIT_DELAY
        };
        let weak = self.downgrade();
        let inline = self.inner.drag_commit().schedule(delay, move || {
            with_player(&weak, |player| player.seek_to(progress));
        });
        // The drag_commit guard is gone here, so a seek listener may drag again
        if let Some(commit) = inline {
            commit();
        }
    }
}
