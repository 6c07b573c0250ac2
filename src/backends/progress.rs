//! Terminal progress plugin.
//!
//! Mirrors the playback position onto an indicatif bar. The bar length is
//! the resolved duration in milliseconds, set on `Ready`, and the message
//! shows elapsed and total time.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use crate::constants::SPINNER_CHARS;
use crate::events::{EventBus, Subscription};
use crate::player::{Plugin, PluginEvent, WaveEvent, WaveEventKind, WavePlayer};

/// Create a playback bar in the same style as the other progress output.
pub fn create_progress_bar(total: u64) -> ProgressBar {
    let pb = ProgressBar::new(total);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.cyan} [{bar:40.cyan/blue}] {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .tick_strings(SPINNER_CHARS)
        .progress_chars("█▓░");
    pb.set_style(style);
    pb
}

/// Format seconds as `m:ss.t`.
pub fn format_time(seconds: f64) -> String {
    let seconds = if seconds.is_finite() { seconds.max(0.0) } else { 0.0 };
    let tenths = (seconds * 10.0).round() as u64;
    format!("{}:{:02}.{}", tenths / 600, (tenths / 10) % 60, tenths % 10)
}

fn millis(seconds: f64) -> u64 {
    if seconds.is_finite() && seconds > 0.0 {
        (seconds * 1000.0).round() as u64
    } else {
        0
    }
}

pub struct ProgressPlugin {
    bar: ProgressBar,
    events: EventBus<PluginEvent>,
    subscriptions: Mutex<Vec<Subscription>>,
    destroyed: AtomicBool,
}

impl Default for ProgressPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressPlugin {
    pub fn new() -> Self {
        Self::with_bar(create_progress_bar(0))
    }

    /// A plugin whose bar never draws. Used when stderr is not a terminal.
    pub fn hidden() -> Self {
        let bar = create_progress_bar(0);
        bar.set_draw_target(ProgressDrawTarget::hidden());
        Self::with_bar(bar)
    }

    fn with_bar(bar: ProgressBar) -> Self {
        Self {
            bar,
            events: EventBus::new(),
            subscriptions: Mutex::new(Vec::new()),
            destroyed: AtomicBool::new(false),
        }
    }

    /// Position in milliseconds.
    pub fn position(&self) -> u64 {
        self.bar.position()
    }

    pub fn length(&self) -> Option<u64> {
        self.bar.length()
    }

    pub fn message(&self) -> String {
        self.bar.message().to_string()
    }

    pub fn is_finished(&self) -> bool {
        self.bar.is_finished()
    }
}

impl Plugin for ProgressPlugin {
    fn name(&self) -> &str {
        "progress"
    }

    fn events(&self) -> &EventBus<PluginEvent> {
        &self.events
    }

    fn init(&self, host: &WavePlayer) {
        let weak = host.downgrade();
        let total = std::sync::Arc::new(Mutex::new(String::from("0:00.0")));

        let bar = self.bar.clone();
        let label = total.clone();
        let ready = host.on(WaveEventKind::Ready, move |event| {
            if let WaveEvent::Ready(duration) = event {
                *label.lock().unwrap_or_else(PoisonError::into_inner) = format_time(*duration);
                bar.reset();
                bar.set_length(millis(*duration));
                bar.set_message(format!("0:00.0 / {}", format_time(*duration)));
            }
        });

        let bar = self.bar.clone();
        let label = total;
        let time_update = host.on(WaveEventKind::TimeUpdate, move |event| {
            if let WaveEvent::TimeUpdate(time) = event {
                let total = label.lock().unwrap_or_else(PoisonError::into_inner).clone();
                bar.set_position(millis(*time));
                bar.set_message(format!("{} / {total}", format_time(*time)));
            }
        });

        let bar = self.bar.clone();
        let finish = host.on(WaveEventKind::Finish, move |_| {
            let duration = weak.upgrade().map(|p| p.duration()).unwrap_or(0.0);
            bar.set_position(millis(duration));
            bar.finish_with_message(format!("{} done", format_time(duration)));
        });

        self.subscriptions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend([ready, time_update, finish]);
    }

    fn destroy(&self) {
        if self.destroyed.swap(true, Ordering::SeqCst) {
            return;
        }
        let subscriptions: Vec<Subscription> = self
            .subscriptions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect();
        for subscription in subscriptions {
            subscription.unsubscribe();
        }
        if !self.bar.is_finished() {
            self.bar.finish_and_clear();
        }
        self.events.emit(PluginEvent::Destroy);
    }
}
