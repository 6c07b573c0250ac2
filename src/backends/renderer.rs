//! Terminal waveform renderer.
//!
//! Draws one row of block characters per channel (or a single mixed-down row)
//! into a fixed number of columns. When the horizontal resolution asks for
//! more columns than the viewport has, the waveform scrolls and the viewport
//! follows the progress cursor.
//!
//! Input is simulated through [`TextRenderer::click`], [`TextRenderer::drag`]
//! and [`TextRenderer::scroll_to`], which raise the same events a pointer
//! would on a graphical surface.

use rayon::prelude::*;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::constants::{DEFAULT_WAVEFORM_WIDTH, MAX_WAVEFORM_COLUMNS};
use crate::events::EventBus;
use crate::options::WaveOptions;
use crate::player::{DecodedAudio, Renderer, RendererEvent, Wrapper};

/// Convert amplitude to terminal block characters for visualization
pub fn amplitude_to_blocks(amplitude: f32) -> &'static str {
    let normalized = amplitude.abs().min(1.0);
    let index = (normalized * 8.0) as usize;

    match index {
        0 => " ",
        1 => "▁",
        2 => "▂",
        3 => "▃",
        4 => "▄",
        5 => "▅",
        6 => "▆",
        7 => "▇",
        _ => "█",
    }
}

/// Min/max pairs for `columns` equal slices of `samples`.
pub fn column_peaks(samples: &[f32], columns: usize) -> Vec<(f32, f32)> {
    if columns == 0 {
        return Vec::new();
    }
    if samples.is_empty() {
        return vec![(0.0, 0.0); columns];
    }

    let per_column = samples.len() as f64 / columns as f64;
    (0..columns)
        .map(|i| {
            let start = (i as f64 * per_column) as usize;
            let end = (((i + 1) as f64 * per_column) as usize)
                .max(start + 1)
                .min(samples.len());
            if start >= samples.len() {
                return (0.0, 0.0);
            }
            samples[start..end]
                .iter()
                .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &s| {
                    (lo.min(s), hi.max(s))
                })
        })
        .collect()
}

#[derive(Default)]
struct State {
    options: WaveOptions,
    audio: Option<DecodedAudio>,
    /// Visible columns
    width: usize,
    /// One row of column peaks per drawn channel
    rows: Vec<Vec<(f32, f32)>>,
    progress: f64,
    scroll_left: usize,
    min_px_per_sec: f64,
}

impl State {
    fn scroll_width(&self) -> usize {
        self.rows.first().map(Vec::len).unwrap_or(self.width)
    }

    fn total_columns(&self, duration: f64) -> usize {
        let wanted = (duration * self.min_px_per_sec).ceil();
        let wanted = if wanted.is_finite() && wanted > 0.0 {
            wanted.min(MAX_WAVEFORM_COLUMNS as f64) as usize
        } else {
            0
        };
        let columns = if self.options.fill_parent {
            wanted.max(self.width)
        } else if wanted > 0 {
            wanted
        } else {
            self.width
        };
        columns.min(MAX_WAVEFORM_COLUMNS)
    }

    fn layout(&mut self) {
        let Some(audio) = &self.audio else {
            self.rows.clear();
            return;
        };
        let columns = self.total_columns(audio.duration()).max(1);

        let mut rows: Vec<Vec<(f32, f32)>> = if self.options.split_channels {
            audio
                .channels()
                .par_iter()
                .map(|data| column_peaks(data, columns))
                .collect()
        } else {
            vec![column_peaks(&mixdown(audio.channels()), columns)]
        };

        let mut scale = self.options.bar_height.unwrap_or(1.0);
        if self.options.normalize {
            let max = rows
                .iter()
                .flatten()
                .fold(0.0f32, |acc, &(lo, hi)| acc.max(lo.abs()).max(hi.abs()));
            if max > 0.0 {
                scale /= max;
            }
        }
        if scale != 1.0 {
            for (lo, hi) in rows.iter_mut().flatten() {
                *lo *= scale;
                *hi *= scale;
            }
        }

        self.rows = rows;
        self.clamp_scroll();
    }

    fn max_scroll(&self) -> usize {
        self.scroll_width().saturating_sub(self.width)
    }

    fn clamp_scroll(&mut self) {
        self.scroll_left = self.scroll_left.min(self.max_scroll());
    }

    /// Visible window as ratios of the full width.
    fn visible_range(&self) -> (f64, f64) {
        let total = self.scroll_width().max(1) as f64;
        let start = self.scroll_left as f64 / total;
        let end = ((self.scroll_left + self.width) as f64 / total).min(1.0);
        (start, end)
    }

    fn column_ratio(&self, column: usize) -> f64 {
        let total = self.scroll_width().max(1) as f64;
        ((self.scroll_left + column) as f64 / total).clamp(0.0, 1.0)
    }

    /// Move the viewport to keep the cursor visible; true when it moved.
    fn follow_cursor(&mut self, animated: bool) -> bool {
        if !self.options.auto_scroll || self.max_scroll() == 0 {
            return false;
        }
        let cursor = (self.progress * self.scroll_width() as f64).max(0.0) as usize;
        let previous = self.scroll_left;

        if self.options.auto_center && animated {
            self.scroll_left = cursor.saturating_sub(self.width / 2);
        } else if cursor < self.scroll_left || cursor >= self.scroll_left + self.width {
            self.scroll_left = cursor;
        }
        self.clamp_scroll();
        previous != self.scroll_left
    }
}

/// Average all channels into one.
fn mixdown(channels: &[Vec<f32>]) -> Vec<f32> {
    match channels {
        [] => Vec::new(),
        [only] => only.clone(),
        _ => {
            let length = channels.iter().map(Vec::len).min().unwrap_or(0);
            let count = channels.len() as f32;
            (0..length)
                .map(|i| channels.iter().map(|c| c[i]).sum::<f32>() / count)
                .collect()
        }
    }
}

pub struct TextRenderer {
    events: EventBus<RendererEvent>,
    state: Mutex<State>,
}

impl Default for TextRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_WAVEFORM_WIDTH)
    }
}

impl TextRenderer {
    pub fn new(width: usize) -> Self {
        Self {
            events: EventBus::new(),
            state: Mutex::new(State {
                width: width.max(1),
                ..Default::default()
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_width(&self, width: usize) {
        let rendered = {
            let mut state = self.state();
            state.width = width.max(1);
            state.layout();
            state.audio.is_some()
        };
        if rendered {
            self.events.emit(RendererEvent::Render);
        }
    }

    pub fn progress(&self) -> f64 {
        self.state().progress
    }

    /// Visible column of the progress cursor, if it is on screen.
    pub fn cursor_column(&self) -> Option<usize> {
        let state = self.state();
        if state.rows.is_empty() {
            return None;
        }
        let cursor = (state.progress * state.scroll_width() as f64).floor();
        if cursor < 0.0 {
            return None;
        }
        let cursor = cursor as usize;
        (cursor >= state.scroll_left && cursor < state.scroll_left + state.width)
            .then(|| cursor - state.scroll_left)
    }

    /// Visible rows of the waveform, one string per drawn channel.
    pub fn lines(&self) -> Vec<String> {
        let state = self.state();
        let end = (state.scroll_left + state.width).min(state.scroll_width());
        state
            .rows
            .iter()
            .map(|row| {
                row.get(state.scroll_left..end)
                    .unwrap_or_default()
                    .iter()
                    .map(|&(lo, hi)| amplitude_to_blocks(lo.abs().max(hi.abs())))
                    .collect()
            })
            .collect()
    }

    /// Simulate a click on a visible column.
    pub fn click(&self, column: usize) {
        let ratio = self.state().column_ratio(column);
        self.events.emit(RendererEvent::Click(ratio));
    }

    /// Simulate a drag passing over a visible column.
    pub fn drag(&self, column: usize) {
        let ratio = self.state().column_ratio(column);
        self.events.emit(RendererEvent::Drag(ratio));
    }

    /// Scroll the viewport so that `column` of the full waveform is leftmost.
    pub fn scroll_to(&self, column: usize) {
        let range = {
            let mut state = self.state();
            let previous = state.scroll_left;
            state.scroll_left = column;
            state.clamp_scroll();
            (previous != state.scroll_left).then(|| state.visible_range())
        };
        if let Some((start, end)) = range {
            self.events.emit(RendererEvent::Scroll(start, end));
        }
    }
}

impl Renderer for TextRenderer {
    fn events(&self) -> &EventBus<RendererEvent> {
        &self.events
    }

    fn set_options(&self, options: &WaveOptions) {
        let rendered = {
            let mut state = self.state();
            // A zoom survives option updates that leave the resolution alone
            if options.min_px_per_sec != state.options.min_px_per_sec {
                state.min_px_per_sec = options.min_px_per_sec;
            }
            state.options = options.clone();
            state.layout();
            state.audio.is_some()
        };
        if rendered {
            self.events.emit(RendererEvent::Render);
        }
    }

    fn render(&self, audio: &DecodedAudio) {
        {
            let mut state = self.state();
            state.audio = Some(audio.clone());
            state.progress = 0.0;
            state.scroll_left = 0;
            state.layout();
            log::debug!(
                "Rendered {} row(s) over {} columns",
                state.rows.len(),
                state.scroll_width()
            );
        }
        self.events.emit(RendererEvent::Render);
    }

    fn render_progress(&self, progress: f64, animated: bool) {
        let range = {
            let mut state = self.state();
            state.progress = progress;
            state.follow_cursor(animated).then(|| state.visible_range())
        };
        if let Some((start, end)) = range {
            self.events.emit(RendererEvent::Scroll(start, end));
        }
    }

    fn zoom(&self, min_px_per_sec: f64) {
        let rendered = {
            let mut state = self.state();
            state.min_px_per_sec = min_px_per_sec;
            state.layout();
            state.audio.is_some()
        };
        if rendered {
            self.events.emit(RendererEvent::Render);
        }
    }

    fn wrapper(&self) -> Wrapper {
        let state = self.state();
        Wrapper {
            width: state.width as f64,
            scroll_width: state.scroll_width() as f64,
            scroll_left: state.scroll_left as f64,
        }
    }

    fn scroll(&self) -> f64 {
        self.state().scroll_left as f64
    }

    fn destroy(&self) {
        {
            let mut state = self.state();
            state.audio = None;
            state.rows.clear();
        }
        self.events.un_all();
    }
}
