//! Player options and their layering.
//!
//! A [`WaveOptions`] value is immutable once built. Construction starts from
//! [`WaveOptions::default`], applies the caller's [`OptionsPatch`], and every
//! later `set_options` call produces a new value by merging another patch on
//! top. Renderer-only fields (colors, bar geometry, scrolling) are carried
//! through untouched and handed to the renderer.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::constants::DEFAULT_SAMPLE_RATE;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BarAlign {
    Top,
    Bottom,
}

/// Request parameters forwarded to the fetcher.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FetchParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaveOptions {
    pub wave_color: String,
    pub progress_color: String,
    pub cursor_color: Option<String>,
    pub cursor_width: f32,
    pub bar_width: Option<f32>,
    pub bar_gap: Option<f32>,
    pub bar_radius: Option<f32>,
    pub bar_height: Option<f32>,
    pub bar_align: Option<BarAlign>,
    /// Minimum horizontal resolution; 0 fits the waveform to the container
    pub min_px_per_sec: f64,
    pub fill_parent: bool,
    pub url: Option<String>,
    pub peaks: Option<Vec<Vec<f32>>>,
    pub duration: Option<f64>,
    pub autoplay: bool,
    pub interact: bool,
    pub hide_scrollbar: bool,
    pub audio_rate: f64,
    pub auto_scroll: bool,
    pub auto_center: bool,
    pub sample_rate: u32,
    pub split_channels: bool,
    pub normalize: bool,
    pub fetch_params: FetchParams,
}

impl Default for WaveOptions {
    fn default() -> Self {
        Self {
            wave_color: "#999".to_string(),
            progress_color: "#555".to_string(),
            cursor_color: None,
            cursor_width: 1.0,
            bar_width: None,
            bar_gap: None,
            bar_radius: None,
            bar_height: None,
            bar_align: None,
            min_px_per_sec: 0.0,
            fill_parent: true,
            url: None,
            peaks: None,
            duration: None,
            autoplay: false,
            interact: true,
            hide_scrollbar: false,
            audio_rate: 1.0,
            auto_scroll: true,
            auto_center: true,
            sample_rate: DEFAULT_SAMPLE_RATE,
            split_channels: false,
            normalize: false,
            fetch_params: FetchParams::default(),
        }
    }
}

/// A partial update; `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptionsPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wave_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor_width: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bar_width: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bar_gap: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bar_radius: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bar_height: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bar_align: Option<BarAlign>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_px_per_sec: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill_parent: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peaks: Option<Vec<Vec<f32>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub autoplay: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interact: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hide_scrollbar: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_scroll: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_center: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_rate: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub split_channels: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub normalize: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fetch_params: Option<FetchParams>,
}

impl OptionsPatch {
    /// Layer `other` over `self`; fields set in `other` win.
    pub fn layered(self, other: OptionsPatch) -> OptionsPatch {
        let mut base = self;
        macro_rules! take {
            ($($field:ident),* $(,)?) => {
                $(if other.$field.is_some() { base.$field = other.$field; })*
            };
        }
        take!(
            wave_color, progress_color, cursor_color, cursor_width, bar_width, bar_gap,
            bar_radius, bar_height, bar_align, min_px_per_sec, fill_parent, url, peaks,
            duration, autoplay, interact, hide_scrollbar, audio_rate, auto_scroll,
            auto_center, sample_rate, split_channels, normalize, fetch_params,
        );
        base
    }
}

impl WaveOptions {
    /// Build options from the defaults plus one patch.
    pub fn from_patch(patch: OptionsPatch) -> Self {
        Self::default().merged(patch)
    }

    /// Return a new value with every field set in `patch` replaced.
    pub fn merged(&self, patch: OptionsPatch) -> Self {
        let mut next = self.clone();
        macro_rules! set {
            ($($field:ident),* $(,)?) => {
                $(if let Some(value) = patch.$field { next.$field = value; })*
            };
        }
        macro_rules! set_opt {
            ($($field:ident),* $(,)?) => {
                $(if let Some(value) = patch.$field { next.$field = Some(value); })*
            };
        }
        set!(
            wave_color, progress_color, cursor_width, min_px_per_sec, fill_parent, autoplay,
            interact, hide_scrollbar, audio_rate, auto_scroll, auto_center, sample_rate,
            split_channels, normalize, fetch_params,
        );
        set_opt!(
            cursor_color, bar_width, bar_gap, bar_radius, bar_height, bar_align, url, peaks,
            duration,
        );
        next
    }
}
