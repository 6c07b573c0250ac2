//! Application configuration management.
//!
//! This module handles the persistent configuration for zimwave: where and
//! how verbosely the binary logs, the width of the text waveform, and an
//! `[options]` table of player options layered over the built-in defaults.
//! Configuration is stored in the user's config directory (typically
//! ~/.config/zimwave/config.toml).

use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

use crate::constants::{DEFAULT_LOG_FILE, DEFAULT_WAVEFORM_WIDTH};
use crate::options::OptionsPatch;

#[derive(Debug, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_log_file")]
    pub log_file: String,
    #[serde(default = "default_waveform_width")]
    pub waveform_width: usize,
    #[serde(default)]
    pub options: OptionsPatch,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    DEFAULT_LOG_FILE.to_string()
}

fn default_waveform_width() -> usize {
    DEFAULT_WAVEFORM_WIDTH
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        Self {
            log_level: default_log_level(),
            log_file: default_log_file(),
            waveform_width: default_waveform_width(),
            options: OptionsPatch::default(),
        }
    }

    pub fn config_dir() -> Result<PathBuf, Box<dyn Error>> {
        // Check for XDG_CONFIG_HOME first (useful for testing)
        let config_dir = if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
            PathBuf::from(xdg_config).join("zimwave")
        } else {
            dirs::config_dir()
                .ok_or("Unable to find config directory")?
                .join("zimwave")
        };
        Ok(config_dir)
    }

    pub fn config_path() -> Result<PathBuf, Box<dyn Error>> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    pub fn load() -> Result<Self, Box<dyn Error>> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            return Ok(Default::default());
        }

        let contents = fs::read_to_string(&config_path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<(), Box<dyn Error>> {
        let config_dir = Self::config_dir()?;

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)?;
        }

        let config_path = Self::config_path()?;
        let toml_string = toml::to_string_pretty(self)?;
        fs::write(&config_path, toml_string)?;

        Ok(())
    }

    pub fn exists() -> Result<bool, Box<dyn Error>> {
        Ok(Self::config_path()?.exists())
    }

    /// The configured level, falling back to `Info` on an unknown name.
    pub fn level_filter(&self) -> LevelFilter {
        LevelFilter::from_str(&self.log_level).unwrap_or(LevelFilter::Info)
    }

    /// The log file path with `~` expanded.
    pub fn log_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.log_file).as_ref())
    }

    /// Set a top-level key, or a player option as `options.<name>`.
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        match key {
            "log_level" => {
                LevelFilter::from_str(value).map_err(|_| {
                    "Value must be one of: off, error, warn, info, debug, trace"
                })?;
                self.log_level = value.to_lowercase();
            }
            "log_file" => self.log_file = value.to_string(),
            "waveform_width" => {
                let width = value
                    .parse::<usize>()
                    .map_err(|_| "Value must be a positive integer")?;
                if width == 0 {
                    return Err("Value must be a positive integer".into());
                }
                self.waveform_width = width;
            }
            _ => match key.strip_prefix("options.") {
                Some(name) => {
                    let patch = parse_option(name, value)?;
                    self.options = std::mem::take(&mut self.options).layered(patch);
                }
                None => return Err(format!("Unknown configuration key: {key}").into()),
            },
        }
        Ok(())
    }
}

/// Parse `value` as the TOML value of option `name`. Bare words that are not
/// valid TOML are retried as strings, so `options.wave_color violet` works.
fn parse_option(name: &str, value: &str) -> Result<OptionsPatch, Box<dyn Error>> {
    if name.is_empty() || !name.chars().all(|c| c.is_ascii_lowercase() || c == '_') {
        return Err(format!("Unknown option: {name}").into());
    }

    let patch: OptionsPatch = match toml::from_str(&format!("{name} = {value}")) {
        Ok(patch) => patch,
        Err(_) => toml::from_str(&format!("{name} = {}", toml::Value::String(value.to_string())))
            .map_err(|e| format!("Invalid value for {name}: {e}"))?,
    };

    if patch == OptionsPatch::default() {
        return Err(format!("Unknown option: {name}").into());
    }
    Ok(patch)
}
