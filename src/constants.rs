//! Project-wide constants used across multiple modules.

use std::time::Duration;

/// Interval of the smooth progress timer (~60 ticks per second)
pub const TICK_INTERVAL: Duration = Duration::from_millis(16);

/// Delay before a drag gesture commits its seek while paused
pub const DRAG_COMMIT_DELAY: Duration = Duration::from_millis(200);

/// Explicit duration used by `WavePlayer::empty`
pub const EMPTY_DURATION: f64 = 0.001;

/// Sample rate requested from the decoder when none is configured
pub const DEFAULT_SAMPLE_RATE: u32 = 8000;

/// How often the headless media clock reports its own position
pub const MEDIA_TIMEUPDATE_INTERVAL: Duration = Duration::from_millis(250);

/// Default column count of the text waveform
pub const DEFAULT_WAVEFORM_WIDTH: usize = 80;

/// Upper bound on the text waveform's scrollable width
pub const MAX_WAVEFORM_COLUMNS: usize = 65_536;

/// Spinner animation characters for progress indicators
pub const SPINNER_CHARS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Audio file extensions the reference decoder understands
pub const AUDIO_EXTENSIONS: &[&str] = &["wav", "flac"];

/// Log file written by the binary unless the config names another
pub const DEFAULT_LOG_FILE: &str = "/tmp/zimwave.log";
