//! Print the waveform of a file without playing it.

use owo_colors::OwoColorize;
use std::error::Error;

use zim_wave::backends::progress::format_time;
use zim_wave::config::Config;
use zim_wave::options::OptionsPatch;

use super::{Session, display_name};

pub async fn handle_peaks(
    file: &str,
    width: Option<usize>,
    peaks: Option<&str>,
    duration: Option<f64>,
    split: bool,
) -> Result<(), Box<dyn Error>> {
    let config = Config::load()?;
    let overrides = OptionsPatch {
        split_channels: split.then_some(true),
        ..Default::default()
    };
    let session = Session::new(&config, width, overrides);
    session.load(file, peaks, duration).await?;

    let channels = session
        .player
        .decoded_data()
        .map(|audio| audio.number_of_channels())
        .unwrap_or(0);
    println!(
        "{} {} ({}, {} channel{})",
        "♪".cyan(),
        display_name(file).bold(),
        format_time(session.player.duration()),
        channels,
        if channels == 1 { "" } else { "s" }
    );
    session.print_waveform();

    session.player.destroy();
    Ok(())
}
