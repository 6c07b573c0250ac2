//! Decode a file and write its peaks as JSON.

use owo_colors::OwoColorize;
use std::error::Error;
use std::fs;

use zim_wave::config::Config;
use zim_wave::options::OptionsPatch;

use super::{PeaksFile, Session, display_name};

pub async fn handle_export(
    file: &str,
    output: Option<&str>,
    max_length: usize,
    precision: u32,
) -> Result<(), Box<dyn Error>> {
    if max_length == 0 {
        return Err("--max-length must be at least 1".into());
    }

    let config = Config::load()?;
    let session = Session::new(&config, None, OptionsPatch::default());
    session.load(file, None, None).await?;

    let channels = session
        .player
        .decoded_data()
        .map(|audio| audio.number_of_channels())
        .unwrap_or(0);
    let peaks = PeaksFile {
        duration: Some(session.player.duration()),
        channels: session.player.export_peaks(channels, max_length, precision)?,
    };
    session.player.destroy();

    let json = serde_json::to_string(&peaks)?;
    match output {
        Some(path) => {
            let path = shellexpand::tilde(path);
            fs::write(path.as_ref(), json)?;
            eprintln!(
                "{} Exported peaks of {} to {}",
                "✓".green().bold(),
                display_name(file),
                path
            );
        }
        None => println!("{json}"),
    }

    Ok(())
}
