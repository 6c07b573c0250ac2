//! Play a file against the headless clock with a live progress bar.

use owo_colors::OwoColorize;
use std::error::Error;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::oneshot;

use zim_wave::backends::ProgressPlugin;
use zim_wave::backends::progress::format_time;
use zim_wave::config::Config;
use zim_wave::options::OptionsPatch;
use zim_wave::player::{MediaPlayer, WaveEventKind};

use super::{Session, display_name};

pub async fn handle_play(
    file: &str,
    rate: Option<f64>,
    peaks: Option<&str>,
) -> Result<(), Box<dyn Error>> {
    if let Some(rate) = rate.filter(|r| !r.is_finite() || *r <= 0.0) {
        return Err(format!("Playback rate must be positive, got {rate}").into());
    }

    let config = Config::load()?;
    let overrides = OptionsPatch {
        audio_rate: rate,
        ..Default::default()
    };
    let session = Session::new(&config, None, overrides);

    let progress = if console::user_attended_stderr() {
        ProgressPlugin::new()
    } else {
        ProgressPlugin::hidden()
    };
    session.player.register_plugin(Arc::new(progress));

    session.load(file, peaks, None).await?;
    session.media.metadata_loaded().await;
    if session.media.duration() <= 0.0 {
        return Err(format!("Could not determine how long {file} plays").into());
    }
    println!(
        "{} {} ({})",
        "▶".green(),
        display_name(file).bold(),
        format_time(session.player.duration())
    );
    session.print_waveform();

    let (tx, finished) = oneshot::channel();
    let tx = Mutex::new(Some(tx));
    let _finish = session.player.once(WaveEventKind::Finish, move |_| {
        let sender = tx.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(sender) = sender {
            let _ = sender.send(());
        }
    });

    log::info!("Playing {file} at rate {}", session.media.playback_rate());
    session.player.play();
    finished
        .await
        .map_err(|_| "Playback stopped before the end")?;

    session.player.destroy();
    println!("{} Finished {}", "✓".green().bold(), display_name(file));
    Ok(())
}
