//! End-to-end runs of the player over the headless reference backends.

#![cfg(feature = "codecs")]

use std::io::Cursor;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

use zim_wave::backends::{ClockPlayer, FileFetcher, ProgressPlugin, SampleDecoder, TextRenderer};
use zim_wave::options::OptionsPatch;
use zim_wave::player::{MediaPlayer, WaveEvent, WaveEventKind, WavePlayer, WavePlayerParts};

fn write_wav(path: &Path, channels: u16, sample_rate: u32, seconds: f64) {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        let frames = (sample_rate as f64 * seconds) as usize;
        for i in 0..frames {
            // Rising envelope so the waveform is not flat
            let envelope = i as f64 / frames as f64;
            let sample = (envelope * 20000.0 * (i as f64 * 0.3).sin()) as i16;
            for _ in 0..channels {
                writer.write_sample(sample).unwrap();
            }
        }
        writer.finalize().unwrap();
    }
    std::fs::write(path, cursor.into_inner()).unwrap();
}

struct Rig {
    player: WavePlayer,
    renderer: Arc<TextRenderer>,
    media: Arc<ClockPlayer>,
}

fn rig(width: usize, options: OptionsPatch) -> Rig {
    let renderer = Arc::new(TextRenderer::new(width));
    let media = Arc::new(ClockPlayer::new());
    let parts = WavePlayerParts {
        fetcher: Arc::new(FileFetcher::new()),
        decoder: Arc::new(SampleDecoder::new()),
        renderer: renderer.clone(),
        media: media.clone(),
    };
    Rig {
        player: WavePlayer::new(options, parts),
        renderer,
        media,
    }
}

#[tokio::test(start_paused = true)]
async fn test_load_wav_draws_waveform() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tone.wav");
    write_wav(&path, 1, 8000, 2.0);

    let rig = rig(40, OptionsPatch::default());
    rig.player
        .load(path.to_str().unwrap(), None, None)
        .await
        .unwrap();

    assert!((rig.player.duration() - 2.0).abs() < 1e-9);
    assert!((rig.media.duration() - 2.0).abs() < 1e-9);

    let lines = rig.renderer.lines();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].chars().count(), 40);
    // The envelope rises, so the right half is louder than the left
    let first: String = lines[0].chars().take(5).collect();
    let last: String = lines[0].chars().skip(35).collect();
    assert_ne!(first, last);
}

#[tokio::test(start_paused = true)]
async fn test_split_channels_draws_one_row_each() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("stereo.wav");
    write_wav(&path, 2, 8000, 1.0);

    let rig = rig(
        20,
        OptionsPatch {
            split_channels: Some(true),
            ..Default::default()
        },
    );
    rig.player
        .load(path.to_str().unwrap(), None, None)
        .await
        .unwrap();

    assert_eq!(rig.renderer.lines().len(), 2);
    assert_eq!(rig.player.decoded_data().unwrap().number_of_channels(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_missing_file_rejects_load() {
    let rig = rig(20, OptionsPatch::default());
    let result = rig.player.load("/nonexistent/take.wav", None, None).await;
    assert!(result.is_err());
    assert!(rig.player.decoded_data().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_click_on_text_waveform_seeks_media() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tone.wav");
    write_wav(&path, 1, 8000, 4.0);

    let rig = rig(40, OptionsPatch::default());
    rig.player
        .load(path.to_str().unwrap(), None, None)
        .await
        .unwrap();

    rig.renderer.click(20);

    assert!((rig.media.current_time() - 2.0).abs() < 1e-9);
    assert_eq!(rig.renderer.cursor_column(), Some(20));
}

#[tokio::test(start_paused = true)]
async fn test_playback_runs_to_finish_with_progress_plugin() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("short.wav");
    write_wav(&path, 1, 8000, 1.0);

    let rig = rig(40, OptionsPatch::default());
    let progress = rig.player.register_plugin(Arc::new(ProgressPlugin::hidden()));
    rig.player
        .load(path.to_str().unwrap(), None, None)
        .await
        .unwrap();
    assert_eq!(progress.length(), Some(1000));

    let finishes = Arc::new(AtomicUsize::new(0));
    let times = Arc::new(Mutex::new(Vec::new()));
    {
        let finishes = finishes.clone();
        rig.player.on(WaveEventKind::Finish, move |_| {
            finishes.fetch_add(1, Ordering::SeqCst);
        });
        let times = times.clone();
        rig.player.on(WaveEventKind::TimeUpdate, move |event| {
            if let WaveEvent::TimeUpdate(t) = event {
                times.lock().unwrap().push(*t);
            }
        });
    }

    rig.player.play();
    tokio::time::sleep(Duration::from_millis(1200)).await;

    assert_eq!(finishes.load(Ordering::SeqCst), 1);
    assert!(!rig.player.is_playing());
    let times = times.lock().unwrap().clone();
    assert!(times.len() > 10);
    assert!(times.windows(2).all(|w| w[0] <= w[1]));
    assert!((times.last().unwrap() - 1.0).abs() < 1e-9);

    assert!(progress.is_finished());
    assert_eq!(progress.position(), 1000);

    rig.player.destroy();
    assert!(rig.player.active_plugins().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_exported_peaks_load_without_decoding() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tone.wav");
    write_wav(&path, 1, 8000, 2.0);

    let source = rig(30, OptionsPatch::default());
    source
        .player
        .load(path.to_str().unwrap(), None, None)
        .await
        .unwrap();
    let peaks = source.player.export_peaks(1, 300, 4).unwrap();
    assert_eq!(peaks[0].len(), 300);

    let replay = rig(30, OptionsPatch::default());
    replay
        .player
        .load(path.to_str().unwrap(), Some(peaks), Some(2.0))
        .await
        .unwrap();

    assert_eq!(replay.player.duration(), 2.0);
    assert_eq!(replay.renderer.lines().len(), 1);
}
