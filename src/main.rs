//! zimwave - waveform display and playback in the terminal.
//!
//! The binary drives the zim-wave player with its headless backends: files
//! are read from disk, decoded to samples, drawn as block-character
//! waveforms and played against a clock with a live progress bar. Peaks can
//! be exported to JSON once and loaded back later without decoding.

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{Generator, Shell, generate};
use std::error::Error;
use std::io;

use zim_wave::config::Config;

mod cli;

#[derive(Parser)]
#[command(name = "zimwave")]
#[command(about = "Waveform display and playback synchronization in the terminal")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize zimwave configuration
    Init,
    /// Show or change configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Generate shell completions
    Completions {
        /// The shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
    /// Draw the waveform of an audio file
    Peaks {
        /// Audio file path
        file: String,
        /// Waveform width in columns (defaults to config, capped by the terminal)
        #[arg(short, long)]
        width: Option<usize>,
        /// Draw precomputed peaks from a JSON file instead of decoding
        #[arg(short, long)]
        peaks: Option<String>,
        /// Known duration in seconds
        #[arg(short, long)]
        duration: Option<f64>,
        /// Draw one row per channel
        #[arg(short, long)]
        split: bool,
    },
    /// Play an audio file with a live progress bar
    Play {
        /// Audio file path
        file: String,
        /// Playback rate
        #[arg(short, long)]
        rate: Option<f64>,
        /// Draw precomputed peaks from a JSON file instead of decoding
        #[arg(short, long)]
        peaks: Option<String>,
    },
    /// Decode an audio file and write its peaks as JSON
    Export {
        /// Audio file path
        file: String,
        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<String>,
        /// Maximum peaks per channel
        #[arg(short, long, default_value_t = 8000)]
        max_length: usize,
        /// Decimal places kept in each peak
        #[arg(long, default_value_t = 4)]
        precision: u32,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// View current configuration
    View,
    /// Set a configuration value (player options as options.<name>)
    Set {
        /// Configuration key
        #[arg(value_parser = config_key_parser)]
        key: String,
        /// Configuration value
        value: String,
    },
    /// Edit configuration file in your editor
    Edit,
}

const CONFIG_KEYS: &[&str] = &["log_level", "log_file", "waveform_width"];

fn config_key_parser(key: &str) -> Result<String, String> {
    if key.starts_with("options.") || CONFIG_KEYS.contains(&key) {
        Ok(key.to_string())
    } else {
        Err(format!(
            "expected one of {}, or options.<name>",
            CONFIG_KEYS.join(", ")
        ))
    }
}

fn print_completions<G: Generator>(generator: G, cmd: &mut clap::Command) {
    generate(
        generator,
        cmd,
        cmd.get_name().to_string(),
        &mut io::stdout(),
    );
}

fn init_logging(config: &Config) -> Result<(), Box<dyn Error>> {
    use simplelog::{CombinedLogger, WriteLogger};
    use std::fs::File;

    CombinedLogger::init(vec![WriteLogger::new(
        config.level_filter(),
        simplelog::Config::default(),
        File::create(config.log_path())?,
    )])?;

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if !matches!(cli.command, Commands::Completions { .. }) {
        init_logging(&Config::load().unwrap_or_default())?;
    }

    match cli.command {
        Commands::Init => {
            cli::init::handle_init()?;
        }
        Commands::Config { action } => match action {
            ConfigAction::View => {
                cli::config::handle_config_view()?;
            }
            ConfigAction::Set { key, value } => {
                cli::config::handle_config_set(&key, &value)?;
            }
            ConfigAction::Edit => {
                cli::config::handle_config_edit()?;
            }
        },
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            print_completions(shell, &mut cmd);
        }
        Commands::Peaks {
            file,
            width,
            peaks,
            duration,
            split,
        } => {
            cli::peaks::handle_peaks(&file, width, peaks.as_deref(), duration, split).await?;
        }
        Commands::Play { file, rate, peaks } => {
            cli::play::handle_play(&file, rate, peaks.as_deref()).await?;
        }
        Commands::Export {
            file,
            output,
            max_length,
            precision,
        } => {
            cli::export::handle_export(&file, output.as_deref(), max_length, precision).await?;
        }
    }

    Ok(())
}
