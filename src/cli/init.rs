use owo_colors::OwoColorize;
use std::error::Error;

use zim_wave::config::Config;

pub fn handle_init() -> Result<(), Box<dyn Error>> {
    if Config::exists()? {
        return Err(
            "zimwave is already initialized. Use 'zimwave config set <key> <value>' to change settings."
                .into(),
        );
    }

    let config = Config::new();
    config.save()?;

    println!("{} zimwave initialized", "✓".green().bold());
    println!(
        "Configuration saved to: {}",
        Config::config_path()?.display()
    );
    println!("Logs are written to: {}", config.log_path().display());

    Ok(())
}
