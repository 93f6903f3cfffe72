//! Configuration management commands.

use crate::cli::icons::{dim_arrow, warn};
use crate::config::{Config, Settings};

/// Print the effective configuration as TOML.
pub fn cmd_config_show(settings: &Settings) -> anyhow::Result<()> {
    let text = toml::to_string_pretty(&settings.to_config())?;
    print!("{}", text);
    Ok(())
}

/// Print which config file was loaded, if any.
pub fn cmd_config_path(config: &Config) -> anyhow::Result<()> {
    match config.source_path {
        Some(ref path) => println!("{}", path.display()),
        None => {
            eprintln!("{} No config file loaded", warn());
            if let Some(default) = Config::default_path() {
                eprintln!("  {} Create one at {}", dim_arrow(), default.display());
            }
        }
    }
    Ok(())
}
