//! `schemafill config`: inspect configuration.

use super::CmdResult;
use schemafill_config::AppConfig;
use std::path::Path;

pub fn show(config: &AppConfig) -> CmdResult {
    let toml_str = toml::to_string_pretty(config)
        .map_err(|e| format!("Failed to serialize config: {e}"))?;
    println!("{toml_str}");
    Ok(())
}

pub fn path(config_path: &Path) -> CmdResult {
    println!("{}", config_path.display());
    Ok(())
}

pub fn default() -> CmdResult {
    print!("{}", AppConfig::default_toml());
    Ok(())
}
