//! CLI subcommands.

pub mod batch;
pub mod config;
pub mod process;
pub mod serve;

use std::path::{Path, PathBuf};

use invx_core::InvxConfig;

/// `<config dir>/invx/config.json`.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("invx")
        .join("config.json")
}

/// Load the given file, or the default file when it exists, then apply
/// `.env` and environment overrides.
pub fn load_config(config_path: Option<&Path>) -> anyhow::Result<InvxConfig> {
    let config = match config_path {
        Some(path) => InvxConfig::load(Some(path))?,
        None => {
            let default_path = default_config_path();
            if default_path.exists() {
                InvxConfig::load(Some(&default_path))?
            } else {
                InvxConfig::load(None)?
            }
        }
    };
    Ok(config)
}
