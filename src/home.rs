/// Utility functions for the jsrecon home directory
use std::path::PathBuf;

use miette::{Context as _, IntoDiagnostic as _};

pub fn jsrecon_dir() -> miette::Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| miette::miette!("failed to get home directory"))?
        .join(".jsrecon");

    if !home.exists() {
        std::fs::create_dir_all(&home)
            .into_diagnostic()
            .context("failed to create jsrecon home directory")?;
    }

    Ok(home)
}

pub fn state_path() -> miette::Result<PathBuf> {
    Ok(jsrecon_dir()?.join("state.json"))
}

pub fn global_config_path() -> miette::Result<PathBuf> {
    Ok(jsrecon_dir()?.join("config.toml"))
}
