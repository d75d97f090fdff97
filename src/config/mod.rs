use miette::IntoDiagnostic as _;

pub mod model;

use std::path::{Path, PathBuf};

pub use model::*;

pub const CONFIG_FILE_NAME: &str = "jsrecon.toml";

impl RootConfig {
    pub fn load(path: &Path) -> miette::Result<Self> {
        let contents = std::fs::read_to_string(path).into_diagnostic()?;
        let config: Self = toml::from_str(&contents).into_diagnostic()?;

        Ok(config)
    }

    pub fn save(&self, path: &Path) -> miette::Result<()> {
        let contents = toml::to_string_pretty(self).into_diagnostic()?;
        std::fs::write(path, contents).into_diagnostic()?;
        Ok(())
    }
}

/// Locate the settings file: `jsrecon.toml` in the current directory, falling
/// back to the global config under the jsrecon home dir.
pub fn find_config_path() -> miette::Result<PathBuf> {
    let current_dir = std::env::current_dir().into_diagnostic()?;

    let local = current_dir.join(CONFIG_FILE_NAME);

    if local.exists() {
        return Ok(local);
    }

    let global = crate::home::global_config_path()?;

    if global.exists() {
        return Ok(global);
    }

    Err(miette::miette!(
        help = "run `jsrecon init` to create one",
        "no {} found in the current directory or in the jsrecon home",
        CONFIG_FILE_NAME
    ))
}

pub fn load_config() -> miette::Result<RootConfig> {
    let path = find_config_path()?;
    RootConfig::load(&path)
}
