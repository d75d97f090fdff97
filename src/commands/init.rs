use std::path::PathBuf;

use clap::Args as ClapArgs;
use inquire::{Confirm, Select, Text};
use miette::IntoDiagnostic as _;

use crate::config::{
    ApiConfig, ApiMode, CONFIG_FILE_NAME, DEFAULT_LOCAL_API_URL, DEFAULT_LOCAL_MODEL,
    DEFAULT_REMOTE_API_URL, DEFAULT_REMOTE_MODEL, RootConfig,
};

#[derive(ClapArgs)]
pub struct Args {
    /// Use default configuration
    #[arg(short, long)]
    yes: bool,

    /// Write the global settings file instead of one in the current directory
    #[arg(long)]
    global: bool,
}

pub fn run(args: Args) -> miette::Result<()> {
    let mut config = RootConfig::default();

    if !args.yes {
        config = inquire_config()?;
    }

    let path = if args.global {
        crate::home::global_config_path()?
    } else {
        PathBuf::from(CONFIG_FILE_NAME)
    };

    config.save(&path)?;

    println!("Settings written to {}", path.display());

    Ok(())
}

fn inquire_config() -> miette::Result<RootConfig> {
    let mode = Select::new("API mode:", vec!["local", "remote"])
        .prompt()
        .into_diagnostic()?;

    let mode = match mode {
        "remote" => ApiMode::Remote,
        _ => ApiMode::Local,
    };

    let (default_url, default_model) = match mode {
        ApiMode::Local => (DEFAULT_LOCAL_API_URL, DEFAULT_LOCAL_MODEL),
        ApiMode::Remote => (DEFAULT_REMOTE_API_URL, DEFAULT_REMOTE_MODEL),
    };

    let url = Text::new("API URL:")
        .with_default(default_url)
        .prompt()
        .into_diagnostic()?;

    let model = Text::new("Model name:")
        .with_default(default_model)
        .prompt()
        .into_diagnostic()?;

    let key = if mode == ApiMode::Remote {
        Text::new("API key:")
            .prompt_skippable()
            .into_diagnostic()?
            .filter(|key| !key.trim().is_empty())
    } else {
        None
    };

    let config = RootConfig {
        api: ApiConfig {
            mode,
            url,
            model,
            key,
            secret: None,
        },
    };

    let confirm = Confirm::new("Is this OK?")
        .with_default(true)
        .prompt()
        .into_diagnostic()?;

    if !confirm {
        return Err(miette::miette!("Nothing done"));
    }

    Ok(config)
}
