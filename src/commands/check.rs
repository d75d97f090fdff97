use clap::Args as ClapArgs;
use miette::{Context as _, IntoDiagnostic as _};

use crate::config::{ApiMode, RootConfig};
use crate::llm::LlmClient;

const TEST_MESSAGE: &str = "connection test";

#[derive(ClapArgs)]
pub struct Args {}

/// Send a minimal round-trip to the configured backend and report the outcome.
pub fn run(_args: Args, config: &RootConfig) -> miette::Result<()> {
    if config.api.mode == ApiMode::Remote {
        config.api.require_key()?;
    }

    let client = LlmClient::new(config.api.clone());

    super::block_on_runtime_aware(async {
        client.chat(TEST_MESSAGE).await.into_diagnostic()
    })
    .with_context(|| format!("connection test against {} failed", config.api.url))?;

    println!(
        "Connection OK: {} backend at {} answered with model '{}'",
        config.api.mode, config.api.url, config.api.model
    );

    Ok(())
}
