use clap::Args as ClapArgs;
use miette::IntoDiagnostic as _;

use crate::config::RootConfig;
use crate::llm::LlmClient;

#[derive(ClapArgs)]
pub struct Args {}

pub fn run(_args: Args, config: &RootConfig) -> miette::Result<()> {
    let client = LlmClient::new(config.api.clone());

    let models = super::block_on_runtime_aware(async {
        client.list_models().await.into_diagnostic()
    })?;

    if models.is_empty() {
        println!("No models reported by {}", config.api.base_url());
        return Ok(());
    }

    println!("Models available at {}:", config.api.base_url());
    for model in models {
        println!("  {model}");
    }

    Ok(())
}
