use clap::Parser as _;
use miette::Result;
use tracing_subscriber::EnvFilter;

use jsrecon::cli::{Cli, Commands};
use jsrecon::{commands, config};

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    match cli.command {
        Commands::Init(args) => commands::init::run(args),
        Commands::Scan(args) => {
            let config = config::load_config()?;
            commands::scan::run(args, &config)
        }
        Commands::Chat(args) => {
            let config = config::load_config()?;
            commands::chat::run(args, &config)
        }
        Commands::Models(args) => {
            let config = config::load_config()?;
            commands::models::run(args, &config)
        }
        Commands::Check(args) => {
            let config = config::load_config()?;
            commands::check::run(args, &config)
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "jsrecon=debug" } else { "jsrecon=warn" };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
