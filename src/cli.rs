//! CLI parsing for jsrecon

use clap::{Parser, Subcommand};

use crate::commands;

#[derive(Parser)]
#[command(name = "jsrecon")]
#[command(about = "AI-assisted discovery and security triage of a web page's JavaScript", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, short, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a jsrecon.toml settings file
    Init(commands::init::Args),

    /// Scan a page's scripts for probable routes and vulnerability indicators
    Scan(commands::scan::Args),

    /// Chat with the configured model backend
    Chat(commands::chat::Args),

    /// List the models the configured backend offers
    Models(commands::models::Args),

    /// Test the connection to the configured backend
    Check(commands::check::Args),
}
