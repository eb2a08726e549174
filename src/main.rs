use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use log::info;

use github_bridge::commands::call_github_api;
use github_bridge::config::Config;
use github_bridge::context::Context;
use github_bridge::sender;
use github_bridge::server::{self, AppState};

#[derive(Clone, Debug, Subcommand)]
enum Command {
    /// Serve the webhook and command endpoints.
    Serve {
        #[arg(long)]
        bind: Option<String>,
    },
    /// Run a single chat command and print its result.
    Run {
        space_id: String,

        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        content: Vec<String>,
    },
}

#[derive(Debug, Parser)]
struct Args {
    /// JSON config file; environment variables are used when absent.
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::new()
        .filter_module("github_bridge", log::LevelFilter::Debug)
        .parse_default_env()
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::from_env(),
    };

    let ctx = Context::from_config(&config).context("Failed to build GitHub client")?;

    match args.command {
        Command::Serve { bind } => {
            let bind = bind.unwrap_or_else(|| config.bind.clone());
            let state = Arc::new(AppState::new(ctx, sender::from_config(&config)));
            server::serve(state, &bind).await
        }
        Command::Run { space_id, content } => {
            let mut ctx = ctx;
            let result = call_github_api(&mut ctx, &space_id, &content).await;
            info!("{} for space {}", result.title, space_id);
            println!("{}\n{}", result.title, result.message);
            Ok(())
        }
    }
}
