mod cli;
mod config;
mod error;
mod picker;
mod state;

use clap::Parser;
use crate::cli::{Cli, Commands, ModelsCommand};
use crate::config::AppConfig;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = AppConfig::load()?;
    tracing::debug!("Data directory: {}", config.data_dir.display());

    let mut state = AppState::load(config).await?;

    match cli.command {
        Commands::Generate(args) => state.generate(args).await?,
        Commands::Models { command } => match command {
            ModelsCommand::Add { kind, reference } => state.add_model(kind.into(), &reference).await?,
            ModelsCommand::List { kind, all } => state.list_models(kind.map(Into::into), all),
            ModelsCommand::Hide { kind, model_id, unhide } => {
                state.hide_model(kind.into(), &model_id, !unhide).await?
            }
        },
        Commands::History => state.history().await,
    }

    Ok(())
}
