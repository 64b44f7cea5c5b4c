//! ADA CLI entry point.

use clap::Parser;

use ada::cli::commands::context::load_config;
use ada::cli::{handle_error, Cli, Commands};
use ada::infrastructure::logging::{LogConfig, LoggerImpl};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => handle_error(err, cli.json),
    };

    // Held for the life of the process so buffered file logs are flushed.
    let _logger = match LoggerImpl::init(&LogConfig::from(&config.logging)) {
        Ok(logger) => Some(logger),
        Err(err) => {
            eprintln!("warning: logging disabled: {err:#}");
            None
        }
    };

    let result = match cli.command {
        Commands::Run(args) => ada::cli::commands::run::execute(args, &config, cli.json).await,
        Commands::Plan(args) => ada::cli::commands::plan::execute(args, &config, cli.json).await,
        Commands::Route(args) => ada::cli::commands::route::execute(args, &config, cli.json).await,
        Commands::Feedback(args) => {
            ada::cli::commands::feedback::execute(args, &config, cli.json).await
        }
        Commands::Workflow(args) => {
            ada::cli::commands::workflow::execute(args, &config, cli.json).await
        }
        Commands::Status(args) => ada::cli::commands::status::execute(args, &config, cli.json).await,
        Commands::Batch(args) => ada::cli::commands::batch::execute(args, &config, cli.json).await,
    };

    if let Err(err) = result {
        handle_error(err, cli.json);
    }
}
