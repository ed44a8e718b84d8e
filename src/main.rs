mod cli_args;
mod cli_dispatch;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use chefagent::runtime_config;

use crate::cli_args::{Cli, Commands};

fn init_logging(verbose: bool) {
    let default_directive = if verbose {
        "chefagent=debug"
    } else {
        "chefagent=warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let cfg = runtime_config::load_or_default(cli.config.as_deref())?;

    match &cli.command {
        Commands::Chat(args) => cli_dispatch::handle_chat_command(args, cfg).await,
        Commands::Ask(args) => cli_dispatch::handle_ask_command(args, cfg).await,
        Commands::Sanitize(args) => cli_dispatch::handle_sanitize_command(args, &cfg).await,
        Commands::Recipes(args) => cli_dispatch::handle_recipes_command(args),
        Commands::Version => {
            cli_dispatch::handle_version_command();
            Ok(())
        }
    }
}
