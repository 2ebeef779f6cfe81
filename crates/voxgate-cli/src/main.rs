//! CLI entry point - the composition root.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use voxgate_cli::{Cli, CliError, Commands, handlers};

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables before parsing so clap's `env` sees .env values
    dotenvy::dotenv().ok();

    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize logging
    init_tracing(cli.verbose);

    let result = match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => handlers::serve::execute(&cli.gate).await,
        Commands::IssueToken { subject, ttl_secs } => {
            handlers::issue_token::execute(&cli.gate, &subject, ttl_secs).map_err(Into::into)
        }
        Commands::CheckConfig { ping, json } => {
            handlers::check_config::execute(&cli.gate, ping, json).await
        }
    };

    if let Err(e) = result {
        if let Some(cli_error) = e.downcast_ref::<CliError>() {
            eprintln!("Error: {cli_error}");
            std::process::exit(cli_error.exit_code());
        }
        return Err(e);
    }
    Ok(())
}
