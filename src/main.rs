use anyhow::Context;
use clap::Parser;
use std::process;
use taskboard::cli::{Cli, Commands};
use taskboard::cli_handlers;
use taskboard::{ServiceConfig, TaskStore, resolve};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            eprintln!("Error: {e:#}");
            process::exit(1);
        }
    }
}

/// Resolve configuration, open the store and dispatch. `Ok(false)` means the
/// command ran but reported failure (an unready database).
async fn run(cli: Cli) -> anyhow::Result<bool> {
    // Boot: any configuration problem stops here, before the database is touched.
    let config = ServiceConfig::from_env().context("invalid configuration")?;
    let target = resolve(&config.connection).context("cannot resolve database connection")?;

    let command = match cli.command {
        Commands::Resolve => {
            cli_handlers::handle_resolve(&target);
            return Ok(true);
        }
        command => command,
    };

    let store = TaskStore::connect(&target, &config)
        .await
        .with_context(|| format!("cannot open database handle for {}", target.redacted()))?;

    match command {
        Commands::Add { title } => cli_handlers::handle_add(&store, &config, &title).await?,
        Commands::List { json } => cli_handlers::handle_list(&store, json).await?,
        Commands::Show { id } => cli_handlers::handle_show(&store, &id).await?,
        Commands::Toggle { id } => cli_handlers::handle_toggle(&store, &config, &id).await?,
        Commands::Delete { id } => cli_handlers::handle_delete(&store, &id).await?,
        Commands::Clear => cli_handlers::handle_clear(&store).await?,
        Commands::ClearCompleted => cli_handlers::handle_clear_completed(&store).await?,
        Commands::Stats => cli_handlers::handle_stats(&store).await?,
        Commands::Ready => return Ok(cli_handlers::handle_ready(&store, &config).await?),
        Commands::Resolve => cli_handlers::handle_resolve(&target),
    }

    Ok(true)
}
