//! Retro Shop CLI - Database migrations, seeding and integrity checks.
//!
//! # Usage
//!
//! ```bash
//! # Apply pending migrations
//! retro-cli migrate run
//!
//! # Show applied and pending migrations
//! retro-cli migrate status
//!
//! # Load the embedded fixtures (or a custom file)
//! retro-cli seed
//! retro-cli seed --file crates/db/seeds/fixtures.yaml
//!
//! # Verify order arithmetic and uniqueness invariants
//! retro-cli check
//! ```
//!
//! # Commands
//!
//! - `migrate run` / `migrate status` - Schema migrations
//! - `seed` - Load fixture data
//! - `check` - Run integrity rules; exits with status 1 on any violation

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "retro-cli")]
#[command(author, version, about = "Retro Shop CLI tools")]
struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate {
        #[command(subcommand)]
        action: MigrateAction,
    },
    /// Seed the database with fixture data
    Seed {
        /// Fixture YAML file (defaults to the embedded fixture set)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
    /// Check live data against integrity rules
    Check,
}

#[derive(Subcommand)]
enum MigrateAction {
    /// Apply pending migrations
    Run,
    /// List migrations and whether each is applied
    Status,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.json_logs);

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

/// Filter used when `RUST_LOG` is unset: info for the library crates and this binary.
const DEFAULT_LOG_FILTER: &str = "retro_shop=info,retro_cli=info";

fn init_tracing(json: bool) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());

    let json_layer = json.then(|| tracing_subscriber::fmt::layer().json().flatten_event(true));
    let text_layer = (!json).then(tracing_subscriber::fmt::layer);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .init();
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate { action } => match action {
            MigrateAction::Run => commands::migrate::run().await?,
            MigrateAction::Status => commands::migrate::status().await?,
        },
        Commands::Seed { file } => commands::seed::fixtures(file.as_deref()).await?,
        Commands::Check => commands::check::run().await?,
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_migrate_status() {
        let cli = Cli::try_parse_from(["retro-cli", "migrate", "status"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Migrate {
                action: MigrateAction::Status
            }
        ));
        assert!(!cli.json_logs);
    }

    #[test]
    fn test_parse_seed_file() {
        let cli = Cli::try_parse_from(["retro-cli", "seed", "--file", "fixtures.yaml"]).unwrap();
        match cli.command {
            Commands::Seed { file } => assert_eq!(file, Some(PathBuf::from("fixtures.yaml"))),
            _ => panic!("expected seed"),
        }
    }

    #[test]
    fn test_seed_file_is_optional() {
        let cli = Cli::try_parse_from(["retro-cli", "seed"]).unwrap();
        assert!(matches!(cli.command, Commands::Seed { file: None }));
    }

    #[test]
    fn test_json_logs_is_global() {
        let cli = Cli::try_parse_from(["retro-cli", "check", "--json-logs"]).unwrap();
        assert!(cli.json_logs);
        assert!(matches!(cli.command, Commands::Check));
    }

    #[test]
    fn test_migrate_requires_action() {
        assert!(Cli::try_parse_from(["retro-cli", "migrate"]).is_err());
    }

    #[test]
    fn test_default_filter_enables_command_logs() {
        use tracing::Level;
        use tracing_subscriber::EnvFilter;

        let subscriber = tracing_subscriber::registry().with(EnvFilter::new(DEFAULT_LOG_FILTER));
        tracing::subscriber::with_default(subscriber, || {
            assert!(tracing::enabled!(target: "retro_cli::commands::migrate", Level::INFO));
            assert!(tracing::enabled!(target: "retro_shop_db::migrate", Level::INFO));
            assert!(!tracing::enabled!(target: "retro_cli::commands::migrate", Level::DEBUG));
            assert!(!tracing::enabled!(target: "sqlx::query", Level::INFO));
        });
    }
}
