//! Cantina CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! cantina-cli migrate
//!
//! # Give every unowned product to the first admin
//! cantina-cli products assign-orphans
//!
//! # Make an existing user an admin (effective at their next login)
//! cantina-cli users promote -e admin@example.com
//!
//! # Log in as an admin and log the profit summary every 30 seconds
//! cantina-cli watch-profit -e admin@example.com --interval 30
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::time::Duration;

use clap::{Parser, Subcommand};
use secrecy::SecretString;

mod commands;
mod poller;

#[derive(Parser)]
#[command(name = "cantina-cli")]
#[command(author, version, about = "Cantina CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage products
    Products {
        #[command(subcommand)]
        action: ProductAction,
    },
    /// Manage users
    Users {
        #[command(subcommand)]
        action: UserAction,
    },
    /// Poll the admin profit summary until Ctrl-C
    WatchProfit {
        /// Server base URL
        #[arg(long, env = "CANTINA_URL", default_value = "http://127.0.0.1:3000")]
        url: String,

        /// Admin email or war name
        #[arg(short, long)]
        email: String,

        /// Admin password
        #[arg(long, env = "CANTINA_PASSWORD", hide_env_values = true)]
        password: String,

        /// Seconds between polls
        #[arg(short, long, default_value_t = 30)]
        interval: u64,
    },
}

#[derive(Subcommand)]
enum ProductAction {
    /// Assign every product without an owner to the first admin
    AssignOrphans,
}

#[derive(Subcommand)]
enum UserAction {
    /// Grant admin rights to an existing user
    Promote {
        /// User email address
        #[arg(short, long)]
        email: String,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Products { action } => match action {
            ProductAction::AssignOrphans => {
                commands::products::assign_orphans().await?;
            }
        },
        Commands::Users { action } => match action {
            UserAction::Promote { email } => {
                commands::users::promote(&email).await?;
            }
        },
        Commands::WatchProfit {
            url,
            email,
            password,
            interval,
        } => {
            commands::watch::watch_profit(
                &url,
                &email,
                &SecretString::from(password),
                Duration::from_secs(interval.max(1)),
            )
            .await?;
        }
    }
    Ok(())
}
