//! Bazaar CLI - Database migrations and account management.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! bazaar-cli migrate
//!
//! # Register a shopper account
//! bazaar-cli user create -e alice@example.com --first-name Alice
//!
//! # Grant / revoke the ADMIN role
//! bazaar-cli user grant-admin -e alice@example.com
//! bazaar-cli user revoke-admin -e alice@example.com
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `user` - Manage registered accounts

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "bazaar-cli")]
#[command(author, version, about = "Bazaar CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage registered accounts
    User {
        #[command(subcommand)]
        action: UserAction,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Register a new shopper account
    Create {
        /// Email address
        #[arg(short, long)]
        email: String,

        /// First name
        #[arg(long)]
        first_name: Option<String>,

        /// Last name
        #[arg(long)]
        last_name: Option<String>,
    },
    /// Grant the ADMIN role
    GrantAdmin {
        /// Email address of the account
        #[arg(short, long)]
        email: String,
    },
    /// Revoke the ADMIN role
    RevokeAdmin {
        /// Email address of the account
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
        Commands::User { action } => match action {
            UserAction::Create {
                email,
                first_name,
                last_name,
            } => {
                let id = commands::user::create(&email, first_name, last_name).await?;
                tracing::info!("Created user {id}");
            }
            UserAction::GrantAdmin { email } => commands::user::set_admin(&email, true).await?,
            UserAction::RevokeAdmin { email } => commands::user::set_admin(&email, false).await?,
        },
    }
    Ok(())
}
