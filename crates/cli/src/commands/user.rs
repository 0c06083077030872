//! Registered-account management commands.
//!
//! # Usage
//!
//! ```bash
//! # Register a shopper account
//! bazaar-cli user create -e alice@example.com --first-name Alice
//!
//! # Grant or revoke the ADMIN role
//! bazaar-cli user grant-admin -e alice@example.com
//! bazaar-cli user revoke-admin -e alice@example.com
//! ```
//!
//! Demo addresses are rejected: demo identities never reach the database.
//!
//! # Environment Variables
//!
//! - `BAZAAR_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string

use bazaar_core::{Email, EmailError, IdentityKind, Role, UserId};
use bazaar_storefront::db::{PgDatabase, RepositoryError, create_pool};
use bazaar_storefront::models::User;
use bazaar_storefront::store::PersistedStore;
use chrono::Utc;
use thiserror::Error;

/// Errors that can occur during user management.
#[derive(Debug, Error)]
pub enum UserError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Connect(#[from] sqlx::Error),

    /// Repository error.
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// Invalid email.
    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// Demo addresses cannot be registered.
    #[error("Demo addresses cannot be registered: {0}")]
    DemoEmail(String),

    /// No account has this email.
    #[error("No user with email: {0}")]
    NotFound(String),

    /// An account with this email already exists.
    #[error("User already exists with email: {0}")]
    UserExists(String),
}

async fn connect() -> Result<PgDatabase, UserError> {
    let database_url =
        super::database_url().ok_or(UserError::MissingEnvVar("BAZAAR_DATABASE_URL"))?;
    tracing::info!("Connecting to database...");
    let pool = create_pool(&database_url).await?;
    Ok(PgDatabase::new(pool))
}

fn parse_registrable(email: &str) -> Result<Email, UserError> {
    if IdentityKind::of_email(email).is_demo() {
        return Err(UserError::DemoEmail(email.to_owned()));
    }
    Ok(Email::parse(email)?)
}

/// Register a new shopper account.
///
/// # Returns
///
/// The ID of the created user.
///
/// # Errors
///
/// Returns `UserError::UserExists` if the email is taken.
pub async fn create(
    email: &str,
    first_name: Option<String>,
    last_name: Option<String>,
) -> Result<UserId, UserError> {
    let email = parse_registrable(email)?;
    let db = connect().await?;

    if db.find_user_by_email(&email).await?.is_some() {
        return Err(UserError::UserExists(email.to_string()));
    }

    let mut user = User::new(IdentityKind::Persisted.mint_id("user"), email);
    user.first_name = first_name;
    user.last_name = last_name;
    db.save_user(&user).await?;

    tracing::info!(user_id = %user.id, email = %user.email, "User created");
    Ok(user.id)
}

/// Add or remove the `ADMIN` role.
///
/// # Errors
///
/// Returns `UserError::NotFound` if no account has this email.
pub async fn set_admin(email: &str, admin: bool) -> Result<(), UserError> {
    let email = parse_registrable(email)?;
    let db = connect().await?;

    let mut user = db
        .find_user_by_email(&email)
        .await?
        .ok_or_else(|| UserError::NotFound(email.to_string()))?;

    let changed = if admin {
        user.roles.insert(Role::Admin)
    } else {
        user.roles.remove(&Role::Admin)
    };
    if !changed {
        tracing::info!(user_id = %user.id, admin, "Role already in requested state");
        return Ok(());
    }

    user.updated_at = Utc::now();
    db.save_user(&user).await?;
    tracing::info!(user_id = %user.id, admin, "Admin role updated");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_addresses_are_not_registrable() {
        assert!(matches!(
            parse_registrable("demo@bazaar.local"),
            Err(UserError::DemoEmail(_))
        ));
        assert!(matches!(
            parse_registrable("demo+abc@bazaar.local"),
            Err(UserError::DemoEmail(_))
        ));
        assert!(parse_registrable("alice@example.com").is_ok());
        assert!(matches!(
            parse_registrable("not-an-email"),
            Err(UserError::InvalidEmail(_))
        ));
    }
}
