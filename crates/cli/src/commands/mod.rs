//! CLI subcommands.

pub mod migrate;
pub mod user;

/// Resolve the database URL from `BAZAAR_DATABASE_URL`, then `DATABASE_URL`.
///
/// Loads `.env` first.
pub(crate) fn database_url() -> Option<secrecy::SecretString> {
    dotenvy::dotenv().ok();
    ["BAZAAR_DATABASE_URL", "DATABASE_URL"]
        .into_iter()
        .find_map(|key| std::env::var(key).ok())
        .filter(|url| !url.trim().is_empty())
        .map(secrecy::SecretString::from)
}
