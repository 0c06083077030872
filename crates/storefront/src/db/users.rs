//! User account queries.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::types::Json;

use bazaar_core::{Email, Role, UserId};

use super::{RepositoryError, conflict_on_unique};
use crate::models::{Address, User};
use crate::store::{Page, PageRequest};

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: UserId,
    email: String,
    first_name: Option<String>,
    last_name: Option<String>,
    phone: Option<String>,
    profile_image: Option<String>,
    address: Option<Json<Address>>,
    roles: Vec<String>,
    active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;
        let roles = row
            .roles
            .iter()
            .map(|role| role.parse::<Role>())
            .collect::<Result<BTreeSet<_>, _>>()
            .map_err(|e| RepositoryError::DataCorruption(format!("invalid role: {e}")))?;

        Ok(Self {
            id: row.id,
            email,
            first_name: row.first_name,
            last_name: row.last_name,
            phone: row.phone,
            profile_image: row.profile_image,
            address: row.address.map(|Json(address)| address),
            roles,
            active: row.active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const SELECT_USER: &str = r"
    SELECT id, email, first_name, last_name, phone, profile_image, address,
           roles, active, created_at, updated_at
    FROM bazaar.users
";

/// Get a user by their ID.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
/// Returns `RepositoryError::DataCorruption` if the stored row is invalid.
pub async fn get_by_id(pool: &PgPool, id: &UserId) -> Result<Option<User>, RepositoryError> {
    sqlx::query_as::<_, UserRow>(&format!("{SELECT_USER} WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .map(User::try_from)
        .transpose()
}

/// Get a user by email address, ignoring case.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
/// Returns `RepositoryError::DataCorruption` if the stored row is invalid.
pub async fn get_by_email(pool: &PgPool, email: &Email) -> Result<Option<User>, RepositoryError> {
    sqlx::query_as::<_, UserRow>(&format!("{SELECT_USER} WHERE LOWER(email) = $1"))
        .bind(email.lookup_key())
        .fetch_optional(pool)
        .await?
        .map(User::try_from)
        .transpose()
}

/// Every registered user, newest first.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
/// Returns `RepositoryError::DataCorruption` if a stored row is invalid.
pub async fn list(pool: &PgPool, page: PageRequest) -> Result<Page<User>, RepositoryError> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM bazaar.users")
        .fetch_one(pool)
        .await?;

    let items = sqlx::query_as::<_, UserRow>(&format!(
        "{SELECT_USER} ORDER BY created_at DESC, id LIMIT $1 OFFSET $2"
    ))
    .bind(i64::from(page.size))
    .bind(i64::try_from(page.offset()).unwrap_or(i64::MAX))
    .fetch_all(pool)
    .await?
    .into_iter()
    .map(User::try_from)
    .collect::<Result<Vec<_>, _>>()?;

    Ok(Page {
        items,
        page: page.page,
        size: page.size,
        total: u64::try_from(total).unwrap_or_default(),
    })
}

/// Insert or overwrite a user.
///
/// # Errors
///
/// Returns `RepositoryError::Conflict` if the email belongs to another user.
/// Returns `RepositoryError::Database` for other database errors.
pub async fn upsert(pool: &PgPool, user: &User) -> Result<(), RepositoryError> {
    let roles: Vec<String> = user.roles.iter().map(ToString::to_string).collect();

    sqlx::query(
        r"
        INSERT INTO bazaar.users (
            id, email, first_name, last_name, phone, profile_image, address,
            roles, active, created_at, updated_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, NOW())
        ON CONFLICT (id) DO UPDATE SET
            email = EXCLUDED.email,
            first_name = EXCLUDED.first_name,
            last_name = EXCLUDED.last_name,
            phone = EXCLUDED.phone,
            profile_image = EXCLUDED.profile_image,
            address = EXCLUDED.address,
            roles = EXCLUDED.roles,
            active = EXCLUDED.active,
            updated_at = NOW()
        ",
    )
    .bind(&user.id)
    .bind(user.email.as_str())
    .bind(&user.first_name)
    .bind(&user.last_name)
    .bind(&user.phone)
    .bind(&user.profile_image)
    .bind(user.address.as_ref().map(Json))
    .bind(roles)
    .bind(user.active)
    .bind(user.created_at)
    .execute(pool)
    .await
    .map_err(|e| conflict_on_unique(e, "email already exists"))?;

    Ok(())
}
