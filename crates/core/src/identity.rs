//! Demo identity classification.
//!
//! A demo identity is an ephemeral, zero-signup shopper whose whole data graph
//! lives in process memory. Demo identities are recognised purely from their
//! email address or user id:
//!
//! - generated addresses look like `demo+<token>@bazaar.local` and map to the
//!   user id `demo-<token>`
//! - the fixed legacy address `demo@bazaar.local` (any casing) maps to
//!   `demo-legacy`
//!
//! Everything here is pure; no I/O and no shared state.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::UserId;

/// Domain reserved for demo addresses.
pub const DEMO_EMAIL_DOMAIN: &str = "bazaar.local";

/// Local-part prefix of generated demo addresses.
pub const DEMO_EMAIL_PREFIX: &str = "demo+";

/// The fixed legacy demo address.
pub const LEGACY_DEMO_EMAIL: &str = "demo@bazaar.local";

/// Prefix carried by every demo user id (and every demo-owned record id).
pub const DEMO_ID_PREFIX: &str = "demo-";

/// Token reserved for the legacy identity; generated addresses may not use it.
const LEGACY_TOKEN: &str = "legacy";

/// User id of the legacy demo identity.
pub const LEGACY_DEMO_USER_ID: &str = "demo-legacy";

/// Errors raised by identity derivation.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentityError {
    /// The input is not a demo address or demo id.
    #[error("not a demo identity: {0}")]
    InvalidIdentity(String),
}

/// Which storage path an identity's data lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityKind {
    /// Durable account backed by the database.
    Persisted,
    /// Ephemeral in-memory demo session.
    Demo,
}

impl IdentityKind {
    /// Classify a user id.
    #[must_use]
    pub fn of_user_id(user_id: &UserId) -> Self {
        if is_demo_user_id(user_id) {
            Self::Demo
        } else {
            Self::Persisted
        }
    }

    /// Classify an email address.
    #[must_use]
    pub fn of_email(email: &str) -> Self {
        if is_demo_email(email) {
            Self::Demo
        } else {
            Self::Persisted
        }
    }

    /// Whether this is the demo path.
    #[must_use]
    pub const fn is_demo(self) -> bool {
        matches!(self, Self::Demo)
    }

    /// Mint a fresh record id for an entity owned by an identity of this kind.
    ///
    /// Demo records are tagged `demo-<entity>-<uuid>` so they can never be
    /// confused with persisted ones.
    #[must_use]
    pub fn mint_id<T: From<String>>(self, entity: &str) -> T {
        let uuid = Uuid::new_v4();
        match self {
            Self::Persisted => T::from(uuid.to_string()),
            Self::Demo => T::from(format!("{DEMO_ID_PREFIX}{entity}-{uuid}")),
        }
    }
}

const MAX_TOKEN_LEN: usize = 64;

/// Extract the token of a generated demo address, if it is one.
fn generated_token(email: &str) -> Option<&str> {
    let token = email
        .strip_prefix(DEMO_EMAIL_PREFIX)?
        .strip_suffix(DEMO_EMAIL_DOMAIN)?
        .strip_suffix('@')?;
    is_valid_token(token).then_some(token)
}

/// Tokens are limited to characters that survive as both an email local part and an id.
fn is_valid_token(token: &str) -> bool {
    !token.is_empty()
        && token.len() <= MAX_TOKEN_LEN
        && token != LEGACY_TOKEN
        && token
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.'))
}

/// Whether `email` denotes a demo identity.
#[must_use]
pub fn is_demo_email(email: &str) -> bool {
    email.eq_ignore_ascii_case(LEGACY_DEMO_EMAIL) || generated_token(email).is_some()
}

/// Whether `user_id` carries the reserved demo prefix.
#[must_use]
pub fn is_demo_user_id(user_id: &UserId) -> bool {
    user_id.as_str().starts_with(DEMO_ID_PREFIX)
}

/// Derive the demo user id for a demo address.
///
/// Deterministic: the same address always yields the same id.
///
/// # Errors
///
/// Returns `IdentityError::InvalidIdentity` if `email` is not a demo address.
/// Callers should check [`is_demo_email`] first.
pub fn demo_user_id_for(email: &str) -> Result<UserId, IdentityError> {
    if email.eq_ignore_ascii_case(LEGACY_DEMO_EMAIL) {
        return Ok(UserId::new(LEGACY_DEMO_USER_ID));
    }
    generated_token(email)
        .map(|token| UserId::new(format!("{DEMO_ID_PREFIX}{token}")))
        .ok_or_else(|| IdentityError::InvalidIdentity(email.to_owned()))
}

/// Recover the demo address a demo user id was derived from.
///
/// The legacy id maps back to the canonical lower-case legacy address.
///
/// # Errors
///
/// Returns `IdentityError::InvalidIdentity` if `user_id` is not a demo id.
pub fn demo_email_for(user_id: &UserId) -> Result<String, IdentityError> {
    if user_id.as_str() == LEGACY_DEMO_USER_ID {
        return Ok(LEGACY_DEMO_EMAIL.to_owned());
    }
    user_id
        .as_str()
        .strip_prefix(DEMO_ID_PREFIX)
        .filter(|token| is_valid_token(token))
        .map(|token| format!("{DEMO_EMAIL_PREFIX}{token}@{DEMO_EMAIL_DOMAIN}"))
        .ok_or_else(|| IdentityError::InvalidIdentity(user_id.to_string()))
}

/// Generate a fresh demo address for a zero-signup session.
#[must_use]
pub fn new_demo_email() -> String {
    format!("{DEMO_EMAIL_PREFIX}{}@{DEMO_EMAIL_DOMAIN}", Uuid::new_v4())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_legacy_address_is_demo_any_case() {
        assert!(is_demo_email("demo@bazaar.local"));
        assert!(is_demo_email("DEMO@Bazaar.Local"));
        assert_eq!(
            demo_user_id_for("Demo@BAZAAR.local").unwrap().as_str(),
            LEGACY_DEMO_USER_ID
        );
    }

    #[test]
    fn test_generated_address() {
        let email = "demo+abc123@bazaar.local";
        assert!(is_demo_email(email));
        assert_eq!(demo_user_id_for(email).unwrap().as_str(), "demo-abc123");
    }

    #[test]
    fn test_non_demo_addresses() {
        assert!(!is_demo_email("alice@example.com"));
        assert!(!is_demo_email("demo+abc@example.com"));
        assert!(!is_demo_email("demo+@bazaar.local"));
        assert!(!is_demo_email("demo+a@b@bazaar.local"));
        assert!(!is_demo_email("xdemo+abc@bazaar.local"));
        // would collide with the legacy id
        assert!(!is_demo_email("demo+legacy@bazaar.local"));
        assert!(!is_demo_email(""));
    }

    #[test]
    fn test_tokens_outside_the_safe_charset_are_not_demo() {
        for email in [
            "demo+a b@bazaar.local",
            "demo+a\tb@bazaar.local",
            "demo+<x>@bazaar.local",
            "demo+caf\u{e9}@bazaar.local",
        ] {
            assert!(!is_demo_email(email), "{email}");
            assert!(demo_user_id_for(email).is_err());
        }
        let long = format!("demo+{}@bazaar.local", "a".repeat(MAX_TOKEN_LEN + 1));
        assert!(!is_demo_email(&long));
        assert!(demo_email_for(&UserId::new("demo-a b")).is_err());
    }

    #[test]
    fn test_demo_user_id_for_rejects_non_demo() {
        assert_eq!(
            demo_user_id_for("alice@example.com"),
            Err(IdentityError::InvalidIdentity("alice@example.com".to_owned()))
        );
    }

    #[test]
    fn test_is_demo_user_id() {
        assert!(is_demo_user_id(&UserId::new("demo-legacy")));
        assert!(is_demo_user_id(&UserId::new("demo-42")));
        assert!(!is_demo_user_id(&UserId::new("4f1c9a2e-0000")));
    }

    #[test]
    fn test_demo_email_for_inverts_derivation() {
        assert_eq!(
            demo_email_for(&UserId::new("demo-legacy")).unwrap(),
            LEGACY_DEMO_EMAIL
        );
        assert_eq!(
            demo_email_for(&UserId::new("demo-xyz")).unwrap(),
            "demo+xyz@bazaar.local"
        );
        assert!(demo_email_for(&UserId::new("user-1")).is_err());
        assert!(demo_email_for(&UserId::new("demo-")).is_err());
    }

    #[test]
    fn test_new_demo_email_is_demo() {
        let email = new_demo_email();
        assert!(is_demo_email(&email));
        assert_ne!(email, new_demo_email());
    }

    #[test]
    fn test_mint_id() {
        let demo: UserId = IdentityKind::Demo.mint_id("order");
        assert!(demo.as_str().starts_with("demo-order-"));
        let persisted: UserId = IdentityKind::Persisted.mint_id("order");
        assert!(!persisted.as_str().starts_with(DEMO_ID_PREFIX));
    }

    proptest! {
        #[test]
        fn prop_generated_addresses_round_trip(token in "[A-Za-z0-9._-]{1,40}") {
            prop_assume!(token != "legacy");
            let email = format!("demo+{token}@bazaar.local");
            prop_assert!(is_demo_email(&email));
            let first = demo_user_id_for(&email).unwrap();
            let second = demo_user_id_for(&email).unwrap();
            prop_assert_eq!(&first, &second);
            prop_assert!(is_demo_user_id(&first));
            prop_assert_eq!(demo_email_for(&first).unwrap(), email);
        }
    }
}
