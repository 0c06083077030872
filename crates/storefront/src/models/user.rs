//! User domain types.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bazaar_core::{Email, Role, UserId};

/// Display name used on orders when a user has no name on file.
pub const FALLBACK_DISPLAY_NAME: &str = "Customer";

/// Display name given to demo shoppers.
pub const DEMO_FIRST_NAME: &str = "Demo";
/// Surname given to demo shoppers.
pub const DEMO_LAST_NAME: &str = "User";

/// A shopper or administrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique user ID. Demo users carry the `demo-` prefix.
    pub id: UserId,
    /// Login email address.
    pub email: Email,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub profile_image: Option<String>,
    /// Default shipping address.
    pub address: Option<Address>,
    /// Granted roles. Every user holds at least `USER`.
    pub roles: BTreeSet<Role>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A postal address on a user profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub country: Option<String>,
}

impl User {
    /// Build a fresh persisted shopper with the `USER` role.
    #[must_use]
    pub fn new(id: UserId, email: Email) -> Self {
        let now = Utc::now();
        Self {
            id,
            email,
            first_name: None,
            last_name: None,
            phone: None,
            profile_image: None,
            address: None,
            roles: BTreeSet::from([Role::User]),
            active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Build the synthesized profile of a demo shopper.
    #[must_use]
    pub fn demo(id: UserId, email: Email) -> Self {
        Self {
            first_name: Some(DEMO_FIRST_NAME.to_owned()),
            last_name: Some(DEMO_LAST_NAME.to_owned()),
            ..Self::new(id, email)
        }
    }

    /// Whether the user holds the `ADMIN` role.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.roles.contains(&Role::Admin)
    }

    /// Name printed on orders and reviews.
    ///
    /// Joins the non-blank name parts, falling back to `"Customer"`.
    #[must_use]
    pub fn display_name(&self) -> String {
        let name = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if name.is_empty() {
            FALLBACK_DISPLAY_NAME.to_owned()
        } else {
            name
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn user() -> User {
        User::new(UserId::new("u-1"), Email::parse("a@example.com").unwrap())
    }

    #[test]
    fn test_new_user_has_user_role() {
        let user = user();
        assert!(user.roles.contains(&Role::User));
        assert!(!user.is_admin());
        assert!(user.active);
    }

    #[test]
    fn test_display_name_fallback() {
        let mut user = user();
        assert_eq!(user.display_name(), "Customer");
        user.first_name = Some("  ".to_owned());
        assert_eq!(user.display_name(), "Customer");
        user.first_name = Some("Asha".to_owned());
        assert_eq!(user.display_name(), "Asha");
        user.last_name = Some("Rao".to_owned());
        assert_eq!(user.display_name(), "Asha Rao");
    }

    #[test]
    fn test_demo_profile() {
        let user = User::demo(
            UserId::new("demo-1"),
            Email::parse("demo+1@bazaar.local").unwrap(),
        );
        assert_eq!(user.display_name(), "Demo User");
        assert!(!user.is_admin());
    }
}
