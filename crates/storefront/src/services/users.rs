//! User service: who is calling, demo login, profile edits.

use chrono::Utc;
use serde::Deserialize;
use tracing::{info, instrument};

use bazaar_core::identity::{is_demo_email, new_demo_email};
use bazaar_core::{Email, IdentityKind, ParseStatusError, Role, UserId};

use super::{ServiceError, require_admin};
use crate::models::{Address, User};
use crate::store::{Page, PageRequest, Storage};

/// Profile edits. Blank or missing fields leave the current value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub profile_image: Option<String>,
    pub address: Option<Address>,
}

impl ProfileUpdate {
    fn apply(self, user: &mut User) {
        fn set(field: &mut Option<String>, value: Option<String>) {
            if let Some(value) = value.filter(|v| !v.trim().is_empty()) {
                *field = Some(value);
            }
        }
        set(&mut user.first_name, self.first_name);
        set(&mut user.last_name, self.last_name);
        set(&mut user.phone, self.phone);
        set(&mut user.profile_image, self.profile_image);
        if let Some(address) = self.address {
            user.address = Some(address);
        }
        user.updated_at = Utc::now();
    }
}

/// User operations.
pub struct UserService<'a> {
    storage: &'a Storage,
}

impl<'a> UserService<'a> {
    #[must_use]
    pub const fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Resolve an authenticated email to its user.
    ///
    /// Demo addresses resolve to their session profile, creating the session
    /// on first sight. Anything else must be a registered account.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Validation` for a malformed address and
    /// `ServiceError::NotFound` for an unknown account.
    #[instrument(skip(self))]
    pub async fn current_user(&self, email: &str) -> Result<User, ServiceError> {
        if is_demo_email(email) {
            let session = self.storage.demo_sessions().open(email).await?;
            return Ok(session.profile());
        }

        let email = Email::parse(email.trim())?;
        let user = self
            .storage
            .persisted()
            .find_user_by_email(&email)
            .await?
            .ok_or_else(|| ServiceError::not_found("user", &email))?;
        if !user.active {
            return Err(ServiceError::Forbidden("account is disabled".to_owned()));
        }
        Ok(user)
    }

    /// Start a fresh zero-signup demo session.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Demo` if the generated identity is rejected.
    #[instrument(skip(self))]
    pub async fn demo_login(&self) -> Result<User, ServiceError> {
        let email = new_demo_email();
        let session = self.storage.demo_sessions().open(&email).await?;
        info!(user_id = %session.user_id(), "Demo session started");
        Ok(session.profile())
    }

    /// Edit the caller's profile.
    ///
    /// Demo profiles are edited in their session and never persisted.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if storage fails.
    #[instrument(skip(self, user, update), fields(user_id = %user.id))]
    pub async fn update_profile(
        &self,
        user: &User,
        update: ProfileUpdate,
    ) -> Result<User, ServiceError> {
        match IdentityKind::of_user_id(&user.id) {
            IdentityKind::Demo => {
                let session = self.storage.demo_sessions().get_or_create(&user.id).await?;
                let mut profile = session.profile();
                update.apply(&mut profile);
                session.replace_profile(profile.clone());
                Ok(profile)
            }
            IdentityKind::Persisted => {
                let mut profile = user.clone();
                update.apply(&mut profile);
                self.storage.persisted().save_user(&profile).await?;
                Ok(profile)
            }
        }
    }

    // =========================================================================
    // Admin user management
    // =========================================================================

    /// Page through registered accounts. Demo identities are never listed.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Forbidden` for non-admins.
    #[instrument(skip(self, admin), fields(admin_id = %admin.id))]
    pub async fn list_users(
        &self,
        admin: &User,
        page: PageRequest,
    ) -> Result<Page<User>, ServiceError> {
        require_admin(admin)?;
        Ok(self.storage.persisted().list_users(page).await?)
    }

    /// One registered account.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Forbidden` for non-admins and
    /// `ServiceError::NotFound` for unknown or demo ids.
    #[instrument(skip(self, admin), fields(admin_id = %admin.id))]
    pub async fn get_user(&self, admin: &User, user_id: &UserId) -> Result<User, ServiceError> {
        require_admin(admin)?;
        self.storage
            .persisted()
            .find_user(user_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("user", user_id))
    }

    /// Enable or disable an account. Disabled accounts can no longer act.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Forbidden` for non-admins,
    /// `ServiceError::NotFound` for unknown ids and
    /// `ServiceError::InvalidState` when an admin tries to disable themselves.
    #[instrument(skip(self, admin), fields(admin_id = %admin.id))]
    pub async fn set_active(
        &self,
        admin: &User,
        user_id: &UserId,
        active: bool,
    ) -> Result<User, ServiceError> {
        let mut user = self.get_user(admin, user_id).await?;
        if !active && user.id == admin.id {
            return Err(ServiceError::InvalidState(
                "administrators cannot disable their own account".to_owned(),
            ));
        }
        if user.active != active {
            user.active = active;
            user.updated_at = Utc::now();
            self.storage.persisted().save_user(&user).await?;
            info!(user_id = %user.id, active, "Account status changed");
        }
        Ok(user)
    }

    /// Replace an account's roles with `role`. `USER` is always kept.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Validation` for an unknown role,
    /// `ServiceError::Forbidden` for non-admins,
    /// `ServiceError::NotFound` for unknown ids and
    /// `ServiceError::InvalidState` when an admin tries to drop their own admin role.
    #[instrument(skip(self, admin), fields(admin_id = %admin.id))]
    pub async fn set_role(
        &self,
        admin: &User,
        user_id: &UserId,
        role: &str,
    ) -> Result<User, ServiceError> {
        let role: Role = role
            .parse()
            .map_err(|err: ParseStatusError| ServiceError::Validation(err.to_string()))?;
        let mut user = self.get_user(admin, user_id).await?;
        if role != Role::Admin && user.id == admin.id {
            return Err(ServiceError::InvalidState(
                "administrators cannot revoke their own admin role".to_owned(),
            ));
        }
        user.roles = [Role::User, role].into_iter().collect();
        user.updated_at = Utc::now();
        self.storage.persisted().save_user(&user).await?;
        info!(user_id = %user.id, %role, "Account role changed");
        Ok(user)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use bazaar_core::UserId;

    use super::*;

    #[test]
    fn test_blank_fields_are_ignored() {
        let mut user = User::new(UserId::new("u-1"), Email::parse("a@example.com").unwrap());
        user.first_name = Some("Asha".to_owned());

        ProfileUpdate {
            first_name: Some("   ".to_owned()),
            last_name: Some("Rao".to_owned()),
            ..ProfileUpdate::default()
        }
        .apply(&mut user);

        assert_eq!(user.first_name.as_deref(), Some("Asha"));
        assert_eq!(user.last_name.as_deref(), Some("Rao"));
    }
}
