use super::auth::CredentialsHasher;
use super::{AuthToken, AuthTokenValue, FullUserStore, UserAuthCredentials};
use anyhow::{bail, Context, Result};
use std::{sync::Arc, time::SystemTime};

/// Account and session workflows on top of the user store.
pub struct UserManager {
    user_store: Arc<dyn FullUserStore>,
}

impl UserManager {
    pub fn new(user_store: Arc<dyn FullUserStore>) -> Self {
        Self { user_store }
    }

    pub fn add_user<T: AsRef<str>>(&self, user_handle: T) -> Result<usize> {
        let user_handle = user_handle.as_ref();
        if user_handle.is_empty() {
            bail!("The user handle cannot be empty.")
        }
        if self.user_store.get_user_id(user_handle)?.is_some() {
            bail!("User handle already exists.");
        }
        self.user_store.create_user(user_handle)
    }

    fn hashed_credentials(user_id: usize, password: &str) -> Result<UserAuthCredentials> {
        let hasher = CredentialsHasher::Argon2;
        let salt = hasher.generate_b64_salt();
        let hash = hasher.hash(password.as_bytes(), &salt)?;
        Ok(UserAuthCredentials {
            user_id,
            salt,
            hash,
            hasher,
            created: SystemTime::now(),
            last_used: None,
        })
    }

    pub fn create_password_credentials(&self, user_handle: &str, password: &str) -> Result<()> {
        if self
            .user_store
            .get_user_auth_credentials(user_handle)?
            .is_some()
        {
            bail!(
                "User with handle {} already has password credentials. Maybe you want to modify them?",
                user_handle
            );
        }
        let user_id = self
            .user_store
            .get_user_id(user_handle)?
            .with_context(|| format!("User with handle {} not found.", user_handle))?;
        self.user_store
            .set_user_auth_credentials(&Self::hashed_credentials(user_id, password)?)
    }

    pub fn update_password_credentials(&self, user_handle: &str, password: &str) -> Result<()> {
        let credentials = self
            .user_store
            .get_user_auth_credentials(user_handle)?
            .with_context(|| {
                format!(
                    "Cannot update password of user with handle {} since it never had one.",
                    user_handle
                )
            })?;
        self.user_store
            .set_user_auth_credentials(&Self::hashed_credentials(credentials.user_id, password)?)
    }

    /// Checks a password against the stored credentials.
    /// Returns Ok(Some(user_id)) on success, Ok(None) when the user does not
    /// exist, has no credentials, or the password is wrong.
    pub fn verify_password(&self, user_handle: &str, password: &str) -> Result<Option<usize>> {
        let Some(credentials) = self.user_store.get_user_auth_credentials(user_handle)? else {
            return Ok(None);
        };
        if credentials.hasher.verify(password, &credentials.hash)? {
            Ok(Some(credentials.user_id))
        } else {
            Ok(None)
        }
    }

    pub fn generate_auth_token(&self, user_id: usize) -> Result<AuthToken> {
        let token = AuthToken {
            user_id,
            value: AuthTokenValue::generate(),
            created: SystemTime::now(),
            last_used: None,
        };
        self.user_store.add_user_auth_token(token.clone())?;
        Ok(token)
    }

    pub fn get_auth_token(&self, value: &AuthTokenValue) -> Result<Option<AuthToken>> {
        self.user_store.get_user_auth_token(value)
    }

    pub fn touch_auth_token(&self, value: &AuthTokenValue) -> Result<()> {
        self.user_store
            .update_user_auth_token_last_used_timestamp(value)
    }

    /// Deletes an auth token, enforcing that the requesting user owns it.
    pub fn delete_auth_token(&self, user_id: usize, token_value: &AuthTokenValue) -> Result<()> {
        match self.user_store.delete_user_auth_token(token_value)? {
            Some(removed) if removed.user_id == user_id => Ok(()),
            Some(removed) => {
                // Not the owner, put it back.
                self.user_store.add_user_auth_token(removed.clone())?;
                bail!(
                    "Tried to delete auth token of user {}, but the authenticated user {} is not its owner.",
                    removed.user_id,
                    user_id
                )
            }
            None => bail!("Auth token not found"),
        }
    }

    pub fn prune_unused_auth_tokens(&self, unused_for_days: u64) -> Result<usize> {
        self.user_store.prune_unused_auth_tokens(unused_for_days)
    }

    pub fn get_all_user_handles(&self) -> Result<Vec<String>> {
        self.user_store.get_all_user_handles()
    }
}
