use super::{
    AuthToken, AuthTokenValue, User, UserAuthCredentials, UserDirectory, UserStore,
    UsernamePasswordCredentials,
};
use anyhow::{bail, Context, Result};
use std::{sync::Arc, time::SystemTime};
use tracing::{info, warn};

pub struct UserManager {
    user_store: Arc<dyn UserStore>,
}

impl UserManager {
    pub fn new(user_store: Arc<dyn UserStore>) -> Self {
        Self { user_store }
    }

    pub fn add_user<T: AsRef<str>>(&self, user_handle: T, display_name: T) -> Result<String> {
        let user_handle = user_handle.as_ref();
        if user_handle.is_empty() {
            bail!("The user handle cannot be empty.")
        }
        if self.user_store.get_user_id(user_handle)?.is_some() {
            bail!("User handle already exists.");
        }
        self.user_store
            .create_user(user_handle, display_name.as_ref())
    }

    pub fn get_user_by_handle(&self, user_handle: &str) -> Result<Option<User>> {
        match self.user_store.get_user_id(user_handle)? {
            Some(user_id) => self.user_store.get_user(&user_id),
            None => Ok(None),
        }
    }

    pub fn get_all_users(&self) -> Result<Vec<User>> {
        self.user_store.get_all_users()
    }

    pub fn rename_user(&self, user_handle: &str, display_name: &str) -> Result<()> {
        let user_id = self
            .user_store
            .get_user_id(user_handle)?
            .with_context(|| format!("User with handle {} not found.", user_handle))?;
        self.user_store.set_display_name(&user_id, display_name)?;
        Ok(())
    }

    /// Sets the password of a user, replacing the previous one if any.
    pub fn set_password(&self, user_handle: &str, password: &str) -> Result<()> {
        if password.is_empty() {
            bail!("The password cannot be empty.");
        }
        let mut credentials = self
            .user_store
            .get_user_auth_credentials(user_handle)?
            .with_context(|| format!("User with handle {} not found.", user_handle))?;
        credentials.username_password = Some(UsernamePasswordCredentials::new(
            &credentials.user_id,
            password,
        )?);
        self.user_store.update_user_auth_credentials(credentials)
    }

    pub fn has_password(&self, user_handle: &str) -> Result<bool> {
        Ok(self
            .user_store
            .get_user_auth_credentials(user_handle)?
            .map(|c| c.username_password.is_some())
            .unwrap_or(false))
    }

    /// Checks handle and password and issues a new session token.
    /// Returns Ok(None) if the user doesn't exist, has no password or the
    /// password doesn't match.
    pub fn login(&self, user_handle: &str, password: &str) -> Result<Option<AuthToken>> {
        let credentials = match self.user_store.get_user_auth_credentials(user_handle)? {
            Some(UserAuthCredentials {
                username_password: Some(credentials),
                ..
            }) => credentials,
            _ => {
                warn!("Login attempt for unknown handle {}", user_handle);
                return Ok(None);
            }
        };
        if !credentials.verify(password)? {
            warn!("Wrong password for user {}", user_handle);
            return Ok(None);
        }

        let token = AuthToken {
            user_id: credentials.user_id,
            value: AuthTokenValue::generate(),
            created: SystemTime::now(),
            last_used: None,
        };
        self.user_store.add_user_auth_token(token.clone())?;
        info!("User {} logged in", user_handle);
        Ok(Some(token))
    }

    pub fn get_auth_token(&self, value: &AuthTokenValue) -> Result<Option<AuthToken>> {
        self.user_store.get_user_auth_token(value)
    }

    pub fn touch_auth_token(&self, value: &AuthTokenValue) -> Result<()> {
        self.user_store
            .update_user_auth_token_last_used_timestamp(value)
    }

    pub fn logout(&self, value: &AuthTokenValue) -> Result<Option<AuthToken>> {
        self.user_store.delete_user_auth_token(value)
    }
}

impl UserDirectory for UserManager {
    fn get_display_name(&self, user_id: &str) -> Result<Option<String>> {
        self.user_store.get_display_name(user_id)
    }
}
