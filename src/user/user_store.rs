use super::auth::{AuthToken, AuthTokenValue, UserAuthCredentials};
use super::user_models::User;
use anyhow::Result;

pub trait UserAuthCredentialsStore: Send + Sync {
    /// Returns the user's authentication credentials given the user handle.
    /// Returns Ok(None) if the user does not exist.
    /// Returns Err if there is a database error.
    fn get_user_auth_credentials(&self, user_handle: &str) -> Result<Option<UserAuthCredentials>>;

    /// Replaces the user's authentication credentials.
    fn update_user_auth_credentials(&self, credentials: UserAuthCredentials) -> Result<()>;
}

pub trait UserAuthTokenStore: Send + Sync {
    /// Returns a user's authentication token given an AuthTokenValue.
    /// Returns Ok(None) if the token does not exist.
    /// Returns Err if there is a database error.
    fn get_user_auth_token(&self, token: &AuthTokenValue) -> Result<Option<AuthToken>>;

    /// Deletes an auth token given the token value.
    /// Returns Ok(None) if the token does not exist.
    fn delete_user_auth_token(&self, token: &AuthTokenValue) -> Result<Option<AuthToken>>;

    /// Updates an auth token with the latest timestamp.
    fn update_user_auth_token_last_used_timestamp(&self, token: &AuthTokenValue) -> Result<()>;

    /// Adds a new auth token.
    fn add_user_auth_token(&self, token: AuthToken) -> Result<()>;
}

/// Read-only view of users used to label notifications.
pub trait UserDirectory: Send + Sync {
    /// Returns the display name of the user with the given id.
    /// Returns Ok(None) if the user does not exist.
    fn get_display_name(&self, user_id: &str) -> Result<Option<String>>;
}

pub trait UserStore:
    UserAuthTokenStore + UserAuthCredentialsStore + UserDirectory + Send + Sync
{
    /// Creates a new user and returns the user id.
    fn create_user(&self, user_handle: &str, display_name: &str) -> Result<String>;

    /// Returns the user with the given id.
    /// Returns Ok(None) if the user does not exist.
    fn get_user(&self, user_id: &str) -> Result<Option<User>>;

    /// Returns a user's id given the user handle.
    /// Returns Ok(None) if the user does not exist.
    fn get_user_id(&self, user_handle: &str) -> Result<Option<String>>;

    /// Returns all users, ordered by handle.
    fn get_all_users(&self) -> Result<Vec<User>>;

    /// Changes the display name of a user.
    /// Returns Ok(false) if the user does not exist.
    fn set_display_name(&self, user_id: &str, display_name: &str) -> Result<bool>;
}
