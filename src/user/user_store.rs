use super::auth::{AuthToken, AuthTokenValue, UserAuthCredentials};
use anyhow::Result;

pub trait UserAuthCredentialsStore: Send + Sync {
    /// Returns the user's authentication credentials given the email.
    /// Returns Ok(None) if the user does not exist.
    fn get_user_auth_credentials(&self, email: &str) -> Result<Option<UserAuthCredentials>>;

    /// Replaces the user's credentials, removing the password login when
    /// `email_password` is None.
    fn update_user_auth_credentials(&self, credentials: UserAuthCredentials) -> Result<()>;

    /// Records a login attempt, successful or not.
    fn touch_password_credentials(&self, user_id: usize, succeeded: bool) -> Result<()>;
}

pub trait UserAuthTokenStore: Send + Sync {
    /// Returns Ok(None) if the token does not exist.
    fn get_user_auth_token(&self, token: &AuthTokenValue) -> Result<Option<AuthToken>>;

    /// Deletes an auth token and returns it.
    /// Returns Ok(None) if the token does not exist.
    fn delete_user_auth_token(&self, token: &AuthTokenValue) -> Result<Option<AuthToken>>;

    fn update_user_auth_token_last_used_timestamp(&self, token: &AuthTokenValue) -> Result<()>;

    fn add_user_auth_token(&self, token: AuthToken) -> Result<()>;

    fn get_all_user_auth_tokens(&self, email: &str) -> Result<Vec<AuthToken>>;
}

pub trait UserStore: UserAuthTokenStore + UserAuthCredentialsStore + Send + Sync {
    /// Creates a new user and returns the user id.
    fn create_user(&self, email: &str) -> Result<usize>;

    /// Returns Ok(None) if the user does not exist.
    fn get_user_email(&self, user_id: usize) -> Result<Option<String>>;

    /// Returns Ok(None) if the user does not exist.
    fn get_user_id(&self, email: &str) -> Result<Option<usize>>;

    fn get_all_user_emails(&self) -> Result<Vec<String>>;
}
