use super::{
    AuthToken, AuthTokenValue, EmailPasswordCredentials, UserAuthCredentials, UserStore,
};
use anyhow::{bail, Context, Result};
use std::time::SystemTime;
use tracing::{debug, info, warn};

pub struct UserManager {
    user_store: Box<dyn UserStore>,
}

impl UserManager {
    pub fn new(user_store: Box<dyn UserStore>) -> Self {
        Self { user_store }
    }

    pub fn add_user<T: AsRef<str>>(&self, email: T) -> Result<usize> {
        let email = email.as_ref().trim();
        if email.is_empty() {
            bail!("The user email cannot be empty.")
        }
        if !email.contains('@') {
            bail!("{} is not an email address.", email)
        }
        if self.user_store.get_user_id(email)?.is_some() {
            bail!("User email already exists.");
        }

        let user_id = self.user_store.create_user(email)?;
        info!("Created user {} with id {}", email, user_id);
        Ok(user_id)
    }

    pub fn get_user_id(&self, email: &str) -> Result<Option<usize>> {
        self.user_store.get_user_id(email)
    }

    pub fn get_user_email(&self, user_id: usize) -> Result<Option<String>> {
        self.user_store.get_user_email(user_id)
    }

    /// Resolves a session token, recording its use.
    pub fn get_auth_token(&self, value: &AuthTokenValue) -> Result<Option<AuthToken>> {
        let token = self.user_store.get_user_auth_token(value)?;
        if token.is_some() {
            self.user_store
                .update_user_auth_token_last_used_timestamp(value)?;
        }
        Ok(token)
    }

    pub fn generate_auth_token(&self, credentials: &UserAuthCredentials) -> Result<AuthToken> {
        let token = AuthToken {
            user_id: credentials.user_id,
            value: AuthTokenValue::generate(),
            created: SystemTime::now(),
            last_used: None,
        };
        self.user_store.add_user_auth_token(token.clone())?;
        Ok(token)
    }

    /// Checks an email and password pair and issues a new session token.
    /// Returns Ok(None) when the email is unknown, has no password login,
    /// or the password does not match.
    pub fn login(&self, email: &str, password: &str) -> Result<Option<AuthToken>> {
        let Some(credentials) = self.user_store.get_user_auth_credentials(email)? else {
            debug!("login() unknown email {}", email);
            return Ok(None);
        };
        let Some(password_credentials) = &credentials.email_password else {
            debug!("login() user {} has no password login", credentials.user_id);
            return Ok(None);
        };

        let verified = password_credentials.verify(password)?;
        self.user_store
            .touch_password_credentials(credentials.user_id, verified)?;
        if !verified {
            warn!("Failed login attempt for user {}", credentials.user_id);
            return Ok(None);
        }
        self.generate_auth_token(&credentials).map(Some)
    }

    pub fn create_password_credentials(&self, email: &str, password: &str) -> Result<()> {
        let user_id = self
            .user_store
            .get_user_id(email)?
            .with_context(|| format!("User with email {} not found.", email))?;

        let mut credentials = self
            .user_store
            .get_user_auth_credentials(email)?
            .unwrap_or(UserAuthCredentials {
                user_id,
                email_password: None,
            });
        if credentials.email_password.is_some() {
            bail!(
                "User with email {} already has a password login. Maybe you want to modify it?",
                email
            );
        }
        credentials.email_password = Some(EmailPasswordCredentials::new(user_id, password)?);
        self.user_store.update_user_auth_credentials(credentials)
    }

    pub fn update_password_credentials(&self, email: &str, password: &str) -> Result<()> {
        let mut credentials = self
            .user_store
            .get_user_auth_credentials(email)?
            .with_context(|| format!("User with email {} not found.", email))?;
        if credentials.email_password.is_none() {
            bail!(
                "Cannot update password of user with email {} since it never had one.",
                email
            );
        }
        credentials.email_password = Some(EmailPasswordCredentials::new(
            credentials.user_id,
            password,
        )?);
        self.user_store.update_user_auth_credentials(credentials)
    }

    pub fn delete_password_credentials(&self, email: &str) -> Result<()> {
        let mut credentials = self
            .user_store
            .get_user_auth_credentials(email)?
            .with_context(|| format!("User with email {} not found.", email))?;
        credentials.email_password = None;
        self.user_store.update_user_auth_credentials(credentials)
    }

    pub fn get_user_credentials(&self, email: &str) -> Result<Option<UserAuthCredentials>> {
        self.user_store.get_user_auth_credentials(email)
    }

    pub fn delete_auth_token(&self, user_id: usize, token_value: &AuthTokenValue) -> Result<()> {
        let Some(token) = self.user_store.get_user_auth_token(token_value)? else {
            bail!("Did not find auth token {}", token_value.0);
        };
        if token.user_id != user_id {
            bail!(
                "Tried to delete auth token {}, but the authenticated user {} was not the owner {} of the token.",
                token_value.0,
                user_id,
                token.user_id
            );
        }
        self.user_store.delete_user_auth_token(token_value)?;
        Ok(())
    }

    pub fn get_user_tokens(&self, email: &str) -> Result<Vec<AuthToken>> {
        self.user_store.get_all_user_auth_tokens(email)
    }

    pub fn get_all_user_emails(&self) -> Result<Vec<String>> {
        self.user_store.get_all_user_emails()
    }
}
