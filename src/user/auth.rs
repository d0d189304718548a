//! Password credentials and session tokens

use anyhow::{bail, Result};

use rand::Rng;
use rand_distr::Alphanumeric;
use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;
use std::time::SystemTime;

const TOKEN_LENGTH: usize = 64;

#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Debug)]
pub struct AuthTokenValue(pub String);

#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct AuthToken {
    pub user_id: usize,
    pub created: SystemTime,
    pub last_used: Option<SystemTime>,
    pub value: AuthTokenValue,
}

impl AuthTokenValue {
    pub fn generate() -> AuthTokenValue {
        let rng = rand::rng();
        let random_string: String = rng
            .sample_iter(&Alphanumeric)
            .take(TOKEN_LENGTH)
            .map(char::from)
            .collect();
        AuthTokenValue(random_string)
    }
}

mod play_argon2 {
    use anyhow::{anyhow, Result};
    use argon2::{
        password_hash::{
            rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
        },
        Argon2,
    };

    pub fn generate_b64_salt() -> String {
        SaltString::generate(&mut OsRng).to_string()
    }

    pub fn hash(plain: &[u8], b64_salt: &str) -> Result<String> {
        let salt = SaltString::from_b64(b64_salt).map_err(|err| anyhow!("{}", err))?;
        Ok(Argon2::default()
            .hash_password(plain, &salt)
            .map_err(|err| anyhow!("{}", err))?
            .to_string())
    }

    pub fn verify(plain_pw: &[u8], target_hash: &str) -> Result<bool> {
        let password_hash = PasswordHash::new(target_hash).map_err(|err| anyhow!("{}", err))?;
        Ok(Argon2::default()
            .verify_password(plain_pw, &password_hash)
            .is_ok())
    }
}

/// Hashing scheme a stored password was produced with.
#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Debug)]
pub enum PlayHasher {
    Argon2,
}

impl FromStr for PlayHasher {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "argon2" => Ok(PlayHasher::Argon2),
            _ => bail!("Unknown hasher {}", s),
        }
    }
}

impl fmt::Display for PlayHasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlayHasher::Argon2 => write!(f, "argon2"),
        }
    }
}

impl PlayHasher {
    pub fn generate_b64_salt(&self) -> String {
        match self {
            PlayHasher::Argon2 => play_argon2::generate_b64_salt(),
        }
    }

    pub fn hash(&self, plain: &[u8], b64_salt: &str) -> Result<String> {
        match self {
            PlayHasher::Argon2 => play_argon2::hash(plain, b64_salt),
        }
    }

    /// The argon2 hash string embeds its salt.
    pub fn verify(&self, plain_pw: &str, target_hash: &str) -> Result<bool> {
        match self {
            PlayHasher::Argon2 => play_argon2::verify(plain_pw.as_bytes(), target_hash),
        }
    }
}

#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct EmailPasswordCredentials {
    pub user_id: usize,
    pub salt: String,
    pub hash: String,
    pub hasher: PlayHasher,

    pub created: SystemTime,
    pub last_tried: Option<SystemTime>,
    pub last_used: Option<SystemTime>,
}

impl EmailPasswordCredentials {
    pub fn new(user_id: usize, password: &str) -> Result<Self> {
        let hasher = PlayHasher::Argon2;
        let salt = hasher.generate_b64_salt();
        let hash = hasher.hash(password.as_bytes(), &salt)?;
        Ok(EmailPasswordCredentials {
            user_id,
            salt,
            hash,
            hasher,
            created: SystemTime::now(),
            last_tried: None,
            last_used: None,
        })
    }

    pub fn verify(&self, password: &str) -> Result<bool> {
        self.hasher.verify(password, &self.hash)
    }
}

#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct UserAuthCredentials {
    pub user_id: usize,
    pub email_password: Option<EmailPasswordCredentials>,
}
