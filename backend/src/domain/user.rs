//! User accounts and registration input.
//!
//! A [`User`] is the externally visible account. The password hash lives
//! only on [`NewUser`], on its way into the store, and is never part of any
//! serialised representation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{Error, PasswordHash, RoleId, UserId};

/// Longest accepted username, in characters.
pub const MAX_USERNAME_CHARS: usize = 100;
/// Longest accepted email address, in characters.
pub const MAX_EMAIL_CHARS: usize = 255;
/// Shortest accepted password, in characters.
pub const MIN_PASSWORD_CHARS: usize = 3;
/// Longest accepted password, in characters.
pub const MAX_PASSWORD_CHARS: usize = 72;

/// Validation failures raised by [`Registration::new`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationValidationError {
    #[error("username must not be empty")]
    EmptyUsername,
    #[error("username must be at most {max} characters")]
    UsernameTooLong { max: usize },
    #[error("email must be a valid address of at most {max} characters")]
    InvalidEmail { max: usize },
    #[error("password must be between {min} and {max} characters")]
    InvalidPassword { min: usize, max: usize },
}

impl From<RegistrationValidationError> for Error {
    fn from(value: RegistrationValidationError) -> Self {
        Self::invalid_request(value.to_string())
    }
}

/// Stored user account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub role_id: RoleId,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Validated registration request. The password is still plaintext here.
#[derive(Clone, PartialEq, Eq)]
pub struct Registration {
    username: String,
    email: String,
    password: String,
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Registration {
    /// Validate registration fields.
    ///
    /// # Examples
    /// ```
    /// use social_backend::domain::Registration;
    ///
    /// assert!(Registration::new("ada", "ada@example.com", "s3cret").is_ok());
    /// assert!(Registration::new("ada", "not-an-email", "s3cret").is_err());
    /// ```
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self, RegistrationValidationError> {
        let username = username.into().trim().to_owned();
        let email = email.into().trim().to_owned();
        let password = password.into();

        if username.is_empty() {
            return Err(RegistrationValidationError::EmptyUsername);
        }
        if username.chars().count() > MAX_USERNAME_CHARS {
            return Err(RegistrationValidationError::UsernameTooLong {
                max: MAX_USERNAME_CHARS,
            });
        }
        if !is_plausible_email(&email) {
            return Err(RegistrationValidationError::InvalidEmail {
                max: MAX_EMAIL_CHARS,
            });
        }
        let password_chars = password.chars().count();
        if !(MIN_PASSWORD_CHARS..=MAX_PASSWORD_CHARS).contains(&password_chars) {
            return Err(RegistrationValidationError::InvalidPassword {
                min: MIN_PASSWORD_CHARS,
                max: MAX_PASSWORD_CHARS,
            });
        }

        Ok(Self {
            username,
            email,
            password,
        })
    }

    /// Requested username.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Requested email address.
    pub fn email(&self) -> &str {
        &self.email
    }

    /// Plaintext password, to be hashed before storage.
    pub fn password(&self) -> &str {
        &self.password
    }
}

fn is_plausible_email(email: &str) -> bool {
    if email.chars().count() > MAX_EMAIL_CHARS || email.chars().any(char::is_whitespace) {
        return false;
    }
    let mut parts = email.split('@');
    matches!(
        (parts.next(), parts.next(), parts.next()),
        (Some(local), Some(domain), None) if !local.is_empty() && !domain.is_empty()
    )
}

/// Account ready for insertion: validated fields plus the password hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: PasswordHash,
    pub role_id: RoleId,
}
