//! User account rules.

use serde::{Deserialize, Serialize};

/// Minimum accepted password length in characters.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Capability level of an account. Stored as the `is_admin` flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Customer,
    Admin,
}

impl UserRole {
    pub fn from_is_admin(is_admin: bool) -> Self {
        if is_admin { Self::Admin } else { Self::Customer }
    }

    pub fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }
}

/// Errors returned by the credential validators.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CredentialError {
    #[error("a valid email address is required")]
    InvalidEmail,
    #[error("password must be at least {MIN_PASSWORD_LEN} characters")]
    PasswordTooShort,
    #[error("username is required")]
    MissingUsername,
}

/// Trim and lowercase an email address so lookups are case-insensitive.
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Normalize and minimally validate an email address (`local@domain.tld`).
pub fn parse_email(raw: &str) -> Result<String, CredentialError> {
    let email = normalize_email(raw);
    let Some((local, domain)) = email.split_once('@') else {
        return Err(CredentialError::InvalidEmail);
    };
    let valid = !local.is_empty()
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && domain.contains('.')
        && !domain.contains('@')
        && !email.contains(char::is_whitespace);
    if valid {
        Ok(email)
    } else {
        Err(CredentialError::InvalidEmail)
    }
}

pub fn validate_password(password: &str) -> Result<(), CredentialError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(CredentialError::PasswordTooShort);
    }
    Ok(())
}

pub fn validate_username(username: &str) -> Result<String, CredentialError> {
    let username = username.trim();
    if username.is_empty() {
        return Err(CredentialError::MissingUsername);
    }
    Ok(username.to_owned())
}
