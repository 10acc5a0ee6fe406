//! JWT claims for access, refresh and password-reset tokens.

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
#[cfg(any(feature = "issuer", test))]
use serde::Serialize;
use uuid::Uuid;

/// `purpose` claim carried by password-reset tokens.
pub const PASSWORD_RESET_PURPOSE: &str = "password_reset";

/// Errors returned by the `validate_*` functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("invalid signature")]
    InvalidSignature,
    #[error("token expired")]
    Expired,
    #[error("malformed token")]
    Malformed,
    #[error("unexpected token type")]
    WrongType,
}

/// Discriminates the two session credentials so one cannot stand in for the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[cfg_attr(any(feature = "issuer", test), derive(Serialize))]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    Access,
    Refresh,
}

/// Claims of the short-lived bearer token.
///
/// | Field | Meaning |
/// |-------|---------|
/// | `sub` | user id |
/// | `username`, `email`, `is_admin` | identity snapshot at issue time |
/// | `token_type` | always `access` |
/// | `jti` | unique token id |
/// | `iat`, `exp` | seconds since epoch |
#[derive(Debug, Clone, Deserialize)]
#[cfg_attr(any(feature = "issuer", test), derive(Serialize))]
pub struct AccessClaims {
    pub sub: Uuid,
    pub username: String,
    pub email: String,
    pub is_admin: bool,
    pub token_type: TokenType,
    pub jti: Uuid,
    pub iat: i64,
    pub exp: i64,
}

/// Claims of the long-lived refresh token. `jti` keys the revocation table.
#[derive(Debug, Clone, Deserialize)]
#[cfg_attr(any(feature = "issuer", test), derive(Serialize))]
pub struct RefreshClaims {
    pub sub: Uuid,
    pub token_type: TokenType,
    pub jti: Uuid,
    pub iat: i64,
    pub exp: i64,
}

/// Claims of the token handed out after a password-reset OTP is verified.
#[derive(Debug, Clone, Deserialize)]
#[cfg_attr(any(feature = "issuer", test), derive(Serialize))]
pub struct PasswordResetClaims {
    pub sub: Uuid,
    pub email: String,
    pub purpose: String,
    pub iat: i64,
    pub exp: i64,
}

// ── Core decode (private) ────────────────────────────────────────────────

/// HS256 with `exp` and `sub` required. No leeway: expiry is exact.
fn decode_claims<T: DeserializeOwned>(token: &str, secret: &str) -> Result<T, TokenError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    validation.leeway = 0;
    validation.set_required_spec_claims(&["exp", "sub"]);

    let data = decode::<T>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
        jsonwebtoken::errors::ErrorKind::InvalidSignature => TokenError::InvalidSignature,
        _ => TokenError::Malformed,
    })?;

    Ok(data.claims)
}

// ── Public: validation ───────────────────────────────────────────────────

pub fn validate_access_token(token: &str, secret: &str) -> Result<AccessClaims, TokenError> {
    let claims: AccessClaims = decode_claims(token, secret)?;
    if claims.token_type != TokenType::Access {
        return Err(TokenError::WrongType);
    }
    Ok(claims)
}

pub fn validate_refresh_token(token: &str, secret: &str) -> Result<RefreshClaims, TokenError> {
    let claims: RefreshClaims = decode_claims(token, secret)?;
    if claims.token_type != TokenType::Refresh {
        return Err(TokenError::WrongType);
    }
    Ok(claims)
}

pub fn validate_password_reset_token(
    token: &str,
    secret: &str,
) -> Result<PasswordResetClaims, TokenError> {
    let claims: PasswordResetClaims = decode_claims(token, secret)?;
    if claims.purpose != PASSWORD_RESET_PURPOSE {
        return Err(TokenError::WrongType);
    }
    Ok(claims)
}

// ── Feature-gated: issuing ───────────────────────────────────────────────

/// Sign any claims struct with HS256.
#[cfg(any(feature = "issuer", test))]
pub fn sign<T: Serialize>(claims: &T, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
    jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        claims,
        &jsonwebtoken::EncodingKey::from_secret(secret.as_bytes()),
    )
}
