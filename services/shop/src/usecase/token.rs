use anyhow::Context as _;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use bazaar_auth_types::token::{
    AccessClaims, RefreshClaims, TokenType, sign, validate_refresh_token,
};

use crate::domain::repository::{RefreshTokenRepository, UserRepository};
use crate::domain::types::{RefreshTokenRecord, User};
use crate::error::ShopServiceError;

/// Signing secret and lifetimes of the session credentials.
#[derive(Debug, Clone)]
pub struct TokenSettings {
    pub secret: String,
    pub access_ttl_secs: i64,
    pub refresh_ttl_secs: i64,
}

impl TokenSettings {
    /// 15-minute access tokens, 10-day refresh tokens.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            access_ttl_secs: 15 * 60,
            refresh_ttl_secs: 10 * 24 * 60 * 60,
        }
    }
}

/// Freshly issued credentials. The refresh token goes into the cookie only.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub access_expires_at: i64,
    pub refresh_token: String,
    pub refresh_jti: Uuid,
}

pub fn issue_access_token(
    user: &User,
    settings: &TokenSettings,
    now: DateTime<Utc>,
) -> Result<(String, i64), ShopServiceError> {
    let exp = (now + Duration::seconds(settings.access_ttl_secs)).timestamp();
    let claims = AccessClaims {
        sub: user.id,
        username: user.username.clone(),
        email: user.email.clone(),
        is_admin: user.is_admin,
        token_type: TokenType::Access,
        jti: Uuid::new_v4(),
        iat: now.timestamp(),
        exp,
    };
    let token = sign(&claims, &settings.secret).context("sign access token")?;
    Ok((token, exp))
}

/// Sign a refresh token and build the record that must be persisted for it.
pub fn issue_refresh_token(
    user_id: Uuid,
    settings: &TokenSettings,
    now: DateTime<Utc>,
) -> Result<(String, RefreshTokenRecord), ShopServiceError> {
    let expires_at = now + Duration::seconds(settings.refresh_ttl_secs);
    let jti = Uuid::new_v4();
    let claims = RefreshClaims {
        sub: user_id,
        token_type: TokenType::Refresh,
        jti,
        iat: now.timestamp(),
        exp: expires_at.timestamp(),
    };
    let token = sign(&claims, &settings.secret).context("sign refresh token")?;
    let record = RefreshTokenRecord {
        jti,
        user_id,
        expires_at,
        created_at: now,
        revoked_at: None,
    };
    Ok((token, record))
}

/// Issue and persist a new pair for a user who just proved their identity.
pub async fn issue_pair<T: RefreshTokenRepository>(
    tokens: &T,
    user: &User,
    settings: &TokenSettings,
) -> Result<TokenPair, ShopServiceError> {
    let now = Utc::now();
    let (access_token, access_expires_at) = issue_access_token(user, settings, now)?;
    let (refresh_token, record) = issue_refresh_token(user.id, settings, now)?;
    tokens.record(&record).await?;
    Ok(TokenPair {
        access_token,
        access_expires_at,
        refresh_token,
        refresh_jti: record.jti,
    })
}

// ── RefreshToken (rotation) ──────────────────────────────────────────────────

pub struct RefreshTokenUseCase<U: UserRepository, T: RefreshTokenRepository> {
    pub users: U,
    pub tokens: T,
    pub settings: TokenSettings,
}

impl<U: UserRepository, T: RefreshTokenRepository> RefreshTokenUseCase<U, T> {
    /// Exchange a refresh token for a new pair. The presented token is revoked in the
    /// same transaction that records the new one, so each token rotates at most once.
    pub async fn execute(&self, presented: &str) -> Result<TokenPair, ShopServiceError> {
        let claims = validate_refresh_token(presented, &self.settings.secret)
            .map_err(|_| ShopServiceError::InvalidCredential)?;

        let user = self
            .users
            .find_by_id(claims.sub)
            .await?
            .filter(|u| u.is_active)
            .ok_or(ShopServiceError::InvalidCredential)?;

        let now = Utc::now();
        let (refresh_token, record) = issue_refresh_token(user.id, &self.settings, now)?;

        if !self.tokens.rotate(claims.jti, &record, now).await? {
            tracing::warn!(jti = %claims.jti, user_id = %user.id, "refresh token reuse rejected");
            return Err(ShopServiceError::InvalidCredential);
        }

        let (access_token, access_expires_at) = issue_access_token(&user, &self.settings, now)?;
        Ok(TokenPair {
            access_token,
            access_expires_at,
            refresh_token,
            refresh_jti: record.jti,
        })
    }
}

// ── RevokeToken (logout) ─────────────────────────────────────────────────────

pub struct RevokeTokenUseCase<T: RefreshTokenRepository> {
    pub tokens: T,
    pub secret: String,
}

impl<T: RefreshTokenRepository> RevokeTokenUseCase<T> {
    /// Blacklist the caller's refresh token. Invalid, foreign or already revoked tokens
    /// are logged and otherwise ignored.
    pub async fn execute(
        &self,
        user_id: Uuid,
        presented: Option<&str>,
    ) -> Result<(), ShopServiceError> {
        let Some(presented) = presented else {
            tracing::warn!(%user_id, "logout without refresh token");
            return Ok(());
        };

        let claims = match validate_refresh_token(presented, &self.secret) {
            Ok(claims) => claims,
            Err(e) => {
                tracing::warn!(%user_id, error = %e, "logout with invalid refresh token");
                return Ok(());
            }
        };

        if claims.sub != user_id {
            tracing::warn!(%user_id, owner = %claims.sub, "logout with foreign refresh token");
            return Ok(());
        }

        if !self.tokens.revoke(claims.jti, Utc::now()).await? {
            tracing::warn!(%user_id, jti = %claims.jti, "refresh token already revoked");
        }
        Ok(())
    }
}
