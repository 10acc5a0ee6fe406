//! Mock identities for router tests.
//!
//! Mints real HS256 access tokens so requests pass through the production
//! `Identity` extractor unchanged.

use axum::http::{HeaderMap, HeaderValue, header};
use bazaar_auth_types::token::{AccessClaims, TokenType, sign};
use chrono::Utc;
use uuid::Uuid;

/// Configurable identity attached to test requests.
#[derive(Debug, Clone)]
pub struct MockAuth {
    pub user_id: Uuid,
    pub username: String,
    pub email: String,
    pub is_admin: bool,
}

impl MockAuth {
    pub fn customer(user_id: Uuid) -> Self {
        Self {
            user_id,
            username: "customer".to_string(),
            email: "customer@example.com".to_string(),
            is_admin: false,
        }
    }

    pub fn admin(user_id: Uuid) -> Self {
        Self {
            user_id,
            username: "admin".to_string(),
            email: "admin@example.com".to_string(),
            is_admin: true,
        }
    }

    /// Signed access token valid for 15 minutes.
    pub fn access_token(&self, secret: &str) -> String {
        let now = Utc::now().timestamp();
        let claims = AccessClaims {
            sub: self.user_id,
            username: self.username.clone(),
            email: self.email.clone(),
            is_admin: self.is_admin,
            token_type: TokenType::Access,
            jti: Uuid::new_v4(),
            iat: now,
            exp: now + 900,
        };
        sign(&claims, secret).expect("HS256 signing cannot fail for in-memory claims")
    }

    /// `Authorization: Bearer ...` header map.
    pub fn headers(&self, secret: &str) -> HeaderMap {
        let mut map = HeaderMap::new();
        map.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.access_token(secret))).unwrap(),
        );
        map
    }
}
