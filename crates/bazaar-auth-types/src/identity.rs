//! Bearer-token identity extractor.

use std::sync::Arc;

use axum::extract::{FromRef, FromRequestParts};
use axum::response::{IntoResponse, Response};
use http::request::Parts;
use http::{StatusCode, header};
use uuid::Uuid;

use crate::token::validate_access_token;

/// HS256 signing secret, exposed to the extractor through `FromRef` on the router state.
#[derive(Clone)]
pub struct JwtSecret(Arc<str>);

impl JwtSecret {
    pub fn new(secret: impl Into<Arc<str>>) -> Self {
        Self(secret.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for JwtSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("JwtSecret(..)")
    }
}

/// Caller identity taken from a valid `Authorization: Bearer <access>` header.
///
/// Role checks (403) happen in the use cases after extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: Uuid,
    pub username: String,
    pub email: String,
    pub is_admin: bool,
}

/// The caller is authenticated but lacks the admin flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("admin privileges required")]
pub struct NotAdmin;

impl Identity {
    pub fn require_admin(&self) -> Result<&Self, NotAdmin> {
        if self.is_admin { Ok(self) } else { Err(NotAdmin) }
    }
}

/// Why a request carried no usable identity. Always rendered as 401.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityRejection {
    Missing,
    Invalid,
}

impl IntoResponse for IdentityRejection {
    fn into_response(self) -> Response {
        let message = match self {
            Self::Missing => "authentication credentials were not provided",
            Self::Invalid => "invalid or expired access token",
        };
        let body = serde_json::json!({ "kind": "UNAUTHENTICATED", "message": message });
        (StatusCode::UNAUTHORIZED, axum::Json(body)).into_response()
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

impl<S> FromRequestParts<S> for Identity
where
    JwtSecret: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = IdentityRejection;

    // Validate synchronously and return a 'static future so the borrow of `parts`
    // does not leak into the returned future.
    fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let secret = JwtSecret::from_ref(state);
        let result = match bearer_token(parts) {
            None => Err(IdentityRejection::Missing),
            Some(token) => validate_access_token(token, secret.as_str())
                .map(|claims| Self {
                    user_id: claims.sub,
                    username: claims.username,
                    email: claims.email,
                    is_admin: claims.is_admin,
                })
                .map_err(|e| {
                    tracing::debug!(error = %e, "rejected access token");
                    IdentityRejection::Invalid
                }),
        };

        async move { result }
    }
}
