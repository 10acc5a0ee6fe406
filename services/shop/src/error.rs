use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use bazaar_auth_types::identity::NotAdmin;
use bazaar_domain::order::InvalidTransition;
use bazaar_domain::payment::UnknownVariant;
use bazaar_domain::user::CredentialError;

/// Shop service domain error variants.
#[derive(Debug, thiserror::Error)]
pub enum ShopServiceError {
    #[error("user not found")]
    UserNotFound,
    #[error("product not found")]
    ProductNotFound,
    #[error("cart item not found")]
    CartItemNotFound,
    #[error("order not found")]
    OrderNotFound,
    #[error("address not found")]
    AddressNotFound,
    #[error("an account with this email already exists")]
    UserAlreadyExists,
    #[error("invalid credentials")]
    InvalidCredential,
    #[error("invalid or expired token")]
    InvalidToken,
    #[error("account not verified, please verify your email")]
    AccountNotVerified,
    #[error("you are not authorized to access this resource")]
    Forbidden,
    #[error("invalid or expired OTP")]
    InvalidOtp,
    #[error("{0}")]
    InvalidState(String),
    #[error("cart is empty")]
    EmptyCart,
    #[error("{0}")]
    Validation(String),
    #[error("insufficient stock for {product}: available {available}, requested {requested}")]
    InsufficientStock {
        product: String,
        available: i32,
        requested: i32,
    },
    #[error("too many OTP attempts, request a new code")]
    TooManyOtpAttempts,
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl ShopServiceError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UserNotFound => "USER_NOT_FOUND",
            Self::ProductNotFound => "PRODUCT_NOT_FOUND",
            Self::CartItemNotFound => "CART_ITEM_NOT_FOUND",
            Self::OrderNotFound => "ORDER_NOT_FOUND",
            Self::AddressNotFound => "ADDRESS_NOT_FOUND",
            Self::UserAlreadyExists => "USER_ALREADY_EXISTS",
            Self::InvalidCredential => "INVALID_CREDENTIAL",
            Self::InvalidToken => "INVALID_TOKEN",
            Self::AccountNotVerified => "ACCOUNT_NOT_VERIFIED",
            Self::Forbidden => "FORBIDDEN",
            Self::InvalidOtp => "INVALID_OTP",
            Self::InvalidState(_) => "INVALID_STATE",
            Self::EmptyCart => "EMPTY_CART",
            Self::Validation(_) => "VALIDATION",
            Self::InsufficientStock { .. } => "INSUFFICIENT_STOCK",
            Self::TooManyOtpAttempts => "TOO_MANY_OTP_ATTEMPTS",
            Self::Internal(_) => "INTERNAL",
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

impl From<CredentialError> for ShopServiceError {
    fn from(e: CredentialError) -> Self {
        Self::Validation(e.to_string())
    }
}

impl From<NotAdmin> for ShopServiceError {
    fn from(_: NotAdmin) -> Self {
        Self::Forbidden
    }
}

impl From<InvalidTransition> for ShopServiceError {
    fn from(e: InvalidTransition) -> Self {
        Self::InvalidState(e.to_string())
    }
}

impl From<UnknownVariant> for ShopServiceError {
    fn from(e: UnknownVariant) -> Self {
        Self::Validation(e.to_string())
    }
}

impl IntoResponse for ShopServiceError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::UserNotFound
            | Self::ProductNotFound
            | Self::CartItemNotFound
            | Self::OrderNotFound
            | Self::AddressNotFound => StatusCode::NOT_FOUND,
            Self::UserAlreadyExists | Self::InsufficientStock { .. } => StatusCode::CONFLICT,
            Self::InvalidCredential | Self::InvalidToken | Self::AccountNotVerified => {
                StatusCode::UNAUTHORIZED
            }
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::InvalidOtp | Self::InvalidState(_) | Self::EmptyCart | Self::Validation(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::TooManyOtpAttempts => StatusCode::TOO_MANY_REQUESTS,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        // Only 500s are logged here; TraceLayer already records status for every request.
        if let Self::Internal(ref e) = self {
            tracing::error!(error = ?e, kind = "INTERNAL", "internal error");
        }
        let body = serde_json::json!({
            "kind": self.kind(),
            "message": self.to_string(),
        });
        (status, axum::Json(body)).into_response()
    }
}
