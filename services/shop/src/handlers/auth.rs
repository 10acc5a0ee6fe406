use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use axum_extra::extract::CookieJar;
use serde::{Deserialize, Serialize};

use bazaar_auth_types::{
    cookie::{clear_refresh_cookie, refresh_token_from, set_refresh_cookie},
    identity::Identity,
};

use crate::error::ShopServiceError;
use crate::handlers::views::UserView;
use crate::state::AppState;
use crate::usecase::account::{
    LoginInput, LoginUseCase, RegisterInput, RegisterUseCase, ResendActivationOtpUseCase,
    VerifyOtpInput, VerifyOtpUseCase,
};
use crate::usecase::token::{RefreshTokenUseCase, RevokeTokenUseCase};

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

// ── POST /auth/register ──────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct RegisterResponse {
    pub message: &'static str,
    pub user: UserView,
}

pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ShopServiceError> {
    let usecase = RegisterUseCase {
        users: state.user_repo(),
        mailer: state.mailer.clone(),
        otp: state.otp,
    };
    let user = usecase
        .execute(RegisterInput {
            username: body.username,
            email: body.email,
            password: body.password,
        })
        .await?;

    let body = RegisterResponse {
        message: "registration successful, check your email for the verification code",
        user: UserView::from(&user),
    };
    Ok((StatusCode::CREATED, Json(body)))
}

// ── POST /auth/verify-otp ────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct VerifyOtpRequest {
    pub email: String,
    pub otp: String,
}

#[derive(Serialize)]
pub struct VerifyOtpResponse {
    pub message: &'static str,
    pub access: String,
    pub access_expires_at: i64,
    pub user: UserView,
}

pub async fn verify_otp(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(body): Json<VerifyOtpRequest>,
) -> Result<impl IntoResponse, ShopServiceError> {
    let usecase = VerifyOtpUseCase {
        users: state.user_repo(),
        otps: state.otp_repo(),
        tokens: state.token_repo(),
        otp: state.otp,
        settings: state.tokens.clone(),
    };
    let out = usecase
        .execute(VerifyOtpInput {
            email: body.email,
            otp: body.otp,
        })
        .await?;

    let jar = set_refresh_cookie(jar, out.tokens.refresh_token, &state.cookies);
    let body = VerifyOtpResponse {
        message: "account verified",
        access: out.tokens.access_token,
        access_expires_at: out.tokens.access_expires_at,
        user: UserView::from(&out.user),
    };
    Ok((StatusCode::OK, jar, Json(body)))
}

// ── POST /auth/resend-otp ────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct EmailRequest {
    pub email: String,
}

pub async fn resend_activation_otp(
    State(state): State<AppState>,
    Json(body): Json<EmailRequest>,
) -> Result<Json<MessageResponse>, ShopServiceError> {
    let usecase = ResendActivationOtpUseCase {
        users: state.user_repo(),
        otps: state.otp_repo(),
        mailer: state.mailer.clone(),
        otp: state.otp,
    };
    usecase.execute(&body.email).await?;
    Ok(Json(MessageResponse {
        message: "if the account exists and is not verified, a new code has been sent",
    }))
}

// ── POST /auth/login ─────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub access: String,
    pub access_expires_at: i64,
    pub user: UserView,
    pub is_admin: bool,
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(body): Json<LoginRequest>,
) -> Result<impl IntoResponse, ShopServiceError> {
    let usecase = LoginUseCase {
        users: state.user_repo(),
        tokens: state.token_repo(),
        settings: state.tokens.clone(),
    };
    let out = usecase
        .execute(LoginInput {
            email: body.email,
            password: body.password,
        })
        .await?;

    let jar = set_refresh_cookie(jar, out.tokens.refresh_token, &state.cookies);
    let body = LoginResponse {
        access: out.tokens.access_token,
        access_expires_at: out.tokens.access_expires_at,
        is_admin: out.user.is_admin,
        user: UserView::from(&out.user),
    };
    Ok((StatusCode::OK, jar, Json(body)))
}

// ── POST /auth/token/refresh ─────────────────────────────────────────────────

#[derive(Serialize)]
pub struct RefreshResponse {
    pub access: String,
    pub access_expires_at: i64,
}

pub async fn refresh_token(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<impl IntoResponse, ShopServiceError> {
    let presented = refresh_token_from(&jar).ok_or(ShopServiceError::InvalidCredential)?;

    let usecase = RefreshTokenUseCase {
        users: state.user_repo(),
        tokens: state.token_repo(),
        settings: state.tokens.clone(),
    };
    let pair = usecase.execute(&presented).await?;

    let jar = set_refresh_cookie(jar, pair.refresh_token, &state.cookies);
    let body = RefreshResponse {
        access: pair.access_token,
        access_expires_at: pair.access_expires_at,
    };
    Ok((StatusCode::OK, jar, Json(body)))
}

// ── POST /auth/logout ────────────────────────────────────────────────────────

pub async fn logout(
    State(state): State<AppState>,
    identity: Identity,
    jar: CookieJar,
) -> Result<impl IntoResponse, ShopServiceError> {
    let presented = refresh_token_from(&jar);

    let usecase = RevokeTokenUseCase {
        tokens: state.token_repo(),
        secret: state.tokens.secret.clone(),
    };
    usecase
        .execute(identity.user_id, presented.as_deref())
        .await?;

    let jar = clear_refresh_cookie(jar, &state.cookies);
    Ok((
        StatusCode::OK,
        jar,
        Json(MessageResponse {
            message: "logged out",
        }),
    ))
}
