use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};

use bazaar_auth_types::identity::Identity;

use crate::error::ShopServiceError;
use crate::handlers::auth::{EmailRequest, MessageResponse};
use crate::state::AppState;
use crate::usecase::password_reset::{
    ChangePasswordInput, ChangePasswordUseCase, ForgotPasswordUseCase, ResendResetOtpUseCase,
    ResetPasswordInput, ResetPasswordUseCase, VerifyResetOtpInput, VerifyResetOtpUseCase,
};

const RESET_CODE_SENT: &str = "if an account with this email exists, a reset code has been sent";

// ── POST /forgot-password ────────────────────────────────────────────────────

pub async fn forgot_password(
    State(state): State<AppState>,
    Json(body): Json<EmailRequest>,
) -> Result<Json<MessageResponse>, ShopServiceError> {
    let usecase = ForgotPasswordUseCase {
        users: state.user_repo(),
        resets: state.reset_repo(),
        mailer: state.mailer.clone(),
        otp: state.otp,
    };
    usecase.execute(&body.email).await?;
    Ok(Json(MessageResponse {
        message: RESET_CODE_SENT,
    }))
}

// ── POST /resend-otp ─────────────────────────────────────────────────────────

pub async fn resend_reset_otp(
    State(state): State<AppState>,
    Json(body): Json<EmailRequest>,
) -> Result<Json<MessageResponse>, ShopServiceError> {
    let usecase = ResendResetOtpUseCase {
        users: state.user_repo(),
        resets: state.reset_repo(),
        mailer: state.mailer.clone(),
        otp: state.otp,
    };
    usecase.execute(&body.email).await?;
    Ok(Json(MessageResponse {
        message: RESET_CODE_SENT,
    }))
}

// ── POST /verify-reset-otp ───────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct VerifyResetOtpRequest {
    pub email: String,
    pub otp: String,
}

#[derive(Serialize)]
pub struct VerifyResetOtpResponse {
    pub message: &'static str,
    pub token: String,
}

pub async fn verify_reset_otp(
    State(state): State<AppState>,
    Json(body): Json<VerifyResetOtpRequest>,
) -> Result<Json<VerifyResetOtpResponse>, ShopServiceError> {
    let usecase = VerifyResetOtpUseCase {
        users: state.user_repo(),
        resets: state.reset_repo(),
        otp: state.otp,
        secret: state.tokens.secret.clone(),
    };
    let token = usecase
        .execute(VerifyResetOtpInput {
            email: body.email,
            otp: body.otp,
        })
        .await?;
    Ok(Json(VerifyResetOtpResponse {
        message: "code verified",
        token,
    }))
}

// ── POST /reset-password ─────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub new_password: String,
}

pub async fn reset_password(
    State(state): State<AppState>,
    Json(body): Json<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, ShopServiceError> {
    let usecase = ResetPasswordUseCase {
        resets: state.reset_repo(),
        mailer: state.mailer.clone(),
        secret: state.tokens.secret.clone(),
    };
    usecase
        .execute(ResetPasswordInput {
            token: body.token,
            new_password: body.new_password,
        })
        .await?;
    Ok(Json(MessageResponse {
        message: "password has been reset",
    }))
}

// ── POST /change-password ────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

pub async fn change_password(
    State(state): State<AppState>,
    identity: Identity,
    Json(body): Json<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>, ShopServiceError> {
    let usecase = ChangePasswordUseCase {
        users: state.user_repo(),
        tokens: state.token_repo(),
        mailer: state.mailer.clone(),
    };
    usecase
        .execute(ChangePasswordInput {
            user_id: identity.user_id,
            old_password: body.old_password,
            new_password: body.new_password,
        })
        .await?;
    Ok(Json(MessageResponse {
        message: "password changed",
    }))
}
