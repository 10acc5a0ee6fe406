use anyhow::Context as _;
use chrono::{DateTime, NaiveTime, Utc};
use uuid::Uuid;

use bazaar_auth_types::token::{
    PASSWORD_RESET_PURPOSE, PasswordResetClaims, sign, validate_password_reset_token,
};
use bazaar_domain::user::{parse_email, validate_password};

use crate::domain::otp::OtpSettings;
use crate::domain::password::{hash_password, verify_password};
use crate::domain::repository::{
    Mailer, PasswordResetRepository, RefreshTokenRepository, UserRepository,
};
use crate::domain::types::{PasswordReset, User};
use crate::error::ShopServiceError;
use crate::usecase::notify;

fn start_of_day(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive().and_time(NaiveTime::MIN).and_utc()
}

async fn send_reset_code<M: Mailer>(
    mailer: &M,
    user: &User,
    reset: &PasswordReset,
    settings: &OtpSettings,
) -> Result<(), ShopServiceError> {
    let email = notify::password_reset_otp(&user.email, &reset.otp, settings.reset_ttl_secs / 60);
    mailer.send(&email).await
}

/// Put a fresh code on an open record. `None` when the send caps withhold the email;
/// callers still answer with the generic success.
async fn reissue_open<R: PasswordResetRepository>(
    resets: &R,
    mut reset: PasswordReset,
    now: DateTime<Utc>,
    settings: &OtpSettings,
) -> Result<Option<PasswordReset>, ShopServiceError> {
    if let Err(blocked) = reset.check_resend(now, settings) {
        tracing::warn!(user_id = %reset.user_id, ?blocked, "reset email withheld");
        return Ok(None);
    }
    let seen = reset.email_attempts;
    reset.reissue(now, settings);
    if !resets.reissue(&reset, seen).await? {
        tracing::warn!(
            user_id = %reset.user_id,
            "reset email withheld, record changed concurrently"
        );
        return Ok(None);
    }
    Ok(Some(reset))
}

/// Active account for `email`, or `None` for anything that must stay indistinguishable.
async fn active_user<U: UserRepository>(
    users: &U,
    email: &str,
) -> Result<Option<User>, ShopServiceError> {
    let Ok(email) = parse_email(email) else {
        return Ok(None);
    };
    Ok(users.find_by_email(&email).await?.filter(|u| u.is_active))
}

// ── ForgotPassword ───────────────────────────────────────────────────────────

pub struct ForgotPasswordUseCase<U, R, M>
where
    U: UserRepository,
    R: PasswordResetRepository,
    M: Mailer,
{
    pub users: U,
    pub resets: R,
    pub mailer: M,
    pub otp: OtpSettings,
}

impl<U, R, M> ForgotPasswordUseCase<U, R, M>
where
    U: UserRepository,
    R: PasswordResetRepository,
    M: Mailer,
{
    /// Emails a reset code. Today's open record is reused until its send cap is hit.
    /// Answers the same way whether or not a code was sent.
    pub async fn execute(&self, email: &str) -> Result<(), ShopServiceError> {
        let Some(user) = active_user(&self.users, email).await? else {
            return Ok(());
        };

        let now = Utc::now();
        let reset = match self.resets.find_open_since(user.id, start_of_day(now)).await? {
            Some(open) => match reissue_open(&self.resets, open, now, &self.otp).await? {
                Some(reset) => reset,
                None => return Ok(()),
            },
            None => {
                let reset = PasswordReset::issue(user.id, now, &self.otp);
                self.resets.create(&reset).await?;
                reset
            }
        };

        send_reset_code(&self.mailer, &user, &reset, &self.otp).await
    }
}

// ── ResendResetOtp ───────────────────────────────────────────────────────────

pub struct ResendResetOtpUseCase<U, R, M>
where
    U: UserRepository,
    R: PasswordResetRepository,
    M: Mailer,
{
    pub users: U,
    pub resets: R,
    pub mailer: M,
    pub otp: OtpSettings,
}

impl<U, R, M> ResendResetOtpUseCase<U, R, M>
where
    U: UserRepository,
    R: PasswordResetRepository,
    M: Mailer,
{
    /// Re-sends a code for today's open record. Without one nothing is sent.
    pub async fn execute(&self, email: &str) -> Result<(), ShopServiceError> {
        let Some(user) = active_user(&self.users, email).await? else {
            return Ok(());
        };

        let now = Utc::now();
        let Some(open) = self.resets.find_open_since(user.id, start_of_day(now)).await? else {
            tracing::debug!(user_id = %user.id, "reset resend without open request");
            return Ok(());
        };
        let Some(reset) = reissue_open(&self.resets, open, now, &self.otp).await? else {
            return Ok(());
        };
        send_reset_code(&self.mailer, &user, &reset, &self.otp).await
    }
}

// ── VerifyResetOtp ───────────────────────────────────────────────────────────

pub struct VerifyResetOtpInput {
    pub email: String,
    pub otp: String,
}

pub struct VerifyResetOtpUseCase<U, R>
where
    U: UserRepository,
    R: PasswordResetRepository,
{
    pub users: U,
    pub resets: R,
    pub otp: OtpSettings,
    pub secret: String,
}

impl<U, R> VerifyResetOtpUseCase<U, R>
where
    U: UserRepository,
    R: PasswordResetRepository,
{
    /// Returns the signed reset token on success.
    pub async fn execute(&self, input: VerifyResetOtpInput) -> Result<String, ShopServiceError> {
        let user = active_user(&self.users, &input.email)
            .await?
            .ok_or(ShopServiceError::InvalidOtp)?;

        let now = Utc::now();
        let reset = self
            .resets
            .find_open_since(user.id, start_of_day(now))
            .await?
            .ok_or(ShopServiceError::InvalidOtp)?;

        // The read above may be stale; only the conditional claim decides.
        if !reset.can_attempt_otp(&self.otp)
            || !self
                .resets
                .claim_otp_attempt(reset.id, self.otp.reset_max_otp_attempts, now)
                .await?
        {
            return Err(ShopServiceError::TooManyOtpAttempts);
        }
        if !reset.otp_matches(&input.otp, now) {
            return Err(ShopServiceError::InvalidOtp);
        }

        let claims = PasswordResetClaims {
            sub: user.id,
            email: user.email.clone(),
            purpose: PASSWORD_RESET_PURPOSE.to_owned(),
            iat: now.timestamp(),
            exp: reset.expires_at.timestamp(),
        };
        let token = sign(&claims, &self.secret).context("sign password reset token")?;
        if !self.resets.mark_verified(reset.id, &reset.otp, &token).await? {
            return Err(ShopServiceError::InvalidOtp);
        }

        tracing::info!(user_id = %user.id, "password reset code verified");
        Ok(token)
    }
}

// ── ResetPassword ────────────────────────────────────────────────────────────

pub struct ResetPasswordInput {
    pub token: String,
    pub new_password: String,
}

pub struct ResetPasswordUseCase<R, M>
where
    R: PasswordResetRepository,
    M: Mailer,
{
    pub resets: R,
    pub mailer: M,
    pub secret: String,
}

impl<R, M> ResetPasswordUseCase<R, M>
where
    R: PasswordResetRepository,
    M: Mailer,
{
    pub async fn execute(&self, input: ResetPasswordInput) -> Result<(), ShopServiceError> {
        validate_password(&input.new_password)?;

        let claims = validate_password_reset_token(&input.token, &self.secret)
            .map_err(|_| ShopServiceError::InvalidToken)?;
        let reset = self
            .resets
            .find_by_token(&input.token)
            .await?
            .filter(|r| r.user_id == claims.sub)
            .ok_or(ShopServiceError::InvalidToken)?;
        if !reset.is_redeemable(Utc::now()) {
            return Err(ShopServiceError::InvalidToken);
        }

        let hash = hash_password(&input.new_password)?;
        self.resets.complete(reset.id, reset.user_id, &hash).await?;
        tracing::info!(user_id = %reset.user_id, "password reset completed");

        if let Err(e) = self.mailer.send(&notify::password_changed(&claims.email)).await {
            tracing::warn!(user_id = %reset.user_id, error = %e, "password change email failed");
        }
        Ok(())
    }
}

// ── ChangePassword ───────────────────────────────────────────────────────────

pub struct ChangePasswordInput {
    pub user_id: Uuid,
    pub old_password: String,
    pub new_password: String,
}

pub struct ChangePasswordUseCase<U, T, M>
where
    U: UserRepository,
    T: RefreshTokenRepository,
    M: Mailer,
{
    pub users: U,
    pub tokens: T,
    pub mailer: M,
}

impl<U, T, M> ChangePasswordUseCase<U, T, M>
where
    U: UserRepository,
    T: RefreshTokenRepository,
    M: Mailer,
{
    pub async fn execute(&self, input: ChangePasswordInput) -> Result<(), ShopServiceError> {
        let user = self
            .users
            .find_by_id(input.user_id)
            .await?
            .ok_or(ShopServiceError::UserNotFound)?;

        if !verify_password(&input.old_password, &user.password_hash)? {
            return Err(ShopServiceError::InvalidCredential);
        }
        validate_password(&input.new_password)?;
        if input.old_password == input.new_password {
            return Err(ShopServiceError::validation(
                "new password must differ from the current one",
            ));
        }

        let hash = hash_password(&input.new_password)?;
        self.users.update_password(user.id, &hash).await?;
        let revoked = self.tokens.revoke_all_for_user(user.id, Utc::now()).await?;
        tracing::info!(user_id = %user.id, revoked, "password changed");

        if let Err(e) = self.mailer.send(&notify::password_changed(&user.email)).await {
            tracing::warn!(user_id = %user.id, error = %e, "password change email failed");
        }
        Ok(())
    }
}
