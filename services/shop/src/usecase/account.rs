use chrono::Utc;
use uuid::Uuid;

use bazaar_auth_types::identity::Identity;
use bazaar_domain::user::{parse_email, validate_password, validate_username};

use crate::domain::otp::OtpSettings;
use crate::domain::password::{hash_password, verify_password};
use crate::domain::repository::{
    ActivationOtpRepository, Mailer, RefreshTokenRepository, UserRepository,
};
use crate::domain::types::{ActivationOtp, User};
use crate::error::ShopServiceError;
use crate::usecase::notify;
use crate::usecase::token::{TokenPair, TokenSettings, issue_pair};

/// A user that just authenticated, with their new credentials.
#[derive(Debug, Clone)]
pub struct AuthOutput {
    pub user: User,
    pub tokens: TokenPair,
}

async fn send_activation_code<M: Mailer>(
    mailer: &M,
    user: &User,
    otp: &ActivationOtp,
    settings: &OtpSettings,
) -> Result<(), ShopServiceError> {
    let code = otp
        .code_at(Utc::now(), settings)
        .map_err(|e| anyhow::anyhow!("derive activation code: {e}"))?;
    mailer.send(&notify::activation_otp(&user.email, &code)).await
}

// ── Register ─────────────────────────────────────────────────────────────────

pub struct RegisterInput {
    pub username: String,
    pub email: String,
    pub password: String,
}

pub struct RegisterUseCase<U, M>
where
    U: UserRepository,
    M: Mailer,
{
    pub users: U,
    pub mailer: M,
    pub otp: OtpSettings,
}

impl<U, M> RegisterUseCase<U, M>
where
    U: UserRepository,
    M: Mailer,
{
    pub async fn execute(&self, input: RegisterInput) -> Result<User, ShopServiceError> {
        let username = validate_username(&input.username)?;
        let email = parse_email(&input.email)?;
        validate_password(&input.password)?;

        if self.users.find_by_email(&email).await?.is_some() {
            return Err(ShopServiceError::UserAlreadyExists);
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::now_v7(),
            username,
            email,
            password_hash: hash_password(&input.password)?,
            is_active: false,
            is_admin: false,
            created_at: now,
        };
        let otp = ActivationOtp::generate(user.id, now);
        self.users.create_with_otp(&user, &otp).await?;

        send_activation_code(&self.mailer, &user, &otp, &self.otp).await?;
        tracing::info!(user_id = %user.id, "user registered");
        Ok(user)
    }
}

// ── VerifyOtp ────────────────────────────────────────────────────────────────

pub struct VerifyOtpInput {
    pub email: String,
    pub otp: String,
}

pub struct VerifyOtpUseCase<U, O, T>
where
    U: UserRepository,
    O: ActivationOtpRepository,
    T: RefreshTokenRepository,
{
    pub users: U,
    pub otps: O,
    pub tokens: T,
    pub otp: OtpSettings,
    pub settings: TokenSettings,
}

impl<U, O, T> VerifyOtpUseCase<U, O, T>
where
    U: UserRepository,
    O: ActivationOtpRepository,
    T: RefreshTokenRepository,
{
    pub async fn execute(&self, input: VerifyOtpInput) -> Result<AuthOutput, ShopServiceError> {
        let email = parse_email(&input.email).map_err(|_| ShopServiceError::InvalidOtp)?;

        // 1. Unknown users and missing records look the same as a wrong code
        let mut user = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or(ShopServiceError::InvalidOtp)?;
        let otp = self
            .otps
            .latest_for_user(user.id)
            .await?
            .ok_or(ShopServiceError::InvalidOtp)?;

        // 2. A verified record never activates anything again
        if otp.is_verified {
            return Err(ShopServiceError::InvalidOtp);
        }
        if !otp.can_attempt(&self.otp) {
            return Err(ShopServiceError::TooManyOtpAttempts);
        }

        // 3. Claim the attempt atomically before comparing
        if !self
            .otps
            .claim_attempt(otp.id, self.otp.activation_max_attempts)
            .await?
        {
            return Err(ShopServiceError::TooManyOtpAttempts);
        }
        let matched = otp
            .matches(&input.otp, Utc::now(), &self.otp)
            .map_err(|e| anyhow::anyhow!("derive activation code: {e}"))?;
        if !matched {
            return Err(ShopServiceError::InvalidOtp);
        }

        // 4. Activate and sign in; a concurrent winner leaves nothing to activate
        if !self.otps.mark_verified(otp.id, user.id).await? {
            return Err(ShopServiceError::InvalidOtp);
        }
        user.is_active = true;
        let tokens = issue_pair(&self.tokens, &user, &self.settings).await?;

        tracing::info!(user_id = %user.id, "account activated");
        Ok(AuthOutput { user, tokens })
    }
}

// ── ResendActivationOtp ──────────────────────────────────────────────────────

pub struct ResendActivationOtpUseCase<U, O, M>
where
    U: UserRepository,
    O: ActivationOtpRepository,
    M: Mailer,
{
    pub users: U,
    pub otps: O,
    pub mailer: M,
    pub otp: OtpSettings,
}

impl<U, O, M> ResendActivationOtpUseCase<U, O, M>
where
    U: UserRepository,
    O: ActivationOtpRepository,
    M: Mailer,
{
    /// Succeeds silently for unknown or already active accounts, and within the cooldown.
    pub async fn execute(&self, email: &str) -> Result<(), ShopServiceError> {
        let Ok(email) = parse_email(email) else {
            return Ok(());
        };
        let Some(user) = self.users.find_by_email(&email).await? else {
            return Ok(());
        };
        if user.is_active {
            return Ok(());
        }

        let now = Utc::now();
        if let Some(latest) = self.otps.latest_for_user(user.id).await? {
            if now < latest.resend_allowed_at(&self.otp) {
                tracing::warn!(user_id = %user.id, "activation resend within cooldown");
                return Ok(());
            }
        }

        let otp = ActivationOtp::generate(user.id, now);
        self.otps.create(&otp).await?;
        send_activation_code(&self.mailer, &user, &otp, &self.otp).await
    }
}

// ── Login ────────────────────────────────────────────────────────────────────

pub struct LoginInput {
    pub email: String,
    pub password: String,
}

pub struct LoginUseCase<U, T>
where
    U: UserRepository,
    T: RefreshTokenRepository,
{
    pub users: U,
    pub tokens: T,
    pub settings: TokenSettings,
}

impl<U, T> LoginUseCase<U, T>
where
    U: UserRepository,
    T: RefreshTokenRepository,
{
    pub async fn execute(&self, input: LoginInput) -> Result<AuthOutput, ShopServiceError> {
        let email = parse_email(&input.email).map_err(|_| ShopServiceError::InvalidCredential)?;
        let user = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or(ShopServiceError::InvalidCredential)?;

        if !verify_password(&input.password, &user.password_hash)? {
            return Err(ShopServiceError::InvalidCredential);
        }
        if !user.is_active {
            return Err(ShopServiceError::AccountNotVerified);
        }

        let tokens = issue_pair(&self.tokens, &user, &self.settings).await?;
        Ok(AuthOutput { user, tokens })
    }
}

// ── Profile / AdminDashboard ─────────────────────────────────────────────────

pub struct ProfileUseCase<U: UserRepository> {
    pub users: U,
}

impl<U: UserRepository> ProfileUseCase<U> {
    pub async fn execute(&self, user_id: Uuid) -> Result<User, ShopServiceError> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or(ShopServiceError::UserNotFound)
    }
}

pub struct AdminDashboardUseCase<U: UserRepository> {
    pub users: U,
}

impl<U: UserRepository> AdminDashboardUseCase<U> {
    pub async fn execute(&self, identity: &Identity) -> Result<Vec<User>, ShopServiceError> {
        identity.require_admin()?;
        self.users.list_all().await
    }
}
