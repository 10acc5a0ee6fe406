use anyhow::Context as _;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, QueryFilter, QueryOrder, QuerySelect, TransactionError, TransactionTrait,
    sea_query::Expr,
};
use uuid::Uuid;

use bazaar_shop_schema::{activation_otps, password_resets, refresh_tokens, users};

use crate::domain::repository::{ActivationOtpRepository, PasswordResetRepository, UserRepository};
use crate::domain::types::{ActivationOtp, PasswordReset, User};
use crate::error::ShopServiceError;

use super::{flatten_txn, is_unique_violation};

// ── User repository ──────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbUserRepository {
    pub db: DatabaseConnection,
}

impl UserRepository for DbUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, ShopServiceError> {
        let model = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.db)
            .await
            .context("find user by email")?;
        Ok(model.map(user_from_model))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, ShopServiceError> {
        let model = users::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("find user by id")?;
        Ok(model.map(user_from_model))
    }

    async fn create_with_otp(
        &self,
        user: &User,
        otp: &ActivationOtp,
    ) -> Result<(), ShopServiceError> {
        let result = self
            .db
            .transaction::<_, (), sea_orm::DbErr>(|txn| {
                let user = user.clone();
                let otp = otp.clone();
                Box::pin(async move {
                    users::ActiveModel {
                        id: Set(user.id),
                        username: Set(user.username),
                        email: Set(user.email),
                        password_hash: Set(user.password_hash),
                        is_active: Set(user.is_active),
                        is_admin: Set(user.is_admin),
                        created_at: Set(user.created_at),
                    }
                    .insert(txn)
                    .await?;
                    insert_otp(txn, &otp).await
                })
            })
            .await;

        match result {
            Ok(()) => Ok(()),
            Err(TransactionError::Transaction(e)) if is_unique_violation(&e) => {
                Err(ShopServiceError::UserAlreadyExists)
            }
            Err(e) => Err(anyhow::Error::new(e).context("create user with otp").into()),
        }
    }

    async fn update_password(
        &self,
        user_id: Uuid,
        password_hash: &str,
    ) -> Result<(), ShopServiceError> {
        users::Entity::update_many()
            .col_expr(users::Column::PasswordHash, Expr::value(password_hash))
            .filter(users::Column::Id.eq(user_id))
            .exec(&self.db)
            .await
            .context("update password")?;
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<User>, ShopServiceError> {
        let models = users::Entity::find()
            .order_by_desc(users::Column::CreatedAt)
            .all(&self.db)
            .await
            .context("list users")?;
        Ok(models.into_iter().map(user_from_model).collect())
    }

    async fn list_admin_emails(&self) -> Result<Vec<String>, ShopServiceError> {
        let emails = users::Entity::find()
            .select_only()
            .column(users::Column::Email)
            .filter(users::Column::IsAdmin.eq(true))
            .filter(users::Column::IsActive.eq(true))
            .into_tuple::<String>()
            .all(&self.db)
            .await
            .context("list admin emails")?;
        Ok(emails)
    }
}

pub(super) fn user_from_model(model: users::Model) -> User {
    User {
        id: model.id,
        username: model.username,
        email: model.email,
        password_hash: model.password_hash,
        is_active: model.is_active,
        is_admin: model.is_admin,
        created_at: model.created_at,
    }
}

// ── Activation OTP repository ────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbActivationOtpRepository {
    pub db: DatabaseConnection,
}

impl ActivationOtpRepository for DbActivationOtpRepository {
    async fn latest_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Option<ActivationOtp>, ShopServiceError> {
        let model = activation_otps::Entity::find()
            .filter(activation_otps::Column::UserId.eq(user_id))
            .order_by_desc(activation_otps::Column::CreatedAt)
            .one(&self.db)
            .await
            .context("find latest activation otp")?;
        Ok(model.map(otp_from_model))
    }

    async fn create(&self, otp: &ActivationOtp) -> Result<(), ShopServiceError> {
        insert_otp(&self.db, otp)
            .await
            .context("create activation otp")?;
        Ok(())
    }

    async fn claim_attempt(
        &self,
        otp_id: Uuid,
        max_attempts: i32,
    ) -> Result<bool, ShopServiceError> {
        let result = activation_otps::Entity::update_many()
            .col_expr(
                activation_otps::Column::Attempts,
                Expr::col(activation_otps::Column::Attempts).add(1),
            )
            .filter(activation_otps::Column::Id.eq(otp_id))
            .filter(activation_otps::Column::IsVerified.eq(false))
            .filter(activation_otps::Column::Attempts.lt(max_attempts))
            .exec(&self.db)
            .await
            .context("claim otp attempt")?;
        Ok(result.rows_affected == 1)
    }

    async fn mark_verified(&self, otp_id: Uuid, user_id: Uuid) -> Result<bool, ShopServiceError> {
        let verified = self
            .db
            .transaction::<_, bool, sea_orm::DbErr>(|txn| {
                Box::pin(async move {
                    let marked = activation_otps::Entity::update_many()
                        .col_expr(activation_otps::Column::IsVerified, Expr::value(true))
                        .filter(activation_otps::Column::Id.eq(otp_id))
                        .filter(activation_otps::Column::IsVerified.eq(false))
                        .exec(txn)
                        .await?;
                    if marked.rows_affected == 0 {
                        return Ok(false);
                    }
                    users::Entity::update_many()
                        .col_expr(users::Column::IsActive, Expr::value(true))
                        .filter(users::Column::Id.eq(user_id))
                        .exec(txn)
                        .await?;
                    Ok(true)
                })
            })
            .await
            .context("mark otp verified")?;
        Ok(verified)
    }
}

async fn insert_otp<C: ConnectionTrait>(
    conn: &C,
    otp: &ActivationOtp,
) -> Result<(), sea_orm::DbErr> {
    activation_otps::ActiveModel {
        id: Set(otp.id),
        user_id: Set(otp.user_id),
        secret: Set(otp.secret.clone()),
        attempts: Set(otp.attempts),
        is_verified: Set(otp.is_verified),
        created_at: Set(otp.created_at),
    }
    .insert(conn)
    .await?;
    Ok(())
}

fn otp_from_model(model: activation_otps::Model) -> ActivationOtp {
    ActivationOtp {
        id: model.id,
        user_id: model.user_id,
        secret: model.secret,
        attempts: model.attempts,
        is_verified: model.is_verified,
        created_at: model.created_at,
    }
}

// ── Password reset repository ────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbPasswordResetRepository {
    pub db: DatabaseConnection,
}

impl PasswordResetRepository for DbPasswordResetRepository {
    async fn find_open_since(
        &self,
        user_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<Option<PasswordReset>, ShopServiceError> {
        let model = password_resets::Entity::find()
            .filter(password_resets::Column::UserId.eq(user_id))
            .filter(password_resets::Column::IsUsed.eq(false))
            .filter(password_resets::Column::CreatedAt.gte(since))
            .order_by_desc(password_resets::Column::CreatedAt)
            .one(&self.db)
            .await
            .context("find open password reset")?;
        Ok(model.map(reset_from_model))
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<PasswordReset>, ShopServiceError> {
        let model = password_resets::Entity::find()
            .filter(password_resets::Column::Token.eq(token))
            .one(&self.db)
            .await
            .context("find password reset by token")?;
        Ok(model.map(reset_from_model))
    }

    async fn create(&self, reset: &PasswordReset) -> Result<(), ShopServiceError> {
        reset_to_active_model(reset)
            .insert(&self.db)
            .await
            .context("create password reset")?;
        Ok(())
    }

    async fn reissue(
        &self,
        reset: &PasswordReset,
        seen_email_attempts: i32,
    ) -> Result<bool, ShopServiceError> {
        let result = password_resets::Entity::update_many()
            .col_expr(password_resets::Column::Otp, Expr::value(reset.otp.clone()))
            .col_expr(password_resets::Column::Token, Expr::value(Option::<String>::None))
            .col_expr(password_resets::Column::IsVerified, Expr::value(false))
            .col_expr(
                password_resets::Column::EmailAttempts,
                Expr::value(reset.email_attempts),
            )
            .col_expr(password_resets::Column::LastEmailAt, Expr::value(reset.last_email_at))
            .col_expr(password_resets::Column::ExpiresAt, Expr::value(reset.expires_at))
            .filter(password_resets::Column::Id.eq(reset.id))
            .filter(password_resets::Column::IsUsed.eq(false))
            .filter(password_resets::Column::EmailAttempts.eq(seen_email_attempts))
            .exec(&self.db)
            .await
            .context("reissue password reset")?;
        Ok(result.rows_affected == 1)
    }

    async fn claim_otp_attempt(
        &self,
        reset_id: Uuid,
        max_attempts: i32,
        now: DateTime<Utc>,
    ) -> Result<bool, ShopServiceError> {
        let result = password_resets::Entity::update_many()
            .col_expr(
                password_resets::Column::OtpAttempts,
                Expr::col(password_resets::Column::OtpAttempts).add(1),
            )
            .col_expr(password_resets::Column::LastAttemptAt, Expr::value(now))
            .filter(password_resets::Column::Id.eq(reset_id))
            .filter(password_resets::Column::IsUsed.eq(false))
            .filter(password_resets::Column::OtpAttempts.lt(max_attempts))
            .exec(&self.db)
            .await
            .context("claim reset otp attempt")?;
        Ok(result.rows_affected == 1)
    }

    async fn mark_verified(
        &self,
        reset_id: Uuid,
        otp: &str,
        token: &str,
    ) -> Result<bool, ShopServiceError> {
        let result = password_resets::Entity::update_many()
            .col_expr(password_resets::Column::IsVerified, Expr::value(true))
            .col_expr(password_resets::Column::Token, Expr::value(token))
            .filter(password_resets::Column::Id.eq(reset_id))
            .filter(password_resets::Column::IsUsed.eq(false))
            .filter(password_resets::Column::Otp.eq(otp))
            .exec(&self.db)
            .await
            .context("mark password reset verified")?;
        Ok(result.rows_affected == 1)
    }

    async fn complete(
        &self,
        reset_id: Uuid,
        user_id: Uuid,
        password_hash: &str,
    ) -> Result<(), ShopServiceError> {
        let password_hash = password_hash.to_owned();
        self.db
            .transaction::<_, (), ShopServiceError>(|txn| {
                Box::pin(async move {
                    let now = Utc::now();
                    let claimed = password_resets::Entity::update_many()
                        .col_expr(password_resets::Column::IsUsed, Expr::value(true))
                        .filter(password_resets::Column::Id.eq(reset_id))
                        .filter(password_resets::Column::IsUsed.eq(false))
                        .exec(txn)
                        .await
                        .context("mark password reset used")?;
                    if claimed.rows_affected == 0 {
                        return Err(ShopServiceError::InvalidToken);
                    }

                    users::Entity::update_many()
                        .col_expr(users::Column::PasswordHash, Expr::value(password_hash))
                        .filter(users::Column::Id.eq(user_id))
                        .exec(txn)
                        .await
                        .context("store reset password")?;

                    refresh_tokens::Entity::update_many()
                        .col_expr(refresh_tokens::Column::RevokedAt, Expr::value(now))
                        .filter(refresh_tokens::Column::UserId.eq(user_id))
                        .filter(refresh_tokens::Column::RevokedAt.is_null())
                        .exec(txn)
                        .await
                        .context("revoke refresh tokens after reset")?;
                    Ok(())
                })
            })
            .await
            .map_err(|e| flatten_txn(e, "complete password reset"))
    }
}

fn reset_to_active_model(reset: &PasswordReset) -> password_resets::ActiveModel {
    password_resets::ActiveModel {
        id: Set(reset.id),
        user_id: Set(reset.user_id),
        otp: Set(reset.otp.clone()),
        token: Set(reset.token.clone()),
        otp_attempts: Set(reset.otp_attempts),
        email_attempts: Set(reset.email_attempts),
        last_attempt_at: Set(reset.last_attempt_at),
        last_email_at: Set(reset.last_email_at),
        expires_at: Set(reset.expires_at),
        is_verified: Set(reset.is_verified),
        is_used: Set(reset.is_used),
        created_at: Set(reset.created_at),
    }
}

fn reset_from_model(model: password_resets::Model) -> PasswordReset {
    PasswordReset {
        id: model.id,
        user_id: model.user_id,
        otp: model.otp,
        token: model.token,
        otp_attempts: model.otp_attempts,
        email_attempts: model.email_attempts,
        last_attempt_at: model.last_attempt_at,
        last_email_at: model.last_email_at,
        expires_at: model.expires_at,
        is_verified: model.is_verified,
        is_used: model.is_used,
        created_at: model.created_at,
    }
}
