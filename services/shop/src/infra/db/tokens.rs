use anyhow::Context as _;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, QueryFilter, TransactionTrait, sea_query::Expr,
};
use uuid::Uuid;

use bazaar_shop_schema::refresh_tokens;

use crate::domain::repository::RefreshTokenRepository;
use crate::domain::types::RefreshTokenRecord;
use crate::error::ShopServiceError;

#[derive(Clone)]
pub struct DbRefreshTokenRepository {
    pub db: DatabaseConnection,
}

impl RefreshTokenRepository for DbRefreshTokenRepository {
    async fn record(&self, token: &RefreshTokenRecord) -> Result<(), ShopServiceError> {
        insert_token(&self.db, token)
            .await
            .context("record refresh token")?;
        Ok(())
    }

    async fn rotate(
        &self,
        old_jti: Uuid,
        new: &RefreshTokenRecord,
        now: DateTime<Utc>,
    ) -> Result<bool, ShopServiceError> {
        let rotated = self
            .db
            .transaction::<_, bool, sea_orm::DbErr>(|txn| {
                let new = new.clone();
                Box::pin(async move {
                    // Only one concurrent rotation of the same jti can match this row.
                    let revoked = refresh_tokens::Entity::update_many()
                        .col_expr(refresh_tokens::Column::RevokedAt, Expr::value(now))
                        .filter(refresh_tokens::Column::Jti.eq(old_jti))
                        .filter(refresh_tokens::Column::UserId.eq(new.user_id))
                        .filter(refresh_tokens::Column::RevokedAt.is_null())
                        .filter(refresh_tokens::Column::ExpiresAt.gt(now))
                        .exec(txn)
                        .await?;
                    if revoked.rows_affected == 0 {
                        return Ok(false);
                    }
                    insert_token(txn, &new).await?;
                    Ok(true)
                })
            })
            .await
            .context("rotate refresh token")?;
        Ok(rotated)
    }

    async fn revoke(&self, jti: Uuid, now: DateTime<Utc>) -> Result<bool, ShopServiceError> {
        let result = refresh_tokens::Entity::update_many()
            .col_expr(refresh_tokens::Column::RevokedAt, Expr::value(now))
            .filter(refresh_tokens::Column::Jti.eq(jti))
            .filter(refresh_tokens::Column::RevokedAt.is_null())
            .exec(&self.db)
            .await
            .context("revoke refresh token")?;
        Ok(result.rows_affected > 0)
    }

    async fn revoke_all_for_user(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<u64, ShopServiceError> {
        let result = refresh_tokens::Entity::update_many()
            .col_expr(refresh_tokens::Column::RevokedAt, Expr::value(now))
            .filter(refresh_tokens::Column::UserId.eq(user_id))
            .filter(refresh_tokens::Column::RevokedAt.is_null())
            .exec(&self.db)
            .await
            .context("revoke refresh tokens of user")?;
        Ok(result.rows_affected)
    }
}

async fn insert_token<C: ConnectionTrait>(
    conn: &C,
    token: &RefreshTokenRecord,
) -> Result<(), sea_orm::DbErr> {
    refresh_tokens::ActiveModel {
        jti: Set(token.jti),
        user_id: Set(token.user_id),
        expires_at: Set(token.expires_at),
        created_at: Set(token.created_at),
        revoked_at: Set(token.revoked_at),
    }
    .insert(conn)
    .await?;
    Ok(())
}
