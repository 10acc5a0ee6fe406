use anyhow::Context as _;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, TransactionTrait, sea_query::Expr,
};
use uuid::Uuid;

use bazaar_shop_schema::addresses;

use crate::domain::repository::AddressRepository;
use crate::domain::types::Address;
use crate::error::ShopServiceError;

#[derive(Clone)]
pub struct DbAddressRepository {
    pub db: DatabaseConnection,
}

impl AddressRepository for DbAddressRepository {
    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Address>, ShopServiceError> {
        let models = addresses::Entity::find()
            .filter(addresses::Column::UserId.eq(user_id))
            .order_by_desc(addresses::Column::IsDefault)
            .order_by_desc(addresses::Column::CreatedAt)
            .all(&self.db)
            .await
            .context("list addresses")?;
        Ok(models.into_iter().map(address_from_model).collect())
    }

    async fn create(&self, address: &Address) -> Result<(), ShopServiceError> {
        self.db
            .transaction::<_, (), sea_orm::DbErr>(|txn| {
                let address = address.clone();
                Box::pin(async move {
                    if address.is_default {
                        addresses::Entity::update_many()
                            .col_expr(addresses::Column::IsDefault, Expr::value(false))
                            .filter(addresses::Column::UserId.eq(address.user_id))
                            .filter(addresses::Column::IsDefault.eq(true))
                            .exec(txn)
                            .await?;
                    }
                    addresses::ActiveModel {
                        id: Set(address.id),
                        user_id: Set(address.user_id),
                        phone: Set(address.phone),
                        address_type: Set(address.address_type),
                        street: Set(address.street),
                        city: Set(address.city),
                        state: Set(address.state),
                        zip_code: Set(address.zip_code),
                        is_default: Set(address.is_default),
                        created_at: Set(address.created_at),
                    }
                    .insert(txn)
                    .await?;
                    Ok(())
                })
            })
            .await
            .context("create address")?;
        Ok(())
    }

    async fn find_owned(
        &self,
        user_id: Uuid,
        address_id: Uuid,
    ) -> Result<Option<Address>, ShopServiceError> {
        let model = addresses::Entity::find_by_id(address_id)
            .filter(addresses::Column::UserId.eq(user_id))
            .one(&self.db)
            .await
            .context("find owned address")?;
        Ok(model.map(address_from_model))
    }

    async fn set_default(
        &self,
        user_id: Uuid,
        address_id: Uuid,
    ) -> Result<bool, ShopServiceError> {
        let updated = self
            .db
            .transaction::<_, bool, sea_orm::DbErr>(|txn| {
                Box::pin(async move {
                    let owned = addresses::Entity::find_by_id(address_id)
                        .filter(addresses::Column::UserId.eq(user_id))
                        .lock_exclusive()
                        .one(txn)
                        .await?;
                    if owned.is_none() {
                        return Ok(false);
                    }

                    addresses::Entity::update_many()
                        .col_expr(addresses::Column::IsDefault, Expr::value(false))
                        .filter(addresses::Column::UserId.eq(user_id))
                        .filter(addresses::Column::IsDefault.eq(true))
                        .exec(txn)
                        .await?;
                    addresses::Entity::update_many()
                        .col_expr(addresses::Column::IsDefault, Expr::value(true))
                        .filter(addresses::Column::Id.eq(address_id))
                        .exec(txn)
                        .await?;
                    Ok(true)
                })
            })
            .await
            .context("set default address")?;
        Ok(updated)
    }
}

pub(super) fn address_from_model(model: addresses::Model) -> Address {
    Address {
        id: model.id,
        user_id: model.user_id,
        phone: model.phone,
        address_type: model.address_type,
        street: model.street,
        city: model.city,
        state: model.state,
        zip_code: model.zip_code,
        is_default: model.is_default,
        created_at: model.created_at,
    }
}
