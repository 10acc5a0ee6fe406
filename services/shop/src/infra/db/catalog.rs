use anyhow::Context as _;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, JoinType, QueryFilter, QueryOrder, QuerySelect, RelationTrait,
    TransactionTrait, sea_query::{Expr, OnConflict},
};
use uuid::Uuid;

use bazaar_shop_schema::{cart_items, carts, products};

use crate::domain::repository::{CartRepository, ProductRepository};
use crate::domain::types::{Cart, CartLine, Product};
use crate::error::ShopServiceError;

// ── Product repository ───────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbProductRepository {
    pub db: DatabaseConnection,
}

impl ProductRepository for DbProductRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Product>, ShopServiceError> {
        let model = products::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("find product by id")?;
        Ok(model.map(product_from_model))
    }
}

pub(super) fn product_from_model(model: products::Model) -> Product {
    Product {
        id: model.id,
        name: model.name,
        price: model.price,
        stock_quantity: model.stock_quantity,
        image_url: model.image_url,
        created_at: model.created_at,
    }
}

// ── Cart repository ──────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbCartRepository {
    pub db: DatabaseConnection,
}

/// The user's cart row, inserted on first use. Safe under concurrent first use.
async fn ensure_cart<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
) -> Result<carts::Model, sea_orm::DbErr> {
    let now = Utc::now();
    carts::Entity::insert(carts::ActiveModel {
        id: Set(Uuid::now_v7()),
        user_id: Set(user_id),
        created_at: Set(now),
        updated_at: Set(now),
    })
    .on_conflict(
        OnConflict::column(carts::Column::UserId)
            .do_nothing()
            .to_owned(),
    )
    .exec_without_returning(conn)
    .await?;

    carts::Entity::find()
        .filter(carts::Column::UserId.eq(user_id))
        .one(conn)
        .await?
        .ok_or_else(|| sea_orm::DbErr::RecordNotFound(format!("cart of user {user_id}")))
}

fn line_from_models(
    item: cart_items::Model,
    product: Option<products::Model>,
) -> anyhow::Result<CartLine> {
    let product = product.with_context(|| format!("cart item {} without product", item.id))?;
    Ok(CartLine {
        item_id: item.id,
        product: product_from_model(product),
        quantity: item.quantity,
    })
}

impl CartRepository for DbCartRepository {
    async fn get_or_create(&self, user_id: Uuid) -> Result<Cart, ShopServiceError> {
        let cart = ensure_cart(&self.db, user_id)
            .await
            .context("ensure cart")?;

        let rows = cart_items::Entity::find()
            .filter(cart_items::Column::CartId.eq(cart.id))
            .order_by_asc(cart_items::Column::CreatedAt)
            .find_also_related(products::Entity)
            .all(&self.db)
            .await
            .context("load cart items")?;

        let items = rows
            .into_iter()
            .map(|(item, product)| line_from_models(item, product))
            .collect::<anyhow::Result<Vec<_>>>()?;

        Ok(Cart {
            id: cart.id,
            user_id,
            items,
        })
    }

    async fn add_item(
        &self,
        user_id: Uuid,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<(), ShopServiceError> {
        self.db
            .transaction::<_, (), sea_orm::DbErr>(|txn| {
                Box::pin(async move {
                    let cart = ensure_cart(txn, user_id).await?;
                    cart_items::Entity::insert(cart_items::ActiveModel {
                        id: Set(Uuid::now_v7()),
                        cart_id: Set(cart.id),
                        product_id: Set(product_id),
                        quantity: Set(quantity),
                        created_at: Set(Utc::now()),
                    })
                    .on_conflict(
                        OnConflict::columns([
                            cart_items::Column::CartId,
                            cart_items::Column::ProductId,
                        ])
                        .value(
                            cart_items::Column::Quantity,
                            Expr::col((cart_items::Entity, cart_items::Column::Quantity))
                                .add(quantity),
                        )
                        .to_owned(),
                    )
                    .exec_without_returning(txn)
                    .await?;
                    Ok(())
                })
            })
            .await
            .context("add cart item")?;
        Ok(())
    }

    async fn find_item(
        &self,
        user_id: Uuid,
        item_id: Uuid,
    ) -> Result<Option<CartLine>, ShopServiceError> {
        let row = cart_items::Entity::find_by_id(item_id)
            .join(JoinType::InnerJoin, cart_items::Relation::Cart.def())
            .filter(carts::Column::UserId.eq(user_id))
            .find_also_related(products::Entity)
            .one(&self.db)
            .await
            .context("find cart item")?;
        Ok(row
            .map(|(item, product)| line_from_models(item, product))
            .transpose()?)
    }

    async fn set_quantity(&self, item_id: Uuid, quantity: i32) -> Result<(), ShopServiceError> {
        cart_items::ActiveModel {
            id: Set(item_id),
            quantity: Set(quantity),
            ..Default::default()
        }
        .update(&self.db)
        .await
        .context("set cart item quantity")?;
        Ok(())
    }

    async fn remove_item(&self, item_id: Uuid) -> Result<(), ShopServiceError> {
        cart_items::Entity::delete_by_id(item_id)
            .exec(&self.db)
            .await
            .context("remove cart item")?;
        Ok(())
    }
}
