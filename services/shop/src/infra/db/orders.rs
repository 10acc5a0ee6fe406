use anyhow::Context as _;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection,
    DbBackend, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Statement, TransactionTrait,
    sea_query::Expr,
};
use uuid::Uuid;

use bazaar_domain::order::{OrderStatus, next_order_number, order_number_prefix};
use bazaar_shop_schema::{addresses, cart_items, carts, order_items, orders, payments, products, users};

use crate::domain::checkout::{DraftInput, OrderDraft, PurchaseLine, draft_order};
use crate::domain::repository::OrderRepository;
use crate::domain::types::{
    NewOrder, Order, OrderCustomer, OrderDetail, OrderItem, OrderSource, OrderSummary,
    OrderTransition, Payment, PaymentProof,
};
use crate::error::ShopServiceError;

use super::addresses::address_from_model;
use super::catalog::product_from_model;
use super::flatten_txn;

#[derive(Clone)]
pub struct DbOrderRepository {
    pub db: DatabaseConnection,
}

impl OrderRepository for DbOrderRepository {
    async fn create(
        &self,
        order: &NewOrder,
        now: DateTime<Utc>,
    ) -> Result<OrderDetail, ShopServiceError> {
        self.db
            .transaction::<_, OrderDetail, ShopServiceError>(|txn| {
                let order = order.clone();
                Box::pin(async move {
                    // 1. Lock every product row involved, in id order
                    let (lines, ordered_items) = match order.source {
                        OrderSource::Cart => lock_cart_lines(txn, order.user_id).await?,
                        OrderSource::Direct {
                            product_id,
                            quantity,
                        } => {
                            let product = products::Entity::find_by_id(product_id)
                                .lock_exclusive()
                                .one(txn)
                                .await
                                .context("lock product")?
                                .ok_or(ShopServiceError::ProductNotFound)?;
                            let line = PurchaseLine {
                                product: product_from_model(product),
                                quantity,
                            };
                            (vec![line], Vec::new())
                        }
                    };

                    // 2. Next number of the day, serialized per prefix
                    let order_number = allocate_order_number(txn, now).await?;

                    // 3. Check stock and snapshot; fails before anything is written
                    let draft = draft_order(DraftInput {
                        user_id: order.user_id,
                        address_id: order.address_id,
                        method: order.method,
                        order_number,
                        lines: &lines,
                        now,
                    })?;

                    // 4. Persist
                    write_draft(txn, &draft).await.context("write order")?;
                    // Lines added to the cart after the lock stay for the next checkout.
                    if !ordered_items.is_empty() {
                        cart_items::Entity::delete_many()
                            .filter(cart_items::Column::Id.is_in(ordered_items))
                            .exec(txn)
                            .await
                            .context("empty cart")?;
                    }

                    let model = orders::Entity::find_by_id(draft.order.id)
                        .one(txn)
                        .await
                        .context("reload order")?
                        .context("order vanished inside its transaction")?;
                    Ok(load_detail(txn, model).await?)
                })
            })
            .await
            .map_err(|e| flatten_txn(e, "create order"))
    }

    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Order>, ShopServiceError> {
        let models = orders::Entity::find()
            .filter(orders::Column::UserId.eq(user_id))
            .order_by_desc(orders::Column::CreatedAt)
            .all(&self.db)
            .await
            .context("list orders by user")?;
        Ok(models
            .into_iter()
            .map(order_from_model)
            .collect::<anyhow::Result<Vec<_>>>()?)
    }

    async fn find_detail(
        &self,
        order_number: &str,
    ) -> Result<Option<OrderDetail>, ShopServiceError> {
        let model = orders::Entity::find()
            .filter(orders::Column::OrderNumber.eq(order_number))
            .one(&self.db)
            .await
            .context("find order by number")?;
        match model {
            Some(model) => Ok(Some(load_detail(&self.db, model).await?)),
            None => Ok(None),
        }
    }

    async fn save_payment_proof(
        &self,
        order_id: Uuid,
        proof: &PaymentProof,
        now: DateTime<Utc>,
    ) -> Result<bool, ShopServiceError> {
        let proof = proof.clone();
        self.db
            .transaction::<_, bool, ShopServiceError>(|txn| {
                Box::pin(async move {
                    // Holds off admin decisions until the proof is written.
                    let order = orders::Entity::find_by_id(order_id)
                        .lock_exclusive()
                        .one(txn)
                        .await
                        .context("lock order for payment proof")?;
                    let Some(order) = order else {
                        return Ok(false);
                    };
                    if !order_from_model(order)?.status.accepts_payment_proof() {
                        return Ok(false);
                    }

                    let mut update = payments::Entity::update_many()
                        .col_expr(payments::Column::UtrNumber, Expr::value(proof.utr_number))
                        .col_expr(payments::Column::PaymentDate, Expr::value(proof.payment_date))
                        .col_expr(payments::Column::UpdatedAt, Expr::value(now))
                        .filter(payments::Column::OrderId.eq(order_id));
                    // A resubmission without a file keeps the previous screenshot.
                    if let Some(screenshot) = proof.screenshot {
                        update =
                            update.col_expr(payments::Column::Screenshot, Expr::value(screenshot));
                    }
                    update.exec(txn).await.context("save payment proof")?;
                    Ok(true)
                })
            })
            .await
            .map_err(|e| flatten_txn(e, "save payment proof"))
    }

    async fn transition(
        &self,
        transition: &OrderTransition,
        now: DateTime<Utc>,
    ) -> Result<bool, ShopServiceError> {
        let applied = self
            .db
            .transaction::<_, bool, sea_orm::DbErr>(|txn| {
                let transition = transition.clone();
                Box::pin(async move {
                    let moved = orders::Entity::update_many()
                        .col_expr(orders::Column::Status, Expr::value(transition.to.as_str()))
                        .col_expr(orders::Column::UpdatedAt, Expr::value(now))
                        .filter(orders::Column::Id.eq(transition.order_id))
                        .filter(orders::Column::Status.eq(transition.from.as_str()))
                        .exec(txn)
                        .await?;
                    if moved.rows_affected == 0 {
                        return Ok(false);
                    }

                    let mut payment = payments::Entity::update_many()
                        .col_expr(payments::Column::UpdatedAt, Expr::value(now))
                        .filter(payments::Column::OrderId.eq(transition.order_id));
                    if let Some(status) = transition.payment_status {
                        payment =
                            payment.col_expr(payments::Column::Status, Expr::value(status.as_str()));
                    }
                    if let Some(notes) = transition.admin_notes {
                        payment = payment.col_expr(payments::Column::AdminNotes, Expr::value(notes));
                    }
                    payment.exec(txn).await?;
                    Ok(true)
                })
            })
            .await
            .context("transition order")?;
        Ok(applied)
    }

    async fn list_by_status(
        &self,
        status: OrderStatus,
        limit: u64,
    ) -> Result<Vec<OrderSummary>, ShopServiceError> {
        let rows = orders::Entity::find()
            .filter(orders::Column::Status.eq(status.as_str()))
            .order_by_desc(orders::Column::CreatedAt)
            .limit(limit)
            .find_also_related(users::Entity)
            .all(&self.db)
            .await
            .context("list orders by status")?;

        let mut summaries = Vec::with_capacity(rows.len());
        for (order, user) in rows {
            let customer_email = user.map(|u| u.email).unwrap_or_default();
            summaries.push(OrderSummary {
                order: order_from_model(order)?,
                customer_email,
            });
        }
        Ok(summaries)
    }

    async fn list_pending(&self) -> Result<Vec<OrderDetail>, ShopServiceError> {
        let models = orders::Entity::find()
            .filter(orders::Column::Status.is_in([
                OrderStatus::PendingVerification.as_str(),
                OrderStatus::Processing.as_str(),
            ]))
            .order_by_asc(orders::Column::CreatedAt)
            .all(&self.db)
            .await
            .context("list pending orders")?;

        let mut details = Vec::with_capacity(models.len());
        for model in models {
            details.push(load_detail(&self.db, model).await?);
        }
        Ok(details)
    }
}

// ── Creation helpers ─────────────────────────────────────────────────────────

/// Cart lines joined with their products, items and product rows locked `FOR UPDATE`.
/// Returns the ids of the locked items so checkout removes only those.
async fn lock_cart_lines<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
) -> Result<(Vec<PurchaseLine>, Vec<Uuid>), ShopServiceError> {
    let cart = carts::Entity::find()
        .filter(carts::Column::UserId.eq(user_id))
        .one(conn)
        .await
        .context("find cart")?
        .ok_or(ShopServiceError::EmptyCart)?;

    let items = cart_items::Entity::find()
        .filter(cart_items::Column::CartId.eq(cart.id))
        .order_by_asc(cart_items::Column::CreatedAt)
        .lock_exclusive()
        .all(conn)
        .await
        .context("lock cart items")?;
    if items.is_empty() {
        return Err(ShopServiceError::EmptyCart);
    }

    let locked = products::Entity::find()
        .filter(products::Column::Id.is_in(items.iter().map(|i| i.product_id)))
        .order_by_asc(products::Column::Id)
        .lock_exclusive()
        .all(conn)
        .await
        .context("lock cart products")?;

    let ids = items.iter().map(|i| i.id).collect();
    let mut lines = Vec::with_capacity(items.len());
    for item in items {
        let product = locked
            .iter()
            .find(|p| p.id == item.product_id)
            .cloned()
            .ok_or(ShopServiceError::ProductNotFound)?;
        lines.push(PurchaseLine {
            product: product_from_model(product),
            quantity: item.quantity,
        });
    }
    Ok((lines, ids))
}

/// `ORD<YYYYMMDD><seq>`; the advisory lock holds until the transaction ends.
async fn allocate_order_number<C: ConnectionTrait>(
    conn: &C,
    now: DateTime<Utc>,
) -> Result<String, ShopServiceError> {
    let today = now.date_naive();
    let prefix = order_number_prefix(today);

    conn.execute(Statement::from_sql_and_values(
        DbBackend::Postgres,
        "SELECT pg_advisory_xact_lock(hashtext($1))",
        [prefix.clone().into()],
    ))
    .await
    .context("lock order number sequence")?;

    let last = orders::Entity::find()
        .select_only()
        .column(orders::Column::OrderNumber)
        .filter(orders::Column::OrderNumber.starts_with(&prefix))
        .order_by_desc(orders::Column::OrderNumber)
        .into_tuple::<String>()
        .one(conn)
        .await
        .context("find last order number")?;

    Ok(next_order_number(today, last.as_deref()))
}

async fn write_draft<C: ConnectionTrait>(conn: &C, draft: &OrderDraft) -> Result<(), sea_orm::DbErr> {
    for (product_id, remaining) in &draft.stock_updates {
        products::Entity::update_many()
            .col_expr(products::Column::StockQuantity, Expr::value(*remaining))
            .filter(products::Column::Id.eq(*product_id))
            .exec(conn)
            .await?;
    }

    let order = &draft.order;
    orders::ActiveModel {
        id: Set(order.id),
        user_id: Set(order.user_id),
        order_number: Set(order.order_number.clone()),
        total_amount: Set(order.total_amount),
        status: Set(order.status.as_str().to_owned()),
        shipping_address_id: Set(order.shipping_address_id),
        created_at: Set(order.created_at),
        updated_at: Set(order.updated_at),
    }
    .insert(conn)
    .await?;

    order_items::Entity::insert_many(draft.items.iter().map(|item| order_items::ActiveModel {
        id: Set(item.id),
        order_id: Set(item.order_id),
        product_id: Set(item.product_id),
        product_name: Set(item.product_name.clone()),
        product_price: Set(item.product_price),
        product_image: Set(item.product_image.clone()),
        quantity: Set(item.quantity),
        total_price: Set(item.total_price),
    }))
    .exec_without_returning(conn)
    .await?;

    let payment = &draft.payment;
    payments::ActiveModel {
        id: Set(payment.id),
        order_id: Set(payment.order_id),
        method: Set(payment.method.as_str().to_owned()),
        amount: Set(payment.amount),
        status: Set(payment.status.as_str().to_owned()),
        utr_number: Set(None),
        payment_date: Set(None),
        screenshot: Set(None),
        admin_notes: Set(None),
        created_at: Set(payment.created_at),
        updated_at: Set(payment.updated_at),
    }
    .insert(conn)
    .await?;
    Ok(())
}

// ── Mapping ──────────────────────────────────────────────────────────────────

async fn load_detail<C: ConnectionTrait>(
    conn: &C,
    model: orders::Model,
) -> anyhow::Result<OrderDetail> {
    let items = order_items::Entity::find()
        .filter(order_items::Column::OrderId.eq(model.id))
        .all(conn)
        .await
        .context("load order items")?;
    let payment = payments::Entity::find()
        .filter(payments::Column::OrderId.eq(model.id))
        .one(conn)
        .await
        .context("load payment")?
        .with_context(|| format!("order {} has no payment", model.order_number))?;
    let customer = users::Entity::find_by_id(model.user_id)
        .one(conn)
        .await
        .context("load order customer")?
        .with_context(|| format!("order {} has no customer", model.order_number))?;
    let shipping_address = match model.shipping_address_id {
        Some(id) => addresses::Entity::find_by_id(id)
            .one(conn)
            .await
            .context("load shipping address")?
            .map(address_from_model),
        None => None,
    };

    Ok(OrderDetail {
        order: order_from_model(model)?,
        items: items.into_iter().map(item_from_model).collect(),
        payment: payment_from_model(payment)?,
        customer: OrderCustomer {
            id: customer.id,
            username: customer.username,
            email: customer.email,
        },
        shipping_address,
    })
}

fn order_from_model(model: orders::Model) -> anyhow::Result<Order> {
    let status = model
        .status
        .parse::<OrderStatus>()
        .with_context(|| format!("order {}", model.order_number))?;
    Ok(Order {
        id: model.id,
        user_id: model.user_id,
        order_number: model.order_number,
        total_amount: model.total_amount,
        status,
        shipping_address_id: model.shipping_address_id,
        created_at: model.created_at,
        updated_at: model.updated_at,
    })
}

fn item_from_model(model: order_items::Model) -> OrderItem {
    OrderItem {
        id: model.id,
        order_id: model.order_id,
        product_id: model.product_id,
        product_name: model.product_name,
        product_price: model.product_price,
        product_image: model.product_image,
        quantity: model.quantity,
        total_price: model.total_price,
    }
}

fn payment_from_model(model: payments::Model) -> anyhow::Result<Payment> {
    Ok(Payment {
        id: model.id,
        order_id: model.order_id,
        method: model.method.parse().context("payment method")?,
        amount: model.amount,
        status: model.status.parse().context("payment status")?,
        utr_number: model.utr_number,
        payment_date: model.payment_date,
        screenshot: model.screenshot,
        admin_notes: model.admin_notes,
        created_at: model.created_at,
        updated_at: model.updated_at,
    })
}
