use bytes::Bytes;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use uuid::Uuid;

use crate::domain::repository::{
    AddressRepository, Mailer, OrderRepository, ProductRepository, ScreenshotStore,
    UserRepository,
};
use crate::domain::types::{NewOrder, Order, OrderDetail, OrderSource, PaymentProof};
use crate::error::ShopServiceError;
use crate::usecase::notify;

/// Load an order, hiding orders of other users behind `OrderNotFound`.
async fn owned_order<O: OrderRepository>(
    orders: &O,
    user_id: Uuid,
    order_number: &str,
) -> Result<OrderDetail, ShopServiceError> {
    orders
        .find_detail(order_number)
        .await?
        .filter(|d| d.order.user_id == user_id)
        .ok_or(ShopServiceError::OrderNotFound)
}

// ── CreateOrder ──────────────────────────────────────────────────────────────

pub struct CreateOrderUseCase<A, P, O, U, M>
where
    A: AddressRepository,
    P: ProductRepository,
    O: OrderRepository,
    U: UserRepository,
    M: Mailer,
{
    pub addresses: A,
    pub products: P,
    pub orders: O,
    pub users: U,
    pub mailer: M,
}

impl<A, P, O, U, M> CreateOrderUseCase<A, P, O, U, M>
where
    A: AddressRepository,
    P: ProductRepository,
    O: OrderRepository,
    U: UserRepository,
    M: Mailer,
{
    pub async fn execute(&self, input: NewOrder) -> Result<OrderDetail, ShopServiceError> {
        // 1. The shipping address must belong to the buyer
        if self
            .addresses
            .find_owned(input.user_id, input.address_id)
            .await?
            .is_none()
        {
            return Err(ShopServiceError::validation(
                "invalid address or address does not belong to you",
            ));
        }

        // 2. Direct purchases name an existing product and a positive quantity
        if let OrderSource::Direct {
            product_id,
            quantity,
        } = input.source
        {
            if quantity < 1 {
                return Err(ShopServiceError::validation("quantity must be at least 1"));
            }
            if self.products.find_by_id(product_id).await?.is_none() {
                return Err(ShopServiceError::ProductNotFound);
            }
        }

        // 3. Stock, items, payment and cart clearing commit together
        let detail = self.orders.create(&input, Utc::now()).await?;
        tracing::info!(
            order_number = %detail.order.order_number,
            user_id = %input.user_id,
            total = %detail.order.total_amount,
            "order created"
        );

        // 4. Runs once per committed order
        let admins = self.users.list_admin_emails().await?;
        if admins.is_empty() {
            tracing::warn!(order_number = %detail.order.order_number, "no admin to notify");
        } else {
            self.mailer.send(&notify::new_order(admins, &detail)).await?;
        }

        Ok(detail)
    }
}

// ── Owner reads ──────────────────────────────────────────────────────────────

pub struct ListOrdersUseCase<O: OrderRepository> {
    pub orders: O,
}

impl<O: OrderRepository> ListOrdersUseCase<O> {
    pub async fn execute(&self, user_id: Uuid) -> Result<Vec<Order>, ShopServiceError> {
        self.orders.list_by_user(user_id).await
    }
}

pub struct GetOrderUseCase<O: OrderRepository> {
    pub orders: O,
}

impl<O: OrderRepository> GetOrderUseCase<O> {
    pub async fn execute(
        &self,
        user_id: Uuid,
        order_number: &str,
    ) -> Result<OrderDetail, ShopServiceError> {
        owned_order(&self.orders, user_id, order_number).await
    }
}

// ── SubmitPaymentProof ───────────────────────────────────────────────────────

pub struct Upload {
    pub file_name: Option<String>,
    pub data: Bytes,
}

pub struct SubmitPaymentProofInput {
    pub user_id: Uuid,
    pub order_number: String,
    pub utr_number: Option<String>,
    pub payment_date: Option<String>,
    pub screenshot: Option<Upload>,
}

/// Accepts `YYYY-MM-DD`, `YYYY-MM-DDTHH:MM` or RFC 3339.
pub fn parse_payment_date(raw: &str) -> Result<DateTime<Utc>, ShopServiceError> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M") {
        return Ok(dt.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(|d| d.and_time(NaiveTime::MIN).and_utc())
        .map_err(|_| ShopServiceError::validation("payment_date must be a date (YYYY-MM-DD)"))
}

pub struct SubmitPaymentProofUseCase<O, S>
where
    O: OrderRepository,
    S: ScreenshotStore,
{
    pub orders: O,
    pub screenshots: S,
}

impl<O, S> SubmitPaymentProofUseCase<O, S>
where
    O: OrderRepository,
    S: ScreenshotStore,
{
    /// Stores the evidence on the payment. The order status is left alone.
    pub async fn execute(
        &self,
        input: SubmitPaymentProofInput,
    ) -> Result<OrderDetail, ShopServiceError> {
        let detail = owned_order(&self.orders, input.user_id, &input.order_number).await?;
        if !detail.order.status.accepts_payment_proof() {
            return Err(ShopServiceError::InvalidState(format!(
                "payment proof cannot be submitted for an order that is {}",
                detail.order.status
            )));
        }

        let utr_number = input
            .utr_number
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .ok_or_else(|| ShopServiceError::validation("UTR number is required"))?
            .to_owned();
        let payment_date = input
            .payment_date
            .as_deref()
            .filter(|d| !d.trim().is_empty())
            .map(parse_payment_date)
            .transpose()?;

        let screenshot = match input.screenshot.filter(|u| !u.data.is_empty()) {
            Some(upload) => Some(
                self.screenshots
                    .save(
                        &detail.order.order_number,
                        upload.file_name.as_deref(),
                        upload.data,
                    )
                    .await?,
            ),
            None => None,
        };

        let proof = PaymentProof {
            utr_number,
            payment_date,
            screenshot,
        };
        let saved = match self
            .orders
            .save_payment_proof(detail.order.id, &proof, Utc::now())
            .await
        {
            Ok(true) => Ok(()),
            Ok(false) => Err(ShopServiceError::InvalidState(format!(
                "order {} no longer accepts payment proof",
                detail.order.order_number
            ))),
            Err(e) => Err(e),
        };
        if let Err(e) = saved {
            if let Some(reference) = &proof.screenshot {
                if let Err(discard) = self.screenshots.discard(reference).await {
                    tracing::warn!(%reference, error = %discard, "orphaned payment screenshot");
                }
            }
            return Err(e);
        }
        tracing::info!(order_number = %detail.order.order_number, "payment proof submitted");

        owned_order(&self.orders, input.user_id, &input.order_number).await
    }
}
