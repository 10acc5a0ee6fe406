use chrono::Utc;

use bazaar_auth_types::identity::Identity;
use bazaar_domain::order::{AdminDecision, FulfilmentStep, OrderStatus};
use bazaar_domain::payment::PaymentStatus;

use crate::domain::repository::{Mailer, OrderRepository};
use crate::domain::types::{ADMIN_LIST_LIMIT, OrderDetail, OrderSummary, OrderTransition};
use crate::error::ShopServiceError;
use crate::usecase::notify;

async fn load<O: OrderRepository>(
    orders: &O,
    order_number: &str,
) -> Result<OrderDetail, ShopServiceError> {
    orders
        .find_detail(order_number)
        .await?
        .ok_or(ShopServiceError::OrderNotFound)
}

/// Apply a transition computed against `detail` and reload the order.
/// Loses to any concurrent change with `InvalidState`.
async fn apply<O: OrderRepository>(
    orders: &O,
    detail: &OrderDetail,
    to: OrderStatus,
    payment_status: Option<PaymentStatus>,
    admin_notes: Option<String>,
) -> Result<OrderDetail, ShopServiceError> {
    let transition = OrderTransition {
        order_id: detail.order.id,
        from: detail.order.status,
        to,
        payment_status,
        admin_notes,
    };
    if !orders.transition(&transition, Utc::now()).await? {
        return Err(ShopServiceError::InvalidState(format!(
            "order {} was modified concurrently",
            detail.order.order_number
        )));
    }
    tracing::info!(
        order_number = %detail.order.order_number,
        from = %transition.from,
        to = %transition.to,
        "order transitioned"
    );
    load(orders, &detail.order.order_number).await
}

// ── DecideOrder ──────────────────────────────────────────────────────────────

pub struct DecideOrderInput {
    pub order_number: String,
    pub decision: AdminDecision,
    pub admin_notes: Option<String>,
}

pub struct DecideOrderUseCase<O, M>
where
    O: OrderRepository,
    M: Mailer,
{
    pub orders: O,
    pub mailer: M,
}

impl<O, M> DecideOrderUseCase<O, M>
where
    O: OrderRepository,
    M: Mailer,
{
    /// Confirm or cancel an order awaiting verification, then tell the purchaser.
    pub async fn execute(
        &self,
        identity: &Identity,
        input: DecideOrderInput,
    ) -> Result<OrderDetail, ShopServiceError> {
        identity.require_admin()?;

        let detail = load(&self.orders, &input.order_number).await?;
        let to = input.decision.apply(detail.order.status)?;
        let notes = input.admin_notes.filter(|n| !n.trim().is_empty());
        let updated = apply(
            &self.orders,
            &detail,
            to,
            Some(input.decision.payment_status()),
            notes.clone(),
        )
        .await?;

        let email = notify::order_status(&updated, notes.as_deref());
        if let Err(e) = self.mailer.send(&email).await {
            tracing::warn!(
                order_number = %updated.order.order_number,
                error = %e,
                "order status email failed"
            );
        }
        Ok(updated)
    }
}

// ── AdvanceOrder ─────────────────────────────────────────────────────────────

pub struct AdvanceOrderUseCase<O: OrderRepository> {
    pub orders: O,
}

impl<O: OrderRepository> AdvanceOrderUseCase<O> {
    pub async fn execute(
        &self,
        identity: &Identity,
        order_number: &str,
        step: FulfilmentStep,
    ) -> Result<OrderDetail, ShopServiceError> {
        identity.require_admin()?;

        let detail = load(&self.orders, order_number).await?;
        let to = step.apply(detail.order.status)?;
        apply(&self.orders, &detail, to, step.payment_status(), None).await
    }
}

// ── Admin reads ──────────────────────────────────────────────────────────────

pub struct ListOrdersByStatusUseCase<O: OrderRepository> {
    pub orders: O,
}

impl<O: OrderRepository> ListOrdersByStatusUseCase<O> {
    pub async fn execute(
        &self,
        identity: &Identity,
        status: OrderStatus,
    ) -> Result<Vec<OrderSummary>, ShopServiceError> {
        identity.require_admin()?;
        self.orders.list_by_status(status, ADMIN_LIST_LIMIT).await
    }
}

pub struct ListPendingOrdersUseCase<O: OrderRepository> {
    pub orders: O,
}

impl<O: OrderRepository> ListPendingOrdersUseCase<O> {
    pub async fn execute(&self, identity: &Identity) -> Result<Vec<OrderDetail>, ShopServiceError> {
        identity.require_admin()?;
        self.orders.list_pending().await
    }
}

pub struct AdminOrderDetailUseCase<O: OrderRepository> {
    pub orders: O,
}

impl<O: OrderRepository> AdminOrderDetailUseCase<O> {
    pub async fn execute(
        &self,
        identity: &Identity,
        order_number: &str,
    ) -> Result<OrderDetail, ShopServiceError> {
        identity.require_admin()?;
        load(&self.orders, order_number).await
    }
}
