use axum::{
    Json,
    extract::{Path, Query, State},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use bazaar_auth_types::identity::Identity;
use bazaar_core::serde::to_rfc3339_ms;
use bazaar_domain::order::{AdminDecision, FulfilmentStep, OrderStatus};

use crate::error::ShopServiceError;
use crate::handlers::views::AdminOrderView;
use crate::state::AppState;
use crate::usecase::admin::{
    AdminOrderDetailUseCase, AdvanceOrderUseCase, DecideOrderInput, DecideOrderUseCase,
    ListOrdersByStatusUseCase, ListPendingOrdersUseCase,
};

fn parse_decision(raw: &str) -> Result<AdminDecision, ShopServiceError> {
    match raw.trim() {
        "confirmed" => Ok(AdminDecision::Confirmed),
        "cancelled" => Ok(AdminDecision::Cancelled),
        _ => Err(ShopServiceError::validation(
            "status must be one of: confirmed, cancelled",
        )),
    }
}

fn parse_step(raw: &str) -> Result<FulfilmentStep, ShopServiceError> {
    match raw.trim() {
        "shipped" => Ok(FulfilmentStep::Shipped),
        "delivered" => Ok(FulfilmentStep::Delivered),
        "refunded" => Ok(FulfilmentStep::Refunded),
        _ => Err(ShopServiceError::validation(
            "status must be one of: shipped, delivered, refunded",
        )),
    }
}

#[derive(Serialize)]
pub struct StatusChangeResponse {
    pub message: String,
    pub order_number: String,
    pub new_status: OrderStatus,
}

impl StatusChangeResponse {
    fn new(order_number: String, status: OrderStatus) -> Self {
        Self {
            message: format!("Order {status} successfully"),
            order_number,
            new_status: status,
        }
    }
}

// ── GET /admin/manage?status= ────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct StatusQuery {
    pub status: Option<String>,
}

#[derive(Serialize)]
pub struct OrderRowResponse {
    pub order_number: String,
    pub user_email: String,
    pub total_amount: Decimal,
    pub status: OrderStatus,
    #[serde(serialize_with = "to_rfc3339_ms")]
    pub created_at: DateTime<Utc>,
    #[serde(serialize_with = "to_rfc3339_ms")]
    pub updated_at: DateTime<Utc>,
}

pub async fn list_by_status(
    State(state): State<AppState>,
    identity: Identity,
    Query(query): Query<StatusQuery>,
) -> Result<Json<Vec<OrderRowResponse>>, ShopServiceError> {
    // Role first, so non-admins never learn anything about the query.
    identity.require_admin()?;
    let status: OrderStatus = query
        .status
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ShopServiceError::validation("status query parameter is required"))?
        .parse()?;

    let usecase = ListOrdersByStatusUseCase {
        orders: state.order_repo(),
    };
    let rows = usecase.execute(&identity, status).await?;
    let body = rows
        .into_iter()
        .map(|row| OrderRowResponse {
            order_number: row.order.order_number,
            user_email: row.customer_email,
            total_amount: row.order.total_amount,
            status: row.order.status,
            created_at: row.order.created_at,
            updated_at: row.order.updated_at,
        })
        .collect();
    Ok(Json(body))
}

// ── GET /admin/manage/pending ────────────────────────────────────────────────

pub async fn list_pending(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Json<Vec<AdminOrderView>>, ShopServiceError> {
    let usecase = ListPendingOrdersUseCase {
        orders: state.order_repo(),
    };
    let list = usecase.execute(&identity).await?;
    Ok(Json(list.iter().map(AdminOrderView::from).collect()))
}

// ── GET /admin/manage/{order_number} ─────────────────────────────────────────

pub async fn order_detail(
    State(state): State<AppState>,
    identity: Identity,
    Path(order_number): Path<String>,
) -> Result<Json<AdminOrderView>, ShopServiceError> {
    let usecase = AdminOrderDetailUseCase {
        orders: state.order_repo(),
    };
    let detail = usecase.execute(&identity, &order_number).await?;
    Ok(Json(AdminOrderView::from(&detail)))
}

// ── POST /admin/manage/{order_number} ────────────────────────────────────────

#[derive(Deserialize)]
pub struct AdvanceRequest {
    pub status: String,
}

pub async fn advance_order(
    State(state): State<AppState>,
    identity: Identity,
    Path(order_number): Path<String>,
    Json(body): Json<AdvanceRequest>,
) -> Result<Json<StatusChangeResponse>, ShopServiceError> {
    identity.require_admin()?;
    let step = parse_step(&body.status)?;

    let usecase = AdvanceOrderUseCase {
        orders: state.order_repo(),
    };
    let detail = usecase.execute(&identity, &order_number, step).await?;
    Ok(Json(StatusChangeResponse::new(
        detail.order.order_number,
        detail.order.status,
    )))
}

// ── POST /admin/manage/{order_number}/status ─────────────────────────────────

#[derive(Deserialize)]
pub struct DecideRequest {
    pub status: String,
    pub admin_notes: Option<String>,
}

pub async fn decide_order(
    State(state): State<AppState>,
    identity: Identity,
    Path(order_number): Path<String>,
    Json(body): Json<DecideRequest>,
) -> Result<Json<StatusChangeResponse>, ShopServiceError> {
    identity.require_admin()?;
    let decision = parse_decision(&body.status)?;

    let usecase = DecideOrderUseCase {
        orders: state.order_repo(),
        mailer: state.mailer.clone(),
    };
    let detail = usecase
        .execute(
            &identity,
            DecideOrderInput {
                order_number,
                decision,
                admin_notes: body.admin_notes,
            },
        )
        .await?;
    Ok(Json(StatusChangeResponse::new(
        detail.order.order_number,
        detail.order.status,
    )))
}
