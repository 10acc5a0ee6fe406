use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use bazaar_auth_types::identity::Identity;
use bazaar_core::serde::to_rfc3339_ms;
use bazaar_domain::order::OrderStatus;
use bazaar_domain::payment::PaymentMethod;

use crate::domain::types::{NewOrder, OrderSource};
use crate::error::ShopServiceError;
use crate::handlers::views::{OrderDetailView, OrderView};
use crate::state::AppState;
use crate::usecase::order::{
    CreateOrderUseCase, GetOrderUseCase, ListOrdersUseCase, SubmitPaymentProofInput,
    SubmitPaymentProofUseCase, Upload,
};

fn payment_method(raw: Option<&str>) -> Result<PaymentMethod, ShopServiceError> {
    match raw.map(str::trim).filter(|m| !m.is_empty()) {
        Some(raw) => Ok(raw.parse()?),
        None => Ok(PaymentMethod::Upi),
    }
}

async fn place_order(
    state: &AppState,
    input: NewOrder,
) -> Result<(StatusCode, Json<OrderDetailView>), ShopServiceError> {
    let usecase = CreateOrderUseCase {
        addresses: state.address_repo(),
        products: state.product_repo(),
        orders: state.order_repo(),
        users: state.user_repo(),
        mailer: state.mailer.clone(),
    };
    let detail = usecase.execute(input).await?;
    Ok((StatusCode::CREATED, Json(OrderDetailView::from(&detail))))
}

// ── POST /order/create ───────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct CreateOrderRequest {
    pub address_id: Uuid,
    pub payment_method: Option<String>,
}

pub async fn create_order(
    State(state): State<AppState>,
    identity: Identity,
    Json(body): Json<CreateOrderRequest>,
) -> Result<impl IntoResponse, ShopServiceError> {
    let input = NewOrder {
        user_id: identity.user_id,
        address_id: body.address_id,
        method: payment_method(body.payment_method.as_deref())?,
        source: OrderSource::Cart,
    };
    place_order(&state, input).await
}

// ── POST /order/direct-purchase ──────────────────────────────────────────────

#[derive(Deserialize)]
pub struct DirectPurchaseRequest {
    pub product_id: Uuid,
    pub quantity: i32,
    pub address_id: Uuid,
    pub payment_method: Option<String>,
}

pub async fn direct_purchase(
    State(state): State<AppState>,
    identity: Identity,
    Json(body): Json<DirectPurchaseRequest>,
) -> Result<impl IntoResponse, ShopServiceError> {
    let input = NewOrder {
        user_id: identity.user_id,
        address_id: body.address_id,
        method: payment_method(body.payment_method.as_deref())?,
        source: OrderSource::Direct {
            product_id: body.product_id,
            quantity: body.quantity,
        },
    };
    place_order(&state, input).await
}

// ── GET /order ───────────────────────────────────────────────────────────────

pub async fn list_orders(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Json<Vec<OrderView>>, ShopServiceError> {
    let usecase = ListOrdersUseCase {
        orders: state.order_repo(),
    };
    let orders = usecase.execute(identity.user_id).await?;
    Ok(Json(orders.iter().map(OrderView::from).collect()))
}

// ── GET /order/{order_number} ────────────────────────────────────────────────

pub async fn get_order(
    State(state): State<AppState>,
    identity: Identity,
    Path(order_number): Path<String>,
) -> Result<Json<OrderDetailView>, ShopServiceError> {
    let usecase = GetOrderUseCase {
        orders: state.order_repo(),
    };
    let detail = usecase.execute(identity.user_id, &order_number).await?;
    Ok(Json(OrderDetailView::from(&detail)))
}

// ── GET /order/{order_number}/status ─────────────────────────────────────────

#[derive(Serialize)]
pub struct OrderStatusResponse {
    pub order_number: String,
    pub status: OrderStatus,
    pub status_display: &'static str,
    #[serde(serialize_with = "to_rfc3339_ms")]
    pub last_updated: DateTime<Utc>,
}

pub async fn order_status(
    State(state): State<AppState>,
    identity: Identity,
    Path(order_number): Path<String>,
) -> Result<Json<OrderStatusResponse>, ShopServiceError> {
    let usecase = GetOrderUseCase {
        orders: state.order_repo(),
    };
    let detail = usecase.execute(identity.user_id, &order_number).await?;
    let order = detail.order;
    Ok(Json(OrderStatusResponse {
        status_display: order.status.display_name(),
        order_number: order.order_number,
        status: order.status,
        last_updated: order.updated_at,
    }))
}

// ── GET /payment/methods ─────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct PaymentMethodResponse {
    pub value: PaymentMethod,
    pub label: &'static str,
    pub description: &'static str,
}

pub async fn payment_methods(_identity: Identity) -> Json<Vec<PaymentMethodResponse>> {
    let body = PaymentMethod::ALL
        .into_iter()
        .map(|method| PaymentMethodResponse {
            value: method,
            label: method.label(),
            description: method.description(),
        })
        .collect();
    Json(body)
}

// ── POST /payment/verify/{order_number} ──────────────────────────────────────

async fn read_proof_form(
    mut multipart: Multipart,
) -> Result<(Option<String>, Option<String>, Option<Upload>), ShopServiceError> {
    let mut utr_number = None;
    let mut payment_date = None;
    let mut screenshot = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ShopServiceError::validation(e.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_owned();
        match name.as_str() {
            "utr_number" => {
                utr_number = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| ShopServiceError::validation(e.body_text()))?,
                );
            }
            "payment_date" => {
                payment_date = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| ShopServiceError::validation(e.body_text()))?,
                );
            }
            "transaction_ss" => {
                let file_name = field.file_name().map(str::to_owned);
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ShopServiceError::validation(e.body_text()))?;
                screenshot = Some(Upload { file_name, data });
            }
            _ => {}
        }
    }
    Ok((utr_number, payment_date, screenshot))
}

#[derive(Serialize)]
pub struct PaymentProofResponse {
    pub message: &'static str,
    pub order: OrderDetailView,
}

pub async fn submit_payment_proof(
    State(state): State<AppState>,
    identity: Identity,
    Path(order_number): Path<String>,
    multipart: Multipart,
) -> Result<Json<PaymentProofResponse>, ShopServiceError> {
    let (utr_number, payment_date, screenshot) = read_proof_form(multipart).await?;

    let usecase = SubmitPaymentProofUseCase {
        orders: state.order_repo(),
        screenshots: state.screenshots.clone(),
    };
    let detail = usecase
        .execute(SubmitPaymentProofInput {
            user_id: identity.user_id,
            order_number,
            utr_number,
            payment_date,
            screenshot,
        })
        .await?;
    Ok(Json(PaymentProofResponse {
        message: "payment details submitted, awaiting verification",
        order: OrderDetailView::from(&detail),
    }))
}
