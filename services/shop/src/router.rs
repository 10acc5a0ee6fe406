use axum::{
    Router,
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    routing::{delete, get, post, put},
};
use tower_http::trace::TraceLayer;

use bazaar_core::health::{database_ready, healthz};
use bazaar_core::middleware::{propagate_request_id_layer, request_id_layer};

use crate::handlers::{
    account::{admin_dashboard, create_address, list_addresses, profile, set_default_address},
    admin::{advance_order, decide_order, list_by_status, list_pending, order_detail},
    auth::{login, logout, refresh_token, register, resend_activation_otp, verify_otp},
    cart::{add_to_cart, get_cart, remove_cart_item, update_cart_item},
    order::{
        create_order, direct_purchase, get_order, list_orders, order_status, payment_methods,
        submit_payment_proof,
    },
    password::{
        change_password, forgot_password, resend_reset_otp, reset_password, verify_reset_otp,
    },
};
use crate::state::AppState;

/// Upper bound for the payment proof form, screenshot included.
const PAYMENT_PROOF_BODY_LIMIT: usize = 10 * 1024 * 1024;

async fn readyz(State(state): State<AppState>) -> StatusCode {
    database_ready(&state.db).await
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // Auth
        .route("/auth/register", post(register))
        .route("/auth/verify-otp", post(verify_otp))
        .route("/auth/resend-otp", post(resend_activation_otp))
        .route("/auth/login", post(login))
        .route("/auth/token/refresh", post(refresh_token))
        .route("/auth/logout", post(logout))
        // Account
        .route("/profile", get(profile))
        .route("/admin-dashboard", get(admin_dashboard))
        .route("/addresses", get(list_addresses).post(create_address))
        .route("/addresses/{id}/default", post(set_default_address))
        // Password
        .route("/forgot-password", post(forgot_password))
        .route("/resend-otp", post(resend_reset_otp))
        .route("/verify-reset-otp", post(verify_reset_otp))
        .route("/reset-password", post(reset_password))
        .route("/change-password", post(change_password))
        // Cart
        .route("/cart", get(get_cart))
        .route("/cart/add", post(add_to_cart))
        .route("/cart/update/{id}", put(update_cart_item))
        .route("/cart/remove/{id}", delete(remove_cart_item))
        // Orders
        .route("/order", get(list_orders))
        .route("/order/create", post(create_order))
        .route("/order/direct-purchase", post(direct_purchase))
        .route("/order/{order_number}", get(get_order))
        .route("/order/{order_number}/status", get(order_status))
        // Payment
        .route("/payment/methods", get(payment_methods))
        .route(
            "/payment/verify/{order_number}",
            post(submit_payment_proof).layer(DefaultBodyLimit::max(PAYMENT_PROOF_BODY_LIMIT)),
        )
        // Admin
        .route("/admin/manage", get(list_by_status))
        .route("/admin/manage/pending", get(list_pending))
        .route(
            "/admin/manage/{order_number}",
            get(order_detail).post(advance_order),
        )
        .route("/admin/manage/{order_number}/status", post(decide_order))
        .layer(TraceLayer::new_for_http())
        .layer(propagate_request_id_layer())
        .layer(request_id_layer())
        .with_state(state)
}
