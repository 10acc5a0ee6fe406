use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use uuid::Uuid;

use bazaar_auth_types::identity::Identity;

use crate::error::ShopServiceError;
use crate::handlers::views::CartView;
use crate::state::AppState;
use crate::usecase::cart::{
    AddToCartInput, AddToCartUseCase, GetCartUseCase, RemoveCartItemUseCase,
    UpdateCartItemInput, UpdateCartItemUseCase,
};

fn default_quantity() -> i32 {
    1
}

// ── GET /cart ────────────────────────────────────────────────────────────────

pub async fn get_cart(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Json<CartView>, ShopServiceError> {
    let usecase = GetCartUseCase {
        carts: state.cart_repo(),
    };
    let cart = usecase.execute(identity.user_id).await?;
    Ok(Json(CartView::from(&cart)))
}

// ── POST /cart/add ───────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct AddToCartRequest {
    pub product_id: Uuid,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
}

pub async fn add_to_cart(
    State(state): State<AppState>,
    identity: Identity,
    Json(body): Json<AddToCartRequest>,
) -> Result<Json<CartView>, ShopServiceError> {
    let usecase = AddToCartUseCase {
        products: state.product_repo(),
        carts: state.cart_repo(),
    };
    let cart = usecase
        .execute(AddToCartInput {
            user_id: identity.user_id,
            product_id: body.product_id,
            quantity: body.quantity,
        })
        .await?;
    Ok(Json(CartView::from(&cart)))
}

// ── PUT /cart/update/{id} ────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct UpdateCartItemRequest {
    pub quantity: i32,
}

pub async fn update_cart_item(
    State(state): State<AppState>,
    identity: Identity,
    Path(item_id): Path<Uuid>,
    Json(body): Json<UpdateCartItemRequest>,
) -> Result<Json<CartView>, ShopServiceError> {
    let usecase = UpdateCartItemUseCase {
        carts: state.cart_repo(),
    };
    let cart = usecase
        .execute(UpdateCartItemInput {
            user_id: identity.user_id,
            item_id,
            quantity: body.quantity,
        })
        .await?;
    Ok(Json(CartView::from(&cart)))
}

// ── DELETE /cart/remove/{id} ─────────────────────────────────────────────────

pub async fn remove_cart_item(
    State(state): State<AppState>,
    identity: Identity,
    Path(item_id): Path<Uuid>,
) -> Result<Json<CartView>, ShopServiceError> {
    let usecase = RemoveCartItemUseCase {
        carts: state.cart_repo(),
    };
    let cart = usecase.execute(identity.user_id, item_id).await?;
    Ok(Json(CartView::from(&cart)))
}
