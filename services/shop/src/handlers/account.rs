use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use bazaar_auth_types::identity::Identity;

use crate::error::ShopServiceError;
use crate::handlers::views::{AddressView, UserView};
use crate::state::AppState;
use crate::usecase::account::{AdminDashboardUseCase, ProfileUseCase};
use crate::usecase::address::{
    CreateAddressInput, CreateAddressUseCase, ListAddressesUseCase, SetDefaultAddressUseCase,
};

// ── GET /profile ─────────────────────────────────────────────────────────────

pub async fn profile(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Json<UserView>, ShopServiceError> {
    let usecase = ProfileUseCase {
        users: state.user_repo(),
    };
    let user = usecase.execute(identity.user_id).await?;
    Ok(Json(UserView::from(&user)))
}

// ── GET /admin-dashboard ─────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct AdminDashboardResponse {
    pub users: Vec<UserView>,
    pub total: usize,
}

pub async fn admin_dashboard(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Json<AdminDashboardResponse>, ShopServiceError> {
    let usecase = AdminDashboardUseCase {
        users: state.user_repo(),
    };
    let users = usecase.execute(&identity).await?;
    Ok(Json(AdminDashboardResponse {
        total: users.len(),
        users: users.iter().map(UserView::from).collect(),
    }))
}

// ── GET /addresses ───────────────────────────────────────────────────────────

pub async fn list_addresses(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Json<Vec<AddressView>>, ShopServiceError> {
    let usecase = ListAddressesUseCase {
        addresses: state.address_repo(),
    };
    let list = usecase.execute(identity.user_id).await?;
    Ok(Json(list.iter().map(AddressView::from).collect()))
}

// ── POST /addresses ──────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct CreateAddressRequest {
    pub phone: String,
    pub address_type: Option<String>,
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    #[serde(default)]
    pub is_default: bool,
}

pub async fn create_address(
    State(state): State<AppState>,
    identity: Identity,
    Json(body): Json<CreateAddressRequest>,
) -> Result<impl IntoResponse, ShopServiceError> {
    let usecase = CreateAddressUseCase {
        addresses: state.address_repo(),
    };
    let address = usecase
        .execute(CreateAddressInput {
            user_id: identity.user_id,
            phone: body.phone,
            address_type: body.address_type,
            street: body.street,
            city: body.city,
            state: body.state,
            zip_code: body.zip_code,
            is_default: body.is_default,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(AddressView::from(&address))))
}

// ── POST /addresses/{id}/default ─────────────────────────────────────────────

pub async fn set_default_address(
    State(state): State<AppState>,
    identity: Identity,
    Path(address_id): Path<Uuid>,
) -> Result<StatusCode, ShopServiceError> {
    let usecase = SetDefaultAddressUseCase {
        addresses: state.address_repo(),
    };
    usecase.execute(identity.user_id, address_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
