use chrono::Utc;
use uuid::Uuid;

use crate::domain::repository::AddressRepository;
use crate::domain::types::Address;
use crate::error::ShopServiceError;

pub const ADDRESS_TYPES: [&str; 3] = ["home", "work", "other"];

pub struct ListAddressesUseCase<A: AddressRepository> {
    pub addresses: A,
}

impl<A: AddressRepository> ListAddressesUseCase<A> {
    pub async fn execute(&self, user_id: Uuid) -> Result<Vec<Address>, ShopServiceError> {
        self.addresses.list_by_user(user_id).await
    }
}

// ── CreateAddress ────────────────────────────────────────────────────────────

pub struct CreateAddressInput {
    pub user_id: Uuid,
    pub phone: String,
    pub address_type: Option<String>,
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub is_default: bool,
}

fn required(field: &str, value: &str) -> Result<String, ShopServiceError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ShopServiceError::validation(format!("{field} is required")));
    }
    Ok(value.to_owned())
}

pub struct CreateAddressUseCase<A: AddressRepository> {
    pub addresses: A,
}

impl<A: AddressRepository> CreateAddressUseCase<A> {
    /// The first address of a user always becomes the default.
    pub async fn execute(&self, input: CreateAddressInput) -> Result<Address, ShopServiceError> {
        let address_type = input
            .address_type
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or("home")
            .to_lowercase();
        if !ADDRESS_TYPES.contains(&address_type.as_str()) {
            return Err(ShopServiceError::validation(format!(
                "address_type must be one of {}",
                ADDRESS_TYPES.join(", ")
            )));
        }

        let zip_code = required("zip_code", &input.zip_code)?;
        if !zip_code.chars().all(|c| c.is_ascii_digit()) || zip_code.len() > 10 {
            return Err(ShopServiceError::validation("zip_code must be numeric"));
        }

        let is_first = self.addresses.list_by_user(input.user_id).await?.is_empty();
        let address = Address {
            id: Uuid::now_v7(),
            user_id: input.user_id,
            phone: required("phone", &input.phone)?,
            address_type,
            street: required("street", &input.street)?,
            city: required("city", &input.city)?,
            state: required("state", &input.state)?,
            zip_code,
            is_default: input.is_default || is_first,
            created_at: Utc::now(),
        };
        self.addresses.create(&address).await?;
        Ok(address)
    }
}

// ── SetDefaultAddress ────────────────────────────────────────────────────────

pub struct SetDefaultAddressUseCase<A: AddressRepository> {
    pub addresses: A,
}

impl<A: AddressRepository> SetDefaultAddressUseCase<A> {
    pub async fn execute(&self, user_id: Uuid, address_id: Uuid) -> Result<(), ShopServiceError> {
        if !self.addresses.set_default(user_id, address_id).await? {
            return Err(ShopServiceError::AddressNotFound);
        }
        Ok(())
    }
}
