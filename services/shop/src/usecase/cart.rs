use uuid::Uuid;

use crate::domain::repository::{CartRepository, ProductRepository};
use crate::domain::types::Cart;
use crate::error::ShopServiceError;

pub struct GetCartUseCase<C: CartRepository> {
    pub carts: C,
}

impl<C: CartRepository> GetCartUseCase<C> {
    pub async fn execute(&self, user_id: Uuid) -> Result<Cart, ShopServiceError> {
        self.carts.get_or_create(user_id).await
    }
}

// ── AddToCart ────────────────────────────────────────────────────────────────

pub struct AddToCartInput {
    pub user_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
}

pub struct AddToCartUseCase<P, C>
where
    P: ProductRepository,
    C: CartRepository,
{
    pub products: P,
    pub carts: C,
}

impl<P, C> AddToCartUseCase<P, C>
where
    P: ProductRepository,
    C: CartRepository,
{
    pub async fn execute(&self, input: AddToCartInput) -> Result<Cart, ShopServiceError> {
        if input.quantity < 1 {
            return Err(ShopServiceError::validation("quantity must be at least 1"));
        }
        if self.products.find_by_id(input.product_id).await?.is_none() {
            return Err(ShopServiceError::ProductNotFound);
        }

        self.carts
            .add_item(input.user_id, input.product_id, input.quantity)
            .await?;
        self.carts.get_or_create(input.user_id).await
    }
}

// ── UpdateCartItem ───────────────────────────────────────────────────────────

pub struct UpdateCartItemInput {
    pub user_id: Uuid,
    pub item_id: Uuid,
    pub quantity: i32,
}

pub struct UpdateCartItemUseCase<C: CartRepository> {
    pub carts: C,
}

impl<C: CartRepository> UpdateCartItemUseCase<C> {
    /// A quantity of zero or less removes the line.
    pub async fn execute(&self, input: UpdateCartItemInput) -> Result<Cart, ShopServiceError> {
        let line = self
            .carts
            .find_item(input.user_id, input.item_id)
            .await?
            .ok_or(ShopServiceError::CartItemNotFound)?;

        if input.quantity <= 0 {
            self.carts.remove_item(line.item_id).await?;
        } else {
            self.carts.set_quantity(line.item_id, input.quantity).await?;
        }
        self.carts.get_or_create(input.user_id).await
    }
}

// ── RemoveCartItem ───────────────────────────────────────────────────────────

pub struct RemoveCartItemUseCase<C: CartRepository> {
    pub carts: C,
}

impl<C: CartRepository> RemoveCartItemUseCase<C> {
    pub async fn execute(&self, user_id: Uuid, item_id: Uuid) -> Result<Cart, ShopServiceError> {
        let line = self
            .carts
            .find_item(user_id, item_id)
            .await?
            .ok_or(ShopServiceError::CartItemNotFound)?;
        self.carts.remove_item(line.item_id).await?;
        self.carts.get_or_create(user_id).await
    }
}
