//! Turning purchase lines into an order draft.
//!
//! Pure: the caller loads (and locks) the products, persists the draft and applies
//! `stock_updates` inside one transaction.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use bazaar_domain::order::OrderStatus;
use bazaar_domain::payment::{PaymentMethod, PaymentStatus};

use crate::domain::types::{Order, OrderItem, Payment, Product};
use crate::error::ShopServiceError;

/// A product and the quantity requested of it.
#[derive(Debug, Clone)]
pub struct PurchaseLine {
    pub product: Product,
    pub quantity: i32,
}

#[derive(Debug, Clone)]
pub struct OrderDraft {
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub payment: Payment,
    /// `(product_id, remaining_stock)` per line.
    pub stock_updates: Vec<(Uuid, i32)>,
}

pub struct DraftInput<'a> {
    pub user_id: Uuid,
    pub address_id: Uuid,
    pub method: PaymentMethod,
    pub order_number: String,
    pub lines: &'a [PurchaseLine],
    pub now: DateTime<Utc>,
}

/// Every line is checked before anything is produced, so a shortage on any line
/// yields no draft at all.
pub fn draft_order(input: DraftInput<'_>) -> Result<OrderDraft, ShopServiceError> {
    if input.lines.is_empty() {
        return Err(ShopServiceError::EmptyCart);
    }

    for line in input.lines {
        if line.quantity < 1 {
            return Err(ShopServiceError::validation("quantity must be at least 1"));
        }
        if line.product.stock_quantity < line.quantity {
            return Err(ShopServiceError::InsufficientStock {
                product: line.product.name.clone(),
                available: line.product.stock_quantity,
                requested: line.quantity,
            });
        }
    }

    let order_id = Uuid::now_v7();
    let items: Vec<OrderItem> = input
        .lines
        .iter()
        .map(|line| OrderItem {
            id: Uuid::now_v7(),
            order_id,
            product_id: Some(line.product.id),
            product_name: line.product.name.clone(),
            product_price: line.product.price,
            product_image: line.product.image_url.clone(),
            quantity: line.quantity,
            total_price: line.product.price * Decimal::from(line.quantity),
        })
        .collect();
    let total: Decimal = items.iter().map(|i| i.total_price).sum();

    let stock_updates = input
        .lines
        .iter()
        .map(|line| (line.product.id, line.product.stock_quantity - line.quantity))
        .collect();

    Ok(OrderDraft {
        order: Order {
            id: order_id,
            user_id: input.user_id,
            order_number: input.order_number,
            total_amount: total,
            status: OrderStatus::PendingVerification,
            shipping_address_id: Some(input.address_id),
            created_at: input.now,
            updated_at: input.now,
        },
        items,
        payment: Payment {
            id: Uuid::now_v7(),
            order_id,
            method: input.method,
            amount: total,
            status: PaymentStatus::Pending,
            utr_number: None,
            payment_date: None,
            screenshot: None,
            admin_notes: None,
            created_at: input.now,
            updated_at: input.now,
        },
        stock_updates,
    })
}
