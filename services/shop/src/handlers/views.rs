//! JSON shapes shared by several handlers.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use bazaar_core::serde::{to_rfc3339_ms, to_rfc3339_ms_opt};
use bazaar_domain::order::{AdminActions, OrderStatus};
use bazaar_domain::payment::{PaymentMethod, PaymentStatus};

use crate::domain::types::{
    Address, Cart, CartLine, Order, OrderDetail, OrderItem, Payment, User,
};

#[derive(Serialize)]
pub struct UserView {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub is_active: bool,
    pub is_admin: bool,
    #[serde(serialize_with = "to_rfc3339_ms")]
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            is_active: user.is_active,
            is_admin: user.is_admin,
            created_at: user.created_at,
        }
    }
}

#[derive(Serialize)]
pub struct AddressView {
    pub id: Uuid,
    pub phone: String,
    pub address_type: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub is_default: bool,
}

impl From<&Address> for AddressView {
    fn from(address: &Address) -> Self {
        Self {
            id: address.id,
            phone: address.phone.clone(),
            address_type: address.address_type.clone(),
            street: address.street.clone(),
            city: address.city.clone(),
            state: address.state.clone(),
            zip_code: address.zip_code.clone(),
            is_default: address.is_default,
        }
    }
}

// ── Cart ─────────────────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct CartItemView {
    pub id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub product_price: Decimal,
    pub product_image: Option<String>,
    pub quantity: i32,
    pub total_price: Decimal,
}

impl From<&CartLine> for CartItemView {
    fn from(line: &CartLine) -> Self {
        Self {
            id: line.item_id,
            product_id: line.product.id,
            product_name: line.product.name.clone(),
            product_price: line.product.price,
            product_image: line.product.image_url.clone(),
            quantity: line.quantity,
            total_price: line.total_price(),
        }
    }
}

#[derive(Serialize)]
pub struct CartView {
    pub id: Uuid,
    pub items: Vec<CartItemView>,
    pub total_price: Decimal,
    pub total_items: i32,
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        Self {
            id: cart.id,
            items: cart.items.iter().map(CartItemView::from).collect(),
            total_price: cart.total_price(),
            total_items: cart.total_items(),
        }
    }
}

// ── Orders ───────────────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct OrderView {
    pub order_number: String,
    pub total_amount: Decimal,
    pub status: OrderStatus,
    pub status_display: &'static str,
    #[serde(serialize_with = "to_rfc3339_ms")]
    pub created_at: DateTime<Utc>,
    #[serde(serialize_with = "to_rfc3339_ms")]
    pub updated_at: DateTime<Utc>,
}

impl From<&Order> for OrderView {
    fn from(order: &Order) -> Self {
        Self {
            order_number: order.order_number.clone(),
            total_amount: order.total_amount,
            status: order.status,
            status_display: order.status.display_name(),
            created_at: order.created_at,
            updated_at: order.updated_at,
        }
    }
}

#[derive(Serialize)]
pub struct OrderItemView {
    pub product_id: Option<Uuid>,
    pub product_name: String,
    pub product_price: Decimal,
    pub product_image: Option<String>,
    pub quantity: i32,
    pub total_price: Decimal,
}

impl From<&OrderItem> for OrderItemView {
    fn from(item: &OrderItem) -> Self {
        Self {
            product_id: item.product_id,
            product_name: item.product_name.clone(),
            product_price: item.product_price,
            product_image: item.product_image.clone(),
            quantity: item.quantity,
            total_price: item.total_price,
        }
    }
}

#[derive(Serialize)]
pub struct PaymentView {
    pub method: PaymentMethod,
    pub method_display: &'static str,
    pub amount: Decimal,
    pub status: PaymentStatus,
    pub utr_number: Option<String>,
    #[serde(serialize_with = "to_rfc3339_ms_opt")]
    pub payment_date: Option<DateTime<Utc>>,
    pub transaction_ss: Option<String>,
    pub admin_notes: Option<String>,
}

impl From<&Payment> for PaymentView {
    fn from(payment: &Payment) -> Self {
        Self {
            method: payment.method,
            method_display: payment.method.label(),
            amount: payment.amount,
            status: payment.status,
            utr_number: payment.utr_number.clone(),
            payment_date: payment.payment_date,
            transaction_ss: payment.screenshot.clone(),
            admin_notes: payment.admin_notes.clone(),
        }
    }
}

#[derive(Serialize)]
pub struct OrderDetailView {
    #[serde(flatten)]
    pub order: OrderView,
    pub items: Vec<OrderItemView>,
    pub payment: PaymentView,
    pub shipping_address: Option<AddressView>,
}

impl From<&OrderDetail> for OrderDetailView {
    fn from(detail: &OrderDetail) -> Self {
        Self {
            order: OrderView::from(&detail.order),
            items: detail.items.iter().map(OrderItemView::from).collect(),
            payment: PaymentView::from(&detail.payment),
            shipping_address: detail.shipping_address.as_ref().map(AddressView::from),
        }
    }
}

#[derive(Serialize)]
pub struct CustomerView {
    pub id: Uuid,
    pub username: String,
    pub email: String,
}

/// Order detail as seen by admins: purchaser plus the actions allowed now.
#[derive(Serialize)]
pub struct AdminOrderView {
    #[serde(flatten)]
    pub detail: OrderDetailView,
    pub user: CustomerView,
    pub admin_actions: AdminActions,
}

impl From<&OrderDetail> for AdminOrderView {
    fn from(detail: &OrderDetail) -> Self {
        Self {
            detail: OrderDetailView::from(detail),
            user: CustomerView {
                id: detail.customer.id,
                username: detail.customer.username.clone(),
                email: detail.customer.email.clone(),
            },
            admin_actions: AdminActions::from(detail.order.status),
        }
    }
}
