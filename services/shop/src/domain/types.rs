use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use bazaar_domain::order::OrderStatus;
use bazaar_domain::payment::{PaymentMethod, PaymentStatus};

/// Account record. `password_hash` is an argon2id PHC string.
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub is_active: bool,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

/// Activation OTP. The code itself is derived from `secret` and the clock.
#[derive(Debug, Clone)]
pub struct ActivationOtp {
    pub id: Uuid,
    pub user_id: Uuid,
    pub secret: String,
    pub attempts: i32,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
}

/// Password-reset request. See `domain::otp` for the rules that mutate it.
#[derive(Debug, Clone)]
pub struct PasswordReset {
    pub id: Uuid,
    pub user_id: Uuid,
    pub otp: String,
    /// Signed reset token, set once the OTP is verified.
    pub token: Option<String>,
    pub otp_attempts: i32,
    pub email_attempts: i32,
    pub last_attempt_at: Option<DateTime<Utc>>,
    pub last_email_at: Option<DateTime<Utc>>,
    pub expires_at: DateTime<Utc>,
    pub is_verified: bool,
    pub is_used: bool,
    pub created_at: DateTime<Utc>,
}

/// Issued refresh token, keyed by its `jti`. Revoked exactly once.
#[derive(Debug, Clone)]
pub struct RefreshTokenRecord {
    pub jti: Uuid,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
}

impl RefreshTokenRecord {
    pub fn is_usable(&self, now: DateTime<Utc>) -> bool {
        self.revoked_at.is_none() && self.expires_at > now
    }
}

#[derive(Debug, Clone)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub price: Decimal,
    pub stock_quantity: i32,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct Address {
    pub id: Uuid,
    pub user_id: Uuid,
    pub phone: String,
    pub address_type: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
}

/// One product line in a cart, joined with the live product.
#[derive(Debug, Clone)]
pub struct CartLine {
    pub item_id: Uuid,
    pub product: Product,
    pub quantity: i32,
}

impl CartLine {
    pub fn total_price(&self) -> Decimal {
        self.product.price * Decimal::from(self.quantity)
    }
}

#[derive(Debug, Clone)]
pub struct Cart {
    pub id: Uuid,
    pub user_id: Uuid,
    pub items: Vec<CartLine>,
}

impl Cart {
    pub fn total_price(&self) -> Decimal {
        self.items.iter().map(CartLine::total_price).sum()
    }

    pub fn total_items(&self) -> i32 {
        self.items.iter().map(|l| l.quantity).sum()
    }
}

#[derive(Debug, Clone)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    pub order_number: String,
    pub total_amount: Decimal,
    pub status: OrderStatus,
    pub shipping_address_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Order line with product name, price and image snapshotted at purchase time.
#[derive(Debug, Clone)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Option<Uuid>,
    pub product_name: String,
    pub product_price: Decimal,
    pub product_image: Option<String>,
    pub quantity: i32,
    pub total_price: Decimal,
}

#[derive(Debug, Clone)]
pub struct Payment {
    pub id: Uuid,
    pub order_id: Uuid,
    pub method: PaymentMethod,
    pub amount: Decimal,
    pub status: PaymentStatus,
    pub utr_number: Option<String>,
    pub payment_date: Option<DateTime<Utc>>,
    pub screenshot: Option<String>,
    pub admin_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Purchaser fields shown on admin views and used for notifications.
#[derive(Debug, Clone)]
pub struct OrderCustomer {
    pub id: Uuid,
    pub username: String,
    pub email: String,
}

/// An order with everything it owns.
#[derive(Debug, Clone)]
pub struct OrderDetail {
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub payment: Payment,
    pub customer: OrderCustomer,
    pub shipping_address: Option<Address>,
}

/// Row of the admin list-by-status view.
#[derive(Debug, Clone)]
pub struct OrderSummary {
    pub order: Order,
    pub customer_email: String,
}

/// Where the lines of a new order come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderSource {
    Cart,
    Direct { product_id: Uuid, quantity: i32 },
}

#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: Uuid,
    pub address_id: Uuid,
    pub method: PaymentMethod,
    pub source: OrderSource,
}

/// Evidence the purchaser attaches to their payment.
#[derive(Debug, Clone)]
pub struct PaymentProof {
    pub utr_number: String,
    pub payment_date: Option<DateTime<Utc>>,
    pub screenshot: Option<String>,
}

/// A conditional order transition applied by an admin.
#[derive(Debug, Clone)]
pub struct OrderTransition {
    pub order_id: Uuid,
    pub from: OrderStatus,
    pub to: OrderStatus,
    pub payment_status: Option<PaymentStatus>,
    pub admin_notes: Option<String>,
}

/// Plain-text email handed to the mailer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to: Vec<String>,
    pub subject: String,
    pub body: String,
}

/// Orders shown per admin status listing.
pub const ADMIN_LIST_LIMIT: u64 = 50;
