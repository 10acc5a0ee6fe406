#![allow(dead_code)]

use std::sync::{Arc, Mutex, OnceLock};

use bytes::Bytes;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use bazaar_domain::order::{OrderStatus, next_order_number, order_number_prefix};
use bazaar_shop::domain::checkout::{DraftInput, PurchaseLine, draft_order};
use bazaar_shop::domain::password::hash_password;
use bazaar_shop::domain::repository::{
    ActivationOtpRepository, AddressRepository, CartRepository, Mailer, OrderRepository,
    PasswordResetRepository, ProductRepository, RefreshTokenRepository, ScreenshotStore,
    UserRepository,
};
use bazaar_shop::domain::types::{
    ActivationOtp, Address, Cart, CartLine, NewOrder, Order, OrderCustomer, OrderDetail,
    OrderItem, OrderSource, OrderSummary, OrderTransition, OutgoingEmail, PasswordReset, Payment,
    PaymentProof, Product, RefreshTokenRecord, User,
};
use bazaar_shop::error::ShopServiceError;

pub const TEST_JWT_SECRET: &str = "test-secret";
pub const TEST_PASSWORD: &str = "correct-horse";

// ── Fixtures ─────────────────────────────────────────────────────────────────

/// Argon2 is slow in debug builds; hash the shared fixture password once.
pub fn test_password_hash() -> String {
    static HASH: OnceLock<String> = OnceLock::new();
    HASH.get_or_init(|| hash_password(TEST_PASSWORD).unwrap()).clone()
}

pub fn test_user(email: &str) -> User {
    User {
        id: Uuid::now_v7(),
        username: email.split('@').next().unwrap_or("user").to_string(),
        email: email.to_string(),
        password_hash: test_password_hash(),
        is_active: true,
        is_admin: false,
        created_at: Utc::now(),
    }
}

pub fn inactive_user(email: &str) -> User {
    User {
        is_active: false,
        ..test_user(email)
    }
}

pub fn admin_user(email: &str) -> User {
    User {
        is_admin: true,
        ..test_user(email)
    }
}

pub fn test_product(name: &str, price: i64, stock: i32) -> Product {
    Product {
        id: Uuid::now_v7(),
        name: name.to_string(),
        price: Decimal::new(price, 0),
        stock_quantity: stock,
        image_url: None,
        created_at: Utc::now(),
    }
}

pub fn test_address(user_id: Uuid) -> Address {
    Address {
        id: Uuid::now_v7(),
        user_id,
        phone: "9876543210".to_string(),
        address_type: "home".to_string(),
        street: "12 MG Road".to_string(),
        city: "Pune".to_string(),
        state: "MH".to_string(),
        zip_code: "411001".to_string(),
        is_default: true,
        created_at: Utc::now(),
    }
}

// ── MockStore ────────────────────────────────────────────────────────────────

struct StoredOrder {
    order: Order,
    items: Vec<OrderItem>,
    payment: Payment,
}

struct StoredCartItem {
    id: Uuid,
    user_id: Uuid,
    product_id: Uuid,
    quantity: i32,
}

#[derive(Default)]
struct StoreState {
    users: Vec<User>,
    otps: Vec<ActivationOtp>,
    resets: Vec<PasswordReset>,
    tokens: Vec<RefreshTokenRecord>,
    products: Vec<Product>,
    carts: Vec<(Uuid, Uuid)>,
    cart_items: Vec<StoredCartItem>,
    addresses: Vec<Address>,
    orders: Vec<StoredOrder>,
}

impl StoreState {
    fn cart_id(&mut self, user_id: Uuid) -> Uuid {
        if let Some((id, _)) = self.carts.iter().find(|(_, owner)| *owner == user_id) {
            return *id;
        }
        let id = Uuid::now_v7();
        self.carts.push((id, user_id));
        id
    }

    fn cart_line(&self, item: &StoredCartItem) -> Option<CartLine> {
        let product = self.products.iter().find(|p| p.id == item.product_id)?;
        Some(CartLine {
            item_id: item.id,
            product: product.clone(),
            quantity: item.quantity,
        })
    }

    fn detail(&self, stored: &StoredOrder) -> OrderDetail {
        let customer = self
            .users
            .iter()
            .find(|u| u.id == stored.order.user_id)
            .map(|u| OrderCustomer {
                id: u.id,
                username: u.username.clone(),
                email: u.email.clone(),
            })
            .unwrap_or(OrderCustomer {
                id: stored.order.user_id,
                username: String::new(),
                email: String::new(),
            });
        let shipping_address = stored
            .order
            .shipping_address_id
            .and_then(|id| self.addresses.iter().find(|a| a.id == id).cloned());
        OrderDetail {
            order: stored.order.clone(),
            items: stored.items.clone(),
            payment: stored.payment.clone(),
            customer,
            shipping_address,
        }
    }
}

/// In-memory stand-in for every repository, sharing one state so cross-table effects
/// (activation, password reset completion, stock) are visible to later reads.
#[derive(Clone, Default)]
pub struct MockStore {
    state: Arc<Mutex<StoreState>>,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(self, user: User) -> Self {
        self.state.lock().unwrap().users.push(user);
        self
    }

    pub fn with_product(self, product: Product) -> Self {
        self.state.lock().unwrap().products.push(product);
        self
    }

    pub fn with_address(self, address: Address) -> Self {
        self.state.lock().unwrap().addresses.push(address);
        self
    }

    pub fn with_otp(self, otp: ActivationOtp) -> Self {
        self.state.lock().unwrap().otps.push(otp);
        self
    }

    pub fn with_reset(self, reset: PasswordReset) -> Self {
        self.state.lock().unwrap().resets.push(reset);
        self
    }

    pub fn user(&self, id: Uuid) -> Option<User> {
        let state = self.state.lock().unwrap();
        state.users.iter().find(|u| u.id == id).cloned()
    }

    pub fn product(&self, id: Uuid) -> Option<Product> {
        let state = self.state.lock().unwrap();
        state.products.iter().find(|p| p.id == id).cloned()
    }

    pub fn otps_of(&self, user_id: Uuid) -> Vec<ActivationOtp> {
        let state = self.state.lock().unwrap();
        state.otps.iter().filter(|o| o.user_id == user_id).cloned().collect()
    }

    pub fn resets_of(&self, user_id: Uuid) -> Vec<PasswordReset> {
        let state = self.state.lock().unwrap();
        state.resets.iter().filter(|r| r.user_id == user_id).cloned().collect()
    }

    pub fn tokens_of(&self, user_id: Uuid) -> Vec<RefreshTokenRecord> {
        let state = self.state.lock().unwrap();
        state.tokens.iter().filter(|t| t.user_id == user_id).cloned().collect()
    }

    pub async fn find(&self, jti: Uuid) -> Result<Option<RefreshTokenRecord>, ShopServiceError> {
        let state = self.state.lock().unwrap();
        Ok(state.tokens.iter().find(|t| t.jti == jti).cloned())
    }

    pub fn addresses_of(&self, user_id: Uuid) -> Vec<Address> {
        let state = self.state.lock().unwrap();
        state.addresses.iter().filter(|a| a.user_id == user_id).cloned().collect()
    }

    pub fn order_count(&self) -> usize {
        self.state.lock().unwrap().orders.len()
    }

    /// Overwrite an order's status, bypassing the transition rules.
    pub fn force_status(&self, order_number: &str, status: OrderStatus) {
        let mut state = self.state.lock().unwrap();
        if let Some(stored) = state
            .orders
            .iter_mut()
            .find(|o| o.order.order_number == order_number)
        {
            stored.order.status = status;
        }
    }
}

impl UserRepository for MockStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, ShopServiceError> {
        let state = self.state.lock().unwrap();
        Ok(state.users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, ShopServiceError> {
        Ok(self.user(id))
    }

    async fn create_with_otp(
        &self,
        user: &User,
        otp: &ActivationOtp,
    ) -> Result<(), ShopServiceError> {
        let mut state = self.state.lock().unwrap();
        if state.users.iter().any(|u| u.email == user.email) {
            return Err(ShopServiceError::UserAlreadyExists);
        }
        state.users.push(user.clone());
        state.otps.push(otp.clone());
        Ok(())
    }

    async fn update_password(
        &self,
        user_id: Uuid,
        password_hash: &str,
    ) -> Result<(), ShopServiceError> {
        let mut state = self.state.lock().unwrap();
        let user = state
            .users
            .iter_mut()
            .find(|u| u.id == user_id)
            .ok_or(ShopServiceError::UserNotFound)?;
        user.password_hash = password_hash.to_string();
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<User>, ShopServiceError> {
        Ok(self.state.lock().unwrap().users.clone())
    }

    async fn list_admin_emails(&self) -> Result<Vec<String>, ShopServiceError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .users
            .iter()
            .filter(|u| u.is_admin && u.is_active)
            .map(|u| u.email.clone())
            .collect())
    }
}

impl ActivationOtpRepository for MockStore {
    async fn latest_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Option<ActivationOtp>, ShopServiceError> {
        Ok(self
            .otps_of(user_id)
            .into_iter()
            .max_by_key(|o| (o.created_at, o.id)))
    }

    async fn create(&self, otp: &ActivationOtp) -> Result<(), ShopServiceError> {
        self.state.lock().unwrap().otps.push(otp.clone());
        Ok(())
    }

    async fn claim_attempt(
        &self,
        otp_id: Uuid,
        max_attempts: i32,
    ) -> Result<bool, ShopServiceError> {
        let mut state = self.state.lock().unwrap();
        match state
            .otps
            .iter_mut()
            .find(|o| o.id == otp_id && !o.is_verified && o.attempts < max_attempts)
        {
            Some(otp) => {
                otp.attempts += 1;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn mark_verified(&self, otp_id: Uuid, user_id: Uuid) -> Result<bool, ShopServiceError> {
        let mut state = self.state.lock().unwrap();
        let Some(otp) = state
            .otps
            .iter_mut()
            .find(|o| o.id == otp_id && !o.is_verified)
        else {
            return Ok(false);
        };
        otp.is_verified = true;
        if let Some(user) = state.users.iter_mut().find(|u| u.id == user_id) {
            user.is_active = true;
        }
        Ok(true)
    }
}

impl PasswordResetRepository for MockStore {
    async fn find_open_since(
        &self,
        user_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<Option<PasswordReset>, ShopServiceError> {
        Ok(self
            .resets_of(user_id)
            .into_iter()
            .filter(|r| !r.is_used && r.created_at >= since)
            .max_by_key(|r| (r.created_at, r.id)))
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<PasswordReset>, ShopServiceError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .resets
            .iter()
            .find(|r| r.token.as_deref() == Some(token))
            .cloned())
    }

    async fn create(&self, reset: &PasswordReset) -> Result<(), ShopServiceError> {
        self.state.lock().unwrap().resets.push(reset.clone());
        Ok(())
    }

    async fn reissue(
        &self,
        reset: &PasswordReset,
        seen_email_attempts: i32,
    ) -> Result<bool, ShopServiceError> {
        let mut state = self.state.lock().unwrap();
        let Some(stored) = state.resets.iter_mut().find(|r| {
            r.id == reset.id && !r.is_used && r.email_attempts == seen_email_attempts
        }) else {
            return Ok(false);
        };
        stored.otp = reset.otp.clone();
        stored.token = None;
        stored.is_verified = false;
        stored.email_attempts = reset.email_attempts;
        stored.last_email_at = reset.last_email_at;
        stored.expires_at = reset.expires_at;
        Ok(true)
    }

    async fn claim_otp_attempt(
        &self,
        reset_id: Uuid,
        max_attempts: i32,
        now: DateTime<Utc>,
    ) -> Result<bool, ShopServiceError> {
        let mut state = self.state.lock().unwrap();
        match state
            .resets
            .iter_mut()
            .find(|r| r.id == reset_id && !r.is_used && r.otp_attempts < max_attempts)
        {
            Some(stored) => {
                stored.otp_attempts += 1;
                stored.last_attempt_at = Some(now);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn mark_verified(
        &self,
        reset_id: Uuid,
        otp: &str,
        token: &str,
    ) -> Result<bool, ShopServiceError> {
        let mut state = self.state.lock().unwrap();
        match state
            .resets
            .iter_mut()
            .find(|r| r.id == reset_id && !r.is_used && r.otp == otp)
        {
            Some(stored) => {
                stored.is_verified = true;
                stored.token = Some(token.to_string());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn complete(
        &self,
        reset_id: Uuid,
        user_id: Uuid,
        password_hash: &str,
    ) -> Result<(), ShopServiceError> {
        let mut state = self.state.lock().unwrap();
        let reset = state
            .resets
            .iter_mut()
            .find(|r| r.id == reset_id && !r.is_used)
            .ok_or(ShopServiceError::InvalidToken)?;
        reset.is_used = true;
        if let Some(user) = state.users.iter_mut().find(|u| u.id == user_id) {
            user.password_hash = password_hash.to_string();
        }
        let now = Utc::now();
        for token in state.tokens.iter_mut().filter(|t| t.user_id == user_id) {
            token.revoked_at.get_or_insert(now);
        }
        Ok(())
    }
}

impl RefreshTokenRepository for MockStore {
    async fn record(&self, token: &RefreshTokenRecord) -> Result<(), ShopServiceError> {
        self.state.lock().unwrap().tokens.push(token.clone());
        Ok(())
    }

    async fn rotate(
        &self,
        old_jti: Uuid,
        new: &RefreshTokenRecord,
        now: DateTime<Utc>,
    ) -> Result<bool, ShopServiceError> {
        let mut state = self.state.lock().unwrap();
        let Some(old) = state
            .tokens
            .iter_mut()
            .find(|t| t.jti == old_jti && t.user_id == new.user_id && t.is_usable(now))
        else {
            return Ok(false);
        };
        old.revoked_at = Some(now);
        state.tokens.push(new.clone());
        Ok(true)
    }

    async fn revoke(&self, jti: Uuid, now: DateTime<Utc>) -> Result<bool, ShopServiceError> {
        let mut state = self.state.lock().unwrap();
        match state
            .tokens
            .iter_mut()
            .find(|t| t.jti == jti && t.revoked_at.is_none())
        {
            Some(token) => {
                token.revoked_at = Some(now);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn revoke_all_for_user(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<u64, ShopServiceError> {
        let mut state = self.state.lock().unwrap();
        let mut revoked = 0;
        for token in state
            .tokens
            .iter_mut()
            .filter(|t| t.user_id == user_id && t.revoked_at.is_none())
        {
            token.revoked_at = Some(now);
            revoked += 1;
        }
        Ok(revoked)
    }
}

impl ProductRepository for MockStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Product>, ShopServiceError> {
        Ok(self.product(id))
    }
}

impl CartRepository for MockStore {
    async fn get_or_create(&self, user_id: Uuid) -> Result<Cart, ShopServiceError> {
        let mut state = self.state.lock().unwrap();
        let id = state.cart_id(user_id);
        let items = state
            .cart_items
            .iter()
            .filter(|i| i.user_id == user_id)
            .filter_map(|i| state.cart_line(i))
            .collect();
        Ok(Cart { id, user_id, items })
    }

    async fn add_item(
        &self,
        user_id: Uuid,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<(), ShopServiceError> {
        let mut state = self.state.lock().unwrap();
        state.cart_id(user_id);
        match state
            .cart_items
            .iter_mut()
            .find(|i| i.user_id == user_id && i.product_id == product_id)
        {
            Some(item) => item.quantity += quantity,
            None => state.cart_items.push(StoredCartItem {
                id: Uuid::now_v7(),
                user_id,
                product_id,
                quantity,
            }),
        }
        Ok(())
    }

    async fn find_item(
        &self,
        user_id: Uuid,
        item_id: Uuid,
    ) -> Result<Option<CartLine>, ShopServiceError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .cart_items
            .iter()
            .find(|i| i.id == item_id && i.user_id == user_id)
            .and_then(|i| state.cart_line(i)))
    }

    async fn set_quantity(&self, item_id: Uuid, quantity: i32) -> Result<(), ShopServiceError> {
        let mut state = self.state.lock().unwrap();
        if let Some(item) = state.cart_items.iter_mut().find(|i| i.id == item_id) {
            item.quantity = quantity;
        }
        Ok(())
    }

    async fn remove_item(&self, item_id: Uuid) -> Result<(), ShopServiceError> {
        self.state
            .lock()
            .unwrap()
            .cart_items
            .retain(|i| i.id != item_id);
        Ok(())
    }
}

impl AddressRepository for MockStore {
    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Address>, ShopServiceError> {
        let mut list = self.addresses_of(user_id);
        list.sort_by(|a, b| {
            b.is_default
                .cmp(&a.is_default)
                .then(b.created_at.cmp(&a.created_at))
        });
        Ok(list)
    }

    async fn create(&self, address: &Address) -> Result<(), ShopServiceError> {
        let mut state = self.state.lock().unwrap();
        if address.is_default {
            for other in state
                .addresses
                .iter_mut()
                .filter(|a| a.user_id == address.user_id)
            {
                other.is_default = false;
            }
        }
        state.addresses.push(address.clone());
        Ok(())
    }

    async fn find_owned(
        &self,
        user_id: Uuid,
        address_id: Uuid,
    ) -> Result<Option<Address>, ShopServiceError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .addresses
            .iter()
            .find(|a| a.id == address_id && a.user_id == user_id)
            .cloned())
    }

    async fn set_default(
        &self,
        user_id: Uuid,
        address_id: Uuid,
    ) -> Result<bool, ShopServiceError> {
        let mut state = self.state.lock().unwrap();
        if !state
            .addresses
            .iter()
            .any(|a| a.id == address_id && a.user_id == user_id)
        {
            return Ok(false);
        }
        for address in state.addresses.iter_mut().filter(|a| a.user_id == user_id) {
            address.is_default = address.id == address_id;
        }
        Ok(true)
    }
}

impl OrderRepository for MockStore {
    async fn create(
        &self,
        order: &NewOrder,
        now: DateTime<Utc>,
    ) -> Result<OrderDetail, ShopServiceError> {
        let mut state = self.state.lock().unwrap();

        let lines: Vec<PurchaseLine> = match order.source {
            OrderSource::Cart => state
                .cart_items
                .iter()
                .filter(|i| i.user_id == order.user_id)
                .filter_map(|i| state.cart_line(i))
                .map(|line| PurchaseLine {
                    product: line.product,
                    quantity: line.quantity,
                })
                .collect(),
            OrderSource::Direct {
                product_id,
                quantity,
            } => {
                let product = state
                    .products
                    .iter()
                    .find(|p| p.id == product_id)
                    .cloned()
                    .ok_or(ShopServiceError::ProductNotFound)?;
                vec![PurchaseLine { product, quantity }]
            }
        };

        let date = now.date_naive();
        let prefix = order_number_prefix(date);
        let last = state
            .orders
            .iter()
            .map(|o| o.order.order_number.clone())
            .filter(|n| n.starts_with(&prefix))
            .max();
        let draft = draft_order(DraftInput {
            user_id: order.user_id,
            address_id: order.address_id,
            method: order.method,
            order_number: next_order_number(date, last.as_deref()),
            lines: &lines,
            now,
        })?;

        for (product_id, remaining) in &draft.stock_updates {
            if let Some(product) = state.products.iter_mut().find(|p| p.id == *product_id) {
                product.stock_quantity = *remaining;
            }
        }
        if order.source == OrderSource::Cart {
            state.cart_items.retain(|i| i.user_id != order.user_id);
        }
        let stored = StoredOrder {
            order: draft.order,
            items: draft.items,
            payment: draft.payment,
        };
        let detail = state.detail(&stored);
        state.orders.push(stored);
        Ok(detail)
    }

    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Order>, ShopServiceError> {
        let state = self.state.lock().unwrap();
        let mut list: Vec<Order> = state
            .orders
            .iter()
            .filter(|o| o.order.user_id == user_id)
            .map(|o| o.order.clone())
            .collect();
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(list)
    }

    async fn find_detail(
        &self,
        order_number: &str,
    ) -> Result<Option<OrderDetail>, ShopServiceError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .orders
            .iter()
            .find(|o| o.order.order_number == order_number)
            .map(|o| state.detail(o)))
    }

    async fn save_payment_proof(
        &self,
        order_id: Uuid,
        proof: &PaymentProof,
        now: DateTime<Utc>,
    ) -> Result<bool, ShopServiceError> {
        let mut state = self.state.lock().unwrap();
        let Some(stored) = state
            .orders
            .iter_mut()
            .find(|o| o.order.id == order_id && o.order.status.accepts_payment_proof())
        else {
            return Ok(false);
        };
        stored.payment.utr_number = Some(proof.utr_number.clone());
        stored.payment.payment_date = proof.payment_date;
        if proof.screenshot.is_some() {
            stored.payment.screenshot = proof.screenshot.clone();
        }
        stored.payment.updated_at = now;
        Ok(true)
    }

    async fn transition(
        &self,
        transition: &OrderTransition,
        now: DateTime<Utc>,
    ) -> Result<bool, ShopServiceError> {
        let mut state = self.state.lock().unwrap();
        let Some(stored) = state
            .orders
            .iter_mut()
            .find(|o| o.order.id == transition.order_id && o.order.status == transition.from)
        else {
            return Ok(false);
        };
        stored.order.status = transition.to;
        stored.order.updated_at = now;
        if let Some(status) = transition.payment_status {
            stored.payment.status = status;
        }
        if let Some(notes) = &transition.admin_notes {
            stored.payment.admin_notes = Some(notes.clone());
        }
        stored.payment.updated_at = now;
        Ok(true)
    }

    async fn list_by_status(
        &self,
        status: OrderStatus,
        limit: u64,
    ) -> Result<Vec<OrderSummary>, ShopServiceError> {
        let state = self.state.lock().unwrap();
        let mut list: Vec<OrderSummary> = state
            .orders
            .iter()
            .filter(|o| o.order.status == status)
            .map(|o| OrderSummary {
                order: o.order.clone(),
                customer_email: state.detail(o).customer.email,
            })
            .collect();
        list.sort_by(|a, b| b.order.created_at.cmp(&a.order.created_at));
        list.truncate(limit as usize);
        Ok(list)
    }

    async fn list_pending(&self) -> Result<Vec<OrderDetail>, ShopServiceError> {
        let state = self.state.lock().unwrap();
        let mut list: Vec<OrderDetail> = state
            .orders
            .iter()
            .filter(|o| o.order.status.awaits_admin_decision())
            .map(|o| state.detail(o))
            .collect();
        list.sort_by(|a, b| a.order.created_at.cmp(&b.order.created_at));
        Ok(list)
    }
}

// ── StaleReads ───────────────────────────────────────────────────────────────

/// OTP repositories over a `MockStore` whose record reads suspend once after reading,
/// the way a database round-trip does, so concurrent callers all act on the same
/// snapshot before any of them writes.
#[derive(Clone)]
pub struct StaleReads(pub MockStore);

impl ActivationOtpRepository for StaleReads {
    async fn latest_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Option<ActivationOtp>, ShopServiceError> {
        let otp = self.0.latest_for_user(user_id).await;
        tokio::task::yield_now().await;
        otp
    }

    async fn create(&self, otp: &ActivationOtp) -> Result<(), ShopServiceError> {
        ActivationOtpRepository::create(&self.0, otp).await
    }

    async fn claim_attempt(
        &self,
        otp_id: Uuid,
        max_attempts: i32,
    ) -> Result<bool, ShopServiceError> {
        self.0.claim_attempt(otp_id, max_attempts).await
    }

    async fn mark_verified(&self, otp_id: Uuid, user_id: Uuid) -> Result<bool, ShopServiceError> {
        ActivationOtpRepository::mark_verified(&self.0, otp_id, user_id).await
    }
}

impl PasswordResetRepository for StaleReads {
    async fn find_open_since(
        &self,
        user_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<Option<PasswordReset>, ShopServiceError> {
        let reset = self.0.find_open_since(user_id, since).await;
        tokio::task::yield_now().await;
        reset
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<PasswordReset>, ShopServiceError> {
        self.0.find_by_token(token).await
    }

    async fn create(&self, reset: &PasswordReset) -> Result<(), ShopServiceError> {
        PasswordResetRepository::create(&self.0, reset).await
    }

    async fn reissue(
        &self,
        reset: &PasswordReset,
        seen_email_attempts: i32,
    ) -> Result<bool, ShopServiceError> {
        self.0.reissue(reset, seen_email_attempts).await
    }

    async fn claim_otp_attempt(
        &self,
        reset_id: Uuid,
        max_attempts: i32,
        now: DateTime<Utc>,
    ) -> Result<bool, ShopServiceError> {
        self.0.claim_otp_attempt(reset_id, max_attempts, now).await
    }

    async fn mark_verified(
        &self,
        reset_id: Uuid,
        otp: &str,
        token: &str,
    ) -> Result<bool, ShopServiceError> {
        PasswordResetRepository::mark_verified(&self.0, reset_id, otp, token).await
    }

    async fn complete(
        &self,
        reset_id: Uuid,
        user_id: Uuid,
        password_hash: &str,
    ) -> Result<(), ShopServiceError> {
        self.0.complete(reset_id, user_id, password_hash).await
    }
}

// ── MockMailer ───────────────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct MockMailer {
    pub sent: Arc<Mutex<Vec<OutgoingEmail>>>,
    pub fail: bool,
}

impl MockMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().unwrap().clone()
    }

    /// Last six-digit code mailed to `email`.
    pub fn last_code_for(&self, email: &str) -> Option<String> {
        self.sent()
            .into_iter()
            .rev()
            .find(|m| m.to.iter().any(|to| to == email))
            .and_then(|m| {
                m.body
                    .split(|c: char| !c.is_ascii_digit())
                    .find(|part| part.len() == 6)
                    .map(str::to_string)
            })
    }
}

impl Mailer for MockMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), ShopServiceError> {
        if self.fail {
            return Err(ShopServiceError::Internal(anyhow::anyhow!("smtp unavailable")));
        }
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}

// ── MockScreenshots ──────────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct MockScreenshots {
    pub saved: Arc<Mutex<Vec<(String, usize)>>>,
    pub discarded: Arc<Mutex<Vec<String>>>,
}

impl MockScreenshots {
    pub fn discarded(&self) -> Vec<String> {
        self.discarded.lock().unwrap().clone()
    }
}

impl ScreenshotStore for MockScreenshots {
    async fn save(
        &self,
        order_number: &str,
        file_name: Option<&str>,
        data: Bytes,
    ) -> Result<String, ShopServiceError> {
        let ext = file_name
            .and_then(|n| n.rsplit_once('.'))
            .map(|(_, ext)| ext)
            .unwrap_or("png");
        let path = format!("payment_screenshots/{order_number}.{ext}");
        self.saved.lock().unwrap().push((path.clone(), data.len()));
        Ok(path)
    }

    async fn discard(&self, reference: &str) -> Result<(), ShopServiceError> {
        self.discarded.lock().unwrap().push(reference.to_string());
        Ok(())
    }
}
