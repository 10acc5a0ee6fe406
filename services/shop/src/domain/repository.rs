#![allow(async_fn_in_trait)]

use bytes::Bytes;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use bazaar_domain::order::OrderStatus;

use crate::domain::types::{
    ActivationOtp, Address, Cart, CartLine, NewOrder, Order, OrderDetail, OrderSummary,
    OrderTransition, OutgoingEmail, PasswordReset, PaymentProof, Product, RefreshTokenRecord,
    User,
};
use crate::error::ShopServiceError;

/// Persisted accounts.
pub trait UserRepository: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, ShopServiceError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, ShopServiceError>;

    /// Insert a user and its first activation OTP in one transaction.
    /// Fails with `UserAlreadyExists` when the email is taken.
    async fn create_with_otp(&self, user: &User, otp: &ActivationOtp)
    -> Result<(), ShopServiceError>;

    async fn update_password(
        &self,
        user_id: Uuid,
        password_hash: &str,
    ) -> Result<(), ShopServiceError>;

    async fn list_all(&self) -> Result<Vec<User>, ShopServiceError>;

    /// Emails of active admins; recipients of new-order notifications.
    async fn list_admin_emails(&self) -> Result<Vec<String>, ShopServiceError>;
}

/// Activation OTP records.
pub trait ActivationOtpRepository: Send + Sync {
    async fn latest_for_user(&self, user_id: Uuid)
    -> Result<Option<ActivationOtp>, ShopServiceError>;

    async fn create(&self, otp: &ActivationOtp) -> Result<(), ShopServiceError>;

    /// Count one attempt if the record is unverified and below `max_attempts`, as a single
    /// conditional write. Returns whether the attempt was granted.
    async fn claim_attempt(&self, otp_id: Uuid, max_attempts: i32)
    -> Result<bool, ShopServiceError>;

    /// Mark the OTP verified and activate its user in one transaction. Returns `false`
    /// when the record was already verified.
    async fn mark_verified(&self, otp_id: Uuid, user_id: Uuid) -> Result<bool, ShopServiceError>;
}

/// Password-reset records.
pub trait PasswordResetRepository: Send + Sync {
    /// Newest unused record of the user created at or after `since`.
    async fn find_open_since(
        &self,
        user_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<Option<PasswordReset>, ShopServiceError>;

    async fn find_by_token(&self, token: &str) -> Result<Option<PasswordReset>, ShopServiceError>;

    async fn create(&self, reset: &PasswordReset) -> Result<(), ShopServiceError>;

    /// Store the new code, expiry and send counters of `reset` only while the stored
    /// `email_attempts` still equals `seen_email_attempts`. Attempt counters are untouched.
    async fn reissue(
        &self,
        reset: &PasswordReset,
        seen_email_attempts: i32,
    ) -> Result<bool, ShopServiceError>;

    /// Count one code attempt if the record is unused and below `max_attempts`, as a single
    /// conditional write. Returns whether the attempt was granted.
    async fn claim_otp_attempt(
        &self,
        reset_id: Uuid,
        max_attempts: i32,
        now: DateTime<Utc>,
    ) -> Result<bool, ShopServiceError>;

    /// Mark the record verified and attach its reset token, provided it is unused and still
    /// carries `otp`. Returns whether the record was updated.
    async fn mark_verified(
        &self,
        reset_id: Uuid,
        otp: &str,
        token: &str,
    ) -> Result<bool, ShopServiceError>;

    /// Mark the record used, store the new password hash and revoke every refresh
    /// token of the user, all in one transaction.
    async fn complete(
        &self,
        reset_id: Uuid,
        user_id: Uuid,
        password_hash: &str,
    ) -> Result<(), ShopServiceError>;
}

/// Refresh-token revocation table keyed by `jti`.
pub trait RefreshTokenRepository: Send + Sync {
    async fn record(&self, token: &RefreshTokenRecord) -> Result<(), ShopServiceError>;

    /// Revoke `old_jti` and record `new` atomically. Returns `false` (and changes nothing)
    /// when `old_jti` is unknown, expired or already revoked.
    async fn rotate(
        &self,
        old_jti: Uuid,
        new: &RefreshTokenRecord,
        now: DateTime<Utc>,
    ) -> Result<bool, ShopServiceError>;

    /// Returns `false` if the token was unknown or already revoked.
    async fn revoke(&self, jti: Uuid, now: DateTime<Utc>) -> Result<bool, ShopServiceError>;

    async fn revoke_all_for_user(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<u64, ShopServiceError>;
}

/// Read-only product catalog.
pub trait ProductRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Product>, ShopServiceError>;
}

/// Per-user carts. Item lookups are always scoped to the owner.
pub trait CartRepository: Send + Sync {
    async fn get_or_create(&self, user_id: Uuid) -> Result<Cart, ShopServiceError>;

    /// Add `quantity` of a product, merging into an existing line for the same product.
    async fn add_item(
        &self,
        user_id: Uuid,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<(), ShopServiceError>;

    async fn find_item(
        &self,
        user_id: Uuid,
        item_id: Uuid,
    ) -> Result<Option<CartLine>, ShopServiceError>;

    async fn set_quantity(&self, item_id: Uuid, quantity: i32) -> Result<(), ShopServiceError>;

    async fn remove_item(&self, item_id: Uuid) -> Result<(), ShopServiceError>;
}

/// Shipping addresses.
pub trait AddressRepository: Send + Sync {
    /// Default first, then newest.
    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Address>, ShopServiceError>;

    /// Insert; when `address.is_default`, unset the user's other defaults in the same
    /// transaction.
    async fn create(&self, address: &Address) -> Result<(), ShopServiceError>;

    async fn find_owned(
        &self,
        user_id: Uuid,
        address_id: Uuid,
    ) -> Result<Option<Address>, ShopServiceError>;

    /// Make `address_id` the only default of the user. `false` if not owned.
    async fn set_default(&self, user_id: Uuid, address_id: Uuid)
    -> Result<bool, ShopServiceError>;
}

/// Orders with their items and payment.
pub trait OrderRepository: Send + Sync {
    /// Load and lock the purchase lines, check stock, decrement it, write the order,
    /// items and pending payment, and empty the cart for `OrderSource::Cart`. One
    /// transaction; any error leaves no trace.
    async fn create(
        &self,
        order: &NewOrder,
        now: DateTime<Utc>,
    ) -> Result<OrderDetail, ShopServiceError>;

    /// Newest first.
    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Order>, ShopServiceError>;

    async fn find_detail(
        &self,
        order_number: &str,
    ) -> Result<Option<OrderDetail>, ShopServiceError>;

    /// Store the proof on the payment only while the order still accepts one. Returns
    /// `false` when the order has moved on.
    async fn save_payment_proof(
        &self,
        order_id: Uuid,
        proof: &PaymentProof,
        now: DateTime<Utc>,
    ) -> Result<bool, ShopServiceError>;

    /// Apply a transition only if the order is still in `transition.from`; order and
    /// payment change together or not at all. Returns whether it was applied.
    async fn transition(
        &self,
        transition: &OrderTransition,
        now: DateTime<Utc>,
    ) -> Result<bool, ShopServiceError>;

    /// Newest first, at most `limit`.
    async fn list_by_status(
        &self,
        status: OrderStatus,
        limit: u64,
    ) -> Result<Vec<OrderSummary>, ShopServiceError>;

    /// Orders awaiting an admin decision, oldest first.
    async fn list_pending(&self) -> Result<Vec<OrderDetail>, ShopServiceError>;
}

/// Outbound email.
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), ShopServiceError>;
}

/// Storage for uploaded payment screenshots.
pub trait ScreenshotStore: Send + Sync {
    /// Store the file and return the reference saved on the payment.
    async fn save(
        &self,
        order_number: &str,
        file_name: Option<&str>,
        data: Bytes,
    ) -> Result<String, ShopServiceError>;

    /// Delete a file stored by `save` that ended up not referenced.
    async fn discard(&self, reference: &str) -> Result<(), ShopServiceError>;
}
