//! sea-orm implementations of the repository traits.

mod addresses;
mod catalog;
mod orders;
mod tokens;
mod users;

pub use addresses::DbAddressRepository;
pub use catalog::{DbCartRepository, DbProductRepository};
pub use orders::DbOrderRepository;
pub use tokens::DbRefreshTokenRepository;
pub use users::{DbActivationOtpRepository, DbPasswordResetRepository, DbUserRepository};

use sea_orm::{DbErr, SqlErr, TransactionError};

use crate::error::ShopServiceError;

/// Unwrap a transaction whose body speaks `ShopServiceError`.
fn flatten_txn(err: TransactionError<ShopServiceError>, context: &'static str) -> ShopServiceError {
    match err {
        TransactionError::Connection(e) => anyhow::Error::new(e).context(context).into(),
        TransactionError::Transaction(e) => e,
    }
}

fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}
