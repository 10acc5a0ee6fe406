pub use sea_orm_migration::prelude::*;

mod m20260301_000001_create_users;
mod m20260301_000002_create_activation_otps;
mod m20260301_000003_create_password_resets;
mod m20260301_000004_create_refresh_tokens;
mod m20260301_000005_create_products;
mod m20260301_000006_create_addresses;
mod m20260301_000007_create_carts;
mod m20260301_000008_create_cart_items;
mod m20260301_000009_create_orders;
mod m20260301_000010_create_order_items;
mod m20260301_000011_create_payments;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260301_000001_create_users::Migration),
            Box::new(m20260301_000002_create_activation_otps::Migration),
            Box::new(m20260301_000003_create_password_resets::Migration),
            Box::new(m20260301_000004_create_refresh_tokens::Migration),
            Box::new(m20260301_000005_create_products::Migration),
            Box::new(m20260301_000006_create_addresses::Migration),
            Box::new(m20260301_000007_create_carts::Migration),
            Box::new(m20260301_000008_create_cart_items::Migration),
            Box::new(m20260301_000009_create_orders::Migration),
            Box::new(m20260301_000010_create_order_items::Migration),
            Box::new(m20260301_000011_create_payments::Migration),
        ]
    }
}
