//! sea-orm entities of the shop database.

pub mod activation_otps;
pub mod addresses;
pub mod cart_items;
pub mod carts;
pub mod order_items;
pub mod orders;
pub mod password_resets;
pub mod payments;
pub mod products;
pub mod refresh_tokens;
pub mod users;
