pub mod account;
pub mod address;
pub mod admin;
pub mod cart;
pub mod notify;
pub mod order;
pub mod password_reset;
pub mod token;
