pub mod account;
pub mod admin;
pub mod auth;
pub mod cart;
pub mod order;
pub mod password;
pub mod views;
