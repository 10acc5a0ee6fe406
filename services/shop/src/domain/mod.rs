pub mod checkout;
pub mod otp;
pub mod password;
pub mod repository;
pub mod types;
