pub mod account_service;
pub mod cart_service;
