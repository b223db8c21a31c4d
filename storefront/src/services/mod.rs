// storefront/src/services/mod.rs

pub mod auth_service;
pub mod cart_service;
pub mod email_provider;
pub mod notification_service;
pub mod order_service;
pub mod payment_provider;
pub mod payment_service;
pub mod templates;
pub mod token_service;
