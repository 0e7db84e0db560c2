//! Storefront Domain Concerns

pub mod admin;
pub mod carts;
pub mod catalog;
pub mod notifications;
pub mod orders;
pub mod profiles;
pub mod reviews;
pub mod stock;
