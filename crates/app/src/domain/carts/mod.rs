//! Carts

pub mod errors;
pub mod models;
pub(crate) mod repository;
pub mod service;
pub mod store;

pub use errors::CartsServiceError;
pub use service::*;
pub use store::CartStore;
