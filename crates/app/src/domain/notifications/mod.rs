//! Notifications

pub mod errors;
pub mod models;
pub mod service;

pub use errors::NotificationsServiceError;
pub use service::*;
