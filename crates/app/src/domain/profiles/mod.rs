//! Profiles

pub mod errors;
pub mod models;
pub mod service;

pub use errors::ProfilesServiceError;
pub use service::*;
