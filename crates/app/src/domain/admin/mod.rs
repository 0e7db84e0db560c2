//! Admin console

pub mod errors;
pub mod service;

pub use errors::AdminServiceError;
pub use service::*;
