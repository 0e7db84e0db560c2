//! Petshop
//!
//! Storefront rules shared by every petshop surface: discounted pricing, composite
//! document keys, review averages, payment methods and order status transitions.
//!
//! Nothing in this crate performs IO.

pub mod keys;
pub mod payment;
pub mod pricing;
pub mod rating;
pub mod status;
