//! Pet store workflows over a remote document store.
//!
//! Services talk to the store through [`store::DocumentStore`] and learn who is
//! signed in through [`identity::IdentityProvider`]. [`context::AppContext`]
//! wires them together.

pub mod context;
pub mod database;
pub mod domain;
pub mod identity;
pub mod ids;
pub mod objects;
pub mod observability;
pub mod store;

#[cfg(test)]
mod test;
