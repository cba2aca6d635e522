//! Bazaar e-commerce backend.
//!
//! The core of this service is the order-payment-inventory reconciliation
//! flow: a checkout creates a provisional [`domain::Order`] and its
//! [`domain::Payment`], payment happens out-of-band against the remote
//! gateway, and a verified callback atomically decrements stock, marks both
//! ledgers, and clears the cart entry. See [`engine::ReconciliationEngine`].
//!
//! Layout:
//! - [`domain`] - the order/payment ledgers and collaborator projections
//! - [`store`] - data-access contract plus Postgres and in-memory adapters
//! - [`gateway`] - the payment gateway trust boundary
//! - [`engine`] - the reconciliation state machine
//! - [`routes`] - the HTTP surface

pub mod auth;
pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod gateway;
pub mod response;
pub mod routes;
pub mod store;

pub use error::{Error, Result};
