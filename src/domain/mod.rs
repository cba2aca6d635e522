//! Core entities: the order and payment ledgers owned by the reconciliation
//! engine, plus the projections of the catalog and cart it collaborates with.

pub mod cart;
pub mod order;
pub mod payment;
pub mod product;

pub use cart::CartEntry;
pub use order::{Order, OrderSummary, ProductSnapshot};
pub use payment::Payment;
pub use product::ProductStock;
