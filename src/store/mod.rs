//! Data-access contract for the reconciliation engine.
//!
//! The engine drives the flow; the adapter owns the transaction boundary.
//! [`Store::apply_fulfillment`] in particular must be atomic: either all of
//! the stock decrement, order/payment flag flips, and cart cleanup happen,
//! or none do.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::{Order, OrderSummary, Payment, ProductStock};
use crate::error::Result;

pub use memory::MemStore;
pub use postgres::PgStore;

/// Everything needed to persist a freshly initiated checkout: the order row
/// and its payment row, written together or not at all.
#[derive(Debug, Clone)]
pub struct NewCheckout {
    pub user_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub remote_order_id: String,
    pub amount: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FulfillmentOutcome {
    /// Stock decremented, order fulfilled, payment paid, cart entry removed.
    Fulfilled,
    /// The payment was already paid; nothing was touched.
    AlreadyFulfilled,
    /// Stock ran out between initiation and verification. The transaction
    /// was aborted; the rows are untouched and need manual remediation.
    StockExhausted,
}

#[async_trait]
pub trait Store: Send + Sync {
    async fn user_exists(&self, user_id: Uuid) -> Result<bool>;

    async fn product_stock(&self, product_id: Uuid) -> Result<Option<ProductStock>>;

    /// Insert the order and payment rows in one transaction.
    async fn record_checkout(&self, checkout: NewCheckout) -> Result<(Order, Payment)>;

    async fn payment_by_remote_order(&self, remote_order_id: &str) -> Result<Option<Payment>>;

    /// Atomically apply the post-verification state change for `payment_id`.
    ///
    /// Concurrent calls for the same payment serialize; exactly one observes
    /// [`FulfillmentOutcome::Fulfilled`], the rest see `AlreadyFulfilled`.
    /// The product quantity never goes negative: if the order can no longer
    /// be covered the adapter aborts and reports `StockExhausted`.
    async fn apply_fulfillment(&self, payment_id: Uuid) -> Result<FulfillmentOutcome>;

    /// The `get_orders` projection: orders joined with their payment amount
    /// and a representative product image, newest first.
    async fn orders_for_user(&self, user_id: Uuid) -> Result<Vec<OrderSummary>>;
}
