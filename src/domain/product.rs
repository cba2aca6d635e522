use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The slice of a catalog product the engine touches: price for computing
/// the payment amount, quantity for the stock check and decrement.
///
/// Invariant the engine preserves: `quantity` never goes negative, and an
/// order decrements it at most once.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProductStock {
    pub id: Uuid,
    pub name: String,
    pub price: Decimal,
    pub quantity: i32,
}
