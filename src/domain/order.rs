use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One purchase intent: a user buying a quantity of one product.
///
/// `fulfilled` flips false -> true exactly once, when the payment callback
/// verifies and stock is decremented. Orders are never deleted; the ledger is
/// the audit trail.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Order {
    pub id: Uuid,
    pub product_id: Uuid,
    pub user_id: Uuid,
    pub quantity: i32,
    pub fulfilled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Read model for `get_orders`: one row per order, joined with its payment
/// and a representative catalog image.
#[derive(Debug, Clone, Serialize)]
pub struct OrderSummary {
    pub order_id: Uuid,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
    pub fulfilled: bool,
    pub amount: Decimal,
    pub product: ProductSnapshot,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductSnapshot {
    pub id: Uuid,
    pub name: String,
    /// Unit price as paid, i.e. the payment amount divided by the quantity.
    pub price: Decimal,
    pub image: Option<String>,
}
