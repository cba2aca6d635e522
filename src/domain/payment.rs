use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One gateway transaction tied to exactly one order.
///
/// `remote_order_id` is the reference minted by the gateway at initiation;
/// verification callbacks are looked up by it. `amount` is fixed at creation
/// (price x quantity) and never changes. `paid` flips false -> true exactly
/// once.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Payment {
    pub id: Uuid,
    pub order_id: Uuid,
    pub user_id: Uuid,
    pub remote_order_id: String,
    pub amount: Decimal,
    pub paid: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
