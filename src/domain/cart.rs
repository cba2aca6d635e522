use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A pending selection, keyed by `(user_id, product_id)`. The engine only
/// ever deletes these, when the matching order is fulfilled.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CartEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
}
