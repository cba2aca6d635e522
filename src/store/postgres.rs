//! Postgres adapter. Row locks (`SELECT ... FOR UPDATE`) across the payment,
//! order, and product rows give the fulfillment step its serializable
//! behavior under concurrent verify calls.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::{Order, OrderSummary, Payment, ProductSnapshot, ProductStock};
use crate::error::{Error, Result};

use super::{FulfillmentOutcome, NewCheckout, Store};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct SummaryRow {
    order_id: Uuid,
    quantity: i32,
    created_at: DateTime<Utc>,
    fulfilled: bool,
    amount: Decimal,
    product_id: Uuid,
    product_name: String,
    image: Option<String>,
}

#[async_trait]
impl Store for PgStore {
    async fn user_exists(&self, user_id: Uuid) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    async fn product_stock(&self, product_id: Uuid) -> Result<Option<ProductStock>> {
        let product = sqlx::query_as::<_, ProductStock>(
            "SELECT id, name, price, quantity FROM products WHERE id = $1",
        )
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(product)
    }

    async fn record_checkout(&self, checkout: NewCheckout) -> Result<(Order, Payment)> {
        let mut tx = self.pool.begin().await?;

        let order = sqlx::query_as::<_, Order>(
            "INSERT INTO orders (id, product_id, user_id, quantity) \
             VALUES ($1, $2, $3, $4) RETURNING *",
        )
        .bind(Uuid::now_v7())
        .bind(checkout.product_id)
        .bind(checkout.user_id)
        .bind(checkout.quantity)
        .fetch_one(&mut *tx)
        .await?;

        let payment = sqlx::query_as::<_, Payment>(
            "INSERT INTO payments (id, order_id, user_id, remote_order_id, amount) \
             VALUES ($1, $2, $3, $4, $5) RETURNING *",
        )
        .bind(Uuid::now_v7())
        .bind(order.id)
        .bind(checkout.user_id)
        .bind(&checkout.remote_order_id)
        .bind(checkout.amount)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok((order, payment))
    }

    async fn payment_by_remote_order(&self, remote_order_id: &str) -> Result<Option<Payment>> {
        let payment =
            sqlx::query_as::<_, Payment>("SELECT * FROM payments WHERE remote_order_id = $1")
                .bind(remote_order_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(payment)
    }

    async fn apply_fulfillment(&self, payment_id: Uuid) -> Result<FulfillmentOutcome> {
        let mut tx = self.pool.begin().await?;

        // Lock the payment first; a concurrent verify for the same payment
        // blocks here until the winner commits, then sees paid = true.
        let payment = sqlx::query_as::<_, Payment>(
            "SELECT * FROM payments WHERE id = $1 FOR UPDATE",
        )
        .bind(payment_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(Error::NotFound("Payment record"))?;

        if payment.paid {
            return Ok(FulfillmentOutcome::AlreadyFulfilled);
        }

        let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1 FOR UPDATE")
            .bind(payment.order_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(Error::NotFound("Order"))?;

        let stock = sqlx::query_scalar::<_, i32>(
            "SELECT quantity FROM products WHERE id = $1 FOR UPDATE",
        )
        .bind(order.product_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(Error::NotFound("Product"))?;

        if stock < order.quantity {
            tx.rollback().await?;
            return Ok(FulfillmentOutcome::StockExhausted);
        }

        sqlx::query("UPDATE products SET quantity = quantity - $2, updated_at = NOW() WHERE id = $1")
            .bind(order.product_id)
            .bind(order.quantity)
            .execute(&mut *tx)
            .await?;

        sqlx::query("UPDATE orders SET fulfilled = TRUE, updated_at = NOW() WHERE id = $1")
            .bind(order.id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("UPDATE payments SET paid = TRUE, updated_at = NOW() WHERE id = $1")
            .bind(payment.id)
            .execute(&mut *tx)
            .await?;

        // Best-effort: the cart entry may already be gone.
        sqlx::query("DELETE FROM cart_items WHERE user_id = $1 AND product_id = $2")
            .bind(order.user_id)
            .bind(order.product_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(FulfillmentOutcome::Fulfilled)
    }

    async fn orders_for_user(&self, user_id: Uuid) -> Result<Vec<OrderSummary>> {
        let rows = sqlx::query_as::<_, SummaryRow>(
            "SELECT o.id AS order_id, o.quantity, o.created_at, o.fulfilled, \
                    p.amount, pr.id AS product_id, pr.name AS product_name, \
                    (SELECT m.images[1] FROM product_media m \
                     WHERE m.product_id = pr.id LIMIT 1) AS image \
             FROM orders o \
             JOIN payments p ON p.order_id = o.id \
             JOIN products pr ON pr.id = o.product_id \
             WHERE o.user_id = $1 \
             ORDER BY o.created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| OrderSummary {
                order_id: row.order_id,
                quantity: row.quantity,
                created_at: row.created_at,
                fulfilled: row.fulfilled,
                amount: row.amount,
                product: ProductSnapshot {
                    id: row.product_id,
                    name: row.product_name,
                    price: row.amount / Decimal::from(row.quantity),
                    image: row.image,
                },
            })
            .collect())
    }
}
