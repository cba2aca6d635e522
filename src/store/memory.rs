//! In-memory adapter: one async mutex over the whole data set, so every
//! store operation is trivially atomic. Used by the test suites and handy
//! for running the service without Postgres.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::domain::{CartEntry, Order, OrderSummary, Payment, ProductSnapshot, ProductStock};
use crate::error::{Error, Result};

use super::{FulfillmentOutcome, NewCheckout, Store};

#[derive(Default, Clone)]
pub struct MemStore {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Default)]
struct Inner {
    users: HashMap<Uuid, String>,
    products: HashMap<Uuid, ProductStock>,
    images: HashMap<Uuid, Vec<String>>,
    cart: HashMap<(Uuid, Uuid), CartEntry>,
    orders: HashMap<Uuid, Order>,
    payments: HashMap<Uuid, Payment>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_user(&self, name: &str) -> Uuid {
        let id = Uuid::now_v7();
        self.inner.lock().await.users.insert(id, name.to_string());
        id
    }

    pub async fn add_product(&self, name: &str, price: Decimal, quantity: i32) -> Uuid {
        let id = Uuid::now_v7();
        self.inner.lock().await.products.insert(
            id,
            ProductStock {
                id,
                name: name.to_string(),
                price,
                quantity,
            },
        );
        id
    }

    pub async fn add_image(&self, product_id: Uuid, url: &str) {
        self.inner
            .lock()
            .await
            .images
            .entry(product_id)
            .or_default()
            .push(url.to_string());
    }

    pub async fn add_cart_entry(&self, user_id: Uuid, product_id: Uuid, quantity: i32) {
        self.inner.lock().await.cart.insert(
            (user_id, product_id),
            CartEntry {
                id: Uuid::now_v7(),
                user_id,
                product_id,
                quantity,
                created_at: Utc::now(),
            },
        );
    }

    pub async fn product_quantity(&self, product_id: Uuid) -> Option<i32> {
        self.inner
            .lock()
            .await
            .products
            .get(&product_id)
            .map(|p| p.quantity)
    }

    pub async fn cart_contains(&self, user_id: Uuid, product_id: Uuid) -> bool {
        self.inner
            .lock()
            .await
            .cart
            .contains_key(&(user_id, product_id))
    }

    pub async fn order(&self, order_id: Uuid) -> Option<Order> {
        self.inner.lock().await.orders.get(&order_id).cloned()
    }

    pub async fn payment_for_order(&self, order_id: Uuid) -> Option<Payment> {
        self.inner
            .lock()
            .await
            .payments
            .values()
            .find(|p| p.order_id == order_id)
            .cloned()
    }

    pub async fn order_count(&self) -> usize {
        self.inner.lock().await.orders.len()
    }

    pub async fn payment_count(&self) -> usize {
        self.inner.lock().await.payments.len()
    }
}

#[async_trait]
impl Store for MemStore {
    async fn user_exists(&self, user_id: Uuid) -> Result<bool> {
        Ok(self.inner.lock().await.users.contains_key(&user_id))
    }

    async fn product_stock(&self, product_id: Uuid) -> Result<Option<ProductStock>> {
        Ok(self.inner.lock().await.products.get(&product_id).cloned())
    }

    async fn record_checkout(&self, checkout: NewCheckout) -> Result<(Order, Payment)> {
        let mut inner = self.inner.lock().await;
        let now = Utc::now();
        let order = Order {
            id: Uuid::now_v7(),
            product_id: checkout.product_id,
            user_id: checkout.user_id,
            quantity: checkout.quantity,
            fulfilled: false,
            created_at: now,
            updated_at: now,
        };
        let payment = Payment {
            id: Uuid::now_v7(),
            order_id: order.id,
            user_id: checkout.user_id,
            remote_order_id: checkout.remote_order_id,
            amount: checkout.amount,
            paid: false,
            created_at: now,
            updated_at: now,
        };
        inner.orders.insert(order.id, order.clone());
        inner.payments.insert(payment.id, payment.clone());
        Ok((order, payment))
    }

    async fn payment_by_remote_order(&self, remote_order_id: &str) -> Result<Option<Payment>> {
        Ok(self
            .inner
            .lock()
            .await
            .payments
            .values()
            .find(|p| p.remote_order_id == remote_order_id)
            .cloned())
    }

    async fn apply_fulfillment(&self, payment_id: Uuid) -> Result<FulfillmentOutcome> {
        // The single lock spans the whole read-check-mutate sequence.
        let mut inner = self.inner.lock().await;

        let payment = inner
            .payments
            .get(&payment_id)
            .cloned()
            .ok_or(Error::NotFound("Payment record"))?;
        if payment.paid {
            return Ok(FulfillmentOutcome::AlreadyFulfilled);
        }

        let order = inner
            .orders
            .get(&payment.order_id)
            .cloned()
            .ok_or(Error::NotFound("Order"))?;
        let stock = inner
            .products
            .get(&order.product_id)
            .map(|p| p.quantity)
            .ok_or(Error::NotFound("Product"))?;

        if stock < order.quantity {
            return Ok(FulfillmentOutcome::StockExhausted);
        }

        let now = Utc::now();
        if let Some(product) = inner.products.get_mut(&order.product_id) {
            product.quantity -= order.quantity;
        }
        if let Some(order) = inner.orders.get_mut(&payment.order_id) {
            order.fulfilled = true;
            order.updated_at = now;
        }
        if let Some(payment) = inner.payments.get_mut(&payment_id) {
            payment.paid = true;
            payment.updated_at = now;
        }
        inner.cart.remove(&(order.user_id, order.product_id));

        Ok(FulfillmentOutcome::Fulfilled)
    }

    async fn orders_for_user(&self, user_id: Uuid) -> Result<Vec<OrderSummary>> {
        let inner = self.inner.lock().await;
        let mut summaries: Vec<OrderSummary> = inner
            .orders
            .values()
            .filter(|o| o.user_id == user_id)
            .filter_map(|o| {
                let payment = inner.payments.values().find(|p| p.order_id == o.id)?;
                let product = inner.products.get(&o.product_id)?;
                Some(OrderSummary {
                    order_id: o.id,
                    quantity: o.quantity,
                    created_at: o.created_at,
                    fulfilled: o.fulfilled,
                    amount: payment.amount,
                    product: ProductSnapshot {
                        id: product.id,
                        name: product.name.clone(),
                        price: payment.amount / Decimal::from(o.quantity),
                        image: inner
                            .images
                            .get(&o.product_id)
                            .and_then(|imgs| imgs.first().cloned()),
                    },
                })
            })
            .collect();
        summaries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(summaries)
    }
}
