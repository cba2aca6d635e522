//! The order reconciliation engine.
//!
//! Drives a purchase from intent to fulfillment: `initiate` checks stock and
//! mints the remote payment reference, `verify` authenticates the payment
//! callback and applies the state change exactly once. Stock is advisory at
//! initiation and authoritative at verification; two initiations may race
//! past the stock check, and the loser surfaces as
//! [`Error::StockExhausted`] at verify time.

use std::sync::Arc;

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::{Order, OrderSummary, Payment};
use crate::error::{Error, Result};
use crate::gateway::{signature, PaymentGateway, RemoteOrder};
use crate::store::{FulfillmentOutcome, NewCheckout, Store};

#[derive(Clone)]
pub struct ReconciliationEngine {
    store: Arc<dyn Store>,
    gateway: Arc<dyn PaymentGateway>,
    gateway_secret: String,
}

/// Result of a successful `initiate`: the ledger rows plus the remote order
/// the client completes payment against.
#[derive(Debug, Clone)]
pub struct Checkout {
    pub order: Order,
    pub payment: Payment,
    pub remote: RemoteOrder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyOutcome {
    Fulfilled,
    /// Replayed webhook or duplicate client submission; the original success
    /// stands and no side effects were reapplied.
    AlreadyFulfilled,
}

impl ReconciliationEngine {
    pub fn new(
        store: Arc<dyn Store>,
        gateway: Arc<dyn PaymentGateway>,
        gateway_secret: impl Into<String>,
    ) -> Self {
        Self {
            store,
            gateway,
            gateway_secret: gateway_secret.into(),
        }
    }

    /// Create a provisional order and its payment row, returning the remote
    /// reference the client pays against.
    ///
    /// The gateway call happens before anything is persisted, so a gateway
    /// failure leaves no rows behind. Stock is checked here but only
    /// reserved at verification.
    pub async fn initiate(&self, user_id: Uuid, product_id: Uuid, quantity: i32) -> Result<Checkout> {
        if quantity <= 0 {
            return Err(Error::InvalidRequest(
                "Quantity must be a positive integer".into(),
            ));
        }
        if !self.store.user_exists(user_id).await? {
            return Err(Error::NotFound("User"));
        }
        let product = self
            .store
            .product_stock(product_id)
            .await?
            .ok_or(Error::NotFound("Product"))?;
        if product.quantity < quantity {
            return Err(Error::OutOfStock);
        }

        let amount = product.price * Decimal::from(quantity);
        let remote = self.gateway.create_remote_order(amount).await?;

        let (order, payment) = self
            .store
            .record_checkout(NewCheckout {
                user_id,
                product_id,
                quantity,
                remote_order_id: remote.id.clone(),
                amount,
            })
            .await?;

        tracing::info!(
            order_id = %order.id,
            remote_order_id = %remote.id,
            %amount,
            "checkout initiated"
        );
        Ok(Checkout {
            order,
            payment,
            remote,
        })
    }

    /// Authenticate a payment callback and apply the fulfillment transition.
    ///
    /// A signature mismatch changes nothing and may be retried with a
    /// corrected payload. A replay of an already-verified payment returns
    /// the prior success without touching stock.
    pub async fn verify(
        &self,
        remote_order_id: &str,
        remote_payment_id: &str,
        supplied_signature: &str,
    ) -> Result<VerifyOutcome> {
        if remote_order_id.is_empty() || remote_payment_id.is_empty() || supplied_signature.is_empty()
        {
            return Err(Error::InvalidRequest(
                "Order ID, Payment ID, and Signature are required".into(),
            ));
        }

        let payment = self
            .store
            .payment_by_remote_order(remote_order_id)
            .await?
            .ok_or(Error::NotFound("Payment record"))?;

        if !signature::verify_signature(
            remote_order_id,
            remote_payment_id,
            supplied_signature,
            &self.gateway_secret,
        ) {
            tracing::warn!(remote_order_id, "payment signature mismatch");
            return Err(Error::VerificationFailed);
        }

        if payment.paid {
            return Ok(VerifyOutcome::AlreadyFulfilled);
        }

        match self.store.apply_fulfillment(payment.id).await? {
            FulfillmentOutcome::Fulfilled => {
                tracing::info!(order_id = %payment.order_id, remote_order_id, "order fulfilled");
                Ok(VerifyOutcome::Fulfilled)
            }
            // Lost the race against a concurrent verify of the same payment.
            FulfillmentOutcome::AlreadyFulfilled => Ok(VerifyOutcome::AlreadyFulfilled),
            FulfillmentOutcome::StockExhausted => {
                tracing::error!(
                    order_id = %payment.order_id,
                    remote_order_id,
                    "payment captured but stock exhausted; manual remediation required"
                );
                Err(Error::StockExhausted)
            }
        }
    }

    pub async fn list_orders(&self, user_id: Uuid) -> Result<Vec<OrderSummary>> {
        self.store.orders_for_user(user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::signature::payment_signature;
    use crate::store::MemStore;
    use async_trait::async_trait;
    use rust_decimal::prelude::ToPrimitive;
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    const SECRET: &str = "test-secret";

    /// Mints deterministic references; can be told to fail like a gateway
    /// outage.
    struct StubGateway {
        fail: AtomicBool,
        minted: AtomicUsize,
    }

    impl StubGateway {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                fail: AtomicBool::new(false),
                minted: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl PaymentGateway for StubGateway {
        async fn create_remote_order(&self, amount: Decimal) -> Result<RemoteOrder> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(Error::Gateway("connection refused".into()));
            }
            let n = self.minted.fetch_add(1, Ordering::SeqCst);
            Ok(RemoteOrder {
                id: format!("order_stub{n}"),
                amount: (amount * dec!(100)).to_i64().unwrap(),
                currency: "INR".into(),
            })
        }
    }

    struct Fixture {
        engine: ReconciliationEngine,
        store: MemStore,
        gateway: Arc<StubGateway>,
        user: Uuid,
        product: Uuid,
    }

    /// Price 500, ten in stock, one cart entry for the user.
    async fn fixture() -> Fixture {
        let store = MemStore::new();
        let gateway = StubGateway::new();
        let user = store.add_user("Asha").await;
        let product = store.add_product("Ceramic mug", dec!(500), 10).await;
        store.add_cart_entry(user, product, 3).await;
        let engine =
            ReconciliationEngine::new(Arc::new(store.clone()), gateway.clone(), SECRET);
        Fixture {
            engine,
            store,
            gateway,
            user,
            product,
        }
    }

    fn signed(remote_order_id: &str) -> (String, String) {
        let payment_id = format!("pay_{remote_order_id}");
        let sig = payment_signature(remote_order_id, &payment_id, SECRET);
        (payment_id, sig)
    }

    #[tokio::test]
    async fn initiate_creates_one_unpaid_order_and_payment() {
        let f = fixture().await;
        let checkout = f.engine.initiate(f.user, f.product, 3).await.unwrap();

        assert_eq!(checkout.payment.amount, dec!(1500));
        assert_eq!(checkout.remote.amount, 150_000); // paise
        assert!(!checkout.order.fulfilled);
        assert!(!checkout.payment.paid);
        assert_eq!(checkout.payment.order_id, checkout.order.id);
        assert_eq!(f.store.order_count().await, 1);
        assert_eq!(f.store.payment_count().await, 1);
        // Stock is only checked, not reserved.
        assert_eq!(f.store.product_quantity(f.product).await, Some(10));
    }

    #[tokio::test]
    async fn initiate_rejects_non_positive_quantity() {
        let f = fixture().await;
        assert!(matches!(
            f.engine.initiate(f.user, f.product, 0).await,
            Err(Error::InvalidRequest(_))
        ));
        assert_eq!(f.store.order_count().await, 0);
    }

    #[tokio::test]
    async fn initiate_rejects_unknown_user_and_product() {
        let f = fixture().await;
        assert!(matches!(
            f.engine.initiate(Uuid::now_v7(), f.product, 1).await,
            Err(Error::NotFound("User"))
        ));
        assert!(matches!(
            f.engine.initiate(f.user, Uuid::now_v7(), 1).await,
            Err(Error::NotFound("Product"))
        ));
    }

    #[tokio::test]
    async fn initiate_with_quantity_over_stock_creates_no_rows() {
        let f = fixture().await;
        assert!(matches!(
            f.engine.initiate(f.user, f.product, 11).await,
            Err(Error::OutOfStock)
        ));
        assert_eq!(f.store.order_count().await, 0);
        assert_eq!(f.store.payment_count().await, 0);
    }

    #[tokio::test]
    async fn gateway_failure_leaves_no_rows() {
        let f = fixture().await;
        f.gateway.fail.store(true, Ordering::SeqCst);
        assert!(matches!(
            f.engine.initiate(f.user, f.product, 2).await,
            Err(Error::Gateway(_))
        ));
        assert_eq!(f.store.order_count().await, 0);
        assert_eq!(f.store.payment_count().await, 0);
    }

    #[tokio::test]
    async fn verify_fulfills_decrements_and_clears_cart() {
        let f = fixture().await;
        let checkout = f.engine.initiate(f.user, f.product, 3).await.unwrap();
        let (payment_id, sig) = signed(&checkout.remote.id);

        let outcome = f
            .engine
            .verify(&checkout.remote.id, &payment_id, &sig)
            .await
            .unwrap();

        assert_eq!(outcome, VerifyOutcome::Fulfilled);
        assert_eq!(f.store.product_quantity(f.product).await, Some(7));
        assert!(f.store.order(checkout.order.id).await.unwrap().fulfilled);
        assert!(f
            .store
            .payment_for_order(checkout.order.id)
            .await
            .unwrap()
            .paid);
        assert!(!f.store.cart_contains(f.user, f.product).await);
    }

    #[tokio::test]
    async fn verify_replay_decrements_exactly_once() {
        let f = fixture().await;
        let checkout = f.engine.initiate(f.user, f.product, 3).await.unwrap();
        let (payment_id, sig) = signed(&checkout.remote.id);

        f.engine
            .verify(&checkout.remote.id, &payment_id, &sig)
            .await
            .unwrap();
        let replay = f
            .engine
            .verify(&checkout.remote.id, &payment_id, &sig)
            .await
            .unwrap();

        assert_eq!(replay, VerifyOutcome::AlreadyFulfilled);
        assert_eq!(f.store.product_quantity(f.product).await, Some(7));
    }

    #[tokio::test]
    async fn tampered_signature_mutates_nothing_and_is_retryable() {
        let f = fixture().await;
        let checkout = f.engine.initiate(f.user, f.product, 3).await.unwrap();
        let (payment_id, sig) = signed(&checkout.remote.id);

        let forged = payment_signature(&checkout.remote.id, &payment_id, "wrong-secret");
        assert!(matches!(
            f.engine
                .verify(&checkout.remote.id, &payment_id, &forged)
                .await,
            Err(Error::VerificationFailed)
        ));
        assert_eq!(f.store.product_quantity(f.product).await, Some(10));
        assert!(!f.store.order(checkout.order.id).await.unwrap().fulfilled);
        assert!(f.store.cart_contains(f.user, f.product).await);

        // The payment row stays unpaid; a corrected payload still verifies.
        let outcome = f
            .engine
            .verify(&checkout.remote.id, &payment_id, &sig)
            .await
            .unwrap();
        assert_eq!(outcome, VerifyOutcome::Fulfilled);
    }

    #[tokio::test]
    async fn verify_requires_all_fields() {
        let f = fixture().await;
        assert!(matches!(
            f.engine.verify("order_stub0", "pay_x", "").await,
            Err(Error::InvalidRequest(_))
        ));
        assert!(matches!(
            f.engine.verify("", "pay_x", "sig").await,
            Err(Error::InvalidRequest(_))
        ));
    }

    #[tokio::test]
    async fn verify_unknown_reference_is_not_found() {
        let f = fixture().await;
        assert!(matches!(
            f.engine.verify("order_unknown", "pay_x", "sig").await,
            Err(Error::NotFound("Payment record"))
        ));
    }

    #[tokio::test]
    async fn last_unit_goes_to_exactly_one_of_two_paid_orders() {
        let store = MemStore::new();
        let gateway = StubGateway::new();
        let engine = ReconciliationEngine::new(Arc::new(store.clone()), gateway, SECRET);
        let first = store.add_user("Asha").await;
        let second = store.add_user("Biyu").await;
        let product = store.add_product("Last one", dec!(250), 1).await;

        // Both pass the advisory stock check before either verifies.
        let a = engine.initiate(first, product, 1).await.unwrap();
        let b = engine.initiate(second, product, 1).await.unwrap();

        let (a_pay, a_sig) = signed(&a.remote.id);
        let outcome = engine.verify(&a.remote.id, &a_pay, &a_sig).await.unwrap();
        assert_eq!(outcome, VerifyOutcome::Fulfilled);
        assert_eq!(store.product_quantity(product).await, Some(0));

        let (b_pay, b_sig) = signed(&b.remote.id);
        assert!(matches!(
            engine.verify(&b.remote.id, &b_pay, &b_sig).await,
            Err(Error::StockExhausted)
        ));
        // Never negative, and the loser's ledger rows stay open.
        assert_eq!(store.product_quantity(product).await, Some(0));
        assert!(!store.order(b.order.id).await.unwrap().fulfilled);
        assert!(!store.payment_for_order(b.order.id).await.unwrap().paid);
    }

    #[tokio::test]
    async fn list_orders_projects_payment_and_image() {
        let f = fixture().await;
        f.store.add_image(f.product, "https://cdn.example/mug.jpg").await;
        let checkout = f.engine.initiate(f.user, f.product, 3).await.unwrap();
        let (payment_id, sig) = signed(&checkout.remote.id);
        f.engine
            .verify(&checkout.remote.id, &payment_id, &sig)
            .await
            .unwrap();

        let summaries = f.engine.list_orders(f.user).await.unwrap();
        assert_eq!(summaries.len(), 1);
        let summary = &summaries[0];
        assert_eq!(summary.order_id, checkout.order.id);
        assert_eq!(summary.amount, dec!(1500));
        assert_eq!(summary.product.price, dec!(500));
        assert!(summary.fulfilled);
        assert_eq!(
            summary.product.image.as_deref(),
            Some("https://cdn.example/mug.jpg")
        );
    }
}
