//! The payment gateway trust boundary.
//!
//! The engine depends on exactly two things from the remote gateway: minting
//! a remote order for an amount ([`PaymentGateway::create_remote_order`]) and
//! checking callback signatures ([`signature::verify_signature`], a pure
//! function). Everything else about the gateway stays behind this module.

pub mod razorpay;
pub mod signature;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::Result;

pub use razorpay::RazorpayClient;

/// An order minted on the remote gateway. `id` is the reference the client
/// uses to complete payment out-of-band, and later the verification lookup
/// key. `amount` is in the gateway's minor units.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteOrder {
    pub id: String,
    pub amount: i64,
    pub currency: String,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Mint a remote order for `amount` (major units). Fails with
    /// [`crate::Error::Gateway`] on network, credential, or timeout failure;
    /// callers must treat that as all-or-nothing and persist nothing.
    async fn create_remote_order(&self, amount: Decimal) -> Result<RemoteOrder>;
}
