//! HTTP adapter for the Razorpay orders API.

use async_trait::async_trait;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::config::GatewayConfig;
use crate::error::{Error, Result};

use super::{PaymentGateway, RemoteOrder};

pub struct RazorpayClient {
    http: reqwest::Client,
    key_id: String,
    key_secret: String,
    base_url: String,
    currency: String,
}

impl RazorpayClient {
    /// Credentials are checked up front so a misconfigured deployment fails
    /// at startup, not on the first checkout.
    pub fn new(config: &GatewayConfig) -> Result<Self> {
        if config.key_id.is_empty() || config.key_secret.is_empty() {
            return Err(Error::Gateway("gateway credentials not configured".into()));
        }
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| Error::Gateway(err.to_string()))?;
        Ok(Self {
            http,
            key_id: config.key_id.clone(),
            key_secret: config.key_secret.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            currency: config.currency.clone(),
        })
    }
}

#[async_trait]
impl PaymentGateway for RazorpayClient {
    async fn create_remote_order(&self, amount: Decimal) -> Result<RemoteOrder> {
        // The remote API takes the amount in minor units (paise).
        let minor = (amount * Decimal::from(100))
            .round()
            .to_i64()
            .ok_or_else(|| Error::Gateway(format!("amount {amount} out of range")))?;

        let response = self
            .http
            .post(format!("{}/v1/orders", self.base_url))
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .json(&serde_json::json!({ "amount": minor, "currency": self.currency }))
            .send()
            .await
            .map_err(|err| Error::Gateway(err.to_string()))?;

        if !response.status().is_success() {
            return Err(Error::Gateway(format!(
                "remote order rejected with status {}",
                response.status()
            )));
        }

        response
            .json::<RemoteOrder>()
            .await
            .map_err(|err| Error::Gateway(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn config(key_id: &str, key_secret: &str) -> GatewayConfig {
        GatewayConfig {
            key_id: key_id.to_string(),
            key_secret: key_secret.to_string(),
            base_url: "https://api.razorpay.com/".to_string(),
            currency: "INR".to_string(),
            timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn missing_credentials_are_rejected_at_construction() {
        assert!(RazorpayClient::new(&config("", "")).is_err());
        assert!(RazorpayClient::new(&config("rzp_test_key", "")).is_err());
    }

    #[test]
    fn base_url_trailing_slash_is_normalized() {
        let client = RazorpayClient::new(&config("rzp_test_key", "secret")).unwrap();
        assert_eq!(client.base_url, "https://api.razorpay.com");
    }
}
