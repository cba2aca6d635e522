//! Runtime configuration, read once at startup and passed down explicitly.

use std::time::Duration;

use anyhow::Context;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub database_url: String,
    pub jwt_secret: String,
    pub gateway: GatewayConfig,
}

/// Credentials and tuning for the remote payment gateway. Constructed here
/// and handed to the adapter; nothing else reads the gateway environment.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub key_id: String,
    pub key_secret: String,
    pub base_url: String,
    pub currency: String,
    pub timeout: Duration,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let port = std::env::var("PORT").unwrap_or_else(|_| "8080".to_string());
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is required")?;
        let jwt_secret = std::env::var("JWT_SECRET").context("JWT_SECRET is required")?;

        let gateway = GatewayConfig {
            key_id: std::env::var("RAZORPAY_API_KEY").context("RAZORPAY_API_KEY is required")?,
            key_secret: std::env::var("RAZORPAY_API_SECRET")
                .context("RAZORPAY_API_SECRET is required")?,
            base_url: std::env::var("RAZORPAY_BASE_URL")
                .unwrap_or_else(|_| "https://api.razorpay.com".to_string()),
            currency: std::env::var("RAZORPAY_CURRENCY").unwrap_or_else(|_| "INR".to_string()),
            timeout: Duration::from_secs(
                std::env::var("GATEWAY_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(10),
            ),
        };

        Ok(Self {
            bind_addr: format!("0.0.0.0:{port}"),
            database_url,
            jwt_secret,
            gateway,
        })
    }
}
