//! Order endpoints: checkout initiation, payment verification, history.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::auth::AuthUser;
use crate::engine::VerifyOutcome;
use crate::error::{Error, Result};
use crate::gateway::RemoteOrder;
use crate::response::Envelope;

use super::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/create_order", post(create_order))
        .route("/verify_order", post(verify_order))
        .route("/get_orders", get(get_orders))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateOrderRequest {
    pub product_id: Uuid,
    #[validate(range(min = 1, message = "Quantity must be a positive integer"))]
    pub quantity: i32,
}

#[derive(Debug, Serialize)]
struct CheckoutResponse {
    order_id: Uuid,
    payment: RemoteOrder,
}

async fn create_order(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(req): Json<CreateOrderRequest>,
) -> Result<impl IntoResponse> {
    req.validate()
        .map_err(|err| Error::InvalidRequest(err.to_string()))?;
    let checkout = state
        .engine
        .initiate(user_id, req.product_id, req.quantity)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(Envelope::ok(
            "Order created successfully",
            CheckoutResponse {
                order_id: checkout.order.id,
                payment: checkout.remote,
            },
        )),
    ))
}

/// Field names follow the gateway's callback payload.
#[derive(Debug, Deserialize, Validate)]
pub struct VerifyOrderRequest {
    #[validate(length(min = 1, message = "Order ID is required"))]
    pub razorpay_order_id: String,
    #[validate(length(min = 1, message = "Payment ID is required"))]
    pub razorpay_payment_id: String,
    #[validate(length(min = 1, message = "Signature is required"))]
    pub razorpay_signature: String,
}

async fn verify_order(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    Json(req): Json<VerifyOrderRequest>,
) -> Result<impl IntoResponse> {
    req.validate()
        .map_err(|err| Error::InvalidRequest(err.to_string()))?;
    let outcome = state
        .engine
        .verify(
            &req.razorpay_order_id,
            &req.razorpay_payment_id,
            &req.razorpay_signature,
        )
        .await?;
    let message = match outcome {
        VerifyOutcome::Fulfilled => "Payment verified and order status updated successfully",
        VerifyOutcome::AlreadyFulfilled => "Payment already verified",
    };
    Ok(Json(Envelope::message(message)))
}

async fn get_orders(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<impl IntoResponse> {
    let orders = state.engine.list_orders(user_id).await?;
    Ok(Json(Envelope::ok("Orders fetched successfully", orders)))
}
