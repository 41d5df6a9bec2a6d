use axum::http::HeaderMap;
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use serde::Serialize;
use serde_json::Value;

use crate::{
    config::TapConfig,
    dto::payments::{
        TapInitRequest, TapInitResponse, TapStatusRequest, TapStatusResponse, TapWebhookEvent,
        WebhookAck,
    },
    entity::{
        cart_items::{Column as CartItemCol, Entity as CartItems},
        carts::{Column as CartCol, Entity as Carts},
    },
    error::{AppError, AppResult},
    middleware::{
        auth::{AuthUser, Role, ensure_role},
        signature::verify_tap_signature,
    },
    models::{OrderStatus, PaymentStatus},
    response::{ApiResponse, Meta},
    services::order_service::{self, CartRef, PlaceOrder},
    state::AppState,
};

pub const SIGNATURE_HEADER: &str = "x-tap-signature";

#[derive(Debug, Serialize)]
struct ChargeRequest<'a> {
    #[serde(with = "rust_decimal::serde::float")]
    amount: Decimal,
    currency: &'a str,
    #[serde(rename = "threeDSecure")]
    three_d_secure: bool,
    save_card: bool,
    description: &'a str,
    customer: ChargeCustomer<'a>,
    source: ChargeSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    post: Option<ChargeUrl<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    redirect: Option<ChargeUrl<'a>>,
    metadata: ChargeMetadata<'a>,
}

#[derive(Debug, Serialize)]
struct ChargeCustomer<'a> {
    first_name: &'a str,
    last_name: &'a str,
    email: &'a str,
}

#[derive(Debug, Serialize)]
struct ChargeSource {
    id: &'static str,
}

#[derive(Debug, Serialize)]
struct ChargeUrl<'a> {
    url: &'a str,
}

#[derive(Debug, Serialize)]
struct ChargeMetadata<'a> {
    cart_id: String,
    user_id: &'a str,
}

fn secret_key(config: &TapConfig) -> AppResult<&str> {
    config
        .secret_key
        .as_deref()
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("TAP_SECRET_KEY is not set")))
}

fn gateway_error(err: reqwest::Error) -> AppError {
    tracing::warn!(error = %err, "tap request failed");
    AppError::BadGateway("tap request failed".into())
}

/// Start a card charge for the caller's cart. The amount is the cart's
/// current total; the cart id travels in the charge metadata so the webhook
/// can place the order.
pub async fn init_charge(
    state: &AppState,
    user: &AuthUser,
    payload: TapInitRequest,
) -> AppResult<ApiResponse<TapInitResponse>> {
    ensure_role(user, Role::User)?;
    let tap = &state.config.tap;
    let key = secret_key(tap)?;

    let cart = Carts::find()
        .filter(CartCol::UserId.eq(user.user_id.as_str()))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    let lines = CartItems::find()
        .filter(CartItemCol::CartId.eq(cart.id))
        .count(&state.orm)
        .await?;
    if lines == 0 {
        return Err(AppError::BadRequest("cart is empty".into()));
    }
    let totals = order_service::cart_totals(&state.orm, cart.id).await?;

    let charge = ChargeRequest {
        amount: totals.total_amount,
        currency: &tap.currency,
        three_d_secure: true,
        save_card: false,
        description: "Storefront order",
        customer: ChargeCustomer {
            first_name: payload.first_name.as_deref().unwrap_or("Customer"),
            last_name: payload.last_name.as_deref().unwrap_or(""),
            email: &payload.customer_email,
        },
        source: ChargeSource { id: "src_all" },
        post: tap.post_url.as_deref().map(|url| ChargeUrl { url }),
        redirect: tap.redirect_url.as_deref().map(|url| ChargeUrl { url }),
        metadata: ChargeMetadata {
            cart_id: cart.id.to_string(),
            user_id: &user.user_id,
        },
    };

    let response = state
        .http
        .post(format!("{}/charges", tap.api_url))
        .bearer_auth(key)
        .json(&charge)
        .send()
        .await
        .map_err(gateway_error)?;
    let status = response.status();
    let body: Value = response.json().await.map_err(gateway_error)?;
    if !status.is_success() {
        tracing::warn!(%status, body = %body, "tap rejected charge");
        return Err(AppError::BadGateway(format!("tap answered {status}")));
    }

    let charge_id = body["id"].as_str().unwrap_or_default().to_string();
    let redirect_url = body["transaction"]["url"]
        .as_str()
        .ok_or_else(|| AppError::BadGateway("transaction url missing".into()))?
        .to_string();

    tracing::info!(
        cart_id = %cart.id,
        charge_id = %charge_id,
        amount = %totals.total_amount,
        "tap charge created"
    );

    Ok(ApiResponse::success(
        "Charge created",
        TapInitResponse {
            charge_id,
            redirect_url,
            amount: totals.total_amount,
        },
        Some(Meta::empty()),
    ))
}

pub async fn charge_status(
    state: &AppState,
    payload: TapStatusRequest,
) -> AppResult<ApiResponse<TapStatusResponse>> {
    let charge_id = payload.charge_id.trim();
    if charge_id.is_empty() {
        return Err(AppError::BadRequest("charge_id is required".into()));
    }
    let tap = &state.config.tap;
    let key = secret_key(tap)?;

    let response = state
        .http
        .get(format!("{}/charges/{}", tap.api_url, charge_id))
        .bearer_auth(key)
        .send()
        .await
        .map_err(gateway_error)?;
    if !response.status().is_success() {
        return Err(AppError::BadGateway(format!(
            "tap answered {}",
            response.status()
        )));
    }
    let data: Value = response.json().await.map_err(gateway_error)?;
    let status = data["status"].as_str().unwrap_or_default().to_string();

    Ok(ApiResponse::success(
        "Charge status",
        TapStatusResponse { status, data },
        Some(Meta::empty()),
    ))
}

/// Verify and apply a Tap callback. A succeeded charge places the order for
/// the cart named in its metadata, using the charge id as the order reference
/// so redelivered callbacks return the same order.
pub async fn handle_webhook(
    state: &AppState,
    headers: &HeaderMap,
    body: &[u8],
) -> AppResult<WebhookAck> {
    let secret = state
        .config
        .tap
        .webhook_secret
        .as_deref()
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("TAP_WEBHOOK_SECRET is not set")))?;

    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::BadRequest("missing X-Tap-Signature header".into()))?;
    if !verify_tap_signature(secret, body, signature) {
        tracing::warn!("tap webhook signature mismatch");
        return Err(AppError::Unauthorized("invalid signature".into()));
    }

    let event: TapWebhookEvent = serde_json::from_slice(body)
        .map_err(|e| AppError::BadRequest(format!("invalid webhook body: {e}")))?;

    match event.event_type.as_str() {
        "charge.succeeded" => {
            let cart_id = event
                .data
                .metadata
                .cart_id
                .ok_or_else(|| AppError::BadRequest("charge metadata has no cart_id".into()))?;

            let placed = order_service::place_order(
                state,
                PlaceOrder {
                    cart: CartRef::Cart(cart_id),
                    status: OrderStatus::Confirmed.to_string(),
                    payment_status: PaymentStatus::Paid.to_string(),
                    payment_method: "card".to_string(),
                    order_ref: Some(event.data.id.clone()),
                },
            )
            .await
            .map_err(|err| {
                AppError::Internal(anyhow::anyhow!(
                    "tap charge {} could not be placed: {err}",
                    event.data.id
                ))
            })?;

            Ok(WebhookAck {
                received: true,
                order_ref: Some(placed.order.order_ref),
            })
        }
        "charge.failed" => {
            tracing::warn!(
                charge_id = %event.data.id,
                user_id = ?event.data.metadata.user_id,
                "tap charge failed"
            );
            Ok(WebhookAck {
                received: true,
                order_ref: None,
            })
        }
        other => {
            tracing::info!(event_type = other, "unhandled tap event");
            Ok(WebhookAck {
                received: true,
                order_ref: None,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn charge_body_carries_numeric_amount_and_cart_metadata() {
        let charge = ChargeRequest {
            amount: dec!(70.50),
            currency: "SAR",
            three_d_secure: true,
            save_card: false,
            description: "Storefront order",
            customer: ChargeCustomer {
                first_name: "Customer",
                last_name: "",
                email: "a@example.com",
            },
            source: ChargeSource { id: "src_all" },
            post: None,
            redirect: Some(ChargeUrl {
                url: "https://shop.example/return",
            }),
            metadata: ChargeMetadata {
                cart_id: "c-1".into(),
                user_id: "u-1",
            },
        };

        let body = serde_json::to_value(&charge).expect("serialize");
        assert_eq!(body["amount"], serde_json::json!(70.5));
        assert_eq!(body["threeDSecure"], serde_json::json!(true));
        assert_eq!(body["metadata"]["cart_id"], "c-1");
        assert_eq!(body["redirect"]["url"], "https://shop.example/return");
        assert!(body.get("post").is_none());
    }
}
