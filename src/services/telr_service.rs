use std::collections::HashMap;

use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;

use crate::{
    config::{TelrConfig, TelrMode},
    dto::payments::{TelrPlaceRequest, TelrPlaceResponse, WebhookAck},
    entity::{
        cart_items::{Column as CartItemCol, Entity as CartItems},
        carts::{Column as CartCol, Entity as Carts},
    },
    error::{AppError, AppResult},
    middleware::{
        auth::{AuthUser, Role, ensure_role},
        signature::verify_telr_check,
    },
    models::{OrderStatus, PaymentStatus},
    response::{ApiResponse, Meta},
    services::order_service::{self, CartRef, PlaceOrder},
    state::AppState,
};

/// Telr's `tran_status` for an authorised transaction.
const AUTHORISED: &str = "A";

#[derive(Debug, Deserialize)]
struct TelrCreateResponse {
    order: Option<TelrOrder>,
    error: Option<TelrError>,
}

#[derive(Debug, Deserialize)]
struct TelrOrder {
    #[serde(rename = "ref")]
    reference: String,
    url: String,
}

#[derive(Debug, Deserialize)]
struct TelrError {
    message: Option<String>,
    note: Option<String>,
}

struct Store<'a> {
    id: i64,
    auth_key: &'a str,
    api_url: &'a str,
}

fn store(config: &TelrConfig) -> AppResult<Store<'_>> {
    match (config.store_id, config.auth_key.as_deref(), config.api_url.as_deref()) {
        (Some(id), Some(auth_key), Some(api_url)) => Ok(Store {
            id,
            auth_key,
            api_url,
        }),
        _ => Err(AppError::Internal(anyhow::anyhow!(
            "Telr configuration missing"
        ))),
    }
}

fn create_payload(
    config: &TelrConfig,
    store: &Store<'_>,
    amount: Decimal,
    payload: &TelrPlaceRequest,
) -> Value {
    json!({
        "method": "create",
        "store": store.id,
        "authkey": store.auth_key,
        "order": {
            "cartid": payload.cart_id.to_string(),
            "test": config.mode.test_flag(),
            "amount": amount.round_dp(2).to_string(),
            "currency": config.currency,
            "description": payload.description,
        },
        "customer": {
            "name": payload.name,
            "email": payload.email,
            "phone": payload.phone,
            "address": {
                "line1": payload.address_line1,
                "line2": payload.address_line2,
                "city": payload.city,
                "region": payload.region,
                "country": payload.country,
                "postcode": payload.postcode,
            },
        },
        "return": {
            "authorised": config.success_url.as_deref().unwrap_or_default(),
            "declined": config.failure_url.as_deref().unwrap_or_default(),
            "cancelled": config.cancel_url.as_deref().unwrap_or_default(),
        },
    })
}

fn gateway_error(err: reqwest::Error) -> AppError {
    tracing::warn!(error = %err, "telr request failed");
    AppError::BadGateway("telr request failed".into())
}

/// Open a hosted payment page for one of the caller's carts.
pub async fn create_payment(
    state: &AppState,
    user: &AuthUser,
    payload: TelrPlaceRequest,
) -> AppResult<ApiResponse<TelrPlaceResponse>> {
    ensure_role(user, Role::User)?;
    if payload.name.trim().is_empty()
        || payload.email.trim().is_empty()
        || payload.phone.trim().is_empty()
    {
        return Err(AppError::BadRequest(
            "name, email and phone are required".into(),
        ));
    }

    let config = &state.config.telr;
    let store = store(config)?;

    let cart = Carts::find_by_id(payload.cart_id)
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
    let amount = order_service::cart_totals(&state.orm, cart.id)
        .await?
        .total_amount;

    let body = create_payload(config, &store, amount, &payload);
    let response = state
        .http
        .post(store.api_url)
        .json(&body)
        .send()
        .await
        .map_err(gateway_error)?;
    let status = response.status();
    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        tracing::warn!(%status, body = %text, "telr rejected payment");
        return Err(AppError::BadGateway(format!("telr answered {status}")));
    }

    let created: TelrCreateResponse = response.json().await.map_err(gateway_error)?;
    let order = accepted_order(created)?;

    tracing::info!(
        cart_id = %cart.id,
        order_ref = %order.reference,
        amount = %amount,
        "telr payment created"
    );

    Ok(ApiResponse::success(
        "Payment created",
        TelrPlaceResponse {
            payment_url: order.url,
            order_ref: order.reference,
            amount,
        },
        Some(Meta::empty()),
    ))
}

fn accepted_order(created: TelrCreateResponse) -> AppResult<TelrOrder> {
    if let Some(error) = created.error {
        let message = error
            .message
            .or(error.note)
            .unwrap_or_else(|| "unknown error".to_string());
        return Err(AppError::BadGateway(format!("telr error: {message}")));
    }
    match created.order {
        Some(order) if !order.url.is_empty() => Ok(order),
        _ => Err(AppError::BadGateway("telr returned no payment url".into())),
    }
}

/// Apply a Telr transaction callback. Only authorised transactions place an
/// order; the Telr order reference makes redelivery return the same order.
pub async fn handle_webhook(
    state: &AppState,
    fields: &HashMap<String, String>,
) -> AppResult<WebhookAck> {
    let config = &state.config.telr;
    if config.mode == TelrMode::Live {
        let secret = config
            .webhook_secret
            .as_deref()
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("TELR_WEBHOOK_SECRET is not set")))?;
        if !verify_telr_check(secret, fields) {
            tracing::warn!("telr callback check mismatch");
            return Err(AppError::Forbidden);
        }
    } else {
        tracing::debug!("sandbox mode: telr callback check skipped");
    }

    let field = |name: &str| fields.get(name).map(|v| v.trim()).unwrap_or_default();
    let tran_status = field("tran_status");
    let cart_id = field("tran_cartid");
    let order_ref = field("tran_order");

    if tran_status != AUTHORISED {
        tracing::info!(
            cart_id,
            order_ref,
            tran_status,
            "telr transaction not authorised"
        );
        return Ok(WebhookAck {
            received: true,
            order_ref: None,
        });
    }

    let cart_id = Uuid::parse_str(cart_id)
        .map_err(|_| AppError::BadRequest("tran_cartid is not a cart id".into()))?;
    if order_ref.is_empty() {
        return Err(AppError::BadRequest("tran_order is required".into()));
    }

    let placed = order_service::place_order(
        state,
        PlaceOrder {
            cart: CartRef::Cart(cart_id),
            status: OrderStatus::Confirmed.to_string(),
            payment_status: PaymentStatus::Paid.to_string(),
            payment_method: "card".to_string(),
            order_ref: Some(order_ref.to_string()),
        },
    )
    .await
    .map_err(|err| {
        AppError::Internal(anyhow::anyhow!(
            "telr order {order_ref} for cart {cart_id} could not be placed: {err}"
        ))
    })?;

    Ok(WebhookAck {
        received: true,
        order_ref: Some(placed.order.order_ref),
    })
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    fn config(mode: TelrMode) -> TelrConfig {
        TelrConfig {
            store_id: Some(1234),
            auth_key: Some("key".into()),
            api_url: Some("https://secure.telr.example/gateway/order.json".into()),
            mode,
            currency: "SAR".into(),
            webhook_secret: None,
            success_url: Some("https://shop.example/ok".into()),
            failure_url: None,
            cancel_url: None,
        }
    }

    fn request() -> TelrPlaceRequest {
        serde_json::from_value(json!({
            "cart_id": "6f1c2a44-5e3b-4c55-9a39-0a8c7d9d1e11",
            "name": "Sara",
            "email": "sara@example.com",
            "phone": "0500000000",
        }))
        .expect("request")
    }

    #[test]
    fn payload_flags_sandbox_and_rounds_amount() {
        let config = config(TelrMode::Sandbox);
        let store = store(&config).expect("store");
        let body = create_payload(&config, &store, dec!(70.456), &request());

        assert_eq!(body["method"], "create");
        assert_eq!(body["store"], 1234);
        assert_eq!(body["order"]["test"], 1);
        assert_eq!(body["order"]["amount"], "70.46");
        assert_eq!(
            body["order"]["cartid"],
            "6f1c2a44-5e3b-4c55-9a39-0a8c7d9d1e11"
        );
        assert_eq!(body["order"]["description"], "Storefront order");
        assert_eq!(body["return"]["authorised"], "https://shop.example/ok");
        assert_eq!(body["return"]["declined"], "");
    }

    #[test]
    fn missing_store_settings_are_an_internal_error() {
        let mut config = config(TelrMode::Live);
        config.auth_key = None;
        assert!(matches!(store(&config), Err(AppError::Internal(_))));
    }

    #[test]
    fn gateway_errors_and_blank_urls_are_rejected() {
        let failed: TelrCreateResponse = serde_json::from_value(json!({
            "error": { "message": "Invalid store", "note": "" }
        }))
        .expect("parse");
        assert!(matches!(accepted_order(failed), Err(AppError::BadGateway(_))));

        let blank: TelrCreateResponse = serde_json::from_value(json!({
            "order": { "ref": "R1", "url": "" }
        }))
        .expect("parse");
        assert!(matches!(accepted_order(blank), Err(AppError::BadGateway(_))));

        let ok: TelrCreateResponse = serde_json::from_value(json!({
            "order": { "ref": "R1", "url": "https://pay.example/R1" }
        }))
        .expect("parse");
        let order = accepted_order(ok).expect("order");
        assert_eq!(order.reference, "R1");
    }
}
