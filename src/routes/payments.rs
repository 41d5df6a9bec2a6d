use std::collections::HashMap;

use axum::{
    Form, Json, Router,
    body::Bytes,
    extract::State,
    http::HeaderMap,
    routing::post,
};

use crate::{
    dto::payments::{
        TapInitRequest, TapInitResponse, TapStatusRequest, TapStatusResponse, TelrPlaceRequest,
        TelrPlaceResponse, WebhookAck,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    services::{tap_service, telr_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/tap/init", post(tap_init))
        .route("/tap/status", post(tap_status))
        .route("/tap/webhook", post(tap_webhook))
        .route("/telr/place", post(telr_place))
        .route("/telr/webhook", post(telr_webhook))
}

#[utoipa::path(
    post,
    path = "/api/payments/tap/init",
    request_body = TapInitRequest,
    responses(
        (status = 200, description = "Charge created; redirect the shopper", body = ApiResponse<TapInitResponse>),
        (status = 400, description = "Cart is empty"),
        (status = 502, description = "Gateway error"),
    ),
    security(("bearer_auth" = [])),
    tag = "Payments"
)]
pub async fn tap_init(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<TapInitRequest>,
) -> AppResult<Json<ApiResponse<TapInitResponse>>> {
    Ok(Json(tap_service::init_charge(&state, &user, payload).await?))
}

#[utoipa::path(
    post,
    path = "/api/payments/tap/status",
    request_body = TapStatusRequest,
    responses(
        (status = 200, description = "Charge status", body = ApiResponse<TapStatusResponse>),
        (status = 502, description = "Gateway error"),
    ),
    tag = "Payments"
)]
pub async fn tap_status(
    State(state): State<AppState>,
    Json(payload): Json<TapStatusRequest>,
) -> AppResult<Json<ApiResponse<TapStatusResponse>>> {
    Ok(Json(tap_service::charge_status(&state, payload).await?))
}

#[utoipa::path(
    post,
    path = "/api/payments/tap/webhook",
    request_body(content = String, description = "Raw Tap event signed with X-Tap-Signature"),
    responses(
        (status = 200, description = "Event accepted", body = WebhookAck),
        (status = 401, description = "Invalid signature"),
        (status = 500, description = "Order could not be placed; Tap retries"),
    ),
    tag = "Payments"
)]
pub async fn tap_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Json<WebhookAck>> {
    Ok(Json(tap_service::handle_webhook(&state, &headers, &body).await?))
}

#[utoipa::path(
    post,
    path = "/api/payments/telr/place",
    request_body = TelrPlaceRequest,
    responses(
        (status = 200, description = "Hosted payment page created", body = ApiResponse<TelrPlaceResponse>),
        (status = 404, description = "Cart not found"),
        (status = 502, description = "Gateway error"),
    ),
    security(("bearer_auth" = [])),
    tag = "Payments"
)]
pub async fn telr_place(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<TelrPlaceRequest>,
) -> AppResult<Json<ApiResponse<TelrPlaceResponse>>> {
    Ok(Json(
        telr_service::create_payment(&state, &user, payload).await?,
    ))
}

#[utoipa::path(
    post,
    path = "/api/payments/telr/webhook",
    request_body(content = String, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Callback accepted", body = WebhookAck),
        (status = 403, description = "tran_check mismatch"),
        (status = 500, description = "Order could not be placed; Telr retries"),
    ),
    tag = "Payments"
)]
pub async fn telr_webhook(
    State(state): State<AppState>,
    Form(fields): Form<HashMap<String, String>>,
) -> AppResult<Json<WebhookAck>> {
    Ok(Json(telr_service::handle_webhook(&state, &fields).await?))
}
