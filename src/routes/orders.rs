use std::{sync::Arc, time::Duration};

use axum::{
    Json, Router,
    extract::{
        Path, Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::{HeaderMap, StatusCode, header},
    response::Response,
    routing::get,
};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::{
    dto::orders::{OrderList, OrderWithItems, PlaceOrderRequest},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, Role, decode_session, ensure_admin, ensure_role},
    notify::OrderHub,
    response::ApiResponse,
    routes::params::OrderListQuery,
    services::order_service,
    state::AppState,
};

const PING_EVERY: Duration = Duration::from_secs(30);

pub fn route() -> Router<AppState> {
    Router::new()
        .route("/", get(list_order).post(place_order))
        .route("/ws", get(order_feed))
        .route("/{id}", get(get_order))
}

#[utoipa::path(
    get,
    path = "/api/orders",
    params(OrderListQuery),
    responses(
        (status = 200, description = "The caller's orders", body = ApiResponse<OrderList>),
        (status = 400, description = "Unknown status filter"),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn list_order(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<OrderListQuery>,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    ensure_role(&user, Role::User)?;
    Ok(Json(order_service::list_orders(&state, &user, query).await?))
}

#[utoipa::path(
    post,
    path = "/api/orders",
    request_body = PlaceOrderRequest,
    responses(
        (status = 201, description = "Order placed from the caller's cart", body = ApiResponse<OrderWithItems>),
        (status = 400, description = "Cart is empty"),
        (status = 404, description = "Cart or product not found"),
        (status = 409, description = "Insufficient stock"),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn place_order(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<PlaceOrderRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<OrderWithItems>>)> {
    ensure_role(&user, Role::User)?;
    let resp = order_service::place_own_order(&state, &user, payload.payment_method).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    get,
    path = "/api/orders/{id}",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order with items", body = ApiResponse<OrderWithItems>),
        (status = 404, description = "Order not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<OrderWithItems>>> {
    ensure_role(&user, Role::User)?;
    Ok(Json(order_service::get_order(&state, &user, id).await?))
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct FeedAuth {
    /// Session token for clients that cannot set headers on the upgrade.
    pub token: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/orders/ws",
    params(FeedAuth),
    responses(
        (status = 101, description = "Switching to a WebSocket stream of order_created events"),
        (status = 401, description = "Missing or invalid session"),
        (status = 403, description = "Admins only"),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn order_feed(
    State(state): State<AppState>,
    Query(auth): Query<FeedAuth>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> AppResult<Response> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .map(str::to_owned)
        .or(auth.token)
        .ok_or_else(|| AppError::Unauthorized("Missing session token".into()))?;
    let user = decode_session(&token, &state.config.jwt_secret)?;
    ensure_admin(&user)?;

    let hub = state.hub.clone();
    Ok(ws.on_upgrade(move |socket| forward_events(socket, hub, user.user_id)))
}

async fn forward_events(mut socket: WebSocket, hub: Arc<OrderHub>, admin_id: String) {
    let mut subscription = hub.subscribe();
    let mut ping = tokio::time::interval(PING_EVERY);
    tracing::info!(subscriber = subscription.id, admin_id = %admin_id, "order feed opened");

    loop {
        tokio::select! {
            event = subscription.rx.recv() => {
                // None: the hub dropped this subscriber as too slow.
                let Some(payload) = event else { break };
                if socket.send(Message::Text(payload.as_ref().into())).await.is_err() {
                    break;
                }
            }
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    Some(Ok(_)) => {}
                }
            }
            _ = ping.tick() => {
                if socket.send(Message::Ping(Default::default())).await.is_err() {
                    break;
                }
            }
        }
    }

    hub.unsubscribe(subscription.id);
    tracing::info!(subscriber = subscription.id, admin_id = %admin_id, "order feed closed");
}
