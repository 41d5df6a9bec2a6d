use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch},
};
use uuid::Uuid;

use crate::{
    dto::{
        cart::CartList,
        catalog::{LowStockList, StockUpdateRequest},
        orders::{
            AdminPlaceOrderRequest, OrderList, OrderWithItems, UpdateOrderStatusRequest,
            UpdatePaymentStatusRequest,
        },
        users::{AdminList, UserList},
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::{Order, Product},
    response::ApiResponse,
    routes::params::{AdminListQuery, LowStockQuery, OrderListQuery, UserListQuery},
    services::{admin_service, cart_service, user_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/orders", get(list_all_orders).post(place_order_for_user))
        .route("/orders/ref/{order_ref}", get(get_order_by_ref))
        .route("/orders/user/{user_id}", get(list_user_orders))
        .route("/orders/{id}", get(get_order_admin).delete(delete_order))
        .route("/orders/{id}/status", patch(update_order_status))
        .route("/orders/{id}/payment-status", patch(update_payment_status))
        .route("/inventory/low-stock", get(list_low_stock))
        .route("/inventory/{id}", patch(set_stock))
        .route("/users", get(list_users))
        .route("/users/{user_id}/cart", get(user_cart))
        .route("/admins", get(list_admins))
}

#[utoipa::path(
    get,
    path = "/api/admin/orders",
    params(OrderListQuery),
    responses(
        (status = 200, description = "List all orders (admin)", body = ApiResponse<OrderList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_all_orders(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<OrderListQuery>,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    Ok(Json(admin_service::list_all_orders(&state, &user, query).await?))
}

#[utoipa::path(
    get,
    path = "/api/admin/orders/user/{user_id}",
    params(("user_id" = String, Path, description = "User ID"), OrderListQuery),
    responses(
        (status = 200, description = "One user's orders", body = ApiResponse<OrderList>),
        (status = 400, description = "Unknown status filter"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_user_orders(
    State(state): State<AppState>,
    user: AuthUser,
    Path(user_id): Path<String>,
    Query(mut query): Query<OrderListQuery>,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    query.user_id = Some(user_id);
    Ok(Json(admin_service::list_all_orders(&state, &user, query).await?))
}

#[utoipa::path(
    post,
    path = "/api/admin/orders",
    request_body = AdminPlaceOrderRequest,
    responses(
        (status = 201, description = "Order placed from a user's cart", body = ApiResponse<OrderWithItems>),
        (status = 400, description = "Empty cart or unknown status"),
        (status = 404, description = "Cart or product not found"),
        (status = 409, description = "Insufficient stock"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn place_order_for_user(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<AdminPlaceOrderRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<OrderWithItems>>)> {
    let resp = admin_service::place_order_for_user(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    get,
    path = "/api/admin/orders/{id}",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order detail (admin)", body = ApiResponse<OrderWithItems>),
        (status = 404, description = "Order not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn get_order_admin(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<OrderWithItems>>> {
    Ok(Json(admin_service::get_order_admin(&state, &user, id).await?))
}

#[utoipa::path(
    get,
    path = "/api/admin/orders/ref/{order_ref}",
    params(("order_ref" = String, Path, description = "Order reference")),
    responses(
        (status = 200, description = "Order detail by reference", body = ApiResponse<OrderWithItems>),
        (status = 404, description = "Order not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn get_order_by_ref(
    State(state): State<AppState>,
    user: AuthUser,
    Path(order_ref): Path<String>,
) -> AppResult<Json<ApiResponse<OrderWithItems>>> {
    Ok(Json(
        admin_service::get_order_by_ref(&state, &user, &order_ref).await?,
    ))
}

#[utoipa::path(
    patch,
    path = "/api/admin/orders/{id}/status",
    params(("id" = Uuid, Path, description = "Order ID")),
    request_body = UpdateOrderStatusRequest,
    responses(
        (status = 200, description = "Order status updated", body = ApiResponse<Order>),
        (status = 400, description = "Unknown status"),
        (status = 404, description = "Order not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn update_order_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateOrderStatusRequest>,
) -> AppResult<Json<ApiResponse<Order>>> {
    Ok(Json(
        admin_service::update_order_status(&state, &user, id, payload).await?,
    ))
}

#[utoipa::path(
    patch,
    path = "/api/admin/orders/{id}/payment-status",
    params(("id" = Uuid, Path, description = "Order ID")),
    request_body = UpdatePaymentStatusRequest,
    responses(
        (status = 200, description = "Payment status updated", body = ApiResponse<Order>),
        (status = 400, description = "Unknown payment status"),
        (status = 404, description = "Order not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn update_payment_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePaymentStatusRequest>,
) -> AppResult<Json<ApiResponse<Order>>> {
    Ok(Json(
        admin_service::update_payment_status(&state, &user, id, payload).await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/api/admin/orders/{id}",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order deleted", body = ApiResponse<serde_json::Value>),
        (status = 404, description = "Order not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn delete_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    Ok(Json(admin_service::delete_order(&state, &user, id).await?))
}

#[utoipa::path(
    get,
    path = "/api/admin/inventory/low-stock",
    params(LowStockQuery),
    responses(
        (status = 200, description = "Products at or below the threshold", body = ApiResponse<LowStockList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_low_stock(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<LowStockQuery>,
) -> AppResult<Json<ApiResponse<LowStockList>>> {
    Ok(Json(admin_service::list_low_stock(&state, &user, query).await?))
}

#[utoipa::path(
    patch,
    path = "/api/admin/inventory/{id}",
    params(("id" = Uuid, Path, description = "Product ID")),
    request_body = StockUpdateRequest,
    responses(
        (status = 200, description = "Stock overwritten", body = ApiResponse<Product>),
        (status = 400, description = "Negative stock"),
        (status = 404, description = "Product not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn set_stock(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<StockUpdateRequest>,
) -> AppResult<Json<ApiResponse<Product>>> {
    Ok(Json(admin_service::set_stock(&state, &user, id, payload).await?))
}

#[utoipa::path(
    get,
    path = "/api/admin/users/{user_id}/cart",
    params(("user_id" = String, Path, description = "User ID")),
    responses(
        (status = 200, description = "A user's cart", body = ApiResponse<CartList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn user_cart(
    State(state): State<AppState>,
    user: AuthUser,
    Path(user_id): Path<String>,
) -> AppResult<Json<ApiResponse<CartList>>> {
    Ok(Json(
        cart_service::get_user_cart_admin(&state, &user, &user_id).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/admin/users",
    params(UserListQuery),
    responses(
        (status = 200, description = "Registered users, newest first", body = ApiResponse<UserList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_users(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<UserListQuery>,
) -> AppResult<Json<ApiResponse<UserList>>> {
    Ok(Json(user_service::list_users(&state, &user, query).await?))
}

#[utoipa::path(
    get,
    path = "/api/admin/admins",
    params(AdminListQuery),
    responses(
        (status = 200, description = "Admin accounts, newest first", body = ApiResponse<AdminList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_admins(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<AdminListQuery>,
) -> AppResult<Json<ApiResponse<AdminList>>> {
    Ok(Json(user_service::list_admins(&state, &user, query).await?))
}
