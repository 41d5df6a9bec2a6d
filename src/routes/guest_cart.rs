use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{delete, get},
};
use uuid::Uuid;

use crate::{
    dto::cart::{AddToCartRequest, CartList},
    error::AppResult,
    middleware::auth::{AuthUser, Role},
    models::CartItem,
    response::ApiResponse,
    routes::cart::owner,
    services::cart_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(guest_cart_list).post(guest_add_to_cart).delete(guest_clear_cart))
        .route("/{product_id}", delete(guest_remove_from_cart))
}

#[utoipa::path(
    get,
    path = "/api/guest/cart",
    responses(
        (status = 200, description = "Guest cart items", body = ApiResponse<CartList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Guest Cart"
)]
pub async fn guest_cart_list(
    State(state): State<AppState>,
    guest: AuthUser,
) -> AppResult<Json<ApiResponse<CartList>>> {
    let owner = owner(&guest, Role::Guest)?;
    Ok(Json(cart_service::get_cart(&state, &owner).await?))
}

#[utoipa::path(
    post,
    path = "/api/guest/cart",
    request_body = AddToCartRequest,
    responses(
        (status = 200, description = "Add or update guest cart item", body = ApiResponse<CartItem>),
        (status = 400, description = "Bad request"),
    ),
    security(("bearer_auth" = [])),
    tag = "Guest Cart"
)]
pub async fn guest_add_to_cart(
    State(state): State<AppState>,
    guest: AuthUser,
    Json(payload): Json<AddToCartRequest>,
) -> AppResult<Json<ApiResponse<CartItem>>> {
    let owner = owner(&guest, Role::Guest)?;
    Ok(Json(cart_service::add_item(&state, &owner, payload).await?))
}

#[utoipa::path(
    delete,
    path = "/api/guest/cart/{product_id}",
    params(
        ("product_id" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "OK", body = ApiResponse<serde_json::Value>),
        (status = 404, description = "Cart item not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Guest Cart"
)]
pub async fn guest_remove_from_cart(
    State(state): State<AppState>,
    guest: AuthUser,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let owner = owner(&guest, Role::Guest)?;
    Ok(Json(
        cart_service::remove_item(&state, &owner, product_id).await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/api/guest/cart",
    responses(
        (status = 200, description = "Guest cart emptied", body = ApiResponse<serde_json::Value>),
    ),
    security(("bearer_auth" = [])),
    tag = "Guest Cart"
)]
pub async fn guest_clear_cart(
    State(state): State<AppState>,
    guest: AuthUser,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let owner = owner(&guest, Role::Guest)?;
    Ok(Json(cart_service::clear_cart(&state, &owner).await?))
}
