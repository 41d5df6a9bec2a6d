use axum::Router;

use crate::state::AppState;

pub mod admin;
pub mod auth;
pub mod cart;
pub mod categories;
pub mod doc;
pub mod guest_cart;
pub mod health;
pub mod orders;
pub mod params;
pub mod payments;
pub mod products;
pub mod user;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/products", products::router())
        .nest("/categories", categories::router())
        .nest("/cart", cart::router())
        .nest("/guest/cart", guest_cart::router())
        .nest("/user", user::router())
        .nest("/orders", orders::route())
        .nest("/admin", admin::router())
        .nest("/payments", payments::router())
}
