mod common;

use axum::{
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use rust_decimal_macros::dec;
use serde_json::Value;
use storefront_api::app::build_app;
use tower::ServiceExt;

async fn json_body(response: axum::response::Response) -> anyhow::Result<Value> {
    let bytes = to_bytes(response.into_body(), 64 * 1024).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[tokio::test]
async fn unknown_paths_use_the_envelope() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };
    let response = build_app(state)
        .oneshot(Request::get("/nowhere").body(Body::empty())?)
        .await?;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(response.headers().contains_key("x-request-id"));
    let body = json_body(response).await?;
    assert_eq!(body["message"], "Not Found");
    assert_eq!(body["data"]["path"], "/nowhere");
    Ok(())
}

#[tokio::test]
async fn cart_requires_a_session() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };
    let response = build_app(state)
        .oneshot(Request::get("/api/cart").body(Body::empty())?)
        .await?;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = json_body(response).await?;
    assert_eq!(body["data"]["reason"], "unauthorized");
    Ok(())
}

#[tokio::test]
async fn guest_session_can_fill_its_cart() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };
    let product = common::create_product(&state, dec!(9), dec!(1), 5).await?;
    let app = build_app(state);

    let session = app
        .clone()
        .oneshot(Request::post("/api/auth/guest").body(Body::empty())?)
        .await?;
    assert_eq!(session.status(), StatusCode::CREATED);
    let token = json_body(session).await?["data"]["token"]
        .as_str()
        .map(str::to_owned)
        .ok_or_else(|| anyhow::anyhow!("guest token missing"))?;

    let add = app
        .clone()
        .oneshot(
            Request::post("/api/guest/cart")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    serde_json::json!({ "product_id": product.id, "quantity": 2 }).to_string(),
                ))?,
        )
        .await?;
    assert!(add.status().is_success(), "add to guest cart: {}", add.status());

    let list = app
        .oneshot(
            Request::get("/api/guest/cart")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())?,
        )
        .await?;
    assert_eq!(list.status(), StatusCode::OK);
    let body = json_body(list).await?;
    assert_eq!(body["data"]["items"][0]["quantity"], 2);
    Ok(())
}

#[tokio::test]
async fn unsigned_tap_webhook_is_refused() -> anyhow::Result<()> {
    let Some(state) = common::setup_state_with(|config| {
        config.tap.webhook_secret = Some("whsec".into());
    })
    .await?
    else {
        return Ok(());
    };
    let response = build_app(state)
        .oneshot(
            Request::post("/api/payments/tap/webhook")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"type":"charge.succeeded","data":{"id":"chg_x"}}"#))?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    Ok(())
}
