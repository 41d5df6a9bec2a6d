mod common;

use rust_decimal_macros::dec;
use storefront_api::{
    dto::cart::AddToCartRequest,
    error::AppError,
    services::{
        auth_service,
        cart_service::{self, CartOwner},
    },
    state::AppState,
};
use uuid::Uuid;

async fn add_concurrently(
    state: &AppState,
    owner: &CartOwner,
    product_id: Uuid,
) -> anyhow::Result<Vec<Result<i32, AppError>>> {
    let handles: Vec<_> = (1..=6)
        .map(|quantity| {
            let state = state.clone();
            let owner = owner.clone();
            tokio::spawn(async move {
                cart_service::add_item(
                    &state,
                    &owner,
                    AddToCartRequest {
                        product_id,
                        quantity,
                    },
                )
                .await
                .map(|_| quantity)
            })
        })
        .collect();

    let mut results = Vec::new();
    for handle in handles {
        results.push(handle.await?);
    }
    Ok(results)
}

// Racing adds of one product settle on a single line holding one of the
// requested quantities.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_adds_keep_one_line() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };
    let user = common::create_user(&state).await?;
    let owner = CartOwner::User(user.user_id.clone());
    let product = common::create_product(&state, dec!(3), dec!(1), 50).await?;

    for result in add_concurrently(&state, &owner, product.id).await? {
        assert!(result.is_ok(), "add failed: {result:?}");
    }

    let items = cart_service::get_cart(&state, &owner)
        .await?
        .data
        .expect("cart")
        .items;
    assert_eq!(items.len(), 1);
    assert!((1..=6).contains(&items[0].quantity));
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_guest_adds_keep_one_line() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };
    let guest_id = auth_service::create_guest_session(&state)
        .await?
        .data
        .expect("guest")
        .guest_id;
    let owner = CartOwner::Guest(guest_id);
    let product = common::create_product(&state, dec!(3), dec!(1), 50).await?;

    for result in add_concurrently(&state, &owner, product.id).await? {
        assert!(result.is_ok(), "add failed: {result:?}");
    }

    let items = cart_service::get_cart(&state, &owner)
        .await?
        .data
        .expect("cart")
        .items;
    assert_eq!(items.len(), 1);
    Ok(())
}

#[tokio::test]
async fn adding_again_sets_the_quantity() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };
    let user = common::create_user(&state).await?;
    let owner = CartOwner::User(user.user_id.clone());
    let product = common::create_product(&state, dec!(3), dec!(1), 50).await?;

    common::add_to_cart(&state, &owner, product.id, 4).await?;
    common::add_to_cart(&state, &owner, product.id, 1).await?;

    let items = cart_service::get_cart(&state, &owner)
        .await?
        .data
        .expect("cart")
        .items;
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].quantity, 1);

    let missing = cart_service::remove_item(&state, &owner, Uuid::new_v4()).await;
    assert!(matches!(missing, Err(AppError::NotFound)));

    let zero = cart_service::add_item(
        &state,
        &owner,
        AddToCartRequest {
            product_id: product.id,
            quantity: 0,
        },
    )
    .await;
    assert!(matches!(zero, Err(AppError::BadRequest(_))));
    Ok(())
}
