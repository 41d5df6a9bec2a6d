mod common;

use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, Set};
use storefront_api::{
    dto::users::UpdateProfileRequest,
    entity::admins,
    error::AppError,
    models::Address,
    routes::params::{AdminListQuery, OrderListQuery, UserListQuery},
    services::{
        admin_service,
        cart_service::CartOwner,
        order_service::{self, CartRef, PlaceOrder},
        user_service,
    },
    state::AppState,
};
use uuid::Uuid;

async fn order_for(state: &AppState, user_id: &str) -> anyhow::Result<Uuid> {
    let product = common::create_product(state, dec!(12), dec!(1), 10).await?;
    common::add_to_cart(state, &CartOwner::User(user_id.to_string()), product.id, 1).await?;
    let placed = order_service::place_order(
        state,
        PlaceOrder {
            cart: CartRef::User(user_id.to_string()),
            status: "pending".into(),
            payment_status: "pending".into(),
            payment_method: "cod".into(),
            order_ref: None,
        },
    )
    .await?;
    Ok(placed.order.id)
}

#[tokio::test]
async fn profile_update_keeps_omitted_fields() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };
    let user = common::create_user(&state).await?;
    let address = Address {
        street: "12 Corniche Rd".into(),
        city: "Abu Dhabi".into(),
        state: "Abu Dhabi".into(),
        postal_code: "00000".into(),
        country: "AE".into(),
    };

    let updated = user_service::update_profile(
        &state,
        &user,
        UpdateProfileRequest {
            phone: Some("  +971500000000 ".into()),
            address: Some(address.clone()),
            ..Default::default()
        },
    )
    .await?
    .data
    .expect("user");
    assert_eq!(updated.phone, "+971500000000");
    assert_eq!(updated.name, "Test Shopper");
    assert_eq!(updated.address, address);

    let order_id = order_for(&state, &user.user_id).await?;
    let profile = user_service::get_profile(&state, &user)
        .await?
        .data
        .expect("profile");
    assert_eq!(profile.user.address, address);
    assert_eq!(profile.orders.len(), 1);
    assert_eq!(profile.orders[0].id, order_id);
    assert!(profile.cart.items.is_empty());

    let as_admin = user_service::get_profile(&state, &common::admin()).await;
    assert!(matches!(as_admin, Err(AppError::Forbidden)));
    Ok(())
}

#[tokio::test]
async fn admins_list_users_and_admins() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };
    let admin = common::admin();
    let user = common::create_user(&state).await?;

    let found = user_service::list_users(
        &state,
        &admin,
        UserListQuery {
            q: Some(user.user_id.clone()),
            ..Default::default()
        },
    )
    .await?
    .data
    .expect("users")
    .items;
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, user.user_id);

    let refused = user_service::list_users(&state, &user, UserListQuery::default()).await;
    assert!(matches!(refused, Err(AppError::Forbidden)));

    let pending = admins::ActiveModel {
        id: Set(Uuid::new_v4()),
        email: Set(format!("pending-{}@example.com", Uuid::new_v4().simple())),
        name: Set("Pending Admin".into()),
        picture: Set(String::new()),
        approved: Set(false),
        ..Default::default()
    }
    .insert(&state.orm)
    .await?;

    let listed = |approved| AdminListQuery {
        per_page: Some(100),
        approved: Some(approved),
        ..Default::default()
    };
    let unapproved = user_service::list_admins(&state, &admin, listed(false))
        .await?
        .data
        .expect("admins")
        .items;
    assert!(unapproved.iter().any(|a| a.id == pending.id));
    assert!(unapproved.iter().all(|a| !a.approved));

    let approved = user_service::list_admins(&state, &admin, listed(true))
        .await?
        .data
        .expect("admins")
        .items;
    assert!(approved.iter().all(|a| a.id != pending.id));
    Ok(())
}

#[tokio::test]
async fn order_listing_by_user_is_admin_only() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };
    let alice = common::create_user(&state).await?;
    let bob = common::create_user(&state).await?;
    let alice_order = order_for(&state, &alice.user_id).await?;
    let bob_order = order_for(&state, &bob.user_id).await?;

    let for_alice = admin_service::list_all_orders(
        &state,
        &common::admin(),
        OrderListQuery {
            user_id: Some(alice.user_id.clone()),
            ..Default::default()
        },
    )
    .await?
    .data
    .expect("orders")
    .items;
    assert_eq!(for_alice.len(), 1);
    assert_eq!(for_alice[0].id, alice_order);

    // A shopper asking for someone else's orders still sees only their own.
    let bobs_view = order_service::list_orders(
        &state,
        &bob,
        OrderListQuery {
            user_id: Some(alice.user_id.clone()),
            ..Default::default()
        },
    )
    .await?
    .data
    .expect("orders")
    .items;
    assert_eq!(bobs_view.len(), 1);
    assert_eq!(bobs_view[0].id, bob_order);
    Ok(())
}
