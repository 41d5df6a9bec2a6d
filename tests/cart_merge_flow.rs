mod common;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use storefront_api::{
    dto::auth::{AdminLoginRequest, GoogleLoginRequest},
    entity::{Admins, GuestCarts, GuestUsers, admins, guest_carts, guest_users},
    error::AppError,
    identity::{IdentityVerifier, VerifiedIdentity},
    middleware::auth::{Role, decode_session},
    services::{
        auth_service::{self, purge_expired_guests},
        cart_service::{self, CartOwner},
        merge_service::{MergeOutcome, merge_guest_cart},
    },
    state::AppState,
};
use uuid::Uuid;

/// Accepts any token as the given identity.
struct FixedIdentity(VerifiedIdentity);

#[async_trait]
impl IdentityVerifier for FixedIdentity {
    async fn verify(&self, _token: &str) -> Result<VerifiedIdentity, AppError> {
        Ok(self.0.clone())
    }
}

fn identity(subject: &str) -> VerifiedIdentity {
    VerifiedIdentity {
        subject_id: subject.to_string(),
        email: format!("{subject}@example.com"),
        display_name: "Signed In".into(),
        picture: String::new(),
        audience: "local-storefront".into(),
    }
}

fn with_identity(state: &AppState, identity: VerifiedIdentity) -> anyhow::Result<AppState> {
    AppState::with_identity(
        state.orm.clone(),
        (*state.config).clone(),
        Arc::new(FixedIdentity(identity)),
    )
}

async fn new_guest(state: &AppState) -> anyhow::Result<String> {
    let session = auth_service::create_guest_session(state).await?;
    Ok(session.data.expect("guest session").guest_id)
}

async fn expire_guest(state: &AppState, guest_id: &str) -> anyhow::Result<()> {
    let guest = GuestUsers::find_by_id(guest_id)
        .one(&state.orm)
        .await?
        .expect("guest");
    let mut active: guest_users::ActiveModel = guest.into();
    active.expires_at = Set((Utc::now() - Duration::hours(1)).into());
    active.update(&state.orm).await?;
    Ok(())
}

async fn guest_cart_exists(state: &AppState, guest_id: &str) -> anyhow::Result<bool> {
    Ok(GuestCarts::find()
        .filter(guest_carts::Column::GuestId.eq(guest_id))
        .one(&state.orm)
        .await?
        .is_some())
}

#[tokio::test]
async fn merge_adds_quantities_and_runs_once() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };
    let user = common::create_user(&state).await?;
    let user_owner = CartOwner::User(user.user_id.clone());
    let guest_id = new_guest(&state).await?;
    let guest_owner = CartOwner::Guest(guest_id.clone());

    let shared = common::create_product(&state, dec!(10), dec!(1), 50).await?;
    let guest_only = common::create_product(&state, dec!(4), dec!(1), 50).await?;

    common::add_to_cart(&state, &user_owner, shared.id, 3).await?;
    common::add_to_cart(&state, &guest_owner, shared.id, 2).await?;
    common::add_to_cart(&state, &guest_owner, guest_only.id, 1).await?;

    let outcome = merge_guest_cart(&state.orm, &guest_id, &user.user_id).await;
    assert_eq!(outcome, MergeOutcome::MergedSuccess { merged: 2 });

    let items = cart_service::get_cart(&state, &user_owner)
        .await?
        .data
        .expect("cart")
        .items;
    assert_eq!(items.len(), 2);
    let quantity_of = |product_id: Uuid| {
        items
            .iter()
            .find(|i| i.product_id == product_id)
            .map(|i| i.quantity)
    };
    assert_eq!(quantity_of(shared.id), Some(5));
    assert_eq!(quantity_of(guest_only.id), Some(1));

    for _ in 0..2 {
        let repeat = merge_guest_cart(&state.orm, &guest_id, &user.user_id).await;
        assert_eq!(repeat, MergeOutcome::NoGuestCart);
    }

    let guest_cart = cart_service::get_cart(&state, &guest_owner)
        .await?
        .data
        .expect("cart");
    assert!(guest_cart.cart_id.is_none());
    Ok(())
}

#[tokio::test]
async fn empty_guest_cart_is_discarded() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };
    let user = common::create_user(&state).await?;
    let guest_id = new_guest(&state).await?;

    let outcome = merge_guest_cart(&state.orm, &guest_id, &user.user_id).await;
    assert_eq!(outcome, MergeOutcome::GuestCartEmpty);

    let repeat = merge_guest_cart(&state.orm, &guest_id, &user.user_id).await;
    assert_eq!(repeat, MergeOutcome::NoGuestCart);
    Ok(())
}

#[tokio::test]
async fn google_login_merges_the_guest_cart() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };
    let subject = format!("google-{}", Uuid::new_v4().simple());
    let state = with_identity(&state, identity(&subject))?;

    let guest_id = new_guest(&state).await?;
    let product = common::create_product(&state, dec!(7), dec!(1), 9).await?;
    common::add_to_cart(&state, &CartOwner::Guest(guest_id.clone()), product.id, 4).await?;

    let login = auth_service::google_login(
        &state,
        GoogleLoginRequest {
            id_token: "provider-token".into(),
            guest_id: Some(guest_id),
        },
    )
    .await?
    .data
    .expect("login");

    assert_eq!(login.user.id, subject);
    assert_eq!(login.merge, Some(MergeOutcome::MergedSuccess { merged: 1 }));
    let session = decode_session(&login.token, &state.config.jwt_secret)?;
    assert_eq!(session.user_id, subject);
    assert_eq!(session.role, Role::User);

    let items = cart_service::get_cart(&state, &CartOwner::User(subject.clone()))
        .await?
        .data
        .expect("cart")
        .items;
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].quantity, 4);

    // A second login refreshes the profile and reports no guest cart.
    let again = auth_service::google_login(
        &state,
        GoogleLoginRequest {
            id_token: "provider-token".into(),
            guest_id: None,
        },
    )
    .await?
    .data
    .expect("login");
    assert_eq!(again.user.id, subject);
    assert!(again.merge.is_none());
    Ok(())
}

#[tokio::test]
async fn admin_login_requires_approval() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };
    let subject = format!("admin-{}", Uuid::new_v4().simple());
    let identity = identity(&subject);
    let email = identity.email.clone();
    let state = with_identity(&state, identity)?;
    let request = || AdminLoginRequest {
        id_token: "provider-token".into(),
    };

    for _ in 0..2 {
        let refused = auth_service::admin_login(&state, request()).await;
        assert!(matches!(refused, Err(AppError::Forbidden)));
    }

    let pending = Admins::find()
        .filter(admins::Column::Email.eq(email.as_str()))
        .one(&state.orm)
        .await?
        .expect("pending admin recorded");
    assert!(!pending.approved);

    let mut approve: admins::ActiveModel = pending.into();
    approve.approved = Set(true);
    approve.update(&state.orm).await?;

    let login = auth_service::admin_login(&state, request())
        .await?
        .data
        .expect("login");
    assert_eq!(login.admin.email, email);
    let session = decode_session(&login.token, &state.config.jwt_secret)?;
    assert_eq!(session.role, Role::Admin);
    Ok(())
}

#[tokio::test]
async fn expired_guest_cart_is_not_merged() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };
    let user = common::create_user(&state).await?;
    let user_owner = CartOwner::User(user.user_id.clone());
    let guest_id = new_guest(&state).await?;
    let product = common::create_product(&state, dec!(6), dec!(1), 20).await?;
    common::add_to_cart(&state, &CartOwner::Guest(guest_id.clone()), product.id, 3).await?;
    expire_guest(&state, &guest_id).await?;

    let outcome = merge_guest_cart(&state.orm, &guest_id, &user.user_id).await;
    assert_eq!(outcome, MergeOutcome::NoGuestCart);
    assert!(!guest_cart_exists(&state, &guest_id).await?);

    let items = cart_service::get_cart(&state, &user_owner)
        .await?
        .data
        .expect("cart")
        .items;
    assert!(items.is_empty());
    Ok(())
}

#[tokio::test]
async fn purge_removes_only_expired_guests() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };
    let stale = new_guest(&state).await?;
    let fresh = new_guest(&state).await?;
    let product = common::create_product(&state, dec!(6), dec!(1), 20).await?;
    common::add_to_cart(&state, &CartOwner::Guest(stale.clone()), product.id, 1).await?;
    expire_guest(&state, &stale).await?;

    let purged = purge_expired_guests(&state.orm, Utc::now()).await?;
    assert!(purged >= 1);

    assert!(GuestUsers::find_by_id(stale.as_str()).one(&state.orm).await?.is_none());
    assert!(!guest_cart_exists(&state, &stale).await?);
    assert!(GuestUsers::find_by_id(fresh.as_str()).one(&state.orm).await?.is_some());
    assert!(guest_cart_exists(&state, &fresh).await?);
    Ok(())
}
