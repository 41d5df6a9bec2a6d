#![allow(dead_code)]

use rust_decimal::Decimal;
use sea_orm::ActiveModelTrait;
use sea_orm::ActiveValue::NotSet;
use sea_orm::Set;
use storefront_api::{
    config::AppConfig,
    db::connect_and_migrate,
    dto::cart::AddToCartRequest,
    entity::{products, users},
    middleware::auth::{AuthUser, Role},
    services::cart_service::{self, CartOwner},
    state::AppState,
};
use uuid::Uuid;

/// Connect to the test database, or `None` when none is configured.
///
/// Tests share one database and run in parallel, so every fixture is keyed by
/// fresh ids instead of truncating tables.
pub async fn setup_state() -> anyhow::Result<Option<AppState>> {
    setup_state_with(|_| {}).await
}

pub async fn setup_state_with(
    configure: impl FnOnce(&mut AppConfig),
) -> anyhow::Result<Option<AppState>> {
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration tests."
            );
            return Ok(None);
        }
    };

    let orm = connect_and_migrate(&database_url).await?;
    let mut config = AppConfig::local(database_url);
    configure(&mut config);
    Ok(Some(AppState::new(orm, config)?))
}

pub async fn create_user(state: &AppState) -> anyhow::Result<AuthUser> {
    let id = format!("test-user-{}", Uuid::new_v4().simple());
    users::ActiveModel {
        id: Set(id.clone()),
        email: Set(format!("{id}@example.com")),
        name: Set("Test Shopper".into()),
        picture: Set(String::new()),
        provider: Set("google".into()),
        ..Default::default()
    }
    .insert(&state.orm)
    .await?;

    Ok(AuthUser {
        user_id: id,
        role: Role::User,
    })
}

pub fn admin() -> AuthUser {
    AuthUser {
        user_id: Uuid::new_v4().to_string(),
        role: Role::Admin,
    }
}

pub async fn create_product(
    state: &AppState,
    sale_price: Decimal,
    weight: Decimal,
    stock: i32,
) -> anyhow::Result<products::Model> {
    let product = products::ActiveModel {
        id: Set(Uuid::new_v4()),
        ename: Set(format!("Test product {}", Uuid::new_v4().simple())),
        arname: Set("منتج".into()),
        edescription: Set(String::new()),
        ardescription: Set(String::new()),
        sale_price: Set(sale_price),
        regular_price: Set(sale_price),
        base_cost: Set(Decimal::ZERO),
        image: Set(String::new()),
        weight: Set(weight),
        stock: Set(stock),
        created_at: NotSet,
        updated_at: NotSet,
        deleted_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(product)
}

pub async fn add_to_cart(
    state: &AppState,
    owner: &CartOwner,
    product_id: Uuid,
    quantity: i32,
) -> anyhow::Result<()> {
    cart_service::add_item(
        state,
        owner,
        AddToCartRequest {
            product_id,
            quantity,
        },
    )
    .await?;
    Ok(())
}
