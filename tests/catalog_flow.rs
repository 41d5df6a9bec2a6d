mod common;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use storefront_api::{
    dto::catalog::{CreateCategoryRequest, CreateProductRequest},
    entity::{ProductCategories, product_categories},
    error::{AppError, OrderError},
    models::{Category, ProductWithCategories},
    routes::params::{ProductQuery, ProductSortBy, SortOrder},
    services::{
        cart_service::{self, CartOwner},
        category_service,
        order_service::{self, CartRef, PlaceOrder},
        product_service,
    },
    state::AppState,
};
use uuid::Uuid;

async fn category(state: &AppState, name: &str) -> anyhow::Result<Category> {
    Ok(category_service::create_category(
        state,
        &common::admin(),
        CreateCategoryRequest {
            ename: name.to_string(),
            arname: String::new(),
            image: None,
        },
    )
    .await?
    .data
    .expect("category"))
}

async fn product(
    state: &AppState,
    ename: String,
    arname: String,
    sale_price: Decimal,
    category_ids: Vec<Uuid>,
) -> anyhow::Result<ProductWithCategories> {
    Ok(product_service::create_product(
        state,
        &common::admin(),
        CreateProductRequest {
            ename,
            arname,
            edescription: String::new(),
            ardescription: String::new(),
            sale_price,
            regular_price: sale_price,
            base_cost: Decimal::ZERO,
            image: String::new(),
            weight: dec!(1),
            stock: 10,
            category_ids,
        },
    )
    .await?
    .data
    .expect("product"))
}

async fn search(state: &AppState, query: ProductQuery) -> anyhow::Result<Vec<ProductWithCategories>> {
    Ok(product_service::list_products(state, query)
        .await?
        .data
        .expect("products")
        .items)
}

#[tokio::test]
async fn search_spans_both_languages_and_filters_compose() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };
    let tag = Uuid::new_v4().simple().to_string();
    let cookware = category(&state, &format!("Cookware {tag}")).await?;

    let pan = product(&state, format!("Pan {tag}"), "مقلاة".into(), dec!(10), vec![cookware.id]).await?;
    let pot = product(&state, "Pot".into(), format!("قدر {tag}"), dec!(40), vec![cookware.id]).await?;
    let lid = product(&state, format!("Lid {tag}"), "غطاء".into(), dec!(25), vec![]).await?;
    assert_eq!(pan.categories.len(), 1);

    let everything = search(
        &state,
        ProductQuery {
            q: Some(tag.clone()),
            sort_by: Some(ProductSortBy::SalePrice),
            sort_order: Some(SortOrder::Asc),
            ..Default::default()
        },
    )
    .await?;
    let ids: Vec<Uuid> = everything.iter().map(|p| p.product.id).collect();
    assert_eq!(ids, vec![pan.product.id, lid.product.id, pot.product.id]);

    let in_category = search(
        &state,
        ProductQuery {
            q: Some(tag.clone()),
            category_id: Some(cookware.id),
            ..Default::default()
        },
    )
    .await?;
    assert_eq!(in_category.len(), 2);
    assert!(in_category.iter().all(|p| p.product.id != lid.product.id));

    let mid_priced = search(
        &state,
        ProductQuery {
            q: Some(tag.clone()),
            min_price: Some(dec!(20)),
            max_price: Some(dec!(30)),
            ..Default::default()
        },
    )
    .await?;
    assert_eq!(mid_priced.len(), 1);
    assert_eq!(mid_priced[0].product.id, lid.product.id);

    // `%` and `_` in the search text are literal characters.
    let literal = search(
        &state,
        ProductQuery {
            q: Some(format!("%{tag}")),
            ..Default::default()
        },
    )
    .await?;
    assert!(literal.is_empty());
    Ok(())
}

#[tokio::test]
async fn duplicate_category_name_conflicts() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };
    let name = format!("Spices {}", Uuid::new_v4().simple());
    category(&state, &name).await?;

    let again = category_service::create_category(
        &state,
        &common::admin(),
        CreateCategoryRequest {
            ename: name,
            arname: String::new(),
            image: None,
        },
    )
    .await;
    assert!(matches!(again, Err(AppError::Conflict(_))));
    Ok(())
}

#[tokio::test]
async fn deleting_a_category_unlinks_its_products() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };
    let tag = Uuid::new_v4().simple().to_string();
    let spices = category(&state, &format!("Spices {tag}")).await?;
    let saffron = product(&state, format!("Saffron {tag}"), "زعفران".into(), dec!(55), vec![spices.id]).await?;

    category_service::delete_category(&state, &common::admin(), spices.id).await?;

    let links = ProductCategories::find()
        .filter(product_categories::Column::CategoryId.eq(spices.id))
        .count(&state.orm)
        .await?;
    assert_eq!(links, 0);

    let reloaded = product_service::get_product(&state, saffron.product.id)
        .await?
        .data
        .expect("product");
    assert!(reloaded.categories.is_empty());

    let gone = category_service::get_category(&state, spices.id).await;
    assert!(matches!(gone, Err(AppError::NotFound)));
    Ok(())
}

#[tokio::test]
async fn soft_deleted_products_disappear_from_reads_carts_and_orders() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };
    let admin = common::admin();
    let user = common::create_user(&state).await?;
    let owner = CartOwner::User(user.user_id.clone());
    let retired = common::create_product(&state, dec!(8), dec!(1), 10).await?;
    common::add_to_cart(&state, &owner, retired.id, 2).await?;

    product_service::delete_product(&state, &admin, retired.id).await?;

    let direct = product_service::get_product(&state, retired.id).await;
    assert!(matches!(direct, Err(AppError::NotFound)));

    let listed = search(
        &state,
        ProductQuery {
            q: Some(retired.ename.clone()),
            ..Default::default()
        },
    )
    .await?;
    assert!(listed.is_empty());

    let re_add = common::add_to_cart(&state, &owner, retired.id, 1).await;
    assert!(re_add.is_err());

    let err = order_service::place_order(
        &state,
        PlaceOrder {
            cart: CartRef::User(user.user_id.clone()),
            status: "pending".into(),
            payment_status: "pending".into(),
            payment_method: "cod".into(),
            order_ref: None,
        },
    )
    .await
    .expect_err("retired product");
    assert!(matches!(err, OrderError::ProductNotFound(id) if id == retired.id));

    // The failed placement leaves the cart as it was.
    let items = cart_service::get_cart(&state, &owner)
        .await?
        .data
        .expect("cart")
        .items;
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].quantity, 2);
    Ok(())
}
