use std::collections::{HashMap, HashSet};

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::sea_query::{Expr, LikeExpr, Query};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::audit_or_warn,
    dto::catalog::{CreateProductRequest, ProductList, UpdateProductRequest},
    entity::{
        categories::{Column as CategoryCol, Entity as Categories},
        product_categories::{
            ActiveModel as ProductCategoryActive, Column as ProductCategoryCol,
            Entity as ProductCategories,
        },
        products::{ActiveModel, Column, Entity as Products, Model as ProductModel},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Category, Product, ProductWithCategories},
    response::{ApiResponse, Meta},
    routes::params::{ProductQuery, ProductSortBy, SortOrder},
    state::AppState,
};

pub async fn list_products(
    state: &AppState,
    query: ProductQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let mut condition = Condition::all().add(Column::DeletedAt.is_null());

    if let Some(search) = query.q.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = contains_pattern(search);
        condition = condition.add(
            Condition::any()
                .add(Expr::col(Column::Ename).ilike(pattern.clone()))
                .add(Expr::col(Column::Arname).ilike(pattern.clone()))
                .add(Expr::col(Column::Edescription).ilike(pattern.clone()))
                .add(Expr::col(Column::Ardescription).ilike(pattern)),
        );
    }

    if let Some(category_id) = query.category_id {
        condition = condition.add(
            Column::Id.in_subquery(
                Query::select()
                    .column(ProductCategoryCol::ProductId)
                    .from(ProductCategories)
                    .and_where(Expr::col(ProductCategoryCol::CategoryId).eq(category_id))
                    .to_owned(),
            ),
        );
    }

    if let Some(min_price) = query.min_price {
        condition = condition.add(Column::SalePrice.gte(min_price));
    }

    if let Some(max_price) = query.max_price {
        condition = condition.add(Column::SalePrice.lte(max_price));
    }

    let sort_col = match query.sort_by.unwrap_or(ProductSortBy::CreatedAt) {
        ProductSortBy::CreatedAt => Column::CreatedAt,
        ProductSortBy::SalePrice => Column::SalePrice,
        ProductSortBy::Name => Column::Ename,
    };

    let mut finder = Products::find().filter(condition);
    finder = match query.sort_order.unwrap_or(SortOrder::Desc) {
        SortOrder::Asc => finder.order_by_asc(sort_col),
        SortOrder::Desc => finder.order_by_desc(sort_col),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let products = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;
    let items = with_categories(&state.orm, products).await?;

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Products", ProductList { items }, Some(meta)))
}

/// `%term%` with the term's own `\`, `%` and `_` matched literally.
pub(crate) fn contains_pattern(term: &str) -> LikeExpr {
    LikeExpr::new(format!("%{}%", escape_like(term))).escape('\\')
}

fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for ch in term.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

pub async fn get_product(
    state: &AppState,
    id: Uuid,
) -> AppResult<ApiResponse<ProductWithCategories>> {
    let product = find_live(&state.orm, id).await?;
    let mut items = with_categories(&state.orm, vec![product]).await?;
    let item = items.pop().ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success("Product", item, None))
}

pub async fn create_product(
    state: &AppState,
    user: &AuthUser,
    payload: CreateProductRequest,
) -> AppResult<ApiResponse<ProductWithCategories>> {
    ensure_admin(user)?;
    if payload.ename.trim().is_empty() {
        return Err(AppError::BadRequest("ename is required".into()));
    }
    validate_amounts(
        Some(payload.sale_price),
        Some(payload.weight),
        Some(payload.stock),
    )?;

    let txn = state.orm.begin().await?;
    let product = ActiveModel {
        id: Set(Uuid::new_v4()),
        ename: Set(payload.ename),
        arname: Set(payload.arname),
        edescription: Set(payload.edescription),
        ardescription: Set(payload.ardescription),
        sale_price: Set(payload.sale_price),
        regular_price: Set(payload.regular_price),
        base_cost: Set(payload.base_cost),
        image: Set(payload.image),
        weight: Set(payload.weight),
        stock: Set(payload.stock),
        created_at: NotSet,
        updated_at: NotSet,
        deleted_at: Set(None),
    }
    .insert(&txn)
    .await?;
    replace_categories(&txn, product.id, &payload.category_ids).await?;
    txn.commit().await?;

    audit_or_warn(
        &state.orm,
        Some(&user.user_id),
        "product_create",
        Some("products"),
        Some(serde_json::json!({ "product_id": product.id })),
    )
    .await;

    let mut items = with_categories(&state.orm, vec![product]).await?;
    let item = items.pop().ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success(
        "Product created",
        item,
        Some(Meta::empty()),
    ))
}

pub async fn update_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateProductRequest,
) -> AppResult<ApiResponse<ProductWithCategories>> {
    ensure_admin(user)?;
    validate_amounts(payload.sale_price, payload.weight, payload.stock)?;

    let txn = state.orm.begin().await?;
    let existing = find_live(&txn, id).await?;

    let mut active: ActiveModel = existing.into();
    if let Some(ename) = payload.ename.filter(|n| !n.trim().is_empty()) {
        active.ename = Set(ename);
    }
    if let Some(arname) = payload.arname {
        active.arname = Set(arname);
    }
    if let Some(edescription) = payload.edescription {
        active.edescription = Set(edescription);
    }
    if let Some(ardescription) = payload.ardescription {
        active.ardescription = Set(ardescription);
    }
    if let Some(sale_price) = payload.sale_price {
        active.sale_price = Set(sale_price);
    }
    if let Some(regular_price) = payload.regular_price {
        active.regular_price = Set(regular_price);
    }
    if let Some(base_cost) = payload.base_cost {
        active.base_cost = Set(base_cost);
    }
    if let Some(image) = payload.image {
        active.image = Set(image);
    }
    if let Some(weight) = payload.weight {
        active.weight = Set(weight);
    }
    if let Some(stock) = payload.stock {
        active.stock = Set(stock);
    }
    active.updated_at = Set(Utc::now().into());

    let product = active.update(&txn).await?;
    if let Some(category_ids) = payload.category_ids.as_deref() {
        replace_categories(&txn, product.id, category_ids).await?;
    }
    txn.commit().await?;

    audit_or_warn(
        &state.orm,
        Some(&user.user_id),
        "product_update",
        Some("products"),
        Some(serde_json::json!({ "product_id": product.id })),
    )
    .await;

    let mut items = with_categories(&state.orm, vec![product]).await?;
    let item = items.pop().ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success("Updated", item, Some(Meta::empty())))
}

/// Soft-delete: associations are removed and `deleted_at` is stamped.
pub async fn delete_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;

    let txn = state.orm.begin().await?;
    let existing = find_live(&txn, id).await?;

    ProductCategories::delete_many()
        .filter(ProductCategoryCol::ProductId.eq(id))
        .exec(&txn)
        .await?;

    let mut active: ActiveModel = existing.into();
    let now = Utc::now();
    active.deleted_at = Set(Some(now.into()));
    active.updated_at = Set(now.into());
    active.update(&txn).await?;
    txn.commit().await?;

    audit_or_warn(
        &state.orm,
        Some(&user.user_id),
        "product_delete",
        Some("products"),
        Some(serde_json::json!({ "product_id": id })),
    )
    .await;

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub(crate) async fn find_live<C>(db: &C, id: Uuid) -> AppResult<ProductModel>
where
    C: ConnectionTrait,
{
    Products::find_by_id(id)
        .filter(Column::DeletedAt.is_null())
        .one(db)
        .await?
        .ok_or(AppError::NotFound)
}

fn validate_amounts(
    sale_price: Option<Decimal>,
    weight: Option<Decimal>,
    stock: Option<i32>,
) -> AppResult<()> {
    if sale_price.is_some_and(|p| p < Decimal::ZERO) {
        return Err(AppError::BadRequest("sale_price cannot be negative".into()));
    }
    if weight.is_some_and(|w| w < Decimal::ZERO) {
        return Err(AppError::BadRequest("weight cannot be negative".into()));
    }
    if stock.is_some_and(|s| s < 0) {
        return Err(AppError::BadRequest("stock cannot be negative".into()));
    }
    Ok(())
}

async fn replace_categories<C>(db: &C, product_id: Uuid, category_ids: &[Uuid]) -> AppResult<()>
where
    C: ConnectionTrait,
{
    let wanted: HashSet<Uuid> = category_ids.iter().copied().collect();
    if !wanted.is_empty() {
        let found = Categories::find()
            .filter(CategoryCol::Id.is_in(wanted.iter().copied()))
            .count(db)
            .await?;
        if found as usize != wanted.len() {
            return Err(AppError::BadRequest("unknown category id".into()));
        }
    }

    ProductCategories::delete_many()
        .filter(ProductCategoryCol::ProductId.eq(product_id))
        .exec(db)
        .await?;

    if !wanted.is_empty() {
        ProductCategories::insert_many(wanted.into_iter().map(|category_id| {
            ProductCategoryActive {
                product_id: Set(product_id),
                category_id: Set(category_id),
            }
        }))
        .exec_without_returning(db)
        .await?;
    }
    Ok(())
}

/// Attach each product's categories, keeping the input order.
pub(crate) async fn with_categories<C>(
    db: &C,
    products: Vec<ProductModel>,
) -> Result<Vec<ProductWithCategories>, DbErr>
where
    C: ConnectionTrait,
{
    if products.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<Uuid> = products.iter().map(|p| p.id).collect();
    let links = ProductCategories::find()
        .filter(ProductCategoryCol::ProductId.is_in(ids))
        .all(db)
        .await?;

    let category_ids: HashSet<Uuid> = links.iter().map(|l| l.category_id).collect();
    let categories: HashMap<Uuid, Category> = if category_ids.is_empty() {
        HashMap::new()
    } else {
        Categories::find()
            .filter(CategoryCol::Id.is_in(category_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|c| (c.id, Category::from(c)))
            .collect()
    };

    let mut by_product: HashMap<Uuid, Vec<Category>> = HashMap::new();
    for link in links {
        if let Some(category) = categories.get(&link.category_id) {
            by_product
                .entry(link.product_id)
                .or_default()
                .push(category.clone());
        }
    }

    Ok(products
        .into_iter()
        .map(|model| {
            let mut categories = by_product.remove(&model.id).unwrap_or_default();
            categories.sort_by(|a, b| a.ename.cmp(&b.ename));
            ProductWithCategories {
                product: Product::from(model),
                categories,
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn negative_amounts_are_rejected() {
        assert!(validate_amounts(Some(dec!(0)), Some(dec!(0)), Some(0)).is_ok());
        assert!(validate_amounts(None, None, None).is_ok());
        assert!(matches!(
            validate_amounts(Some(dec!(-1)), None, None),
            Err(AppError::BadRequest(_))
        ));
        assert!(validate_amounts(None, Some(dec!(-0.5)), None).is_err());
        assert!(validate_amounts(None, None, Some(-3)).is_err());
    }

    #[test]
    fn search_wildcards_are_literal() {
        assert_eq!(escape_like("50%_off"), r"50\%\_off");
        assert_eq!(escape_like(r"a\b"), r"a\\b");
        assert_eq!(escape_like("قدر ضغط"), "قدر ضغط");
    }
}
