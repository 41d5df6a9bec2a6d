use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{Category, Product, ProductWithCategories};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateProductRequest {
    pub ename: String,
    #[serde(default)]
    pub arname: String,
    #[serde(default)]
    pub edescription: String,
    #[serde(default)]
    pub ardescription: String,
    pub sale_price: Decimal,
    #[serde(default)]
    pub regular_price: Decimal,
    #[serde(default)]
    pub base_cost: Decimal,
    #[serde(default)]
    pub image: String,
    pub weight: Decimal,
    #[serde(default)]
    pub stock: i32,
    #[serde(default)]
    pub category_ids: Vec<Uuid>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateProductRequest {
    pub ename: Option<String>,
    pub arname: Option<String>,
    pub edescription: Option<String>,
    pub ardescription: Option<String>,
    pub sale_price: Option<Decimal>,
    pub regular_price: Option<Decimal>,
    pub base_cost: Option<Decimal>,
    pub image: Option<String>,
    pub weight: Option<Decimal>,
    pub stock: Option<i32>,
    /// Replaces the product's category set when present.
    pub category_ids: Option<Vec<Uuid>>,
}

#[derive(Serialize, ToSchema)]
pub struct ProductList {
    pub items: Vec<ProductWithCategories>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateCategoryRequest {
    pub ename: String,
    #[serde(default)]
    pub arname: String,
    pub image: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateCategoryRequest {
    pub ename: Option<String>,
    pub arname: Option<String>,
    pub image: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct CategoryList {
    pub items: Vec<Category>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct StockUpdateRequest {
    pub stock: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LowStockList {
    pub items: Vec<Product>,
}
