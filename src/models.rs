use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entity::{
    admins, cart_items, categories, guest_cart_items, order_items, orders, products, users,
};

/// Fulfilment state of an order. Parsing is case-insensitive.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, EnumString, AsRefStr, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum OrderStatus {
    Pending,
    Confirmed,
    ReadyToShip,
    Shipped,
    Delivered,
    Returned,
    Cancelled,
}

/// Payment state of an order, tracked independently of [`OrderStatus`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, EnumString, AsRefStr, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
    Refunded,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: String,
    pub email: String,
    pub phone: String,
    pub name: String,
    pub picture: String,
    pub provider: String,
    pub address: Address,
    pub created_at: DateTime<Utc>,
}

/// Shipping address stored inline on the user row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Address {
    pub street: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Admin {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub picture: String,
    pub approved: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Product {
    pub id: Uuid,
    pub ename: String,
    pub arname: String,
    pub edescription: String,
    pub ardescription: String,
    pub sale_price: Decimal,
    pub regular_price: Decimal,
    pub base_cost: Decimal,
    pub image: String,
    pub weight: Decimal,
    pub stock: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Category {
    pub id: Uuid,
    pub ename: String,
    pub arname: String,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProductWithCategories {
    #[serde(flatten)]
    pub product: Product,
    pub categories: Vec<Category>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CategoryWithProducts {
    #[serde(flatten)]
    pub category: Category,
    pub products: Vec<Product>,
}

/// A cart line as shown to the shopper: the product snapshot taken when the
/// line was added, plus the requested quantity.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CartItem {
    pub id: Uuid,
    pub product_id: Uuid,
    pub product_ename: String,
    pub product_arname: String,
    pub product_image: String,
    pub product_stock: i32,
    pub sale_price: Decimal,
    pub regular_price: Decimal,
    pub weight: Decimal,
    pub quantity: i32,
    pub added_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: Uuid,
    pub user_id: String,
    pub shipping_cost: Decimal,
    pub total_amount: Decimal,
    pub status: String,
    pub payment_status: String,
    pub payment_method: String,
    pub order_ref: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub product_ename: String,
    pub product_arname: String,
    pub product_image: String,
    pub sale_price: Decimal,
    pub regular_price: Decimal,
    pub weight: Decimal,
    pub quantity: i32,
}

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            email: model.email,
            phone: model.phone,
            name: model.name,
            picture: model.picture,
            provider: model.provider,
            address: Address {
                street: model.street,
                city: model.city,
                state: model.state,
                postal_code: model.postal_code,
                country: model.country,
            },
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

impl From<admins::Model> for Admin {
    fn from(model: admins::Model) -> Self {
        Self {
            id: model.id,
            email: model.email,
            name: model.name,
            picture: model.picture,
            approved: model.approved,
        }
    }
}

impl From<products::Model> for Product {
    fn from(model: products::Model) -> Self {
        Self {
            id: model.id,
            ename: model.ename,
            arname: model.arname,
            edescription: model.edescription,
            ardescription: model.ardescription,
            sale_price: model.sale_price,
            regular_price: model.regular_price,
            base_cost: model.base_cost,
            image: model.image,
            weight: model.weight,
            stock: model.stock,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

impl From<categories::Model> for Category {
    fn from(model: categories::Model) -> Self {
        Self {
            id: model.id,
            ename: model.ename,
            arname: model.arname,
            image: model.image,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

impl From<cart_items::Model> for CartItem {
    fn from(model: cart_items::Model) -> Self {
        Self {
            id: model.id,
            product_id: model.product_id,
            product_ename: model.product_ename,
            product_arname: model.product_arname,
            product_image: model.product_image,
            product_stock: model.product_stock,
            sale_price: model.sale_price,
            regular_price: model.regular_price,
            weight: model.weight,
            quantity: model.quantity,
            added_at: model.added_at.with_timezone(&Utc),
        }
    }
}

impl From<guest_cart_items::Model> for CartItem {
    fn from(model: guest_cart_items::Model) -> Self {
        Self {
            id: model.id,
            product_id: model.product_id,
            product_ename: model.product_ename,
            product_arname: model.product_arname,
            product_image: model.product_image,
            product_stock: model.product_stock,
            sale_price: model.sale_price,
            regular_price: model.regular_price,
            weight: model.weight,
            quantity: model.quantity,
            added_at: model.added_at.with_timezone(&Utc),
        }
    }
}

impl From<orders::Model> for Order {
    fn from(model: orders::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            shipping_cost: model.shipping_cost,
            total_amount: model.total_amount,
            status: model.status,
            payment_status: model.payment_status,
            payment_method: model.payment_method,
            order_ref: model.order_ref,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

impl From<order_items::Model> for OrderItem {
    fn from(model: order_items::Model) -> Self {
        Self {
            id: model.id,
            order_id: model.order_id,
            product_id: model.product_id,
            product_ename: model.product_ename,
            product_arname: model.product_arname,
            product_image: model.product_image,
            sale_price: model.sale_price,
            regular_price: model.regular_price,
            weight: model.weight,
            quantity: model.quantity,
        }
    }
}
