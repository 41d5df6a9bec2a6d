use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::{LockType, OnConflict};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::{
    audit::audit_or_warn,
    dto::cart::{AddToCartRequest, CartList},
    entity::{
        cart_items::{ActiveModel as CartItemActive, Column as CartItemCol, Entity as CartItems},
        carts::{self, ActiveModel as CartActive, Column as CartCol, Entity as Carts},
        guest_cart_items::{
            ActiveModel as GuestItemActive, Column as GuestItemCol, Entity as GuestCartItems,
        },
        guest_carts::{self, ActiveModel as GuestCartActive, Column as GuestCartCol, Entity as GuestCarts},
        products::{Column as ProdCol, Entity as Products, Model as ProductModel},
    },
    error::{AppError, AppResult, conflict_on_unique},
    middleware::auth::{AuthUser, Role, ensure_admin},
    models::CartItem,
    response::{ApiResponse, Meta},
    state::AppState,
};

/// Whose cart a request addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartOwner {
    User(String),
    Guest(String),
}

impl CartOwner {
    pub fn id(&self) -> &str {
        match self {
            CartOwner::User(id) | CartOwner::Guest(id) => id,
        }
    }
}

impl TryFrom<&AuthUser> for CartOwner {
    type Error = AppError;

    fn try_from(user: &AuthUser) -> Result<Self, Self::Error> {
        match user.role {
            Role::User => Ok(CartOwner::User(user.user_id.clone())),
            Role::Guest => Ok(CartOwner::Guest(user.user_id.clone())),
            Role::Admin => Err(AppError::Forbidden),
        }
    }
}

/// Find the user's cart, creating it when missing. The row is locked when
/// called inside a transaction.
pub async fn ensure_user_cart<C>(db: &C, user_id: &str) -> Result<carts::Model, DbErr>
where
    C: ConnectionTrait,
{
    Carts::insert(CartActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id.to_owned()),
        created_at: NotSet,
        updated_at: NotSet,
    })
    .on_conflict(OnConflict::column(CartCol::UserId).do_nothing().to_owned())
    .exec_without_returning(db)
    .await?;

    Carts::find()
        .filter(CartCol::UserId.eq(user_id))
        .lock(LockType::Update)
        .one(db)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound(format!("cart for user {user_id}")))
}

pub async fn ensure_guest_cart<C>(db: &C, guest_id: &str) -> Result<guest_carts::Model, DbErr>
where
    C: ConnectionTrait,
{
    GuestCarts::insert(GuestCartActive {
        id: Set(Uuid::new_v4()),
        guest_id: Set(guest_id.to_owned()),
        created_at: NotSet,
        updated_at: NotSet,
    })
    .on_conflict(OnConflict::column(GuestCartCol::GuestId).do_nothing().to_owned())
    .exec_without_returning(db)
    .await?;

    GuestCarts::find()
        .filter(GuestCartCol::GuestId.eq(guest_id))
        .one(db)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound(format!("guest cart {guest_id}")))
}

pub async fn get_cart(state: &AppState, owner: &CartOwner) -> AppResult<ApiResponse<CartList>> {
    let list = load_cart(state, owner).await?;
    let total = list.items.len() as i64;
    Ok(ApiResponse::success(
        "OK",
        list,
        Some(Meta::new(1, total, total)),
    ))
}

pub async fn get_user_cart_admin(
    state: &AppState,
    admin: &AuthUser,
    user_id: &str,
) -> AppResult<ApiResponse<CartList>> {
    ensure_admin(admin)?;
    get_cart(state, &CartOwner::User(user_id.to_owned())).await
}

/// Add a product line or, when the product is already in the cart, set its
/// quantity. New lines snapshot the product as it is now.
pub async fn add_item(
    state: &AppState,
    owner: &CartOwner,
    payload: AddToCartRequest,
) -> AppResult<ApiResponse<CartItem>> {
    if payload.quantity <= 0 {
        return Err(AppError::BadRequest(
            "quantity must be greater than 0".to_string(),
        ));
    }

    let product = Products::find_by_id(payload.product_id)
        .filter(ProdCol::DeletedAt.is_null())
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let item = match owner {
        CartOwner::User(user_id) => upsert_user_line(state, user_id, &product, payload.quantity).await?,
        CartOwner::Guest(guest_id) => {
            upsert_guest_line(state, guest_id, &product, payload.quantity).await?
        }
    };

    audit_or_warn(
        &state.orm,
        Some(owner.id()),
        "cart_update",
        Some("cart_items"),
        Some(serde_json::json!({ "product_id": product.id, "quantity": payload.quantity })),
    )
    .await;

    Ok(ApiResponse::success("OK", item, None))
}

pub async fn remove_item(
    state: &AppState,
    owner: &CartOwner,
    product_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let removed = match owner {
        CartOwner::User(user_id) => {
            let cart = Carts::find()
                .filter(CartCol::UserId.eq(user_id.as_str()))
                .one(&state.orm)
                .await?
                .ok_or(AppError::NotFound)?;
            CartItems::delete_many()
                .filter(CartItemCol::CartId.eq(cart.id))
                .filter(CartItemCol::ProductId.eq(product_id))
                .exec(&state.orm)
                .await?
                .rows_affected
        }
        CartOwner::Guest(guest_id) => {
            let cart = GuestCarts::find()
                .filter(GuestCartCol::GuestId.eq(guest_id.as_str()))
                .one(&state.orm)
                .await?
                .ok_or(AppError::NotFound)?;
            GuestCartItems::delete_many()
                .filter(GuestItemCol::CartId.eq(cart.id))
                .filter(GuestItemCol::ProductId.eq(product_id))
                .exec(&state.orm)
                .await?
                .rows_affected
        }
    };

    if removed == 0 {
        return Err(AppError::NotFound);
    }

    audit_or_warn(
        &state.orm,
        Some(owner.id()),
        "cart_remove",
        Some("cart_items"),
        Some(serde_json::json!({ "product_id": product_id })),
    )
    .await;

    Ok(ApiResponse::success(
        "Removed from cart",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub async fn clear_cart(
    state: &AppState,
    owner: &CartOwner,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let removed = match owner {
        CartOwner::User(user_id) => {
            match Carts::find()
                .filter(CartCol::UserId.eq(user_id.as_str()))
                .one(&state.orm)
                .await?
            {
                Some(cart) => {
                    CartItems::delete_many()
                        .filter(CartItemCol::CartId.eq(cart.id))
                        .exec(&state.orm)
                        .await?
                        .rows_affected
                }
                None => 0,
            }
        }
        CartOwner::Guest(guest_id) => {
            match GuestCarts::find()
                .filter(GuestCartCol::GuestId.eq(guest_id.as_str()))
                .one(&state.orm)
                .await?
            {
                Some(cart) => {
                    GuestCartItems::delete_many()
                        .filter(GuestItemCol::CartId.eq(cart.id))
                        .exec(&state.orm)
                        .await?
                        .rows_affected
                }
                None => 0,
            }
        }
    };

    Ok(ApiResponse::success(
        "Cart cleared",
        serde_json::json!({ "removed": removed }),
        Some(Meta::empty()),
    ))
}

pub(crate) async fn load_cart(state: &AppState, owner: &CartOwner) -> AppResult<CartList> {
    let list = match owner {
        CartOwner::User(user_id) => {
            let cart = Carts::find()
                .filter(CartCol::UserId.eq(user_id.as_str()))
                .one(&state.orm)
                .await?;
            match cart {
                Some(cart) => CartList {
                    cart_id: Some(cart.id),
                    items: CartItems::find()
                        .filter(CartItemCol::CartId.eq(cart.id))
                        .order_by_desc(CartItemCol::AddedAt)
                        .all(&state.orm)
                        .await?
                        .into_iter()
                        .map(CartItem::from)
                        .collect(),
                },
                None => CartList {
                    cart_id: None,
                    items: Vec::new(),
                },
            }
        }
        CartOwner::Guest(guest_id) => {
            let cart = GuestCarts::find()
                .filter(GuestCartCol::GuestId.eq(guest_id.as_str()))
                .one(&state.orm)
                .await?;
            match cart {
                Some(cart) => CartList {
                    cart_id: Some(cart.id),
                    items: GuestCartItems::find()
                        .filter(GuestItemCol::CartId.eq(cart.id))
                        .order_by_desc(GuestItemCol::AddedAt)
                        .all(&state.orm)
                        .await?
                        .into_iter()
                        .map(CartItem::from)
                        .collect(),
                },
                None => CartList {
                    cart_id: None,
                    items: Vec::new(),
                },
            }
        }
    };
    Ok(list)
}

// Concurrent adds of one product resolve on the (cart_id, product_id) key:
// the last writer's quantity wins.
async fn upsert_user_line(
    state: &AppState,
    user_id: &str,
    product: &ProductModel,
    quantity: i32,
) -> AppResult<CartItem> {
    let cart = ensure_user_cart(&state.orm, user_id).await?;
    let line = CartItems::insert(CartItemActive {
        id: Set(Uuid::new_v4()),
        cart_id: Set(cart.id),
        product_id: Set(product.id),
        product_ename: Set(product.ename.clone()),
        product_arname: Set(product.arname.clone()),
        product_image: Set(product.image.clone()),
        product_stock: Set(product.stock),
        sale_price: Set(product.sale_price),
        regular_price: Set(product.regular_price),
        weight: Set(product.weight),
        quantity: Set(quantity),
        added_at: Set(Utc::now().into()),
    })
    .on_conflict(
        OnConflict::columns([CartItemCol::CartId, CartItemCol::ProductId])
            .update_columns([CartItemCol::Quantity, CartItemCol::AddedAt])
            .to_owned(),
    )
    .exec_with_returning(&state.orm)
    .await
    .map_err(|err| conflict_on_unique(err, "cart line changed concurrently"))?;

    Ok(line.into())
}

async fn upsert_guest_line(
    state: &AppState,
    guest_id: &str,
    product: &ProductModel,
    quantity: i32,
) -> AppResult<CartItem> {
    let cart = ensure_guest_cart(&state.orm, guest_id).await?;
    let line = GuestCartItems::insert(GuestItemActive {
        id: Set(Uuid::new_v4()),
        cart_id: Set(cart.id),
        product_id: Set(product.id),
        product_ename: Set(product.ename.clone()),
        product_arname: Set(product.arname.clone()),
        product_image: Set(product.image.clone()),
        product_stock: Set(product.stock),
        sale_price: Set(product.sale_price),
        regular_price: Set(product.regular_price),
        weight: Set(product.weight),
        quantity: Set(quantity),
        added_at: Set(Utc::now().into()),
    })
    .on_conflict(
        OnConflict::columns([GuestItemCol::CartId, GuestItemCol::ProductId])
            .update_columns([GuestItemCol::Quantity, GuestItemCol::AddedAt])
            .to_owned(),
    )
    .exec_with_returning(&state.orm)
    .await
    .map_err(|err| conflict_on_unique(err, "cart line changed concurrently"))?;

    Ok(line.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owner_follows_session_role() {
        let guest = AuthUser {
            user_id: "guest_abc".into(),
            role: Role::Guest,
        };
        assert_eq!(
            CartOwner::try_from(&guest).ok(),
            Some(CartOwner::Guest("guest_abc".into()))
        );

        let user = AuthUser {
            user_id: "sub-1".into(),
            role: Role::User,
        };
        assert_eq!(CartOwner::try_from(&user).ok(), Some(CartOwner::User("sub-1".into())));

        let admin = AuthUser {
            user_id: "a".into(),
            role: Role::Admin,
        };
        assert!(matches!(CartOwner::try_from(&admin), Err(AppError::Forbidden)));
    }
}
