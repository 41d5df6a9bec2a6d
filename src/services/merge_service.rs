use std::collections::HashMap;

use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::{Expr, LockType};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DbErr, EntityTrait, QueryFilter, QuerySelect, Set,
    TransactionTrait,
};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    db::OrmConn,
    entity::{
        cart_items::{self, ActiveModel as CartItemActive, Column as CartItemCol, Entity as CartItems},
        guest_cart_items::{self, Column as GuestItemCol, Entity as GuestCartItems},
        guest_carts::{Column as GuestCartCol, Entity as GuestCarts},
        guest_users::Entity as GuestUsers,
    },
    services::cart_service::ensure_user_cart,
};

/// Result of folding a guest cart into a user's cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MergeOutcome {
    NoGuestCart,
    MergedSuccess { merged: usize },
    GuestCartEmpty,
    MergeFailed { reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum MergeStep<'a> {
    /// Existing user line for the same product; quantities add up.
    SetQuantity { item_id: Uuid, quantity: i32 },
    /// Product not yet in the user cart; the guest snapshot is copied.
    Insert(&'a guest_cart_items::Model),
}

pub fn plan_merge<'a>(
    user_items: &[cart_items::Model],
    guest_items: &'a [guest_cart_items::Model],
) -> Vec<MergeStep<'a>> {
    let existing: HashMap<Uuid, &cart_items::Model> = user_items
        .iter()
        .map(|item| (item.product_id, item))
        .collect();

    guest_items
        .iter()
        .map(|guest| match existing.get(&guest.product_id) {
            Some(line) => MergeStep::SetQuantity {
                item_id: line.id,
                quantity: line.quantity.saturating_add(guest.quantity),
            },
            None => MergeStep::Insert(guest),
        })
        .collect()
}

/// Fold the guest's cart into the user's cart and delete the guest cart.
///
/// Running it again for an already merged guest reports `NoGuestCart`.
/// Storage failures roll back and are reported as `MergeFailed`.
pub async fn merge_guest_cart(db: &OrmConn, guest_id: &str, user_id: &str) -> MergeOutcome {
    match try_merge(db, guest_id, user_id).await {
        Ok(outcome) => {
            tracing::info!(guest_id, user_id, outcome = ?outcome, "guest cart merge finished");
            outcome
        }
        Err(err) => {
            tracing::error!(guest_id, user_id, error = %err, "guest cart merge failed");
            MergeOutcome::MergeFailed {
                reason: "storage error".to_string(),
            }
        }
    }
}

async fn try_merge(db: &OrmConn, guest_id: &str, user_id: &str) -> Result<MergeOutcome, DbErr> {
    let txn = db.begin().await?;

    let Some(guest_cart) = GuestCarts::find()
        .filter(GuestCartCol::GuestId.eq(guest_id))
        .lock(LockType::Update)
        .one(&txn)
        .await?
    else {
        return Ok(MergeOutcome::NoGuestCart);
    };

    // An expired guest's cart is discarded rather than merged.
    let expired = GuestUsers::find_by_id(guest_id)
        .one(&txn)
        .await?
        .is_some_and(|guest| guest.expires_at <= Utc::now());
    if expired {
        GuestCarts::delete_by_id(guest_cart.id).exec(&txn).await?;
        txn.commit().await?;
        tracing::info!(guest_id, "guest session expired; cart discarded");
        return Ok(MergeOutcome::NoGuestCart);
    }

    let guest_items = GuestCartItems::find()
        .filter(GuestItemCol::CartId.eq(guest_cart.id))
        .all(&txn)
        .await?;

    if guest_items.is_empty() {
        GuestCarts::delete_by_id(guest_cart.id).exec(&txn).await?;
        txn.commit().await?;
        return Ok(MergeOutcome::GuestCartEmpty);
    }

    let user_cart = ensure_user_cart(&txn, user_id).await?;
    let user_items = CartItems::find()
        .filter(CartItemCol::CartId.eq(user_cart.id))
        .all(&txn)
        .await?;

    let steps = plan_merge(&user_items, &guest_items);
    let merged = steps.len();
    for step in steps {
        match step {
            MergeStep::SetQuantity { item_id, quantity } => {
                CartItems::update_many()
                    .col_expr(CartItemCol::Quantity, Expr::value(quantity))
                    .col_expr(CartItemCol::AddedAt, Expr::current_timestamp().into())
                    .filter(CartItemCol::Id.eq(item_id))
                    .exec(&txn)
                    .await?;
            }
            MergeStep::Insert(guest) => {
                CartItemActive {
                    id: Set(Uuid::new_v4()),
                    cart_id: Set(user_cart.id),
                    product_id: Set(guest.product_id),
                    product_ename: Set(guest.product_ename.clone()),
                    product_arname: Set(guest.product_arname.clone()),
                    product_image: Set(guest.product_image.clone()),
                    product_stock: Set(guest.product_stock),
                    sale_price: Set(guest.sale_price),
                    regular_price: Set(guest.regular_price),
                    weight: Set(guest.weight),
                    quantity: Set(guest.quantity),
                    added_at: NotSet,
                }
                .insert(&txn)
                .await?;
            }
        }
    }

    GuestCartItems::delete_many()
        .filter(GuestItemCol::CartId.eq(guest_cart.id))
        .exec(&txn)
        .await?;
    GuestCarts::delete_by_id(guest_cart.id).exec(&txn).await?;

    txn.commit().await?;
    Ok(MergeOutcome::MergedSuccess { merged })
}
