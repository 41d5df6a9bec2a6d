use std::str::FromStr;

use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::{Expr, LockType};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::audit_or_warn,
    dto::orders::{OrderList, OrderWithItems},
    entity::{
        cart_items::{self, Column as CartItemCol, Entity as CartItems},
        carts::{Column as CartCol, Entity as Carts},
        order_items::{ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems},
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
        products::{Column as ProdCol, Entity as Products},
    },
    error::{AppError, AppResult, OrderError},
    middleware::auth::AuthUser,
    models::{Order, OrderItem, OrderStatus, PaymentStatus},
    notify::OrderEvent,
    pricing::{OrderTotals, PricedLine},
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    state::AppState,
};

/// Which cart an order is built from.
#[derive(Debug, Clone)]
pub enum CartRef {
    /// The cart owned by this user id.
    User(String),
    /// A cart addressed directly, as payment callbacks do.
    Cart(Uuid),
}

#[derive(Debug, Clone)]
pub struct PlaceOrder {
    pub cart: CartRef,
    pub status: String,
    pub payment_status: String,
    pub payment_method: String,
    /// Caller-supplied reference. Placing twice with the same reference
    /// returns the first order.
    pub order_ref: Option<String>,
}

/// Convert a cart into an order in one transaction.
///
/// The cart row and every product row are locked for the duration. Stock is
/// checked and decremented under those locks, totals come from the cart
/// snapshot, and the cart is emptied before commit. Any failure rolls the
/// whole transaction back. Observers are notified only after commit.
pub async fn place_order(state: &AppState, req: PlaceOrder) -> Result<OrderWithItems, OrderError> {
    let status = parse_status(&req.status)?;
    let payment_status = parse_payment_status(&req.payment_status)?;

    let txn = state.orm.begin().await?;

    let cart_query = match &req.cart {
        CartRef::User(user_id) => Carts::find().filter(CartCol::UserId.eq(user_id.as_str())),
        CartRef::Cart(cart_id) => Carts::find_by_id(*cart_id),
    };
    let cart = cart_query
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(OrderError::CartNotFound)?;

    if let Some(reference) = req.order_ref.as_deref() {
        if let Some(existing) = Orders::find()
            .filter(OrderCol::OrderRef.eq(reference))
            .one(&txn)
            .await?
        {
            let items = load_items(&txn, existing.id).await?;
            txn.commit().await?;
            tracing::info!(order_ref = reference, "order reference already placed");
            return Ok(OrderWithItems {
                order: existing.into(),
                items,
            });
        }
    }

    // Locks are taken in product id order so concurrent placements cannot deadlock.
    let lines = CartItems::find()
        .filter(CartItemCol::CartId.eq(cart.id))
        .order_by_asc(CartItemCol::ProductId)
        .all(&txn)
        .await?;
    if lines.is_empty() {
        return Err(OrderError::EmptyCart);
    }

    for line in &lines {
        let product = Products::find_by_id(line.product_id)
            .filter(ProdCol::DeletedAt.is_null())
            .lock(LockType::Update)
            .one(&txn)
            .await?
            .ok_or(OrderError::ProductNotFound(line.product_id))?;

        if product.stock < line.quantity {
            tracing::info!(
                product_id = %product.id,
                stock = product.stock,
                requested = line.quantity,
                "insufficient stock"
            );
            return Err(OrderError::InsufficientStock {
                product_id: product.id,
                name: product.ename,
            });
        }

        Products::update_many()
            .col_expr(ProdCol::Stock, Expr::col(ProdCol::Stock).sub(line.quantity))
            .col_expr(ProdCol::UpdatedAt, Expr::current_timestamp().into())
            .filter(ProdCol::Id.eq(product.id))
            .exec(&txn)
            .await?;
    }

    let totals = price_lines(&lines);

    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(cart.user_id.clone()),
        shipping_cost: Set(totals.shipping_cost),
        total_amount: Set(totals.total_amount),
        status: Set(status.as_ref().to_owned()),
        payment_status: Set(payment_status.as_ref().to_owned()),
        payment_method: Set(req.payment_method.clone()),
        order_ref: Set(req.order_ref.clone().unwrap_or_else(generate_order_ref)),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    let mut items = Vec::with_capacity(lines.len());
    for line in lines {
        let item = OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            product_id: Set(line.product_id),
            product_ename: Set(line.product_ename),
            product_arname: Set(line.product_arname),
            product_image: Set(line.product_image),
            sale_price: Set(line.sale_price),
            regular_price: Set(line.regular_price),
            weight: Set(line.weight),
            quantity: Set(line.quantity),
        }
        .insert(&txn)
        .await?;
        items.push(OrderItem::from(item));
    }

    CartItems::delete_many()
        .filter(CartItemCol::CartId.eq(cart.id))
        .exec(&txn)
        .await?;

    txn.commit().await?;

    let placed = OrderWithItems {
        order: order.into(),
        items,
    };

    tracing::info!(
        order_id = %placed.order.id,
        order_ref = %placed.order.order_ref,
        total = %placed.order.total_amount,
        "order placed"
    );

    state.hub.publish(&OrderEvent::OrderCreated {
        order: placed.order.clone(),
        items: placed.items.clone(),
    });
    audit_or_warn(
        &state.orm,
        Some(&placed.order.user_id),
        "order_placed",
        Some("orders"),
        Some(serde_json::json!({
            "order_id": placed.order.id,
            "order_ref": placed.order.order_ref,
        })),
    )
    .await;

    Ok(placed)
}

fn price_lines(lines: &[cart_items::Model]) -> OrderTotals {
    OrderTotals::from_lines(lines.iter().map(|line| PricedLine {
        unit_price: line.sale_price,
        unit_weight: line.weight,
        quantity: line.quantity,
    }))
}

/// Totals a cart would be charged at right now, from its line snapshots.
pub(crate) async fn cart_totals<C>(db: &C, cart_id: Uuid) -> Result<OrderTotals, DbErr>
where
    C: ConnectionTrait,
{
    let lines = CartItems::find()
        .filter(CartItemCol::CartId.eq(cart_id))
        .all(db)
        .await?;
    Ok(price_lines(&lines))
}

pub fn parse_status(value: &str) -> Result<OrderStatus, OrderError> {
    OrderStatus::from_str(value.trim()).map_err(|_| OrderError::InvalidStatus(value.to_owned()))
}

pub fn parse_payment_status(value: &str) -> Result<PaymentStatus, OrderError> {
    PaymentStatus::from_str(value.trim())
        .map_err(|_| OrderError::InvalidPaymentStatus(value.to_owned()))
}

/// Timestamp prefix plus a random suffix.
pub fn generate_order_ref() -> String {
    format!(
        "{}-{}",
        Utc::now().format("%Y%m%d%H%M%S"),
        Uuid::new_v4().simple()
    )
}

/// Set an order's status. Any valid status may follow any other.
pub async fn update_status(state: &AppState, order_id: Uuid, status: &str) -> AppResult<Order> {
    let status = parse_status(status)?;
    let order = find_order(&state.orm, order_id).await?;

    let mut active: OrderActive = order.into();
    active.status = Set(status.as_ref().to_owned());
    active.updated_at = Set(Utc::now().into());
    Ok(active.update(&state.orm).await?.into())
}

pub async fn update_payment_status(
    state: &AppState,
    order_id: Uuid,
    payment_status: &str,
) -> AppResult<Order> {
    let payment_status = parse_payment_status(payment_status)?;
    let order = find_order(&state.orm, order_id).await?;

    let mut active: OrderActive = order.into();
    active.payment_status = Set(payment_status.as_ref().to_owned());
    active.updated_at = Set(Utc::now().into());
    Ok(active.update(&state.orm).await?.into())
}

pub async fn place_own_order(
    state: &AppState,
    user: &AuthUser,
    payment_method: String,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let placed = place_order(
        state,
        PlaceOrder {
            cart: CartRef::User(user.user_id.clone()),
            status: OrderStatus::Pending.to_string(),
            payment_status: PaymentStatus::Pending.to_string(),
            payment_method,
            order_ref: None,
        },
    )
    .await?;

    Ok(ApiResponse::success(
        "Order placed",
        placed,
        Some(Meta::empty()),
    ))
}

pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    mut query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    query.user_id = None;
    let condition = Condition::all().add(OrderCol::UserId.eq(user.user_id.as_str()));
    list_with(state, condition, query).await
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let order = Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::UserId.eq(user.user_id.as_str()))
                .add(OrderCol::Id.eq(id)),
        )
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let items = load_items(&state.orm, order.id).await?;

    Ok(ApiResponse::success(
        "OK",
        OrderWithItems {
            order: order.into(),
            items,
        },
        Some(Meta::empty()),
    ))
}

/// Shared listing used by both the shopper and admin views.
pub(crate) async fn list_with(
    state: &AppState,
    mut condition: Condition,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = query.pagination().normalize();
    if let Some(user_id) = query.user_id.as_deref().filter(|u| !u.is_empty()) {
        condition = condition.add(OrderCol::UserId.eq(user_id));
    }
    if let Some(status) = query.status.as_deref().filter(|s| !s.is_empty()) {
        let status = parse_status(status)?;
        condition = condition.add(OrderCol::Status.eq(status.as_ref()));
    }
    if let Some(payment_status) = query.payment_status.as_deref().filter(|s| !s.is_empty()) {
        let payment_status = parse_payment_status(payment_status)?;
        condition = condition.add(OrderCol::PaymentStatus.eq(payment_status.as_ref()));
    }

    let mut finder = Orders::find().filter(condition);
    finder = match query.sort_order.unwrap_or(SortOrder::Desc) {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;
    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Order::from)
        .collect();

    Ok(ApiResponse::success(
        "Ok",
        OrderList { items: orders },
        Some(Meta::new(page, limit, total)),
    ))
}

pub(crate) async fn find_order<C>(db: &C, id: Uuid) -> AppResult<OrderModel>
where
    C: ConnectionTrait,
{
    Orders::find_by_id(id)
        .one(db)
        .await?
        .ok_or(AppError::NotFound)
}

pub(crate) async fn load_items<C>(db: &C, order_id: Uuid) -> Result<Vec<OrderItem>, sea_orm::DbErr>
where
    C: ConnectionTrait,
{
    Ok(OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order_id))
        .order_by_asc(OrderItemCol::ProductId)
        .all(db)
        .await?
        .into_iter()
        .map(OrderItem::from)
        .collect())
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn statuses_are_validated_case_insensitively() {
        assert_eq!(parse_status("Confirmed").ok(), Some(OrderStatus::Confirmed));
        assert_eq!(parse_payment_status(" PAID ").ok(), Some(PaymentStatus::Paid));
        assert!(matches!(
            parse_status("bogus"),
            Err(OrderError::InvalidStatus(s)) if s == "bogus"
        ));
        assert!(matches!(
            parse_payment_status("settled"),
            Err(OrderError::InvalidPaymentStatus(_))
        ));
    }

    #[test]
    fn generated_refs_are_timestamped_and_unique() {
        let refs: HashSet<String> = (0..64).map(|_| generate_order_ref()).collect();
        assert_eq!(refs.len(), 64);

        let sample = refs.iter().next().expect("one ref");
        let (stamp, suffix) = sample.split_once('-').expect("separator");
        assert_eq!(stamp.len(), 14);
        assert!(stamp.chars().all(|c| c.is_ascii_digit()));
        assert_eq!(suffix.len(), 32);
    }
}
