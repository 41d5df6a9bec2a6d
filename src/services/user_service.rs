use sea_orm::sea_query::{Expr, extension::postgres::PgExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};

use crate::{
    audit::audit_or_warn,
    dto::users::{AdminList, UpdateProfileRequest, UserList, UserProfile},
    entity::{
        admins::{Column as AdminCol, Entity as Admins},
        orders::{Column as OrderCol, Entity as Orders},
        users::{ActiveModel as UserActive, Column as UserCol, Entity as Users},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, Role, ensure_admin, ensure_role},
    models::{Admin, Order, User},
    response::{ApiResponse, Meta},
    routes::params::{AdminListQuery, UserListQuery},
    services::{
        cart_service::{CartOwner, load_cart},
        product_service::contains_pattern,
    },
    state::AppState,
};

/// The caller's profile with their cart and order history.
pub async fn get_profile(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<UserProfile>> {
    ensure_role(user, Role::User)?;
    let model = Users::find_by_id(user.user_id.as_str())
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let cart = load_cart(state, &CartOwner::User(model.id.clone())).await?;
    let orders = Orders::find()
        .filter(OrderCol::UserId.eq(model.id.as_str()))
        .order_by_desc(OrderCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Order::from)
        .collect();

    Ok(ApiResponse::success(
        "OK",
        UserProfile {
            user: model.into(),
            cart,
            orders,
        },
        Some(Meta::empty()),
    ))
}

pub async fn update_profile(
    state: &AppState,
    user: &AuthUser,
    payload: UpdateProfileRequest,
) -> AppResult<ApiResponse<User>> {
    ensure_role(user, Role::User)?;
    let model = Users::find_by_id(user.user_id.as_str())
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut active: UserActive = model.clone().into();
    let mut changed = false;
    if let Some(name) = payload.name {
        active.name = Set(name.trim().to_string());
        changed = true;
    }
    if let Some(phone) = payload.phone {
        active.phone = Set(phone.trim().to_string());
        changed = true;
    }
    if let Some(picture) = payload.picture {
        active.picture = Set(picture);
        changed = true;
    }
    if let Some(address) = payload.address {
        active.street = Set(address.street);
        active.city = Set(address.city);
        active.state = Set(address.state);
        active.postal_code = Set(address.postal_code);
        active.country = Set(address.country);
        changed = true;
    }

    let updated = if changed {
        let updated = active.update(&state.orm).await?;
        audit_or_warn(&state.orm, Some(&user.user_id), "profile_update", Some("users"), None).await;
        updated
    } else {
        model
    };

    Ok(ApiResponse::success("Profile updated", updated.into(), None))
}

pub async fn list_users(
    state: &AppState,
    admin: &AuthUser,
    query: UserListQuery,
) -> AppResult<ApiResponse<UserList>> {
    ensure_admin(admin)?;
    let (page, limit, offset) = query.pagination().normalize();

    let mut condition = Condition::all();
    if let Some(search) = query.q.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = contains_pattern(search);
        condition = condition.add(
            Condition::any()
                .add(Expr::col(UserCol::Email).ilike(pattern.clone()))
                .add(Expr::col(UserCol::Name).ilike(pattern)),
        );
    }

    let finder = Users::find()
        .filter(condition)
        .order_by_desc(UserCol::CreatedAt);
    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(User::from)
        .collect();

    Ok(ApiResponse::success(
        "Users",
        UserList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn list_admins(
    state: &AppState,
    admin: &AuthUser,
    query: AdminListQuery,
) -> AppResult<ApiResponse<AdminList>> {
    ensure_admin(admin)?;
    let (page, limit, offset) = query.pagination().normalize();

    let mut finder = Admins::find().order_by_desc(AdminCol::CreatedAt);
    if let Some(approved) = query.approved {
        finder = finder.filter(AdminCol::Approved.eq(approved));
    }
    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Admin::from)
        .collect();

    Ok(ApiResponse::success(
        "Admins",
        AdminList { items },
        Some(Meta::new(page, limit, total)),
    ))
}
