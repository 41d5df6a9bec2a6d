use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use rand::Rng;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::{OnConflict, Query};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::audit_or_warn,
    dto::auth::{
        AdminLoginRequest, AdminLoginResponse, Claims, GoogleLoginRequest, GuestSessionResponse,
        LoginResponse,
    },
    entity::{
        admins::{ActiveModel as AdminActive, Column as AdminCol, Entity as Admins},
        guest_carts::{Column as GuestCartCol, Entity as GuestCarts},
        guest_users::{
            ActiveModel as GuestUserActive, Column as GuestUserCol, Entity as GuestUsers,
        },
        users::{ActiveModel as UserActive, Column as UserCol, Entity as Users},
    },
    error::{AppError, AppResult, conflict_on_unique},
    middleware::auth::Role,
    models::{Admin, User},
    response::{ApiResponse, Meta},
    services::{
        cart_service::{ensure_guest_cart, ensure_user_cart},
        merge_service::merge_guest_cart,
    },
    state::AppState,
};

/// Sign a session token for `subject` expiring at `expires_at`.
pub fn issue_session(
    secret: &str,
    subject: &str,
    role: Role,
    expires_at: DateTime<Utc>,
) -> AppResult<String> {
    let claims = Claims {
        sub: subject.to_owned(),
        role: role.to_string(),
        exp: expires_at.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

pub fn new_guest_id() -> String {
    let bytes: [u8; 16] = rand::thread_rng().r#gen();
    format!("guest_{}", hex::encode(bytes))
}

fn expiry(hours: i64) -> AppResult<DateTime<Utc>> {
    Utc::now()
        .checked_add_signed(Duration::hours(hours))
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))
}

pub async fn create_guest_session(state: &AppState) -> AppResult<ApiResponse<GuestSessionResponse>> {
    let guest_id = new_guest_id();
    let expires_at = expiry(state.config.guest_ttl_hours)?;

    GuestUserActive {
        id: Set(guest_id.clone()),
        expires_at: Set(expires_at.into()),
    }
    .insert(&state.orm)
    .await?;
    ensure_guest_cart(&state.orm, &guest_id).await?;

    let token = issue_session(&state.config.jwt_secret, &guest_id, Role::Guest, expires_at)?;
    tracing::info!(guest_id = %guest_id, "guest session created");

    Ok(ApiResponse::success(
        "Guest session created",
        GuestSessionResponse {
            token,
            guest_id,
            expires_at,
        },
        Some(Meta::empty()),
    ))
}

/// Delete guests whose session expired before `now`, together with their
/// carts. Returns the number of guests removed.
pub async fn purge_expired_guests<C>(db: &C, now: DateTime<Utc>) -> Result<u64, DbErr>
where
    C: ConnectionTrait + TransactionTrait,
{
    let txn = db.begin().await?;
    let expired = Query::select()
        .column(GuestUserCol::Id)
        .from(GuestUsers)
        .and_where(GuestUserCol::ExpiresAt.lte(now))
        .to_owned();

    let carts = GuestCarts::delete_many()
        .filter(GuestCartCol::GuestId.in_subquery(expired))
        .exec(&txn)
        .await?
        .rows_affected;
    let guests = GuestUsers::delete_many()
        .filter(GuestUserCol::ExpiresAt.lte(now))
        .exec(&txn)
        .await?
        .rows_affected;
    txn.commit().await?;

    if guests > 0 {
        tracing::info!(guests, carts, "expired guest sessions purged");
    }
    Ok(guests)
}

/// Sign a shopper in with an identity-provider token. A supplied guest id has
/// its cart merged; a failed merge is reported but does not fail the login.
pub async fn google_login(
    state: &AppState,
    payload: GoogleLoginRequest,
) -> AppResult<ApiResponse<LoginResponse>> {
    let identity = state.identity.verify(&payload.id_token).await?;

    Users::insert(UserActive {
        id: Set(identity.subject_id.clone()),
        email: Set(identity.email.clone()),
        name: Set(identity.display_name.clone()),
        picture: Set(identity.picture.clone()),
        provider: Set("google".to_string()),
        ..Default::default()
    })
    .on_conflict(
        OnConflict::column(UserCol::Id)
            .update_columns([UserCol::Email, UserCol::Name, UserCol::Picture])
            .to_owned(),
    )
    .exec_without_returning(&state.orm)
    .await
    .map_err(|err| conflict_on_unique(err, "email is linked to another account"))?;

    let user = Users::find_by_id(identity.subject_id.as_str())
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    ensure_user_cart(&state.orm, &user.id).await?;

    let merge = match payload.guest_id.as_deref().filter(|g| !g.is_empty()) {
        Some(guest_id) => Some(merge_guest_cart(&state.orm, guest_id, &user.id).await),
        None => None,
    };

    let expires_at = expiry(state.config.session_ttl_hours)?;
    let token = issue_session(&state.config.jwt_secret, &user.id, Role::User, expires_at)?;

    audit_or_warn(
        &state.orm,
        Some(&user.id),
        "user_login",
        Some("users"),
        Some(serde_json::json!({ "merge": merge })),
    )
    .await;

    Ok(ApiResponse::success(
        "Logged in",
        LoginResponse {
            token,
            user: User::from(user),
            merge,
        },
        Some(Meta::empty()),
    ))
}

/// Admin sign-in. Unknown admins are recorded unapproved and refused until a
/// super-admin approves them.
pub async fn admin_login(
    state: &AppState,
    payload: AdminLoginRequest,
) -> AppResult<ApiResponse<AdminLoginResponse>> {
    let identity = state.identity.verify(&payload.id_token).await?;

    let existing = Admins::find()
        .filter(AdminCol::Email.eq(identity.email.as_str()))
        .one(&state.orm)
        .await?;

    let admin = match existing {
        Some(admin) => admin,
        None => {
            let pending = AdminActive {
                id: Set(Uuid::new_v4()),
                email: Set(identity.email.clone()),
                name: Set(identity.display_name.clone()),
                picture: Set(identity.picture.clone()),
                approved: Set(false),
                created_at: NotSet,
            }
            .insert(&state.orm)
            .await
            .map_err(|err| conflict_on_unique(err, "admin already registered"))?;
            tracing::info!(email = %pending.email, "admin registration pending approval");
            return Err(AppError::Forbidden);
        }
    };

    if !admin.approved {
        tracing::info!(email = %admin.email, "unapproved admin sign-in refused");
        return Err(AppError::Forbidden);
    }

    let mut active: AdminActive = admin.into();
    active.name = Set(identity.display_name);
    active.picture = Set(identity.picture);
    let admin = active.update(&state.orm).await?;

    let expires_at = expiry(state.config.session_ttl_hours)?;
    let subject = admin.id.to_string();
    let token = issue_session(&state.config.jwt_secret, &subject, Role::Admin, expires_at)?;

    audit_or_warn(
        &state.orm,
        Some(&subject),
        "admin_login",
        Some("admins"),
        None,
    )
    .await;

    Ok(ApiResponse::success(
        "Logged in",
        AdminLoginResponse {
            token,
            admin: Admin::from(admin),
        },
        Some(Meta::empty()),
    ))
}
