use axum::{Json, Router, extract::State, http::StatusCode, routing::post};

use crate::{
    dto::auth::{
        AdminLoginRequest, AdminLoginResponse, GoogleLoginRequest, GuestSessionResponse,
        LoginResponse,
    },
    error::AppResult,
    response::ApiResponse,
    services::auth_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/guest", post(guest_session))
        .route("/google", post(google_login))
        .route("/google-admin", post(admin_login))
}

#[utoipa::path(
    post,
    path = "/api/auth/guest",
    responses(
        (status = 201, description = "Guest session with an empty cart", body = ApiResponse<GuestSessionResponse>)
    ),
    tag = "Auth"
)]
pub async fn guest_session(
    State(state): State<AppState>,
) -> AppResult<(StatusCode, Json<ApiResponse<GuestSessionResponse>>)> {
    let resp = auth_service::create_guest_session(&state).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    post,
    path = "/api/auth/google",
    request_body = GoogleLoginRequest,
    responses(
        (status = 200, description = "Shopper session, with the guest cart merge outcome", body = ApiResponse<LoginResponse>),
        (status = 401, description = "Identity token rejected")
    ),
    tag = "Auth"
)]
pub async fn google_login(
    State(state): State<AppState>,
    Json(payload): Json<GoogleLoginRequest>,
) -> AppResult<Json<ApiResponse<LoginResponse>>> {
    let resp = auth_service::google_login(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/auth/google-admin",
    request_body = AdminLoginRequest,
    responses(
        (status = 200, description = "Admin session", body = ApiResponse<AdminLoginResponse>),
        (status = 401, description = "Identity token rejected"),
        (status = 403, description = "Admin not approved")
    ),
    tag = "Auth"
)]
pub async fn admin_login(
    State(state): State<AppState>,
    Json(payload): Json<AdminLoginRequest>,
) -> AppResult<Json<ApiResponse<AdminLoginResponse>>> {
    let resp = auth_service::admin_login(&state, payload).await?;
    Ok(Json(resp))
}
