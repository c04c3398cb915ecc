//! Authentication and user REST API routes

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use std::sync::Arc;

use crate::error::CoreError;
use crate::state::AppState;

use super::middleware::{require_identity, REFRESH_TOKEN_HEADER};
use super::models::{
    AccessClaims, EditProfileRequest, ForgotPasswordRequest, LoginRequest, MessageResponse,
    RefreshResponse, RegisterRequest, ResetPasswordRequest, TokenPair,
};

/// Routes under `/auth`: the session lifecycle.
pub fn auth_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/sessions", post(login).delete(logout))
        .route("/sessions/refresh", post(refresh))
        .with_state(state)
}

/// Routes under `/users`: account lifecycle and profiles.
pub fn user_router(state: Arc<AppState>) -> Router {
    let protected = Router::new()
        .route("/me", get(current_user))
        .route("/editprofile", post(edit_profile))
        .route_layer(axum::middleware::from_fn(require_identity));

    Router::new()
        .route("/", post(register))
        .route("/verify/{id}/{code}", post(verify_email))
        .route("/forgotpassword", post(forgot_password))
        .route("/resetpassword/{id}/{code}", post(reset_password))
        .route("/{id}", get(public_user))
        .merge(protected)
        .with_state(state)
}

/// POST /auth/sessions - Login with email/password
async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<TokenPair>, CoreError> {
    let pair = state.auth.login(&req.email, &req.password).await?;
    Ok(Json(pair))
}

/// POST /auth/sessions/refresh - Trade the refresh token for a new access token
async fn refresh(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<RefreshResponse>, CoreError> {
    let token = refresh_token_from(&headers)?;
    let access_token = state.auth.refresh_access_token(token).await?;
    Ok(Json(RefreshResponse { access_token }))
}

/// DELETE /auth/sessions - Revoke the session behind the refresh token
async fn logout(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<MessageResponse>, CoreError> {
    let token = refresh_token_from(&headers)?;
    state.auth.logout(token).await?;
    Ok(Json(MessageResponse {
        message: "Session successfully revoked".to_string(),
    }))
}

fn refresh_token_from(headers: &HeaderMap) -> Result<&str, CoreError> {
    headers
        .get(REFRESH_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or(CoreError::Unauthenticated)
}

/// POST /users - Register a new account
async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, CoreError> {
    state.auth.register(req).await?;
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: "User successfully created".to_string(),
        }),
    ))
}

/// POST /users/verify/{id}/{code} - Confirm an email address
async fn verify_email(
    State(state): State<Arc<AppState>>,
    Path((id, code)): Path<(String, String)>,
) -> Result<Json<MessageResponse>, CoreError> {
    state.auth.verify_email(&id, &code).await?;
    Ok(Json(MessageResponse {
        message: "User successfully verified".to_string(),
    }))
}

/// POST /users/forgotpassword - Request a password reset code
async fn forgot_password(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>, CoreError> {
    state.auth.request_password_reset(&req.email).await?;
    // The answer is the same whether or not the account exists.
    Ok(Json(MessageResponse {
        message: "If a user with that email is registered you will receive a password reset email"
            .to_string(),
    }))
}

/// POST /users/resetpassword/{id}/{code} - Set a new password with a reset code
async fn reset_password(
    State(state): State<Arc<AppState>>,
    Path((id, code)): Path<(String, String)>,
    Json(req): Json<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, CoreError> {
    state.auth.reset_password(&id, &code, &req.password).await?;
    Ok(Json(MessageResponse {
        message: "Password successfully updated".to_string(),
    }))
}

/// GET /users/me - The requester's own profile
async fn current_user(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<AccessClaims>,
) -> Result<impl IntoResponse, CoreError> {
    let profile = state.auth.get_profile(&claims.sub).await?;
    Ok(Json(profile))
}

/// GET /users/{id} - Public projection of any user
async fn public_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, CoreError> {
    let user = state.auth.get_public_user(&id).await?;
    Ok(Json(user))
}

/// POST /users/editprofile - Edit the requester's own profile
async fn edit_profile(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<AccessClaims>,
    Json(req): Json<EditProfileRequest>,
) -> Result<impl IntoResponse, CoreError> {
    let profile = state.auth.edit_profile(&claims.sub, req).await?;
    Ok(Json(profile))
}
