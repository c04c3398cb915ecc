//! Post REST API routes

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::{delete, get, post},
    Extension, Json, Router,
};
use std::sync::Arc;

use crate::auth::middleware::require_identity;
use crate::auth::models::{AccessClaims, MessageResponse};
use crate::error::CoreError;
use crate::state::AppState;

use super::models::{PostContent, PostCreatedResponse, SaveToggleResponse, UserIdRequest};

/// Routes under `/posts`.
pub fn post_router(state: Arc<AppState>) -> Router {
    let protected = Router::new()
        .route("/", post(create_post))
        .route("/edit/{id}", post(edit_post))
        .route("/{id}", delete(delete_post))
        .route("/save/{id}", post(toggle_save))
        .route("/owned", post(owned_posts))
        .route("/saved", post(saved_posts))
        .route_layer(axum::middleware::from_fn(require_identity));

    Router::new()
        .route("/home", get(home_posts))
        .route("/{id}", get(get_post))
        .merge(protected)
        .with_state(state)
}

/// POST /posts - Create a post owned by the requester
async fn create_post(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<AccessClaims>,
    Json(content): Json<PostContent>,
) -> Result<Json<PostCreatedResponse>, CoreError> {
    let post = state.posts.create_post(&claims.sub, content).await?;
    Ok(Json(PostCreatedResponse {
        message: "Post successfully created !".to_string(),
        post_id: post.id,
    }))
}

/// GET /posts/{id} - Post detail view; works with or without identity
async fn get_post(
    State(state): State<Arc<AppState>>,
    claims: Option<Extension<AccessClaims>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, CoreError> {
    let requester = claims.as_ref().map(|Extension(c)| c.sub.as_str());
    let view = state.posts.get_post(&id, requester).await?;
    Ok(Json(view))
}

/// POST /posts/edit/{id} - Owner-only content edit
async fn edit_post(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<AccessClaims>,
    Path(id): Path<String>,
    Json(content): Json<PostContent>,
) -> Result<Json<MessageResponse>, CoreError> {
    state.posts.edit_post(&claims.sub, &id, content).await?;
    Ok(Json(MessageResponse {
        message: "Post successfully updated !".to_string(),
    }))
}

/// DELETE /posts/{id} - Owner-only deletion
async fn delete_post(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<AccessClaims>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, CoreError> {
    state.posts.delete_post(&claims.sub, &id).await?;
    Ok(Json(MessageResponse {
        message: "Post successfully deleted !".to_string(),
    }))
}

/// POST /posts/save/{id} - Toggle the requester's bookmark on a post
async fn toggle_save(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<AccessClaims>,
    Path(id): Path<String>,
) -> Result<Json<SaveToggleResponse>, CoreError> {
    let saved = state.posts.toggle_saved(&claims.sub, &id).await?;
    let message = if saved {
        "Post successfully saved !"
    } else {
        "Post successfully unsaved !"
    };
    Ok(Json(SaveToggleResponse {
        saved,
        message: message.to_string(),
    }))
}

/// GET /posts/home - Public feed of all posts
async fn home_posts(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, CoreError> {
    let posts = state.posts.home_posts().await?;
    Ok(Json(posts))
}

/// POST /posts/owned - The requester's own posts
async fn owned_posts(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<AccessClaims>,
    Json(req): Json<UserIdRequest>,
) -> Result<impl IntoResponse, CoreError> {
    if claims.sub != req.id {
        return Err(CoreError::Forbidden);
    }
    let posts = state.posts.owned_posts(&req.id).await?;
    Ok(Json(posts))
}

/// POST /posts/saved - The requester's bookmarked posts
async fn saved_posts(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<AccessClaims>,
    Json(req): Json<UserIdRequest>,
) -> Result<impl IntoResponse, CoreError> {
    if claims.sub != req.id {
        return Err(CoreError::Forbidden);
    }
    let posts = state.posts.saved_posts(&req.id).await?;
    Ok(Json(posts))
}
