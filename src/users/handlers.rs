use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    error::AppError,
    posts::{
        dto::{PostRequest, PostResponse},
        repo_types::NewPost,
    },
    state::AppState,
    users::{
        dto::{Pagination, UserRequest, UserResponse, UserUpdate},
        repo_types::{NewUser, User, UserChanges},
    },
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/user/", get(list_users).post(create_user))
        .route(
            "/user/:username",
            get(get_user).patch(update_user).delete(delete_user),
        )
        .route(
            "/user/:username/posts",
            get(list_user_posts).post(create_user_post),
        )
}

async fn load_user(state: &AppState, username: &str) -> Result<User, AppError> {
    state
        .users
        .find_by_username(username)
        .await?
        .ok_or(AppError::NotFound)
}

#[instrument(skip(state, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    Json(payload): Json<UserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    let new_user = NewUser::from_request(payload).inspect_err(|e| {
        warn!(error = %e, "rejected user request");
    })?;

    let user = state.users.create(new_user).await.inspect_err(|e| {
        warn!(error = %e, "create user failed");
    })?;

    info!(user_id = user.id, username = %user.username, "user created");
    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

#[instrument(skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
    Query(p): Query<Pagination>,
) -> Result<Json<Vec<UserResponse>>, AppError> {
    if p.limit < 0 || p.offset < 0 {
        return Err(AppError::validation("limit and offset must be non-negative"));
    }
    let users = state.users.list(p.limit, p.offset).await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<UserResponse>, AppError> {
    let user = load_user(&state, &username).await?;
    Ok(Json(UserResponse::from(user)))
}

#[instrument(skip(state, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Json(payload): Json<UserUpdate>,
) -> Result<Json<UserResponse>, AppError> {
    let user = load_user(&state, &username).await?;
    let changes = UserChanges::from_update(payload)?;
    if changes.is_empty() {
        return Ok(Json(UserResponse::from(user)));
    }

    let updated = state.users.update(user.id, changes).await.inspect_err(|e| {
        warn!(error = %e, user_id = user.id, "update user failed");
    })?;

    info!(user_id = updated.id, "user updated");
    Ok(Json(UserResponse::from(updated)))
}

#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<StatusCode, AppError> {
    let user = load_user(&state, &username).await?;
    state.users.delete(user.id).await.inspect_err(|e| {
        warn!(error = %e, user_id = user.id, "delete user failed");
    })?;

    info!(user_id = user.id, "user deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn list_user_posts(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<Vec<PostResponse>>, AppError> {
    let user = load_user(&state, &username).await?;
    let posts = state.posts.list_by_user(user.id).await?;
    Ok(Json(posts.into_iter().map(PostResponse::from).collect()))
}

#[instrument(skip(state, payload))]
pub async fn create_user_post(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Json(payload): Json<PostRequest>,
) -> Result<(StatusCode, Json<PostResponse>), AppError> {
    if payload.text.trim().is_empty() {
        return Err(AppError::validation("Post text must not be empty"));
    }
    let user = load_user(&state, &username).await?;
    let post = state
        .posts
        .create(NewPost {
            text: payload.text,
            user_id: user.id,
            parent_id: payload.parent_id,
        })
        .await?;

    info!(post_id = post.id, user_id = user.id, "post created");
    Ok((StatusCode::CREATED, Json(PostResponse::from(post))))
}
