//! User route handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use taskdeck_core::board::{self, Board};
use taskdeck_core::user::{self, NewUser, User};

use crate::error::{ApiError, ApiResult};
use crate::extract::CurrentUser;
use crate::state::AppState;

pub async fn create_user(
    State(state): State<AppState>,
    Json(req): Json<NewUser>,
) -> ApiResult<(StatusCode, Json<User>)> {
    let user = user::register_user(state.store.as_ref(), &req).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn get_user(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<User>> {
    Ok(Json(user::get_user(state.store.as_ref(), &id).await?))
}

/// Callers may only list their own boards.
pub async fn list_user_boards(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<Board>>> {
    if caller.id != id {
        return Err(ApiError::forbidden("cannot list another user's boards"));
    }
    Ok(Json(board::list_boards_for_user(state.store.as_ref(), &id).await?))
}
