//! Board route handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use taskdeck_core::board::{self, Board, BoardDetails, BoardInput};
use taskdeck_core::directory::{self, CreatedBoard};

use crate::error::ApiResult;
use crate::extract::CurrentUser;
use crate::state::AppState;

/// The caller becomes the new board's owner.
pub async fn create_board(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Json(input): Json<BoardInput>,
) -> ApiResult<(StatusCode, Json<CreatedBoard>)> {
    let created = directory::create_board_with_owner(state.store.as_ref(), &input, &caller.id).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn get_board(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<BoardDetails>> {
    Ok(Json(board::get_board(state.store.as_ref(), &caller.id, &id).await?))
}

pub async fn update_board(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Path(id): Path<String>,
    Json(req): Json<BoardInput>,
) -> ApiResult<Json<Board>> {
    Ok(Json(
        board::update_board(state.store.as_ref(), &caller.id, &id, &req).await?,
    ))
}

pub async fn delete_board(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    board::delete_board(state.store.as_ref(), &state.hub, &caller.id, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
