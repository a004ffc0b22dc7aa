//! Collaborator route handlers.
//!
//! Reading memberships needs `View` on the board; adding, re-roling and
//! removing collaborators needs `Delete`, which only owners hold.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use taskdeck_core::directory::{self, BoardMembership};
use taskdeck_core::{CoreError, Permission, Role};
use taskdeck_db::Store;

use crate::error::{ApiError, ApiResult};
use crate::extract::CurrentUser;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct AddCollaboratorRequest {
    pub email: String,
    pub role: String,
}

#[derive(Deserialize)]
pub struct ChangeRoleRequest {
    pub role: String,
}

/// Role strings are checked here so unknown values never reach the directory.
fn parse_role(value: &str) -> ApiResult<Role> {
    Role::parse(value).ok_or_else(|| {
        ApiError::bad_request(format!(
            "invalid role '{}': expected owner, editor or viewer",
            value
        ))
    })
}

/// Missing boards answer 404 before the caller's membership is checked.
async fn gate(store: &dyn Store, board_id: &str, caller_id: &str, permission: Permission) -> ApiResult<()> {
    if store
        .get_board(board_id)
        .await
        .map_err(CoreError::from)?
        .is_none()
    {
        return Err(CoreError::BoardNotFound(board_id.to_string()).into());
    }
    directory::authorize(store, board_id, caller_id, permission).await?;
    Ok(())
}

pub async fn add_collaborator(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Path(board_id): Path<String>,
    Json(req): Json<AddCollaboratorRequest>,
) -> ApiResult<Json<BoardMembership>> {
    let role = parse_role(&req.role)?;
    let store = state.store.as_ref();
    gate(store, &board_id, &caller.id, Permission::Delete).await?;
    let membership = directory::add_collaborator(store, &board_id, &req.email, role).await?;
    Ok(Json(membership))
}

pub async fn list_collaborators(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Path(board_id): Path<String>,
) -> ApiResult<Json<Vec<BoardMembership>>> {
    let store = state.store.as_ref();
    gate(store, &board_id, &caller.id, Permission::View).await?;
    Ok(Json(directory::list_collaborators(store, &board_id).await?))
}

pub async fn get_collaborator(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Path((board_id, user_id)): Path<(String, String)>,
) -> ApiResult<Json<BoardMembership>> {
    let store = state.store.as_ref();
    gate(store, &board_id, &caller.id, Permission::View).await?;
    match directory::check_role(store, &board_id, &user_id).await {
        Ok(membership) => Ok(Json(membership)),
        Err(e @ CoreError::NotAMember { .. }) => Err(ApiError::new(StatusCode::NOT_FOUND, e.to_string())),
        Err(e) => Err(e.into()),
    }
}

pub async fn change_role(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Path((board_id, user_id)): Path<(String, String)>,
    Json(req): Json<ChangeRoleRequest>,
) -> ApiResult<Json<BoardMembership>> {
    let role = parse_role(&req.role)?;
    let store = state.store.as_ref();
    gate(store, &board_id, &caller.id, Permission::Delete).await?;
    Ok(Json(
        directory::change_role(store, &board_id, &user_id, role).await?,
    ))
}

pub async fn remove_collaborator(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Path((board_id, user_id)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    let store = state.store.as_ref();
    gate(store, &board_id, &caller.id, Permission::Delete).await?;
    match directory::remove_collaborator(store, &state.hub, &board_id, &user_id).await {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(e @ CoreError::NotAMember { .. }) => Err(ApiError::new(StatusCode::NOT_FOUND, e.to_string())),
        Err(e) => Err(e.into()),
    }
}
