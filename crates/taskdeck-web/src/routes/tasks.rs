//! Task route handlers. Successful mutations are pushed to realtime
//! subscribers by the task service.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use taskdeck_core::task::{self, Task, TaskInput, TaskPatch};

use crate::error::ApiResult;
use crate::extract::CurrentUser;
use crate::state::AppState;

pub async fn create_task(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Path(board_id): Path<String>,
    Json(req): Json<TaskInput>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    let task = task::create_task(state.store.as_ref(), &state.hub, &caller.id, &board_id, &req).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn list_tasks(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Path(board_id): Path<String>,
) -> ApiResult<Json<Vec<Task>>> {
    Ok(Json(
        task::list_tasks(state.store.as_ref(), &caller.id, &board_id).await?,
    ))
}

pub async fn get_task(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Task>> {
    Ok(Json(task::get_task(state.store.as_ref(), &caller.id, &id).await?))
}

pub async fn update_task(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Path(id): Path<String>,
    Json(req): Json<TaskPatch>,
) -> ApiResult<Json<Task>> {
    Ok(Json(
        task::update_task(state.store.as_ref(), &state.hub, &caller.id, &id, &req).await?,
    ))
}

pub async fn delete_task(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    task::delete_task(state.store.as_ref(), &state.hub, &caller.id, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
