//! Board management. Creation lives in the collaboration directory because it
//! also creates the owner membership.

pub mod model;

pub use model::{Board, BoardDetails, BoardInput};

use taskdeck_db::Store;
use tracing::info;

use crate::directory::authorize;
use crate::error::{CoreError, CoreResult};
use crate::realtime::Hub;
use crate::role::Permission;
use crate::task::Task;

/// Get a board with its tasks and the caller's role. Requires `View`.
pub async fn get_board(store: &dyn Store, actor_id: &str, board_id: &str) -> CoreResult<BoardDetails> {
    let membership = authorize(store, board_id, actor_id, Permission::View).await?;
    let board = load_board(store, board_id).await?;
    let tasks = store
        .list_tasks(board_id)
        .await?
        .into_iter()
        .map(Task::from_row)
        .collect();

    Ok(BoardDetails {
        board,
        role: membership.role,
        tasks,
    })
}

/// Boards the user belongs to, oldest first.
pub async fn list_boards_for_user(store: &dyn Store, user_id: &str) -> CoreResult<Vec<Board>> {
    if store.get_user(user_id).await?.is_none() {
        return Err(CoreError::UserNotFound(user_id.to_string()));
    }
    let rows = store.list_boards_for_user(user_id).await?;
    Ok(rows.into_iter().map(Board::from_row).collect())
}

/// Replace a board's title and description. Requires `Edit`.
pub async fn update_board(
    store: &dyn Store,
    actor_id: &str,
    board_id: &str,
    input: &BoardInput,
) -> CoreResult<Board> {
    authorize(store, board_id, actor_id, Permission::Edit).await?;
    input.validate()?;

    let mut board = load_board(store, board_id).await?;
    board.title = input.title.trim().to_string();
    board.description = input.description.clone();
    board.updated_at = chrono::Utc::now().to_rfc3339();
    store.update_board(&board.to_row()).await?;

    info!(board_id = %board_id, "Board updated");
    Ok(board)
}

/// Delete a board with its memberships and tasks, closing every live
/// connection to it. Requires `Delete`.
pub async fn delete_board(store: &dyn Store, hub: &Hub, actor_id: &str, board_id: &str) -> CoreResult<()> {
    authorize(store, board_id, actor_id, Permission::Delete).await?;
    if !store.delete_board(board_id).await? {
        return Err(CoreError::BoardNotFound(board_id.to_string()));
    }
    hub.close_board(board_id);
    info!(board_id = %board_id, actor_id = %actor_id, "Board deleted");
    Ok(())
}

async fn load_board(store: &dyn Store, board_id: &str) -> CoreResult<Board> {
    store
        .get_board(board_id)
        .await?
        .map(Board::from_row)
        .ok_or_else(|| CoreError::BoardNotFound(board_id.to_string()))
}
