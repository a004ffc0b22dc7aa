//! Board queries (Redis).

use redis::AsyncCommands;

use super::{board_key, board_tasks_key, members_key, task_key, user_boards_key};
use crate::client::{DbError, DbResult, RedisPool};
use crate::rows::{BoardRow, MembershipRow};

/// Write the board, the owner's membership and the owner's board index in
/// one MULTI/EXEC block.
pub async fn create_board_with_owner(
    pool: &RedisPool,
    board: &BoardRow,
    owner: &MembershipRow,
) -> DbResult<()> {
    let mut conn = pool.clone();
    let key = board_key(&board.id);
    let exists: bool = conn.exists(&key).await?;
    if exists {
        return Err(DbError::Duplicate(format!("board {}", board.id)));
    }

    let board_json = serde_json::to_string(board)?;
    let owner_json = serde_json::to_string(owner)?;
    let _: () = redis::pipe()
        .atomic()
        .hset(&key, "data", board_json)
        .ignore()
        .hset(members_key(&board.id), &owner.user_id, owner_json)
        .ignore()
        .sadd(user_boards_key(&owner.user_id), &board.id)
        .ignore()
        .query_async(&mut conn)
        .await?;
    Ok(())
}

pub async fn get_board(pool: &RedisPool, id: &str) -> DbResult<Option<BoardRow>> {
    let mut conn = pool.clone();
    let json: Option<String> = conn.hget(board_key(id), "data").await?;
    match json {
        Some(j) => Ok(Some(serde_json::from_str(&j)?)),
        None => Ok(None),
    }
}

pub async fn update_board(pool: &RedisPool, row: &BoardRow) -> DbResult<()> {
    let mut conn = pool.clone();
    let key = board_key(&row.id);
    let exists: bool = conn.exists(&key).await?;
    if !exists {
        return Err(DbError::NotFound(format!("board {}", row.id)));
    }
    conn.hset::<_, _, _, ()>(&key, "data", serde_json::to_string(row)?)
        .await?;
    Ok(())
}

/// Delete a board, its membership hash, its tasks and every member's index
/// entry in one MULTI/EXEC block.
pub async fn delete_board(pool: &RedisPool, id: &str) -> DbResult<bool> {
    let mut conn = pool.clone();
    let exists: bool = conn.exists(board_key(id)).await?;
    if !exists {
        return Ok(false);
    }

    let member_ids: Vec<String> = conn.hkeys(members_key(id)).await?;
    let task_ids: Vec<String> = conn.zrange(board_tasks_key(id), 0, -1).await?;

    let mut pipe = redis::pipe();
    pipe.atomic()
        .del(board_key(id))
        .ignore()
        .del(members_key(id))
        .ignore()
        .del(board_tasks_key(id))
        .ignore();
    for user_id in &member_ids {
        pipe.srem(user_boards_key(user_id), id).ignore();
    }
    for task_id in &task_ids {
        pipe.del(task_key(task_id)).ignore();
    }
    let _: () = pipe.query_async(&mut conn).await?;

    tracing::debug!(
        board_id = %id,
        members = member_ids.len(),
        tasks = task_ids.len(),
        "Deleted board with cascade"
    );
    Ok(true)
}

pub async fn list_boards_for_user(pool: &RedisPool, user_id: &str) -> DbResult<Vec<BoardRow>> {
    let mut conn = pool.clone();
    let ids: Vec<String> = conn.smembers(user_boards_key(user_id)).await?;
    let mut boards = Vec::with_capacity(ids.len());
    for id in ids {
        if let Some(row) = get_board(pool, &id).await? {
            boards.push(row);
        }
    }
    boards.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
    Ok(boards)
}
