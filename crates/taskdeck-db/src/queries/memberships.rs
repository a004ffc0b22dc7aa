//! Board membership queries (Redis).

use redis::AsyncCommands;

use super::{members_key, user_boards_key};
use crate::client::{DbError, DbResult, RedisPool};
use crate::rows::MembershipRow;

pub async fn get_membership(
    pool: &RedisPool,
    board_id: &str,
    user_id: &str,
) -> DbResult<Option<MembershipRow>> {
    let mut conn = pool.clone();
    let json: Option<String> = conn.hget(members_key(board_id), user_id).await?;
    match json {
        Some(j) => Ok(Some(serde_json::from_str(&j)?)),
        None => Ok(None),
    }
}

/// Insert a membership. HSETNX keeps the (board, user) pair unique even when
/// two writers race past the caller's existence probe.
pub async fn insert_membership(pool: &RedisPool, row: &MembershipRow) -> DbResult<()> {
    let mut conn = pool.clone();
    let inserted: bool = conn
        .hset_nx(
            members_key(&row.board_id),
            &row.user_id,
            serde_json::to_string(row)?,
        )
        .await?;
    if !inserted {
        return Err(DbError::Duplicate(format!(
            "membership {}/{}",
            row.board_id, row.user_id
        )));
    }
    conn.sadd::<_, _, ()>(user_boards_key(&row.user_id), &row.board_id)
        .await?;
    Ok(())
}

pub async fn update_membership(pool: &RedisPool, row: &MembershipRow) -> DbResult<()> {
    let mut conn = pool.clone();
    let key = members_key(&row.board_id);
    let exists: bool = conn.hexists(&key, &row.user_id).await?;
    if !exists {
        return Err(DbError::NotFound(format!(
            "membership {}/{}",
            row.board_id, row.user_id
        )));
    }
    conn.hset::<_, _, _, ()>(&key, &row.user_id, serde_json::to_string(row)?)
        .await?;
    Ok(())
}

pub async fn delete_membership(pool: &RedisPool, board_id: &str, user_id: &str) -> DbResult<bool> {
    let mut conn = pool.clone();
    let removed: i64 = conn.hdel(members_key(board_id), user_id).await?;
    conn.srem::<_, _, ()>(user_boards_key(user_id), board_id)
        .await?;
    Ok(removed > 0)
}

pub async fn list_memberships(pool: &RedisPool, board_id: &str) -> DbResult<Vec<MembershipRow>> {
    let mut conn = pool.clone();
    let values: Vec<String> = conn.hvals(members_key(board_id)).await?;
    let mut rows = Vec::with_capacity(values.len());
    for json in values {
        rows.push(serde_json::from_str::<MembershipRow>(&json)?);
    }
    rows.sort_by(|a, b| {
        a.created_at
            .cmp(&b.created_at)
            .then_with(|| a.user_id.cmp(&b.user_id))
    });
    Ok(rows)
}
