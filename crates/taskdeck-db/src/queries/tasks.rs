//! Task queries (Redis).

use redis::AsyncCommands;

use super::{board_tasks_key, task_key, timestamp_score};
use crate::client::{DbError, DbResult, RedisPool};
use crate::rows::TaskRow;

pub async fn insert_task(pool: &RedisPool, row: &TaskRow) -> DbResult<()> {
    let mut conn = pool.clone();
    let json = serde_json::to_string(row)?;
    let _: () = redis::pipe()
        .atomic()
        .hset(task_key(&row.id), "data", json)
        .ignore()
        .zadd(
            board_tasks_key(&row.board_id),
            &row.id,
            timestamp_score(&row.created_at),
        )
        .ignore()
        .query_async(&mut conn)
        .await?;
    Ok(())
}

pub async fn get_task(pool: &RedisPool, id: &str) -> DbResult<Option<TaskRow>> {
    let mut conn = pool.clone();
    let json: Option<String> = conn.hget(task_key(id), "data").await?;
    match json {
        Some(j) => Ok(Some(serde_json::from_str(&j)?)),
        None => Ok(None),
    }
}

pub async fn update_task(pool: &RedisPool, row: &TaskRow) -> DbResult<()> {
    let mut conn = pool.clone();
    let key = task_key(&row.id);
    let exists: bool = conn.exists(&key).await?;
    if !exists {
        return Err(DbError::NotFound(format!("task {}", row.id)));
    }
    conn.hset::<_, _, _, ()>(&key, "data", serde_json::to_string(row)?)
        .await?;
    Ok(())
}

pub async fn delete_task(pool: &RedisPool, id: &str) -> DbResult<bool> {
    let Some(row) = get_task(pool, id).await? else {
        return Ok(false);
    };
    let mut conn = pool.clone();
    let _: () = redis::pipe()
        .atomic()
        .del(task_key(id))
        .ignore()
        .zrem(board_tasks_key(&row.board_id), id)
        .ignore()
        .query_async(&mut conn)
        .await?;
    Ok(true)
}

pub async fn list_tasks(pool: &RedisPool, board_id: &str) -> DbResult<Vec<TaskRow>> {
    let mut conn = pool.clone();
    let ids: Vec<String> = conn.zrange(board_tasks_key(board_id), 0, -1).await?;
    let mut tasks = Vec::with_capacity(ids.len());
    for id in ids {
        if let Some(row) = get_task(pool, &id).await? {
            tasks.push(row);
        }
    }
    Ok(tasks)
}
