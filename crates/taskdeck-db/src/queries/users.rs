//! User queries (Redis).

use redis::AsyncCommands;

use super::{email_key, user_key};
use crate::client::{DbError, DbResult, RedisPool};
use crate::rows::UserRow;

pub async fn insert_user(pool: &RedisPool, row: &UserRow) -> DbResult<()> {
    let mut conn = pool.clone();
    // SETNX on the email key is the uniqueness claim.
    let claimed: bool = conn.set_nx(email_key(&row.email), &row.id).await?;
    if !claimed {
        return Err(DbError::Duplicate(format!("email {}", row.email)));
    }
    conn.hset::<_, _, _, ()>(user_key(&row.id), "data", serde_json::to_string(row)?)
        .await?;
    Ok(())
}

pub async fn get_user(pool: &RedisPool, id: &str) -> DbResult<Option<UserRow>> {
    let mut conn = pool.clone();
    let json: Option<String> = conn.hget(user_key(id), "data").await?;
    match json {
        Some(j) => Ok(Some(serde_json::from_str(&j)?)),
        None => Ok(None),
    }
}

pub async fn find_user_by_email(pool: &RedisPool, email: &str) -> DbResult<Option<UserRow>> {
    let mut conn = pool.clone();
    let id: Option<String> = conn.get(email_key(email)).await?;
    match id {
        Some(id) => get_user(pool, &id).await,
        None => Ok(None),
    }
}
