//! Redis connection management and the Redis-backed [`Store`].

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use thiserror::Error;

use crate::queries::{boards, memberships, tasks, users};
use crate::rows::{BoardRow, MembershipRow, TaskRow, UserRow};
use crate::store::Store;

/// Storage error types.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("Redis connection error: {0}")]
    Connection(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Duplicate key: {0}")]
    Duplicate(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

/// Result type for storage operations.
pub type DbResult<T> = Result<T, DbError>;

/// Redis connection pool. ConnectionManager multiplexes internally and is
/// Clone, so callers clone it to get a mutable handle for each operation.
pub type RedisPool = ConnectionManager;

/// Initialize a Redis connection pool from a URL.
///
/// Example URL: `redis://127.0.0.1:6379`
pub async fn init_pool(redis_url: &str) -> DbResult<RedisPool> {
    let client = redis::Client::open(redis_url)?;
    let manager = ConnectionManager::new(client).await?;
    tracing::info!(redis_url = %redis_url, "Connected to Redis");
    Ok(manager)
}

/// [`Store`] implementation over a Redis connection pool.
#[derive(Clone)]
pub struct RedisStore {
    pool: RedisPool,
}

impl RedisStore {
    pub fn new(pool: RedisPool) -> Self {
        Self { pool }
    }

    /// Connect to `redis_url` and wrap the pool.
    pub async fn connect(redis_url: &str) -> DbResult<Self> {
        Ok(Self::new(init_pool(redis_url).await?))
    }
}

#[async_trait]
impl Store for RedisStore {
    async fn insert_user(&self, row: &UserRow) -> DbResult<()> {
        users::insert_user(&self.pool, row).await
    }

    async fn get_user(&self, id: &str) -> DbResult<Option<UserRow>> {
        users::get_user(&self.pool, id).await
    }

    async fn find_user_by_email(&self, email: &str) -> DbResult<Option<UserRow>> {
        users::find_user_by_email(&self.pool, email).await
    }

    async fn create_board_with_owner(
        &self,
        board: &BoardRow,
        owner: &MembershipRow,
    ) -> DbResult<()> {
        boards::create_board_with_owner(&self.pool, board, owner).await
    }

    async fn get_board(&self, id: &str) -> DbResult<Option<BoardRow>> {
        boards::get_board(&self.pool, id).await
    }

    async fn update_board(&self, row: &BoardRow) -> DbResult<()> {
        boards::update_board(&self.pool, row).await
    }

    async fn delete_board(&self, id: &str) -> DbResult<bool> {
        boards::delete_board(&self.pool, id).await
    }

    async fn list_boards_for_user(&self, user_id: &str) -> DbResult<Vec<BoardRow>> {
        boards::list_boards_for_user(&self.pool, user_id).await
    }

    async fn get_membership(
        &self,
        board_id: &str,
        user_id: &str,
    ) -> DbResult<Option<MembershipRow>> {
        memberships::get_membership(&self.pool, board_id, user_id).await
    }

    async fn insert_membership(&self, row: &MembershipRow) -> DbResult<()> {
        memberships::insert_membership(&self.pool, row).await
    }

    async fn update_membership(&self, row: &MembershipRow) -> DbResult<()> {
        memberships::update_membership(&self.pool, row).await
    }

    async fn delete_membership(&self, board_id: &str, user_id: &str) -> DbResult<bool> {
        memberships::delete_membership(&self.pool, board_id, user_id).await
    }

    async fn list_memberships(&self, board_id: &str) -> DbResult<Vec<MembershipRow>> {
        memberships::list_memberships(&self.pool, board_id).await
    }

    async fn insert_task(&self, row: &TaskRow) -> DbResult<()> {
        tasks::insert_task(&self.pool, row).await
    }

    async fn get_task(&self, id: &str) -> DbResult<Option<TaskRow>> {
        tasks::get_task(&self.pool, id).await
    }

    async fn update_task(&self, row: &TaskRow) -> DbResult<()> {
        tasks::update_task(&self.pool, row).await
    }

    async fn delete_task(&self, id: &str) -> DbResult<bool> {
        tasks::delete_task(&self.pool, id).await
    }

    async fn list_tasks(&self, board_id: &str) -> DbResult<Vec<TaskRow>> {
        tasks::list_tasks(&self.pool, board_id).await
    }
}
