//! The persistence contract consumed by the domain layer.

use std::sync::Arc;

use async_trait::async_trait;

use crate::client::DbResult;
use crate::rows::{BoardRow, MembershipRow, TaskRow, UserRow};

/// CRUD-style storage for every entity.
///
/// Lookups return `Ok(None)` for missing rows so callers can probe for
/// existence and pick their own error. Inserts that would violate a key
/// (email, board id, membership pair) fail with [`DbError::Duplicate`].
///
/// [`DbError::Duplicate`]: crate::DbError::Duplicate
#[async_trait]
pub trait Store: Send + Sync + 'static {
    async fn insert_user(&self, row: &UserRow) -> DbResult<()>;
    async fn get_user(&self, id: &str) -> DbResult<Option<UserRow>>;
    async fn find_user_by_email(&self, email: &str) -> DbResult<Option<UserRow>>;

    /// Insert a board and its first membership as one atomic write.
    /// Either both rows exist afterwards or neither does.
    async fn create_board_with_owner(&self, board: &BoardRow, owner: &MembershipRow)
        -> DbResult<()>;
    async fn get_board(&self, id: &str) -> DbResult<Option<BoardRow>>;
    async fn update_board(&self, row: &BoardRow) -> DbResult<()>;
    /// Delete a board together with its memberships and tasks.
    /// Returns `false` when the board did not exist.
    async fn delete_board(&self, id: &str) -> DbResult<bool>;
    async fn list_boards_for_user(&self, user_id: &str) -> DbResult<Vec<BoardRow>>;

    async fn get_membership(&self, board_id: &str, user_id: &str)
        -> DbResult<Option<MembershipRow>>;
    async fn insert_membership(&self, row: &MembershipRow) -> DbResult<()>;
    async fn update_membership(&self, row: &MembershipRow) -> DbResult<()>;
    async fn delete_membership(&self, board_id: &str, user_id: &str) -> DbResult<bool>;
    /// Memberships of a board, oldest first.
    async fn list_memberships(&self, board_id: &str) -> DbResult<Vec<MembershipRow>>;

    async fn insert_task(&self, row: &TaskRow) -> DbResult<()>;
    async fn get_task(&self, id: &str) -> DbResult<Option<TaskRow>>;
    async fn update_task(&self, row: &TaskRow) -> DbResult<()>;
    async fn delete_task(&self, id: &str) -> DbResult<bool>;
    /// Tasks of a board, oldest first.
    async fn list_tasks(&self, board_id: &str) -> DbResult<Vec<TaskRow>>;
}

/// Store handle shared across request handlers.
pub type SharedStore = Arc<dyn Store>;
