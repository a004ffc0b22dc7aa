//! In-process [`Store`] backed by hash maps behind one async lock.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::client::{DbError, DbResult};
use crate::rows::{BoardRow, MembershipRow, TaskRow, UserRow};
use crate::store::Store;

#[derive(Default)]
struct Tables {
    users: HashMap<String, UserRow>,
    boards: HashMap<String, BoardRow>,
    memberships: HashMap<(String, String), MembershipRow>,
    tasks: HashMap<String, TaskRow>,
}

/// Volatile store. Every operation takes the single table lock, so
/// multi-row writes are atomic with respect to each other.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn membership_key(board_id: &str, user_id: &str) -> (String, String) {
    (board_id.to_string(), user_id.to_string())
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_user(&self, row: &UserRow) -> DbResult<()> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.email == row.email) {
            return Err(DbError::Duplicate(format!("email {}", row.email)));
        }
        if tables.users.contains_key(&row.id) {
            return Err(DbError::Duplicate(format!("user {}", row.id)));
        }
        tables.users.insert(row.id.clone(), row.clone());
        Ok(())
    }

    async fn get_user(&self, id: &str) -> DbResult<Option<UserRow>> {
        Ok(self.tables.read().await.users.get(id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> DbResult<Option<UserRow>> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn create_board_with_owner(
        &self,
        board: &BoardRow,
        owner: &MembershipRow,
    ) -> DbResult<()> {
        let mut tables = self.tables.write().await;
        if tables.boards.contains_key(&board.id) {
            return Err(DbError::Duplicate(format!("board {}", board.id)));
        }
        tables.boards.insert(board.id.clone(), board.clone());
        tables
            .memberships
            .insert(membership_key(&owner.board_id, &owner.user_id), owner.clone());
        Ok(())
    }

    async fn get_board(&self, id: &str) -> DbResult<Option<BoardRow>> {
        Ok(self.tables.read().await.boards.get(id).cloned())
    }

    async fn update_board(&self, row: &BoardRow) -> DbResult<()> {
        let mut tables = self.tables.write().await;
        match tables.boards.get_mut(&row.id) {
            Some(existing) => {
                *existing = row.clone();
                Ok(())
            }
            None => Err(DbError::NotFound(format!("board {}", row.id))),
        }
    }

    async fn delete_board(&self, id: &str) -> DbResult<bool> {
        let mut tables = self.tables.write().await;
        if tables.boards.remove(id).is_none() {
            return Ok(false);
        }
        tables.memberships.retain(|(board_id, _), _| board_id != id);
        tables.tasks.retain(|_, task| task.board_id != id);
        Ok(true)
    }

    async fn list_boards_for_user(&self, user_id: &str) -> DbResult<Vec<BoardRow>> {
        let tables = self.tables.read().await;
        let mut boards: Vec<BoardRow> = tables
            .memberships
            .values()
            .filter(|m| m.user_id == user_id)
            .filter_map(|m| tables.boards.get(&m.board_id).cloned())
            .collect();
        boards.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(boards)
    }

    async fn get_membership(
        &self,
        board_id: &str,
        user_id: &str,
    ) -> DbResult<Option<MembershipRow>> {
        let tables = self.tables.read().await;
        Ok(tables
            .memberships
            .get(&membership_key(board_id, user_id))
            .cloned())
    }

    async fn insert_membership(&self, row: &MembershipRow) -> DbResult<()> {
        let mut tables = self.tables.write().await;
        let key = membership_key(&row.board_id, &row.user_id);
        if tables.memberships.contains_key(&key) {
            return Err(DbError::Duplicate(format!(
                "membership {}/{}",
                row.board_id, row.user_id
            )));
        }
        tables.memberships.insert(key, row.clone());
        Ok(())
    }

    async fn update_membership(&self, row: &MembershipRow) -> DbResult<()> {
        let mut tables = self.tables.write().await;
        match tables
            .memberships
            .get_mut(&membership_key(&row.board_id, &row.user_id))
        {
            Some(existing) => {
                *existing = row.clone();
                Ok(())
            }
            None => Err(DbError::NotFound(format!(
                "membership {}/{}",
                row.board_id, row.user_id
            ))),
        }
    }

    async fn delete_membership(&self, board_id: &str, user_id: &str) -> DbResult<bool> {
        let mut tables = self.tables.write().await;
        Ok(tables
            .memberships
            .remove(&membership_key(board_id, user_id))
            .is_some())
    }

    async fn list_memberships(&self, board_id: &str) -> DbResult<Vec<MembershipRow>> {
        let tables = self.tables.read().await;
        let mut rows: Vec<MembershipRow> = tables
            .memberships
            .values()
            .filter(|m| m.board_id == board_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.user_id.cmp(&b.user_id))
        });
        Ok(rows)
    }

    async fn insert_task(&self, row: &TaskRow) -> DbResult<()> {
        let mut tables = self.tables.write().await;
        if tables.tasks.contains_key(&row.id) {
            return Err(DbError::Duplicate(format!("task {}", row.id)));
        }
        tables.tasks.insert(row.id.clone(), row.clone());
        Ok(())
    }

    async fn get_task(&self, id: &str) -> DbResult<Option<TaskRow>> {
        Ok(self.tables.read().await.tasks.get(id).cloned())
    }

    async fn update_task(&self, row: &TaskRow) -> DbResult<()> {
        let mut tables = self.tables.write().await;
        match tables.tasks.get_mut(&row.id) {
            Some(existing) => {
                *existing = row.clone();
                Ok(())
            }
            None => Err(DbError::NotFound(format!("task {}", row.id))),
        }
    }

    async fn delete_task(&self, id: &str) -> DbResult<bool> {
        Ok(self.tables.write().await.tasks.remove(id).is_some())
    }

    async fn list_tasks(&self, board_id: &str) -> DbResult<Vec<TaskRow>> {
        let tables = self.tables.read().await;
        let mut rows: Vec<TaskRow> = tables
            .tasks
            .values()
            .filter(|t| t.board_id == board_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(rows)
    }
}
