//! Membership domain models.

use serde::{Deserialize, Serialize};
use taskdeck_db::MembershipRow;

use crate::board::model::Board;
use crate::error::{CoreError, CoreResult};
use crate::role::Role;

/// A user's role on a board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardMembership {
    pub board_id: String,
    pub user_id: String,
    pub role: Role,
    pub created_at: String,
    pub updated_at: String,
}

impl BoardMembership {
    /// Convert a stored row. Rows with an unrecognized role are rejected.
    pub fn from_row(row: MembershipRow) -> CoreResult<Self> {
        let role = Role::parse(&row.role).ok_or_else(|| CoreError::UnknownRole(row.role.clone()))?;
        Ok(Self {
            board_id: row.board_id,
            user_id: row.user_id,
            role,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }

    pub fn to_row(&self) -> MembershipRow {
        MembershipRow {
            board_id: self.board_id.clone(),
            user_id: self.user_id.clone(),
            role: self.role.as_str().to_string(),
            created_at: self.created_at.clone(),
            updated_at: self.updated_at.clone(),
        }
    }
}

/// A freshly created board together with its owner's membership.
#[derive(Debug, Clone, Serialize)]
pub struct CreatedBoard {
    pub board: Board,
    pub membership: BoardMembership,
}
