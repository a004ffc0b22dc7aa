//! Board domain models.

use serde::{Deserialize, Serialize};
use taskdeck_db::BoardRow;

use crate::error::{CoreError, CoreResult};
use crate::role::Role;
use crate::task::model::Task;

/// Maximum length of a board title or description.
pub const MAX_TEXT_LEN: usize = 255;

/// A task board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Board {
    pub fn from_row(row: BoardRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            description: row.description,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }

    pub fn to_row(&self) -> BoardRow {
        BoardRow {
            id: self.id.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
            created_at: self.created_at.clone(),
            updated_at: self.updated_at.clone(),
        }
    }
}

/// Title and description for creating or updating a board.
#[derive(Debug, Clone, Deserialize)]
pub struct BoardInput {
    pub title: String,
    pub description: Option<String>,
}

impl BoardInput {
    pub fn new(title: impl Into<String>, description: Option<&str>) -> Self {
        Self {
            title: title.into(),
            description: description.map(str::to_string),
        }
    }

    pub fn validate(&self) -> CoreResult<()> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(CoreError::validation("title is required"));
        }
        if title.len() > MAX_TEXT_LEN {
            return Err(CoreError::validation(format!(
                "title exceeds {} characters",
                MAX_TEXT_LEN
            )));
        }
        if self
            .description
            .as_ref()
            .is_some_and(|d| d.len() > MAX_TEXT_LEN)
        {
            return Err(CoreError::validation(format!(
                "description exceeds {} characters",
                MAX_TEXT_LEN
            )));
        }
        Ok(())
    }
}

/// A board as seen by one member: the board, its tasks, and the viewer's role.
#[derive(Debug, Clone, Serialize)]
pub struct BoardDetails {
    #[serde(flatten)]
    pub board: Board,
    pub role: Role,
    pub tasks: Vec<Task>,
}
