//! User domain models.

use serde::{Deserialize, Serialize};
use taskdeck_db::UserRow;

use crate::error::{CoreError, CoreResult};

/// Maximum length for names and emails.
pub const MAX_FIELD_LEN: usize = 255;

/// A registered user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub created_at: String,
    pub updated_at: String,
}

impl User {
    pub fn from_row(row: UserRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            email: row.email,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Registration input.
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
}

impl NewUser {
    pub fn validate(&self) -> CoreResult<()> {
        let name = self.name.trim();
        if name.is_empty() || name.len() > MAX_FIELD_LEN {
            return Err(CoreError::validation(format!(
                "name must be 1-{} characters",
                MAX_FIELD_LEN
            )));
        }
        let email = self.email.trim();
        if email.len() > MAX_FIELD_LEN || !is_plausible_email(email) {
            return Err(CoreError::validation(format!("invalid email: {}", self.email)));
        }
        Ok(())
    }
}

/// Normalize an email for storage and lookup.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.contains(char::is_whitespace)
        }
        None => false,
    }
}
