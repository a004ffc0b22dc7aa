//! User registration and lookup.

pub mod model;

pub use model::{normalize_email, NewUser, User};

use taskdeck_db::{DbError, Store, UserRow};
use tracing::info;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};

/// Register a new user. Emails are unique after normalization.
pub async fn register_user(store: &dyn Store, input: &NewUser) -> CoreResult<User> {
    input.validate()?;
    let email = normalize_email(&input.email);

    if store.find_user_by_email(&email).await?.is_some() {
        return Err(CoreError::EmailTaken(email));
    }

    let now = chrono::Utc::now().to_rfc3339();
    let row = UserRow {
        id: Uuid::new_v4().to_string(),
        name: input.name.trim().to_string(),
        email: email.clone(),
        created_at: now.clone(),
        updated_at: now,
    };
    store.insert_user(&row).await.map_err(|e| match e {
        DbError::Duplicate(_) => CoreError::EmailTaken(email),
        e => e.into(),
    })?;

    info!(user_id = %row.id, "User registered");
    Ok(User::from_row(row))
}

/// Get a user by ID.
pub async fn get_user(store: &dyn Store, id: &str) -> CoreResult<User> {
    store
        .get_user(id)
        .await?
        .map(User::from_row)
        .ok_or_else(|| CoreError::UserNotFound(id.to_string()))
}

/// Find a user by email, if registered.
pub async fn find_user_by_email(store: &dyn Store, email: &str) -> CoreResult<Option<User>> {
    let row = store.find_user_by_email(&normalize_email(email)).await?;
    Ok(row.map(User::from_row))
}
