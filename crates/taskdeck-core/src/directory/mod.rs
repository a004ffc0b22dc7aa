//! Collaboration directory.
//!
//! Owns the (board, user) → role mapping and the rules around it: the board
//! creator becomes its owner, a user holds at most one membership per board,
//! and every role-gated operation goes through [`authorize`].

pub mod model;

pub use model::{BoardMembership, CreatedBoard};

use taskdeck_db::{BoardRow, DbError, MembershipRow, Store};
use tracing::{debug, info};
use uuid::Uuid;

use crate::board::model::{Board, BoardInput};
use crate::error::{CoreError, CoreResult};
use crate::realtime::Hub;
use crate::role::{satisfies, Requirement, Role};
use crate::user::normalize_email;

/// Create a board and make `creator_id` its owner.
///
/// The board and the owner membership are written in one store operation:
/// if anything fails, neither exists.
pub async fn create_board_with_owner(
    store: &dyn Store,
    input: &BoardInput,
    creator_id: &str,
) -> CoreResult<CreatedBoard> {
    input.validate()?;
    if store.get_user(creator_id).await?.is_none() {
        return Err(CoreError::UserNotFound(creator_id.to_string()));
    }

    let now = chrono::Utc::now().to_rfc3339();
    let board_row = BoardRow {
        id: Uuid::new_v4().to_string(),
        title: input.title.trim().to_string(),
        description: input.description.clone(),
        created_at: now.clone(),
        updated_at: now.clone(),
    };
    let owner_row = MembershipRow {
        board_id: board_row.id.clone(),
        user_id: creator_id.to_string(),
        role: Role::Owner.as_str().to_string(),
        created_at: now.clone(),
        updated_at: now,
    };

    store.create_board_with_owner(&board_row, &owner_row).await?;
    info!(board_id = %board_row.id, owner_id = %creator_id, "Board created");

    Ok(CreatedBoard {
        board: Board::from_row(board_row),
        membership: BoardMembership::from_row(owner_row)?,
    })
}

/// Add the user registered under `email` to a board.
///
/// Checks run in a fixed order and callers branch on which one failed:
/// unknown email → `UserNotFound`, unknown board → `BoardNotFound`,
/// existing membership → `AlreadyMember`.
pub async fn add_collaborator(
    store: &dyn Store,
    board_id: &str,
    email: &str,
    role: Role,
) -> CoreResult<BoardMembership> {
    let email = normalize_email(email);
    let user = store
        .find_user_by_email(&email)
        .await?
        .ok_or_else(|| CoreError::UserNotFound(email.clone()))?;

    if store.get_board(board_id).await?.is_none() {
        return Err(CoreError::BoardNotFound(board_id.to_string()));
    }

    let already_member = || CoreError::AlreadyMember {
        board_id: board_id.to_string(),
        user_id: user.id.clone(),
    };
    if store.get_membership(board_id, &user.id).await?.is_some() {
        return Err(already_member());
    }

    let now = chrono::Utc::now().to_rfc3339();
    let membership = BoardMembership {
        board_id: board_id.to_string(),
        user_id: user.id.clone(),
        role,
        created_at: now.clone(),
        updated_at: now,
    };
    // A concurrent add can still win between the probe and the insert.
    store
        .insert_membership(&membership.to_row())
        .await
        .map_err(|e| match e {
            DbError::Duplicate(_) => already_member(),
            e => e.into(),
        })?;

    info!(board_id = %board_id, user_id = %user.id, role = %role, "Collaborator added");
    Ok(membership)
}

/// Get a user's membership on a board.
pub async fn check_role(
    store: &dyn Store,
    board_id: &str,
    user_id: &str,
) -> CoreResult<BoardMembership> {
    let row = store
        .get_membership(board_id, user_id)
        .await?
        .ok_or_else(|| CoreError::not_a_member(board_id, user_id))?;
    BoardMembership::from_row(row)
}

/// Gate an operation: the user must be a member whose role satisfies
/// `requirement`. Insufficient roles are denied with `Forbidden`.
pub async fn authorize(
    store: &dyn Store,
    board_id: &str,
    user_id: &str,
    requirement: impl Into<Requirement>,
) -> CoreResult<BoardMembership> {
    let requirement = requirement.into();
    let row = store
        .get_membership(board_id, user_id)
        .await?
        .ok_or_else(|| CoreError::not_a_member(board_id, user_id))?;

    if !satisfies(&row.role, requirement) {
        debug!(
            board_id = %board_id,
            user_id = %user_id,
            role = %row.role,
            %requirement,
            "Authorization denied"
        );
        return Err(CoreError::forbidden(&row.role, requirement));
    }
    BoardMembership::from_row(row)
}

/// Change a collaborator's role. The last owner cannot be demoted.
pub async fn change_role(
    store: &dyn Store,
    board_id: &str,
    user_id: &str,
    role: Role,
) -> CoreResult<BoardMembership> {
    let mut membership = check_role(store, board_id, user_id).await?;
    if membership.role == role {
        return Ok(membership);
    }
    if membership.role == Role::Owner {
        ensure_another_owner(store, board_id).await?;
    }

    membership.role = role;
    membership.updated_at = chrono::Utc::now().to_rfc3339();
    store.update_membership(&membership.to_row()).await?;

    info!(board_id = %board_id, user_id = %user_id, role = %role, "Collaborator role changed");
    Ok(membership)
}

/// Remove a collaborator and close their live connections to the board.
/// The last owner cannot be removed.
pub async fn remove_collaborator(
    store: &dyn Store,
    hub: &Hub,
    board_id: &str,
    user_id: &str,
) -> CoreResult<()> {
    let membership = check_role(store, board_id, user_id).await?;
    if membership.role == Role::Owner {
        ensure_another_owner(store, board_id).await?;
    }

    if !store.delete_membership(board_id, user_id).await? {
        return Err(CoreError::not_a_member(board_id, user_id));
    }
    hub.revoke(board_id, user_id);
    info!(board_id = %board_id, user_id = %user_id, "Collaborator removed");
    Ok(())
}

/// List every membership on a board, oldest first.
pub async fn list_collaborators(store: &dyn Store, board_id: &str) -> CoreResult<Vec<BoardMembership>> {
    if store.get_board(board_id).await?.is_none() {
        return Err(CoreError::BoardNotFound(board_id.to_string()));
    }
    store
        .list_memberships(board_id)
        .await?
        .into_iter()
        .map(BoardMembership::from_row)
        .collect()
}

async fn ensure_another_owner(store: &dyn Store, board_id: &str) -> CoreResult<()> {
    let owners = store
        .list_memberships(board_id)
        .await?
        .iter()
        .filter(|m| m.role == Role::Owner.as_str())
        .count();
    if owners <= 1 {
        return Err(CoreError::LastOwner(board_id.to_string()));
    }
    Ok(())
}
