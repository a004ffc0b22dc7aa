//! Caller identity.
//!
//! Authentication is handled upstream; requests arrive with the caller's user
//! id in the `x-user-id` header.

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap},
};
use taskdeck_core::user::{self, User};
use taskdeck_core::CoreError;

use crate::error::ApiError;
use crate::state::AppState;

pub const USER_HEADER: &str = "x-user-id";

/// The registered user making the request. Rejects with 401 when the header
/// is missing or names no known user.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl CurrentUser {
    /// Resolve the caller from the header, falling back to `fallback_id`
    /// (used by the WebSocket endpoint, where browsers cannot set headers).
    pub async fn resolve(
        state: &AppState,
        headers: &HeaderMap,
        fallback_id: Option<&str>,
    ) -> Result<Self, ApiError> {
        let id = headers
            .get(USER_HEADER)
            .and_then(|v| v.to_str().ok())
            .or(fallback_id)
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ApiError::unauthorized(format!("missing {} header", USER_HEADER)))?;

        match user::get_user(state.store.as_ref(), id).await {
            Ok(user) => Ok(Self(user)),
            Err(CoreError::UserNotFound(_)) => Err(ApiError::unauthorized("unknown caller")),
            Err(e) => Err(e.into()),
        }
    }
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Self::resolve(state, &parts.headers, None).await
    }
}
