//! # Authentication Boundary
//!
//! Token handling lives in the upstream gateway. By the time a request gets
//! here the caller's identity has been verified and forwarded in two headers:
//!
//! - `X-User-Id`: numeric user id
//! - `X-User-Role`: `client`, `admin` or `system`
//!
//! The [`Caller`] extractor turns them into an [`Actor`] and rejects requests
//! where they are missing or malformed.

use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};
use coachslot_core::{
    errors::BookingError,
    models::reservation::{Actor, ActorRole},
};

use super::error_handling::AppError;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// The authenticated caller of a request.
#[derive(Debug, Clone, Copy)]
pub struct Caller(pub Actor);

impl Caller {
    /// Fails with 403 unless the caller is an admin (or the system).
    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.0.role.is_admin() {
            Ok(())
        } else {
            Err(AppError(BookingError::Authorization(
                "This operation requires an administrator".to_string(),
            )))
        }
    }

    /// Fails with 403 unless the caller is `user_id` or an admin.
    pub fn require_self_or_admin(&self, user_id: i64) -> Result<(), AppError> {
        if self.0.role.is_admin() || self.0.user_id == Some(user_id) {
            Ok(())
        } else {
            Err(AppError(BookingError::Authorization(format!(
                "Access to user {} is not allowed",
                user_id
            ))))
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let role: ActorRole = header(parts, USER_ROLE_HEADER)
            .ok_or_else(|| unauthenticated("Missing X-User-Role header"))?
            .parse()
            .map_err(|_| unauthenticated("Invalid X-User-Role header"))?;

        let user_id = match header(parts, USER_ID_HEADER) {
            Some(raw) => Some(
                raw.parse::<i64>()
                    .ok()
                    .filter(|id| *id > 0)
                    .ok_or_else(|| unauthenticated("Invalid X-User-Id header"))?,
            ),
            None => None,
        };

        // Only the system actor may act without a user id
        if user_id.is_none() && role != ActorRole::System {
            return Err(unauthenticated("Missing X-User-Id header"));
        }

        Ok(Caller(Actor { user_id, role }))
    }
}

fn header<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts
        .headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

fn unauthenticated(message: &str) -> AppError {
    AppError(BookingError::Authentication(message.to_string()))
}
