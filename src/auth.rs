//! Caller identity.
//!
//! Authentication itself happens upstream; the identity provider forwards the
//! verified user id in `x-user-id` (plus optional `x-user-email` and
//! `x-user-name`). Every identified request refreshes the user row so other
//! users can later be found by email.

use std::sync::Arc;

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use tracing::debug;

use crate::domain::User;
use crate::error::AppError;
use crate::state::AppState;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_EMAIL_HEADER: &str = "x-user-email";
pub const USER_NAME_HEADER: &str = "x-user-name";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthUser {
  pub id: String,
  pub email: Option<String>,
  pub name: Option<String>,
}

fn header(parts: &Parts, name: &str) -> Option<String> {
  parts
    .headers
    .get(name)
    .and_then(|v| v.to_str().ok())
    .map(|v| v.trim().to_string())
    .filter(|v| !v.is_empty())
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AuthUser {
  type Rejection = AppError;

  async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
    let id = header(parts, USER_ID_HEADER).ok_or(AppError::Unauthorized)?;
    let user = AuthUser {
      id,
      email: header(parts, USER_EMAIL_HEADER).map(|e| e.to_lowercase()),
      name: header(parts, USER_NAME_HEADER),
    };
    state
      .store
      .upsert_user(&User { id: user.id.clone(), email: user.email.clone(), name: user.name.clone() })
      .await?;
    debug!(target: "practice_backend", user_id = %user.id, "Identified caller");
    Ok(user)
  }
}
