//! Session domain model

use super::member::MemberId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Name of the cookie that carries the session token
pub const SESSION_COOKIE: &str = "session_id";

/// Server-side session binding an opaque token to a member.
///
/// `expires_at` is fixed at creation; reads never extend it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Session {
    pub id: String,
    pub member_id: MemberId,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Observable lifecycle state of a stored session at a given instant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Active,
    Expired,
}

impl Session {
    /// A session is expired from `expires_at` onwards.
    pub fn state_at(&self, now: DateTime<Utc>) -> SessionState {
        if now >= self.expires_at {
            SessionState::Expired
        } else {
            SessionState::Active
        }
    }

    /// Abbreviated token for log lines
    pub fn short_id(&self) -> &str {
        short_token(&self.id)
    }
}

/// First few characters of a token; full tokens are never logged.
pub fn short_token(token: &str) -> &str {
    let end = token
        .char_indices()
        .nth(8)
        .map(|(i, _)| i)
        .unwrap_or(token.len());
    &token[..end]
}
