//! Session store adapter
//!
//! Sessions move through `Active -> Expired -> Purged`. Expiry is lazy: a
//! session is only purged when a read finds it past `expires_at`. Reads never
//! extend the lifetime.

use crate::domain::{short_token, MemberId, Session, SessionState};
use crate::error::AppError;
use crate::repository::SessionRepository;
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Default session lifetime in seconds (24h)
pub const DEFAULT_SESSION_TTL_SECS: i64 = 24 * 60 * 60;

/// Session lookup failures
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session not found")]
    NotFound,

    #[error("session expired")]
    Expired,

    #[error(transparent)]
    Store(#[from] AppError),
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::NotFound => AppError::NotFound("Session not found".to_string()),
            SessionError::Expired => AppError::authentication_required(),
            SessionError::Store(e) => e,
        }
    }
}

/// 32 random bytes, hex encoded
pub fn generate_session_token() -> String {
    let mut rng = rand::thread_rng();
    let bytes: [u8; 32] = rng.gen();
    hex::encode(bytes)
}

pub struct SessionService<S: SessionRepository> {
    session_repo: Arc<S>,
    ttl: Duration,
}

impl<S: SessionRepository> SessionService<S> {
    pub fn new(session_repo: Arc<S>, ttl: Duration) -> Self {
        Self { session_repo, ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Create a session for a member, valid for the configured TTL
    pub async fn create(&self, member_id: MemberId) -> Result<Session, AppError> {
        self.create_at(member_id, Utc::now()).await
    }

    pub async fn create_at(
        &self,
        member_id: MemberId,
        now: DateTime<Utc>,
    ) -> Result<Session, AppError> {
        let session = Session {
            id: generate_session_token(),
            member_id,
            created_at: now,
            expires_at: now + self.ttl,
        };

        self.session_repo.create(&session).await?;
        info!(member_id, session = session.short_id(), "Session created");

        Ok(session)
    }

    /// Fetch an active session. An expired session is purged before
    /// `Expired` is returned, so it can never be observed again.
    pub async fn get(&self, session_id: &str) -> Result<Session, SessionError> {
        self.get_at(session_id, Utc::now()).await
    }

    pub async fn get_at(
        &self,
        session_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Session, SessionError> {
        let session = self
            .session_repo
            .find_by_id(session_id)
            .await?
            .ok_or(SessionError::NotFound)?;

        match session.state_at(now) {
            SessionState::Active => Ok(session),
            SessionState::Expired => {
                self.session_repo.delete(session_id).await?;
                debug!(session = session.short_id(), "Purged expired session");
                Err(SessionError::Expired)
            }
        }
    }

    /// Idempotent: deleting an unknown session succeeds.
    pub async fn delete(&self, session_id: &str) -> Result<(), AppError> {
        self.session_repo.delete(session_id).await?;
        info!(session = short_token(session_id), "Session deleted");
        Ok(())
    }

    /// Member owning an active session. Missing and expired sessions both
    /// yield `Unauthenticated`; store failures propagate unchanged.
    pub async fn resolve_member_id(&self, session_id: &str) -> Result<MemberId, AppError> {
        self.resolve_member_id_at(session_id, Utc::now()).await
    }

    pub async fn resolve_member_id_at(
        &self,
        session_id: &str,
        now: DateTime<Utc>,
    ) -> Result<MemberId, AppError> {
        match self.get_at(session_id, now).await {
            Ok(session) => Ok(session.member_id),
            Err(SessionError::NotFound) | Err(SessionError::Expired) => {
                Err(AppError::authentication_required())
            }
            Err(SessionError::Store(e)) => Err(e),
        }
    }
}
