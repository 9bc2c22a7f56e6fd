//! Identity resolution and ownership checks

use crate::domain::{Member, MemberId};
use crate::error::{AppError, Result};
use crate::repository::{MemberRepository, SessionRepository};
use crate::service::SessionService;
use std::sync::Arc;
use tracing::warn;

pub struct IdentityService<M: MemberRepository, S: SessionRepository> {
    member_repo: Arc<M>,
    sessions: Arc<SessionService<S>>,
}

impl<M: MemberRepository, S: SessionRepository> IdentityService<M, S> {
    pub fn new(member_repo: Arc<M>, sessions: Arc<SessionService<S>>) -> Self {
        Self {
            member_repo,
            sessions,
        }
    }

    /// Member behind a session token. A session whose member no longer
    /// exists counts as unauthenticated.
    pub async fn resolve(&self, session_id: &str) -> Result<Member> {
        let member_id = self.sessions.resolve_member_id(session_id).await?;
        self.member_repo
            .find_by_id(member_id)
            .await?
            .ok_or_else(AppError::authentication_required)
    }

    /// Succeeds only when the authenticated member is the one named in the
    /// path. The addressed resource is never consulted, so a foreign
    /// namespace is forbidden whether or not the resource exists.
    pub async fn authorize_owner(&self, member_id: MemberId, path_member: &str) -> Result<Member> {
        let member = self.member_repo.find_by_id(member_id).await?;
        match member {
            Some(member) if member.name == path_member => Ok(member),
            _ => {
                warn!(member_id, path_member, "Ownership check failed");
                Err(AppError::Forbidden(
                    "You can only manage sketches under your own account".to_string(),
                ))
            }
        }
    }
}
