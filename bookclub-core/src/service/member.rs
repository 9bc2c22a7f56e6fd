//! Member registration, sign-in and password management

use crate::domain::{
    ChangePasswordInput, Member, MemberId, MemberSummary, RegisterInput, SignInInput,
};
use crate::error::{AppError, Result};
use crate::repository::MemberRepository;
use crate::service::password::{hash_password, verify_password};
use std::sync::Arc;
use tracing::{info, warn};
use validator::Validate;

const INVALID_CREDENTIALS: &str = "Invalid name or password";

pub struct MemberService<M: MemberRepository> {
    member_repo: Arc<M>,
}

impl<M: MemberRepository> MemberService<M> {
    pub fn new(member_repo: Arc<M>) -> Self {
        Self { member_repo }
    }

    /// Register a new, unverified member
    pub async fn register(&self, input: RegisterInput) -> Result<Member> {
        input.validate()?;

        if self.member_repo.find_by_name(&input.name).await?.is_some() {
            return Err(AppError::Conflict("name already exists".to_string()));
        }

        let password_hash = hash_password(&input.password)?;
        let member = self.member_repo.create(&input.name, &password_hash).await?;
        info!(member_id = member.id, name = %member.name, "Member registered");

        Ok(member)
    }

    /// Check credentials. Unknown names and wrong passwords are
    /// indistinguishable to the caller.
    pub async fn authenticate(&self, input: SignInInput) -> Result<Member> {
        input.validate()?;

        let member = match self.member_repo.find_by_name(&input.name).await? {
            Some(member) => member,
            None => {
                warn!(name = %input.name, "Sign-in for unknown member");
                return Err(AppError::Unauthenticated(INVALID_CREDENTIALS.to_string()));
            }
        };

        if !verify_password(&input.password, &member.password_hash)? {
            warn!(member_id = member.id, "Sign-in with wrong password");
            return Err(AppError::Unauthenticated(INVALID_CREDENTIALS.to_string()));
        }

        Ok(member)
    }

    pub async fn get(&self, id: MemberId) -> Result<Member> {
        self.member_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Member not found".to_string()))
    }

    pub async fn get_by_name(&self, name: &str) -> Result<Member> {
        self.member_repo
            .find_by_name(name)
            .await?
            .ok_or_else(|| AppError::NotFound("Member not found".to_string()))
    }

    pub async fn list(&self) -> Result<Vec<MemberSummary>> {
        self.member_repo.list().await
    }

    /// Replace the password of a verified member after checking the current one
    pub async fn change_password(&self, id: MemberId, input: ChangePasswordInput) -> Result<()> {
        input.validate()?;

        let member = self.get(id).await?;
        if !member.verified {
            return Err(AppError::Forbidden(
                "Only verified members can update their password".to_string(),
            ));
        }

        if !verify_password(&input.current_password, &member.password_hash)? {
            return Err(AppError::Validation(
                "Current password is incorrect".to_string(),
            ));
        }

        let password_hash = hash_password(&input.new_password)?;
        self.member_repo
            .update_password_hash(member.id, &password_hash)
            .await?;
        info!(member_id = member.id, "Password updated");

        Ok(())
    }
}
