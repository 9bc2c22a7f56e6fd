//! Member domain model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Numeric member identity
pub type MemberId = i64;

/// Registered member.
///
/// `name` is the case-sensitive key used in URLs. The password hash is never
/// serialized.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Member {
    pub id: MemberId,
    pub name: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Default for Member {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            name: String::new(),
            password_hash: String::new(),
            verified: false,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Public projection of a member (list endpoints, `/me`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct MemberSummary {
    pub id: MemberId,
    pub name: String,
}

impl From<Member> for MemberSummary {
    fn from(member: Member) -> Self {
        Self {
            id: member.id,
            name: member.name,
        }
    }
}

/// Input for registering a new member
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterInput {
    #[validate(length(min = 1, max = 50, message = "Name and password are required"))]
    pub name: String,
    #[validate(length(min = 1, message = "Name and password are required"))]
    pub password: String,
    #[validate(must_match(other = "password", message = "Passwords do not match"))]
    pub confirm_password: String,
}

/// Input for signing in
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SignInInput {
    #[validate(length(min = 1, message = "Name and password are required"))]
    pub name: String,
    #[validate(length(min = 1, message = "Name and password are required"))]
    pub password: String,
}

/// Input for changing the current member's password
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ChangePasswordInput {
    #[validate(length(min = 1, message = "All password fields are required"))]
    pub current_password: String,
    #[validate(length(min = 6, message = "New password must be at least 6 characters long"))]
    pub new_password: String,
    #[validate(must_match(other = "new_password", message = "New passwords do not match"))]
    pub confirm_password: String,
}
