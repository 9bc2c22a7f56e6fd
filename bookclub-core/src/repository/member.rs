//! Member repository

use crate::domain::{Member, MemberId, MemberSummary};
use crate::error::{is_unique_violation, AppError, Result};
use async_trait::async_trait;
use sqlx::MySqlPool;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MemberRepository: Send + Sync {
    /// Insert a member. A taken name is reported as `Conflict`.
    async fn create(&self, name: &str, password_hash: &str) -> Result<Member>;
    async fn find_by_id(&self, id: MemberId) -> Result<Option<Member>>;
    async fn find_by_name(&self, name: &str) -> Result<Option<Member>>;
    /// All members ordered by name
    async fn list(&self) -> Result<Vec<MemberSummary>>;
    async fn update_password_hash(&self, id: MemberId, password_hash: &str) -> Result<()>;
}

pub struct MemberRepositoryImpl {
    pool: MySqlPool,
}

impl MemberRepositoryImpl {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MemberRepository for MemberRepositoryImpl {
    async fn create(&self, name: &str, password_hash: &str) -> Result<Member> {
        let result = sqlx::query(
            r#"
            INSERT INTO members (name, password_hash, verified, created_at, updated_at)
            VALUES (?, ?, FALSE, NOW(), NOW())
            "#,
        )
        .bind(name)
        .bind(password_hash)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict("name already exists".to_string())
            } else {
                AppError::Database(e)
            }
        })?;

        let id = result.last_insert_id() as MemberId;
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to create member")))
    }

    async fn find_by_id(&self, id: MemberId) -> Result<Option<Member>> {
        let member = sqlx::query_as::<_, Member>(
            r#"
            SELECT id, name, password_hash, verified, created_at, updated_at
            FROM members
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(member)
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Member>> {
        let member = sqlx::query_as::<_, Member>(
            r#"
            SELECT id, name, password_hash, verified, created_at, updated_at
            FROM members
            WHERE name = ?
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(member)
    }

    async fn list(&self) -> Result<Vec<MemberSummary>> {
        let members = sqlx::query_as::<_, MemberSummary>(
            r#"
            SELECT id, name
            FROM members
            ORDER BY name ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(members)
    }

    async fn update_password_hash(&self, id: MemberId, password_hash: &str) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE members
            SET password_hash = ?, updated_at = NOW()
            WHERE id = ?
            "#,
        )
        .bind(password_hash)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
