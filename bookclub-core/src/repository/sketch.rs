//! Sketch repository

use crate::domain::{MemberId, NewSketch, Sketch, SketchId, SketchMetadata};
use crate::error::{is_unique_violation, AppError, Result};
use async_trait::async_trait;
use sqlx::MySqlPool;

/// Error reported when `(member_id, slug)` is already taken.
pub fn slug_conflict(slug: &str) -> AppError {
    AppError::Conflict(format!(
        "a sketch with slug '{}' already exists for this member",
        slug
    ))
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SketchRepository: Send + Sync {
    /// Insert a sketch. A `(member_id, slug)` collision is reported as
    /// `Conflict` even when a prior existence check passed.
    async fn create(&self, sketch: &NewSketch) -> Result<Sketch>;
    async fn find_by_id(&self, id: SketchId) -> Result<Option<Sketch>>;
    async fn find_by_member_and_slug(
        &self,
        member_id: MemberId,
        slug: &str,
    ) -> Result<Option<Sketch>>;
    /// Whether a row with this slug exists for the member, optionally
    /// ignoring one sketch (used when renaming).
    async fn slug_exists(
        &self,
        member_id: MemberId,
        slug: &str,
        exclude_id: Option<SketchId>,
    ) -> Result<bool>;
    /// Member's sketches, most recently updated first
    async fn list_by_member(&self, member_id: MemberId) -> Result<Vec<Sketch>>;
    async fn update_source(&self, id: SketchId, source_code: &str) -> Result<Sketch>;
    async fn update_metadata(&self, id: SketchId, metadata: &SketchMetadata) -> Result<Sketch>;
    async fn delete(&self, id: SketchId) -> Result<()>;
}

pub struct SketchRepositoryImpl {
    pool: MySqlPool,
}

impl SketchRepositoryImpl {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    async fn reload(&self, id: SketchId) -> Result<Sketch> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Sketch not found".to_string()))
    }
}

fn to_json(values: &[String]) -> Result<String> {
    serde_json::to_string(values).map_err(|e| AppError::Internal(e.into()))
}

#[async_trait]
impl SketchRepository for SketchRepositoryImpl {
    async fn create(&self, sketch: &NewSketch) -> Result<Sketch> {
        let tags = to_json(&sketch.tags)?;
        let external_libs = to_json(&sketch.external_libs)?;

        let result = sqlx::query(
            r#"
            INSERT INTO sketches (member_id, slug, title, description, keywords, tags,
                                  external_libs, source_code, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, NOW(), NOW())
            "#,
        )
        .bind(sketch.member_id)
        .bind(&sketch.slug)
        .bind(&sketch.title)
        .bind(&sketch.description)
        .bind(&sketch.keywords)
        .bind(&tags)
        .bind(&external_libs)
        .bind(&sketch.source_code)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                slug_conflict(&sketch.slug)
            } else {
                AppError::Database(e)
            }
        })?;

        self.reload(result.last_insert_id() as SketchId).await
    }

    async fn find_by_id(&self, id: SketchId) -> Result<Option<Sketch>> {
        let sketch = sqlx::query_as::<_, Sketch>(
            r#"
            SELECT id, member_id, slug, title, description, keywords, tags,
                   external_libs, source_code, created_at, updated_at
            FROM sketches
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sketch)
    }

    async fn find_by_member_and_slug(
        &self,
        member_id: MemberId,
        slug: &str,
    ) -> Result<Option<Sketch>> {
        let sketch = sqlx::query_as::<_, Sketch>(
            r#"
            SELECT id, member_id, slug, title, description, keywords, tags,
                   external_libs, source_code, created_at, updated_at
            FROM sketches
            WHERE member_id = ? AND slug = ?
            "#,
        )
        .bind(member_id)
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sketch)
    }

    async fn slug_exists(
        &self,
        member_id: MemberId,
        slug: &str,
        exclude_id: Option<SketchId>,
    ) -> Result<bool> {
        let (count,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*)
            FROM sketches
            WHERE member_id = ? AND slug = ? AND (? IS NULL OR id <> ?)
            "#,
        )
        .bind(member_id)
        .bind(slug)
        .bind(exclude_id)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count > 0)
    }

    async fn list_by_member(&self, member_id: MemberId) -> Result<Vec<Sketch>> {
        let sketches = sqlx::query_as::<_, Sketch>(
            r#"
            SELECT id, member_id, slug, title, description, keywords, tags,
                   external_libs, source_code, created_at, updated_at
            FROM sketches
            WHERE member_id = ?
            ORDER BY updated_at DESC
            "#,
        )
        .bind(member_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(sketches)
    }

    async fn update_source(&self, id: SketchId, source_code: &str) -> Result<Sketch> {
        sqlx::query(
            r#"
            UPDATE sketches
            SET source_code = ?, updated_at = NOW()
            WHERE id = ?
            "#,
        )
        .bind(source_code)
        .bind(id)
        .execute(&self.pool)
        .await?;

        self.reload(id).await
    }

    async fn update_metadata(&self, id: SketchId, metadata: &SketchMetadata) -> Result<Sketch> {
        let tags = to_json(&metadata.tags)?;
        let external_libs = to_json(&metadata.external_libs)?;

        sqlx::query(
            r#"
            UPDATE sketches
            SET slug = ?, title = ?, description = ?, keywords = ?, tags = ?,
                external_libs = ?, updated_at = NOW()
            WHERE id = ?
            "#,
        )
        .bind(&metadata.slug)
        .bind(&metadata.title)
        .bind(&metadata.description)
        .bind(&metadata.keywords)
        .bind(&tags)
        .bind(&external_libs)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                slug_conflict(&metadata.slug)
            } else {
                AppError::Database(e)
            }
        })?;

        self.reload(id).await
    }

    async fn delete(&self, id: SketchId) -> Result<()> {
        let result = sqlx::query("DELETE FROM sketches WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Sketch not found".to_string()));
        }

        Ok(())
    }
}
