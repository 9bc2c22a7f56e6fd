//! Sketch CRUD business logic
//!
//! Every mutating operation takes the owner already resolved by the
//! ownership check, so a sketch is only ever looked up inside its owner's
//! namespace.

use crate::domain::{
    validate_title, CreateSketchInput, Member, NewSketch, Sketch, SketchMetadata, SketchSummary,
    UpdateMetadataInput, UpdateSourceInput, DEFAULT_P5_LIB,
};
use crate::error::{AppError, Result};
use crate::repository::sketch::slug_conflict;
use crate::repository::{MemberRepository, SketchRepository};
use crate::service::slug::{allocate_timestamp_slug, is_reserved, title_slug};
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::info;
use validator::Validate;

const GENERATED_DESCRIPTION: &str = "Auto-generated sketch";
const GENERATED_KEYWORDS: &str = "creative-coding, sketch";
const GENERATED_TAG: &str = "auto-generated";

/// How a new sketch gets its slug
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateMode {
    /// Slug derived from this title
    Titled(String),
    /// Slug allocated from the creation date
    Timestamped,
}

impl CreateMode {
    /// A body title always wins, even a blank one that will fail
    /// validation. Otherwise the reserved path slug selects timestamp mode
    /// and any other path slug is treated as the title.
    pub fn resolve(path_slug: &str, input: &CreateSketchInput) -> Self {
        match &input.title {
            Some(title) => CreateMode::Titled(title.clone()),
            None if is_reserved(path_slug) => CreateMode::Timestamped,
            None => CreateMode::Titled(path_slug.to_string()),
        }
    }
}

pub struct SketchService<K: SketchRepository, M: MemberRepository> {
    sketch_repo: Arc<K>,
    member_repo: Arc<M>,
}

impl<K: SketchRepository, M: MemberRepository> SketchService<K, M> {
    pub fn new(sketch_repo: Arc<K>, member_repo: Arc<M>) -> Self {
        Self {
            sketch_repo,
            member_repo,
        }
    }

    async fn member_by_name(&self, name: &str) -> Result<Member> {
        self.member_repo
            .find_by_name(name)
            .await?
            .ok_or_else(|| AppError::NotFound("Member not found".to_string()))
    }

    async fn owned(&self, owner: &Member, slug: &str) -> Result<Sketch> {
        self.sketch_repo
            .find_by_member_and_slug(owner.id, slug)
            .await?
            .ok_or_else(|| AppError::NotFound("Sketch not found".to_string()))
    }

    /// Public listing of a member's sketches, newest first, without source
    pub async fn list_for_member(&self, member_name: &str) -> Result<Vec<SketchSummary>> {
        let member = self.member_by_name(member_name).await?;
        let sketches = self.sketch_repo.list_by_member(member.id).await?;
        Ok(sketches.into_iter().map(SketchSummary::from).collect())
    }

    /// Public lookup. The reserved slug yields the unsaved template.
    pub async fn get(&self, member_name: &str, slug: &str) -> Result<Sketch> {
        let member = self.member_by_name(member_name).await?;
        if is_reserved(slug) {
            return Ok(Sketch::template(member.id));
        }
        self.owned(&member, slug).await
    }

    pub async fn create(
        &self,
        owner: &Member,
        path_slug: &str,
        input: CreateSketchInput,
        today: NaiveDate,
    ) -> Result<Sketch> {
        input.validate()?;

        let new_sketch = match CreateMode::resolve(path_slug, &input) {
            CreateMode::Titled(title) => {
                validate_title(&title).map_err(|e| AppError::Validation(e.to_string()))?;
                let slug = title_slug(&title)?;
                if self.sketch_repo.slug_exists(owner.id, &slug, None).await? {
                    return Err(slug_conflict(&slug));
                }
                NewSketch {
                    member_id: owner.id,
                    slug,
                    title,
                    description: input.description.unwrap_or_default(),
                    keywords: input.keywords.unwrap_or_default(),
                    tags: input.tags.unwrap_or_default(),
                    external_libs: input.external_libs.unwrap_or_default(),
                    source_code: input.source_code,
                }
            }
            CreateMode::Timestamped => {
                let slug =
                    allocate_timestamp_slug(self.sketch_repo.as_ref(), owner.id, today).await?;
                NewSketch {
                    member_id: owner.id,
                    title: slug.clone(),
                    slug,
                    description: GENERATED_DESCRIPTION.to_string(),
                    keywords: GENERATED_KEYWORDS.to_string(),
                    tags: vec![GENERATED_TAG.to_string()],
                    external_libs: vec![DEFAULT_P5_LIB.to_string()],
                    source_code: input.source_code,
                }
            }
        };

        // The pre-check above only improves the message; the unique index
        // reports concurrent duplicates as Conflict from here.
        let sketch = self.sketch_repo.create(&new_sketch).await?;
        info!(member_id = owner.id, slug = %sketch.slug, "Sketch created");

        Ok(sketch)
    }

    /// Replace only the source code
    pub async fn update_source(
        &self,
        owner: &Member,
        slug: &str,
        input: UpdateSourceInput,
    ) -> Result<Sketch> {
        let sketch = self.owned(owner, slug).await?;
        input.validate()?;

        let updated = self
            .sketch_repo
            .update_source(sketch.id, &input.source_code)
            .await?;
        info!(member_id = owner.id, slug, "Sketch source updated");

        Ok(updated)
    }

    /// Replace only the metadata. A title that normalizes to a different
    /// slug renames the sketch, guarded by the same collision check as
    /// creation (ignoring the sketch itself).
    pub async fn update_metadata(
        &self,
        owner: &Member,
        slug: &str,
        input: UpdateMetadataInput,
    ) -> Result<Sketch> {
        let sketch = self.owned(owner, slug).await?;
        input.validate()?;

        let new_slug = title_slug(&input.title)?;
        if new_slug != sketch.slug
            && self
                .sketch_repo
                .slug_exists(owner.id, &new_slug, Some(sketch.id))
                .await?
        {
            return Err(slug_conflict(&new_slug));
        }

        let metadata = SketchMetadata {
            slug: new_slug,
            title: input.title,
            description: input.description,
            keywords: input.keywords,
            tags: input.tags,
            external_libs: input.external_libs,
        };
        let updated = self.sketch_repo.update_metadata(sketch.id, &metadata).await?;
        info!(
            member_id = owner.id,
            from = slug,
            to = %updated.slug,
            "Sketch metadata updated"
        );

        Ok(updated)
    }

    pub async fn delete(&self, owner: &Member, slug: &str) -> Result<()> {
        let sketch = self.owned(owner, slug).await?;
        self.sketch_repo.delete(sketch.id).await?;
        info!(member_id = owner.id, slug, "Sketch deleted");
        Ok(())
    }
}
