//! Sketch slug resolution
//!
//! Two independent schemes produce a slug that is unique within one member's
//! sketches:
//!
//! * title-derived: [`title_slug`] normalizes free text deterministically;
//! * date-derived: [`allocate_timestamp_slug`] tries `YYYY-MM-DD`,
//!   `YYYY-MM-DD-02` .. `YYYY-MM-DD-99` and returns the first free one.
//!
//! Availability checks are advisory. The `(member_id, slug)` unique index is
//! what actually rejects a concurrent duplicate, and repositories surface
//! that as `Conflict`.

use crate::domain::MemberId;
use crate::error::{AppError, Result};
use crate::repository::SketchRepository;
use chrono::NaiveDate;

/// Slug that addresses the unsaved template sketch. Never stored.
pub const RESERVED_SLUG: &str = "new";

/// Highest numeric suffix tried for date-derived slugs
const MAX_TIMESTAMP_SUFFIX: u32 = 99;

lazy_static::lazy_static! {
    static ref NON_SLUG_RUN: regex::Regex = regex::Regex::new(r"[^a-z0-9]+").unwrap();
}

/// Lowercase, collapse every run of characters outside `[a-z0-9]` into one
/// hyphen, trim hyphens at both ends. May return an empty string.
pub fn slugify(title: &str) -> String {
    let lowered = title.to_lowercase();
    NON_SLUG_RUN
        .replace_all(&lowered, "-")
        .trim_matches('-')
        .to_string()
}

pub fn is_reserved(slug: &str) -> bool {
    slug == RESERVED_SLUG
}

/// Slug for a title, rejecting titles that normalize to nothing or to the
/// reserved template slug.
pub fn title_slug(title: &str) -> Result<String> {
    let slug = slugify(title);
    if slug.is_empty() {
        return Err(AppError::Validation("invalid title".to_string()));
    }
    if is_reserved(&slug) {
        return Err(AppError::Validation(format!(
            "the title '{}' is reserved",
            title
        )));
    }
    Ok(slug)
}

/// Candidate slugs for a date in allocation order.
pub fn timestamp_candidates(date: NaiveDate) -> impl Iterator<Item = String> {
    let base = date.format("%Y-%m-%d").to_string();
    std::iter::once(base.clone()).chain(
        (2..=MAX_TIMESTAMP_SUFFIX).map(move |suffix| format!("{}-{:02}", base, suffix)),
    )
}

/// First date-derived slug not yet used by the member.
pub async fn allocate_timestamp_slug<R>(
    repo: &R,
    member_id: MemberId,
    date: NaiveDate,
) -> Result<String>
where
    R: SketchRepository + ?Sized,
{
    for candidate in timestamp_candidates(date) {
        if !repo.slug_exists(member_id, &candidate, None).await? {
            return Ok(candidate);
        }
    }

    Err(AppError::Internal(anyhow::anyhow!(
        "could not allocate identifier: failed to generate unique slug after 100 attempts"
    )))
}
