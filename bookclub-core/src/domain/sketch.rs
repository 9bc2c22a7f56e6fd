//! Sketch domain model and input validation

use super::member::MemberId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use url::Url;
use validator::{Validate, ValidationError};

pub type SketchId = i64;

pub const MAX_TITLE_LENGTH: usize = 100;
pub const MAX_DESCRIPTION_LENGTH: usize = 500;
pub const MAX_KEYWORDS_LENGTH: usize = 200;
pub const MAX_TAGS: usize = 10;
pub const MAX_EXTERNAL_LIBS: usize = 5;

/// p5.js build loaded by generated and template sketches
pub const DEFAULT_P5_LIB: &str = "https://cdn.jsdelivr.net/npm/p5@1.11.7/lib/p5.min.js";

const TEMPLATE_SOURCE: &str = r#"
function setup() {
    createCanvas(400, 400);
}

function draw() {
    background(220);
    fill(255, 0, 150);
    ellipse(mouseX, mouseY, 50, 50);
}"#;

lazy_static::lazy_static! {
    static ref TITLE_REGEX: regex::Regex =
        regex::Regex::new(r"^[a-zA-Z0-9\s\-_.,:;!?()]+$").unwrap();
    static ref DESCRIPTION_REGEX: regex::Regex =
        regex::Regex::new(r"^[a-zA-Z0-9\s\-_.,:;!?()]*$").unwrap();
    static ref KEYWORDS_REGEX: regex::Regex = regex::Regex::new(r"^[a-zA-Z0-9\s,\-_]*$").unwrap();
    static ref TAG_REGEX: regex::Regex = regex::Regex::new(r"^[a-zA-Z0-9\-_]+$").unwrap();
}

fn invalid(code: &'static str, message: String) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    err
}

pub fn validate_title(title: &str) -> Result<(), ValidationError> {
    if title.is_empty() {
        return Err(invalid("required", "title is required".to_string()));
    }
    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(invalid(
            "length",
            format!("title must be {} characters or less", MAX_TITLE_LENGTH),
        ));
    }
    if !TITLE_REGEX.is_match(title) {
        return Err(invalid(
            "invalid_characters",
            "title contains invalid characters".to_string(),
        ));
    }
    Ok(())
}

fn validate_description(description: &str) -> Result<(), ValidationError> {
    if description.chars().count() > MAX_DESCRIPTION_LENGTH {
        return Err(invalid(
            "length",
            format!(
                "description must be {} characters or less",
                MAX_DESCRIPTION_LENGTH
            ),
        ));
    }
    if !DESCRIPTION_REGEX.is_match(description) {
        return Err(invalid(
            "invalid_characters",
            "description contains invalid characters".to_string(),
        ));
    }
    Ok(())
}

fn validate_keywords(keywords: &str) -> Result<(), ValidationError> {
    if keywords.chars().count() > MAX_KEYWORDS_LENGTH {
        return Err(invalid(
            "length",
            format!("keywords must be {} characters or less", MAX_KEYWORDS_LENGTH),
        ));
    }
    if !KEYWORDS_REGEX.is_match(keywords) {
        return Err(invalid(
            "invalid_characters",
            "keywords contains invalid characters".to_string(),
        ));
    }
    Ok(())
}

fn validate_tags(tags: &[String]) -> Result<(), ValidationError> {
    if tags.len() > MAX_TAGS {
        return Err(invalid(
            "too_many",
            format!("maximum {} tags allowed", MAX_TAGS),
        ));
    }
    for tag in tags {
        if tag.trim().is_empty() {
            return Err(invalid("empty", "tags cannot be empty".to_string()));
        }
        if !TAG_REGEX.is_match(tag) {
            return Err(invalid(
                "invalid_characters",
                format!(
                    "tag '{}' contains invalid characters (only alphanumeric, hyphens, and underscores allowed)",
                    tag
                ),
            ));
        }
    }
    Ok(())
}

fn validate_external_libs(libs: &[String]) -> Result<(), ValidationError> {
    if libs.len() > MAX_EXTERNAL_LIBS {
        return Err(invalid(
            "too_many",
            format!("maximum {} external libraries allowed", MAX_EXTERNAL_LIBS),
        ));
    }
    for lib in libs {
        if lib.trim().is_empty() {
            return Err(invalid(
                "empty",
                "external library URLs cannot be empty".to_string(),
            ));
        }
        let parsed = Url::parse(lib)
            .map_err(|_| invalid("invalid_url", format!("invalid URL format: {}", lib)))?;
        if parsed.scheme() != "https" || !lib.starts_with("https://") {
            return Err(invalid(
                "insecure_url",
                format!("external library URLs must use HTTPS: {}", lib),
            ));
        }
    }
    Ok(())
}

/// Stored sketch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Sketch {
    pub id: SketchId,
    pub member_id: MemberId,
    pub slug: String,
    pub title: String,
    pub description: String,
    pub keywords: String,
    #[sqlx(json)]
    pub tags: Vec<String>,
    #[sqlx(json)]
    pub external_libs: Vec<String>,
    pub source_code: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Sketch {
    /// Unsaved starter sketch addressed by the reserved `new` slug.
    /// It has id 0 and is never persisted.
    pub fn template(member_id: MemberId) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            member_id,
            slug: crate::service::slug::RESERVED_SLUG.to_string(),
            title: "New Sketch".to_string(),
            description: "A new creative coding sketch".to_string(),
            keywords: "creative coding, p5js, sketch".to_string(),
            tags: vec!["creative-coding".to_string(), "p5js".to_string()],
            external_libs: vec![DEFAULT_P5_LIB.to_string()],
            source_code: TEMPLATE_SOURCE.to_string(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Sketch without its source code (list endpoints)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SketchSummary {
    pub id: SketchId,
    pub slug: String,
    pub title: String,
    pub description: String,
    pub keywords: String,
    pub tags: Vec<String>,
    pub external_libs: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Sketch> for SketchSummary {
    fn from(sketch: Sketch) -> Self {
        Self {
            id: sketch.id,
            slug: sketch.slug,
            title: sketch.title,
            description: sketch.description,
            keywords: sketch.keywords,
            tags: sketch.tags,
            external_libs: sketch.external_libs,
            created_at: sketch.created_at,
            updated_at: sketch.updated_at,
        }
    }
}

/// Row to insert; the store assigns id and timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSketch {
    pub member_id: MemberId,
    pub slug: String,
    pub title: String,
    pub description: String,
    pub keywords: String,
    pub tags: Vec<String>,
    pub external_libs: Vec<String>,
    pub source_code: String,
}

/// Replacement metadata for an existing sketch, slug already resolved
#[derive(Debug, Clone, PartialEq)]
pub struct SketchMetadata {
    pub slug: String,
    pub title: String,
    pub description: String,
    pub keywords: String,
    pub tags: Vec<String>,
    pub external_libs: Vec<String>,
}

/// Body of `POST /api/sketches/{memberName}/{sketchSlug}`.
///
/// Without a title the sketch is created in timestamp mode.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CreateSketchInput {
    #[validate(length(min = 1, message = "Source code is required"))]
    #[serde(default)]
    pub source_code: String,
    #[validate(custom(function = "validate_title"))]
    pub title: Option<String>,
    #[validate(custom(function = "validate_description"))]
    pub description: Option<String>,
    #[validate(custom(function = "validate_keywords"))]
    pub keywords: Option<String>,
    #[validate(custom(function = "validate_tags"))]
    pub tags: Option<Vec<String>>,
    #[validate(custom(function = "validate_external_libs"))]
    pub external_libs: Option<Vec<String>>,
}

/// Body of `PUT`: source replacement only
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateSourceInput {
    #[validate(length(min = 1, message = "Source code is required"))]
    #[serde(default)]
    pub source_code: String,
}

/// Body of `PATCH`: metadata replacement only
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateMetadataInput {
    #[validate(custom(function = "validate_title"))]
    #[serde(default)]
    pub title: String,
    #[validate(custom(function = "validate_description"))]
    #[serde(default)]
    pub description: String,
    #[validate(custom(function = "validate_keywords"))]
    #[serde(default)]
    pub keywords: String,
    #[validate(custom(function = "validate_tags"))]
    #[serde(default)]
    pub tags: Vec<String>,
    #[validate(custom(function = "validate_external_libs"))]
    #[serde(default)]
    pub external_libs: Vec<String>,
}
