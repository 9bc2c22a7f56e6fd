//! Sketch API handlers
//!
//! Reads are public. Every mutation runs behind the session middleware and
//! then checks that the member named in the path is the signed-in member
//! before the request body is even decoded.

use crate::api::{parse_json, MessageResponse, MEMBER_NAME, SKETCH_SLUG};
use crate::domain::{
    CreateSketchInput, Member, Sketch, SketchSummary, UpdateMetadataInput, UpdateSourceInput,
};
use crate::error::AppError;
use crate::middleware::AuthMember;
use crate::router::PathParams;
use crate::state::HasServices;
use axum::{
    body::Bytes,
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::Utc;

pub const JAVASCRIPT_CONTENT_TYPE: &str = "application/javascript; charset=utf-8";
pub const SOURCE_CACHE_CONTROL: &str = "public, max-age=300";

async fn authorize<S: HasServices>(
    state: &S,
    auth: AuthMember,
    params: &PathParams,
) -> Result<Member, AppError> {
    let member_name = params.require(MEMBER_NAME)?;
    state
        .identity_service()
        .authorize_owner(auth.id(), member_name)
        .await
}

/// List a member's sketches without their source
pub async fn list_sketches<S: HasServices>(
    State(state): State<S>,
    params: PathParams,
) -> Result<Json<Vec<SketchSummary>>, AppError> {
    let member_name = params.require(MEMBER_NAME)?;
    let sketches = state.sketch_service().list_for_member(member_name).await?;
    Ok(Json(sketches))
}

/// Serve a sketch's source as JavaScript. `new` serves the starter template.
pub async fn get_source<S: HasServices>(
    State(state): State<S>,
    params: PathParams,
) -> Result<impl IntoResponse, AppError> {
    let member_name = params.require(MEMBER_NAME)?;
    let slug = params.require(SKETCH_SLUG)?;
    let sketch = state.sketch_service().get(member_name, slug).await?;

    Ok((
        [
            (header::CONTENT_TYPE, JAVASCRIPT_CONTENT_TYPE),
            (header::CACHE_CONTROL, SOURCE_CACHE_CONTROL),
        ],
        sketch.source_code,
    ))
}

pub async fn create_sketch<S: HasServices>(
    State(state): State<S>,
    auth: AuthMember,
    params: PathParams,
    body: Bytes,
) -> Result<(StatusCode, Json<Sketch>), AppError> {
    let owner = authorize(&state, auth, &params).await?;
    let slug = params.require(SKETCH_SLUG)?;
    let input: CreateSketchInput = parse_json(&body)?;

    let sketch = state
        .sketch_service()
        .create(&owner, slug, input, Utc::now().date_naive())
        .await?;

    Ok((StatusCode::CREATED, Json(sketch)))
}

/// Replace the source code only
pub async fn update_source<S: HasServices>(
    State(state): State<S>,
    auth: AuthMember,
    params: PathParams,
    body: Bytes,
) -> Result<Json<Sketch>, AppError> {
    let owner = authorize(&state, auth, &params).await?;
    let slug = params.require(SKETCH_SLUG)?;
    let input: UpdateSourceInput = parse_json(&body)?;

    let sketch = state
        .sketch_service()
        .update_source(&owner, slug, input)
        .await?;
    Ok(Json(sketch))
}

/// Replace the metadata only, renaming the slug if the title changed
pub async fn update_metadata<S: HasServices>(
    State(state): State<S>,
    auth: AuthMember,
    params: PathParams,
    body: Bytes,
) -> Result<Json<Sketch>, AppError> {
    let owner = authorize(&state, auth, &params).await?;
    let slug = params.require(SKETCH_SLUG)?;
    let input: UpdateMetadataInput = parse_json(&body)?;

    let sketch = state
        .sketch_service()
        .update_metadata(&owner, slug, input)
        .await?;
    Ok(Json(sketch))
}

pub async fn delete_sketch<S: HasServices>(
    State(state): State<S>,
    auth: AuthMember,
    params: PathParams,
) -> Result<Json<MessageResponse>, AppError> {
    let owner = authorize(&state, auth, &params).await?;
    let slug = params.require(SKETCH_SLUG)?;

    state.sketch_service().delete(&owner, slug).await?;
    Ok(Json(MessageResponse::new("Sketch deleted successfully")))
}
