//! Member API handlers

use crate::api::{JsonBody, StatusResponse};
use crate::domain::{ChangePasswordInput, Member, MemberSummary};
use crate::error::AppError;
use crate::middleware::AuthMember;
use crate::state::HasServices;
use axum::{extract::State, Json};

/// List all members (id and name only)
pub async fn list_members<S: HasServices>(
    State(state): State<S>,
) -> Result<Json<Vec<MemberSummary>>, AppError> {
    let members = state.member_service().list().await?;
    Ok(Json(members))
}

/// The signed-in member
pub async fn me<S: HasServices>(
    State(state): State<S>,
    auth: AuthMember,
) -> Result<Json<Member>, AppError> {
    let member = state.member_service().get(auth.id()).await?;
    Ok(Json(member))
}

/// Change the signed-in member's password
pub async fn change_password<S: HasServices>(
    State(state): State<S>,
    auth: AuthMember,
    JsonBody(input): JsonBody<ChangePasswordInput>,
) -> Result<Json<StatusResponse>, AppError> {
    state
        .member_service()
        .change_password(auth.id(), input)
        .await?;

    Ok(Json(StatusResponse::with_message(
        "Password updated successfully",
    )))
}
