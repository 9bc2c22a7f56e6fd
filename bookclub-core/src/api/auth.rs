//! Registration, sign-in and sign-out handlers
//!
//! Successful registration and sign-in both open a session and hand its
//! token back in the `session_id` cookie.

use crate::api::{JsonBody, StatusResponse};
use crate::domain::{Member, MemberSummary, RegisterInput, SignInInput};
use crate::error::AppError;
use crate::middleware::session::{clear_session_cookie, session_cookie, session_token};
use crate::state::HasServices;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect},
    Json,
};
use axum_extra::extract::CookieJar;

async fn open_session<S: HasServices>(
    state: &S,
    jar: CookieJar,
    member: &Member,
) -> Result<CookieJar, AppError> {
    let session = state.session_service().create(member.id).await?;
    Ok(jar.add(session_cookie(&session, &state.config().session)))
}

/// Delete the request's session, if any, and expire the cookie
async fn end_session<S: HasServices>(state: &S, jar: CookieJar) -> Result<CookieJar, AppError> {
    if let Some(token) = session_token(&jar) {
        state.session_service().delete(token).await?;
    }
    Ok(jar.add(clear_session_cookie(&state.config().session)))
}

pub async fn register<S: HasServices>(
    State(state): State<S>,
    jar: CookieJar,
    JsonBody(input): JsonBody<RegisterInput>,
) -> Result<impl IntoResponse, AppError> {
    let member = state.member_service().register(input).await?;
    let jar = open_session(&state, jar, &member).await?;

    Ok((StatusCode::CREATED, jar, Json(MemberSummary::from(member))))
}

pub async fn sign_in<S: HasServices>(
    State(state): State<S>,
    jar: CookieJar,
    JsonBody(input): JsonBody<SignInInput>,
) -> Result<impl IntoResponse, AppError> {
    let member = state.member_service().authenticate(input).await?;
    let jar = open_session(&state, jar, &member).await?;

    Ok((jar, Json(MemberSummary::from(member))))
}

/// `POST /api/auth/sign-out`, mounted behind the session middleware
pub async fn sign_out<S: HasServices>(
    State(state): State<S>,
    jar: CookieJar,
) -> Result<impl IntoResponse, AppError> {
    let jar = end_session(&state, jar).await?;
    Ok((jar, Json(StatusResponse::ok())))
}

/// `POST /api/auth/logout`: succeeds with or without a session
pub async fn logout<S: HasServices>(
    State(state): State<S>,
    jar: CookieJar,
) -> Result<impl IntoResponse, AppError> {
    let jar = end_session(&state, jar).await?;
    Ok((jar, Json(StatusResponse::ok())))
}

/// `GET /api/auth/sign-out`: link-friendly variant, back to the homepage
pub async fn sign_out_redirect<S: HasServices>(
    State(state): State<S>,
    jar: CookieJar,
) -> Result<impl IntoResponse, AppError> {
    let jar = end_session(&state, jar).await?;
    Ok((jar, Redirect::to("/")))
}
