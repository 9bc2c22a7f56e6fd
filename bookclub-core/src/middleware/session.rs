//! Session authentication middleware and extractors
//!
//! Provides:
//! - `require_session` middleware, which resolves the `session_id` cookie and
//!   short-circuits with 401 before the handler runs
//! - `AuthMember` extractor for handlers behind that middleware
//! - session cookie builders shared by the auth handlers

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use crate::config::SessionConfig;
use crate::domain::{short_token, MemberId, Session, SESSION_COOKIE};
use crate::error::AppError;
use crate::state::HasServices;

/// Member resolved from the request's session. Only present on requests
/// that passed through [`require_session`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthMember(pub MemberId);

impl AuthMember {
    pub fn id(&self) -> MemberId {
        self.0
    }
}

impl<S> FromRequestParts<S> for AuthMember
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthMember>()
            .copied()
            .ok_or_else(AppError::authentication_required)
    }
}

/// Session token carried by the request, if any
pub fn session_token(jar: &CookieJar) -> Option<&str> {
    jar.get(SESSION_COOKIE)
        .map(|cookie| cookie.value())
        .filter(|value| !value.is_empty())
}

/// Resolve the session cookie to a member and expose it to the handler as
/// [`AuthMember`]. Missing, unknown and expired sessions all stop here with
/// 401; store failures stop here with 500.
pub async fn require_session<S: HasServices>(
    State(state): State<S>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = session_token(&jar).ok_or_else(AppError::authentication_required)?;

    let member_id = match state.session_service().resolve_member_id(token).await {
        Ok(member_id) => member_id,
        Err(e) => {
            tracing::debug!(session = short_token(token), error = %e, "Session rejected");
            return Err(e);
        }
    };

    request.extensions_mut().insert(AuthMember(member_id));
    Ok(next.run(request).await)
}

/// `session_id` cookie for a freshly created session
pub fn session_cookie(session: &Session, config: &SessionConfig) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, session.id.clone()))
        .path("/")
        .http_only(true)
        .secure(config.cookie_secure)
        .same_site(SameSite::Strict)
        .max_age(time::Duration::seconds(config.ttl_secs))
        .build()
}

/// Expired `session_id` cookie that makes the browser drop its copy
pub fn clear_session_cookie(config: &SessionConfig) -> Cookie<'static> {
    let mut cookie = Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .http_only(true)
        .secure(config.cookie_secure)
        .same_site(SameSite::Strict)
        .build();
    cookie.make_removal();
    cookie
}
