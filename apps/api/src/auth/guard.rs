use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tracing::debug;

use super::Session;
use crate::errors::AppError;
use crate::state::AppState;

/// Route middleware gating every item route behind a signed-in session.
///
/// No session: 303 to the login path, the handler never runs.
/// Session: stored in request extensions for `CurrentSession`.
pub async fn require_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(session) = state.sessions.get_session(request.headers()).await? else {
        debug!(path = %request.uri().path(), "No session, redirecting to login");
        return Ok(Redirect::to(&state.config.login_path).into_response());
    };

    request.extensions_mut().insert(session);
    Ok(next.run(request).await)
}

/// The session `require_session` resolved for this request.
pub struct CurrentSession(pub Session);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentSession
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Session>()
            .cloned()
            .map(CurrentSession)
            .ok_or(AppError::Unauthorized)
    }
}
