use axum::{
    extract::State,
    http::{header::SET_COOKIE, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::info;

use crate::errors::AppError;
use crate::state::AppState;

/// POST /api/v1/auth/sign-out
///
/// Ends the session at the auth provider and relays its cookie changes.
pub async fn handle_sign_out(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let cookies = state.sessions.sign_out(&headers).await?;
    info!("Signed out session ({} cookie updates)", cookies.len());

    let mut response = StatusCode::NO_CONTENT.into_response();
    for cookie in cookies {
        if let Ok(value) = HeaderValue::from_str(&cookie) {
            response.headers_mut().append(SET_COOKIE, value);
        }
    }
    Ok(response)
}
