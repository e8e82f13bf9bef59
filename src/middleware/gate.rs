//! The access gate in front of the application routes. Requests without a
//! valid session are redirected to the identity provider's sign-in flow.
use std::sync::LazyLock;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse as _, Redirect, Response},
};
use axum_extra::extract::CookieJar;

use crate::{constants::auth::SESSION_COOKIE, state::AppState, utils::httperror::HttpError};

/// Paths the gate never applies to: framework assets under `_next` and
/// anything that looks like a file (contains a `.`).
static EXCLUDED_PATHS: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r"^/(?:_next|.*\.)").expect("Excluded path regex invalid")
});

/// Whether the gate lets `path` through without a session.
pub fn is_excluded(path: &str) -> bool {
    EXCLUDED_PATHS.is_match(path)
}

/// Build the redirect into the sign-in flow, returning the visitor to
/// `requested` once they have signed in.
fn sign_in_redirect(sign_in_url: &str, requested: &str) -> Response {
    let separator = if sign_in_url.contains('?') { '&' } else { '?' };
    Redirect::to(&format!(
        "{sign_in_url}{separator}post_login_redirect_url={}",
        urlencoding::encode(requested)
    ))
    .into_response()
}

/// Middleware requiring a session for every non-excluded path. Authenticated
/// requests pass through unchanged apart from a `UserId` extension.
pub async fn access_gate(
    State(state): State<AppState>,
    cookie_jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, HttpError> {
    let path = req.uri().path();
    let sign_in_path = state.sign_in_url.split('?').next().unwrap_or_default();
    if is_excluded(path) || path == sign_in_path {
        return Ok(next.run(req).await);
    }
    let requested = req
        .uri()
        .path_and_query()
        .map_or_else(|| path.to_owned(), ToString::to_string);
    let Some(session_cookie) = cookie_jar.get(SESSION_COOKIE) else {
        tracing::debug!(%requested, "No session cookie, redirecting to sign in");
        return Ok(sign_in_redirect(&state.sign_in_url, &requested));
    };
    let user_id = state
        .sessions
        .user_id(session_cookie.value())
        .await
        .map_err(|err| {
            tracing::error!("Error loading session from store: {err}");
            HttpError::internal()
        })?;
    let Some(user_id) = user_id else {
        tracing::debug!(%requested, "Invalid session token, redirecting to sign in");
        return Ok(sign_in_redirect(&state.sign_in_url, &requested));
    };
    req.extensions_mut().insert(user_id);
    Ok(next.run(req).await)
}
