use axum::{http::StatusCode, response::Redirect};
use axum_extra::extract::cookie::CookieJar;

use crate::web::{AppState, AuthUser, auth};

/// Gate for admin pages reached by navigation; failures redirect.
pub async fn require_admin_user(state: &AppState, jar: &CookieJar) -> Result<AuthUser, Redirect> {
    let user = auth::require_user_redirect(state, jar).await?;

    if !user.is_admin {
        return Err(Redirect::to("/?error=not_authorized"));
    }

    Ok(user)
}

/// Gate for admin endpoints called from page scripts (PUT/DELETE); failures
/// map to status codes instead of redirects.
pub async fn require_admin_api(state: &AppState, jar: &CookieJar) -> Result<AuthUser, StatusCode> {
    let Some(user) = auth::current_user(state, jar).await else {
        return Err(StatusCode::UNAUTHORIZED);
    };

    if !user.is_admin {
        return Err(StatusCode::FORBIDDEN);
    }

    Ok(user)
}
