//! Session gate
//!
//! `load_session` runs for every request and attaches a [`SessionContext`]
//! extension. `require_host` is layered on the `/host` routes only and sends
//! anonymous visitors to the login page.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use tracing::{debug, warn};

use crate::api::found;
use crate::db::sessions::load_session_user;
use crate::db::users::User;
use crate::AppState;

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "homestay_session";

/// Who is making the request
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    /// Raw cookie token, present even if it no longer resolves to a user
    pub token: Option<String>,
    pub user: Option<User>,
}

impl SessionContext {
    pub fn is_logged_in(&self) -> bool {
        self.user.is_some()
    }
}

/// Extract the session token from the `Cookie` header(s)
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, token)| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

fn cookie_attributes(secure: bool) -> &'static str {
    if secure {
        "Path=/; HttpOnly; SameSite=Lax; Secure"
    } else {
        "Path=/; HttpOnly; SameSite=Lax"
    }
}

/// `Set-Cookie` value establishing a session
///
/// `secure` adds the `Secure` attribute; set it when served over HTTPS.
pub fn session_cookie(token: &str, ttl_hours: i64, secure: bool) -> String {
    format!(
        "{}={}; {}; Max-Age={}",
        SESSION_COOKIE,
        token,
        cookie_attributes(secure),
        ttl_hours.max(0) * 3600
    )
}

/// `Set-Cookie` value clearing the session
pub fn clear_session_cookie(secure: bool) -> String {
    format!("{}=; {}; Max-Age=0", SESSION_COOKIE, cookie_attributes(secure))
}

/// Session middleware
///
/// A lookup failure is logged and treated as anonymous.
pub async fn load_session(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let token = session_token(request.headers());

    let user = match &token {
        Some(token) => match load_session_user(&state.db, token).await {
            Ok(user) => user,
            Err(e) => {
                warn!(error = %e, "Session lookup failed");
                None
            }
        },
        None => None,
    };

    request.extensions_mut().insert(SessionContext { token, user });
    next.run(request).await
}

/// Redirect to `/login` unless the request carries a live session
pub async fn require_host(request: Request, next: Next) -> Response {
    let logged_in = request
        .extensions()
        .get::<SessionContext>()
        .map(SessionContext::is_logged_in)
        .unwrap_or(false);

    if !logged_in {
        debug!(path = %request.uri().path(), "Anonymous request to host page, redirecting");
        return found("/login");
    }

    next.run(request).await
}
