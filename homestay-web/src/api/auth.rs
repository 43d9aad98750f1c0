//! Login, signup and logout
//!
//! Failed form submissions re-render the form with a 422 status.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Extension, Form, Router,
};
use serde::Deserialize;
use tracing::{info, warn};

use super::found;
use crate::db::sessions::{create_session, delete_session, purge_expired_sessions};
use crate::db::users::{create_user, verify_credentials, NewUser, UserType};
use crate::error::ApiResult;
use crate::gate::{clear_session_cookie, session_cookie, SessionContext};
use crate::views::{self, SignupValues};
use crate::AppState;

const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct SignupForm {
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    #[serde(default)]
    pub user_type: String,
}

impl SignupForm {
    /// Validate and convert; the error is shown to the user
    fn to_new_user(&self) -> Result<NewUser, String> {
        let first_name = self.first_name.trim();
        if first_name.is_empty() {
            return Err("First name is required".to_string());
        }
        let email = self.email.trim();
        if !email.contains('@') {
            return Err("Please enter a valid email".to_string());
        }
        if self.password.len() < MIN_PASSWORD_LEN {
            return Err(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LEN
            ));
        }
        if self.password != self.confirm_password {
            return Err("Passwords do not match".to_string());
        }
        let user_type: UserType = self
            .user_type
            .parse()
            .map_err(|_| "Please choose guest or host".to_string())?;

        Ok(NewUser {
            email: email.to_string(),
            first_name: first_name.to_string(),
            last_name: self.last_name.trim().to_string(),
            user_type,
            password: self.password.clone(),
        })
    }

    fn values(&self) -> SignupValues<'_> {
        SignupValues {
            email: &self.email,
            first_name: &self.first_name,
            last_name: &self.last_name,
            user_type: &self.user_type,
        }
    }
}

/// GET /login
pub async fn login_page(Extension(session): Extension<SessionContext>) -> Response {
    if session.is_logged_in() {
        return found("/");
    }
    Html(views::login(None, "")).into_response()
}

/// POST /login
pub async fn login(State(state): State<AppState>, Form(form): Form<LoginForm>) -> ApiResult<Response> {
    let Some(user) = verify_credentials(&state.db, &form.email, &form.password).await? else {
        warn!(email = %form.email, "Failed login attempt");
        return Ok((
            StatusCode::UNPROCESSABLE_ENTITY,
            Html(views::login(Some("Invalid email or password"), &form.email)),
        )
            .into_response());
    };

    // Expired rows are only ever removed here and at startup
    if let Err(e) = purge_expired_sessions(&state.db).await {
        warn!(error = %e, "Could not purge expired sessions");
    }

    let ttl_hours = state.settings.session_ttl_hours;
    let token = create_session(&state.db, user.guid, ttl_hours).await?;
    info!(user = %user.guid, user_type = %user.user_type, "User logged in");

    Ok((
        [(
            header::SET_COOKIE,
            session_cookie(&token, ttl_hours, state.settings.secure_cookie),
        )],
        found("/"),
    )
        .into_response())
}

/// POST /logout
pub async fn logout(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
) -> ApiResult<Response> {
    if let Some(token) = &session.token {
        delete_session(&state.db, token).await?;
    }
    if let Some(user) = &session.user {
        info!(user = %user.guid, "User logged out");
    }

    Ok((
        [(header::SET_COOKIE, clear_session_cookie(state.settings.secure_cookie))],
        found("/login"),
    )
        .into_response())
}

/// GET /signup
pub async fn signup_page() -> Html<String> {
    Html(views::signup(None, &SignupValues::default()))
}

/// POST /signup
pub async fn signup(State(state): State<AppState>, Form(form): Form<SignupForm>) -> ApiResult<Response> {
    let rejected = |message: &str| {
        (
            StatusCode::UNPROCESSABLE_ENTITY,
            Html(views::signup(Some(message), &form.values())),
        )
            .into_response()
    };

    let new_user = match form.to_new_user() {
        Ok(new_user) => new_user,
        Err(message) => return Ok(rejected(&message)),
    };

    match create_user(&state.db, &new_user).await {
        Ok(guid) => {
            info!(user = %guid, user_type = %new_user.user_type, "User signed up");
            Ok(found("/login"))
        }
        Err(homestay_common::Error::InvalidInput(message)) => Ok(rejected(&message)),
        Err(e) => Err(e.into()),
    }
}

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(login_page).post(login))
        .route("/signup", get(signup_page).post(signup))
        .route("/logout", post(logout))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(password: &str, confirm: &str, user_type: &str) -> SignupForm {
        SignupForm {
            first_name: "Hana".to_string(),
            last_name: String::new(),
            email: "hana@example.com".to_string(),
            password: password.to_string(),
            confirm_password: confirm.to_string(),
            user_type: user_type.to_string(),
        }
    }

    #[test]
    fn test_signup_validation() {
        assert!(form("password1", "password1", "host").to_new_user().is_ok());
        assert!(form("short", "short", "host").to_new_user().is_err());
        assert!(form("password1", "password2", "host").to_new_user().is_err());
        assert!(form("password1", "password1", "admin").to_new_user().is_err());
    }
}
