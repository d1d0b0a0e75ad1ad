use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::{generate_jwt, hash_password, verify_password, Claims};
use crate::database::bounded;
use crate::database::models::{NewUser, User};
use crate::error::{ApiError, ApiResult};
use crate::middleware::cookies::{cleared_cookies, session_cookies};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// POST /signup - Create an account and open a session
///
/// Expected Input:
/// ```json
/// { "username": "string", "email": "string", "password": "string" }
/// ```
///
/// Sets the `token`, `userID` and `username` cookies on success.
pub async fn signup(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> ApiResult<(CookieJar, Json<Value>)> {
    let Json(request) = payload?;

    let username = request.username.trim().to_string();
    let email = normalize_email(&request.email);
    if username.is_empty() || email.is_empty() || request.password.is_empty() {
        return Err(ApiError::bad_request("Please fill all fields"));
    }
    if !email.contains('@') {
        return Err(ApiError::bad_request(format!("'{}' is not a valid email address", email)));
    }

    let cost = state.config.security.password_cost;
    let password = request.password;
    let password_hash = blocking(move || hash_password(&password, cost)).await??;

    let user = User::from_new(NewUser {
        username,
        email,
        password_hash,
    });

    bounded(state.config.request_timeout(), state.users.insert_user(&user))
        .await
        .map_err(|e| match ApiError::from(e) {
            ApiError::Conflict(_) => ApiError::conflict("An account with this email already exists"),
            other => other,
        })?;

    tracing::info!("Registered user {} ({})", user.username, user.id);

    let token = issue_token(&state, &user)?;
    let jar = session_cookies(jar, &state.config.security, &token, &user.id.to_string(), &user.username);
    Ok((jar, Json(json!({ "user": user }))))
}

/// POST /login - Verify credentials and open a session
///
/// Expected Input:
/// ```json
/// { "email": "string", "password": "string" }
/// ```
///
/// Unknown email and wrong password get the same 401 message.
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<(CookieJar, Json<Value>)> {
    let Json(request) = payload?;

    let email = normalize_email(&request.email);
    if email.is_empty() || request.password.is_empty() {
        return Err(ApiError::bad_request("Please fill all fields"));
    }

    let user = bounded(state.config.request_timeout(), state.users.find_by_email(&email))
        .await?
        .ok_or_else(|| {
            tracing::warn!("Login failed: unknown email");
            ApiError::unauthorized(INVALID_CREDENTIALS)
        })?;

    let password = request.password;
    let stored = user.password_hash.clone();
    if !blocking(move || verify_password(&password, &stored)).await?? {
        tracing::warn!("Login failed: wrong password for user {}", user.id);
        return Err(ApiError::unauthorized(INVALID_CREDENTIALS));
    }

    let token = issue_token(&state, &user)?;
    tracing::info!("User {} logged in", user.id);

    let jar = session_cookies(jar, &state.config.security, &token, &user.id.to_string(), &user.username);
    Ok((jar, Json(json!({ "user": user, "token": token }))))
}

/// POST /logout - Expire the session cookies
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> (CookieJar, Json<Value>) {
    (
        cleared_cookies(jar, &state.config.security),
        Json(json!({ "success": "Logged out." })),
    )
}

fn issue_token(state: &AppState, user: &User) -> Result<String, ApiError> {
    let claims = Claims::new(user.id, user.username.clone(), state.config.security.jwt_expiry_hours);
    Ok(generate_jwt(&claims, &state.config.security.jwt_secret)?)
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Run password hashing off the async workers.
async fn blocking<T, F>(work: F) -> Result<T, ApiError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work).await.map_err(|e| {
        tracing::error!("Password task failed: {}", e);
        ApiError::internal_server_error("Authentication is unavailable")
    })
}
