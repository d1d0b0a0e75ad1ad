use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::cookies::cookie_value;
use crate::auth::{validate_jwt, AuthError};
use crate::config::SecurityConfig;
use crate::error::ApiError;
use crate::state::AppState;

/// Verified session principal, injected into request extensions by `require_session`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    pub user_id: String,
    pub username: String,
}

impl Session {
    /// The owner a request may act for: always the principal. A differing
    /// path or body owner is refused.
    pub fn authorize_owner<'a>(&'a self, claimed: &str) -> Result<&'a str, ApiError> {
        if claimed == self.user_id {
            Ok(&self.user_id)
        } else {
            tracing::warn!(
                "Session '{}' attempted to act on resources of '{}'",
                self.user_id,
                claimed
            );
            Err(ApiError::forbidden("You may only access your own opportunities"))
        }
    }
}

/// Why a request carries no valid session. Rendered as a 401 by the middleware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRejection {
    reason: String,
}

impl SessionRejection {
    fn new(reason: impl Into<String>) -> Self {
        Self { reason: reason.into() }
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}

impl From<SessionRejection> for ApiError {
    fn from(rejection: SessionRejection) -> Self {
        ApiError::unauthorized(rejection.reason)
    }
}

impl IntoResponse for SessionRejection {
    fn into_response(self) -> Response {
        ApiError::from(self).into_response()
    }
}

/// Decides whether a request carries a valid session. Has no side effects:
/// the caller decides what to do with a rejection.
pub struct SessionGate<'a> {
    secret: &'a str,
    cookie_name: &'a str,
}

impl<'a> SessionGate<'a> {
    pub fn new(security: &'a SecurityConfig) -> Self {
        Self {
            secret: &security.jwt_secret,
            cookie_name: &security.session_cookie,
        }
    }

    pub fn validate(&self, headers: &HeaderMap) -> Result<Session, SessionRejection> {
        let token = self.extract_token(headers)?;

        let claims = validate_jwt(&token, self.secret).map_err(|e| match e {
            AuthError::Expired => SessionRejection::new("Session expired"),
            AuthError::InvalidSecret => SessionRejection::new("Session validation is not configured"),
            _ => SessionRejection::new("Invalid session token"),
        })?;

        if claims.sub.is_empty() {
            return Err(SessionRejection::new("Session token has no subject"));
        }

        Ok(Session {
            user_id: claims.sub,
            username: claims.username,
        })
    }

    /// Bearer header first, then the session cookie.
    fn extract_token(&self, headers: &HeaderMap) -> Result<String, SessionRejection> {
        if let Some(auth_header) = headers.get(header::AUTHORIZATION) {
            let auth_str = auth_header
                .to_str()
                .map_err(|_| SessionRejection::new("Invalid Authorization header format"))?;

            return match auth_str.strip_prefix("Bearer ") {
                Some(token) if !token.trim().is_empty() => Ok(token.trim().to_string()),
                Some(_) => Err(SessionRejection::new("Empty session token")),
                None => Err(SessionRejection::new(
                    "Authorization header must use Bearer token format",
                )),
            };
        }

        match cookie_value(headers, self.cookie_name) {
            Some(token) if !token.is_empty() => Ok(token),
            _ => Err(SessionRejection::new("No active session")),
        }
    }
}

/// Session middleware: runs the gate and either injects the `Session` or
/// answers with the rejection. The wrapped handler never runs on rejection.
pub async fn require_session(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let gate = SessionGate::new(&state.config.security);

    match gate.validate(request.headers()) {
        Ok(session) => {
            tracing::debug!("Session accepted for user {}", session.user_id);
            request.extensions_mut().insert(session);
            next.run(request).await
        }
        Err(rejection) => {
            tracing::warn!(
                "Rejected {} {}: {}",
                request.method(),
                request.uri().path(),
                rejection.reason()
            );
            rejection.into_response()
        }
    }
}
