use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::extract::cookie::CookieJar;
use tracing::warn;

use crate::auth::jwt::{JwtKeys, AUTH_COOKIE};
use crate::auth::repo_types::User;
use crate::error::ApiError;
use crate::state::AppState;

/// Request gate: extracts the bearer credential, verifies it, resolves the
/// user it names and rejects tokens older than the last password change.
/// Handlers that take a `CurrentUser` are only reached by authenticated
/// requests.
pub struct CurrentUser(pub User);

fn extract_token(parts: &Parts) -> Option<String> {
    let jar = CookieJar::from_headers(&parts.headers);
    if let Some(cookie) = jar.get(AUTH_COOKIE) {
        return Some(cookie.value().to_string());
    }
    // Cookie is the primary channel; a Bearer header works for API clients.
    parts
        .headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.to_string())
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_token(parts).ok_or_else(|| {
            ApiError::Unauthenticated(
                "You are not logged in, please log in to get access".into(),
            )
        })?;

        let keys = JwtKeys::from_ref(state);
        let claims = keys.verify(&token).map_err(|e| {
            warn!(error = %e, "invalid or expired token");
            ApiError::Unauthenticated("Invalid or expired token".into())
        })?;

        let user = User::find_by_id(&state.db, claims.sub)
            .await
            .map_err(ApiError::internal)?
            .ok_or_else(|| {
                ApiError::Unauthenticated(
                    "The user belonging to this token no longer exists".into(),
                )
            })?;

        if user.changed_password_after(claims.iat) {
            warn!(user_id = %user.id, "token issued before last password change");
            return Err(ApiError::Unauthenticated(
                "User recently changed the password. Please log in again".into(),
            ));
        }

        Ok(CurrentUser(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with_headers(headers: &[(&str, &str)]) -> Parts {
        let mut builder = Request::builder().uri("/");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let (parts, _) = builder.body(()).expect("request").into_parts();
        parts
    }

    #[test]
    fn extracts_token_from_cookie() {
        let parts = parts_with_headers(&[("cookie", "jwt=abc.def.ghi; other=1")]);
        assert_eq!(extract_token(&parts).as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn falls_back_to_bearer_header() {
        let parts = parts_with_headers(&[("authorization", "Bearer abc.def.ghi")]);
        assert_eq!(extract_token(&parts).as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn cookie_wins_over_header() {
        let parts = parts_with_headers(&[
            ("cookie", "jwt=from-cookie"),
            ("authorization", "Bearer from-header"),
        ]);
        assert_eq!(extract_token(&parts).as_deref(), Some("from-cookie"));
    }

    #[test]
    fn missing_credential_yields_none() {
        let parts = parts_with_headers(&[("cookie", "session=unrelated")]);
        assert_eq!(extract_token(&parts), None);
    }
}
