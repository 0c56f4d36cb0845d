use lazy_static::lazy_static;
use regex::Regex;
use time::{Duration, OffsetDateTime};
use tracing::{error, info, warn};

use crate::auth::password::{
    generate_reset_token, hash_password, reset_token_digest,
};
use crate::auth::repo_types::User;
use crate::error::ApiError;
use crate::state::AppState;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Password policy for every path that sets a password: signup, the
/// authenticated change and reset-token consumption.
pub(crate) fn validate_new_password(
    password: &str,
    password_confirm: &str,
) -> Result<(), ApiError> {
    if password.len() < 8 {
        return Err(ApiError::Validation("Password too short".into()));
    }
    if password != password_confirm {
        return Err(ApiError::Validation("Passwords do not match".into()));
    }
    Ok(())
}

fn reset_url(public_url: &str, raw_token: &str) -> String {
    format!(
        "{}/api/v1/user/reset-password/{}",
        public_url.trim_end_matches('/'),
        raw_token
    )
}

fn reset_email_body(reset_url: &str) -> String {
    format!(
        "Forgot your password? Submit a PATCH request with password and \
         passwordConfirm at: {reset_url}. If you didn't request this, simply \
         ignore it."
    )
}

/// Start a password reset: persist the token digest with its expiry, then
/// mail the raw token. A delivery failure rolls the columns back so no
/// orphaned token stays live.
///
/// An unknown email is reported as 404, which reveals account existence.
pub async fn request_password_reset(state: &AppState, email: &str) -> Result<(), ApiError> {
    let user = User::find_by_email(&state.db, email)
        .await
        .map_err(ApiError::internal)?
        .ok_or_else(|| ApiError::NotFound("No user with provided email exists".into()))?;

    let raw_token = generate_reset_token();
    let expires_at =
        OffsetDateTime::now_utc() + Duration::minutes(state.config.reset_token_ttl_minutes);
    User::set_reset_token(&state.db, user.id, &reset_token_digest(&raw_token), expires_at)
        .await
        .map_err(ApiError::internal)?;

    let url = reset_url(&state.config.public_url, &raw_token);
    let subject = format!(
        "Reset Link (Valid for {} mins only)",
        state.config.reset_token_ttl_minutes
    );

    match state
        .mailer
        .send(&user.email, &subject, &reset_email_body(&url))
        .await
    {
        Ok(()) => {
            info!(user_id = %user.id, "reset link sent");
            Ok(())
        }
        Err(e) => {
            error!(error = %e, user_id = %user.id, "reset email delivery failed");
            if let Err(clear_err) = User::clear_reset_token(&state.db, user.id).await {
                error!(error = %clear_err, user_id = %user.id, "failed to clear reset token");
            }
            Err(ApiError::Delivery(
                "There was an error sending the email. Please try again".into(),
            ))
        }
    }
}

/// Exchange a presented reset token for a new password. The consuming update
/// itself re-checks the digest and expiry, so of two concurrent presentations
/// of the same token exactly one succeeds.
pub async fn consume_password_reset(
    state: &AppState,
    raw_token: &str,
    password: &str,
    password_confirm: &str,
) -> Result<User, ApiError> {
    let digest = reset_token_digest(raw_token);
    let user = User::find_by_reset_token(&state.db, &digest)
        .await
        .map_err(ApiError::internal)?
        .ok_or_else(|| {
            warn!("reset attempted with unknown or expired token");
            ApiError::Validation("Token is invalid or has expired".into())
        })?;

    validate_new_password(password, password_confirm)?;

    let hash = hash_password(password).map_err(ApiError::internal)?;
    let user = User::reset_password(&state.db, user.id, &hash, &digest)
        .await
        .map_err(ApiError::internal)?
        .ok_or_else(|| {
            // Lost the race against another presentation of the same token.
            warn!("reset token already consumed");
            ApiError::Validation("Token is invalid or has expired".into())
        })?;

    info!(user_id = %user.id, "password reset consumed");
    Ok(user)
}
