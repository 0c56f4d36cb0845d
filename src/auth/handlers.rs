use axum::{
    extract::{FromRef, Path, State},
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{
            AuthResponse, ForgotPasswordRequest, LoginRequest, MessageResponse,
            ResetPasswordRequest, SignupRequest, UpdatePasswordRequest,
        },
        extractors::CurrentUser,
        jwt::{auth_cookie, JwtKeys},
        password::{hash_password, verify_password},
        repo_types::User,
        repo::is_unique_violation,
        services::{
            consume_password_reset, is_valid_email, request_password_reset,
            validate_new_password,
        },
    },
    error::ApiError,
    state::AppState,
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/user/signup", post(signup))
        .route("/user/login", post(login))
        .route("/user/forgot-password", post(forgot_password))
        .route("/user/reset-password/:token", patch(reset_password))
        .route("/user/update-password", patch(update_password))
        .route("/user/me", get(get_me))
}

/// Sign a JWT for the user and deliver it both in the body and as the
/// http-only credential cookie, with matching lifetimes.
fn send_token(
    state: &AppState,
    user: User,
    status: StatusCode,
) -> Result<(StatusCode, CookieJar, Json<AuthResponse>), ApiError> {
    let keys = JwtKeys::from_ref(state);
    let token = keys.sign(user.id).map_err(ApiError::internal)?;
    let jar = CookieJar::new().add(auth_cookie(
        token.clone(),
        keys.ttl,
        state.config.environment,
    ));
    Ok((status, jar, Json(AuthResponse::new(token, user))))
}

#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AppState>,
    Json(mut payload): Json<SignupRequest>,
) -> Result<(StatusCode, CookieJar, Json<AuthResponse>), ApiError> {
    payload.email = payload.email.trim().to_lowercase();

    if payload.name.trim().is_empty() {
        return Err(ApiError::Validation("Name is required".into()));
    }
    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(ApiError::Validation("Invalid email".into()));
    }
    validate_new_password(&payload.password, &payload.password_confirm)?;

    if User::find_by_email(&state.db, &payload.email)
        .await
        .map_err(ApiError::internal)?
        .is_some()
    {
        warn!(email = %payload.email, "email already registered");
        return Err(ApiError::Validation("Email already in use".into()));
    }

    let hash = hash_password(&payload.password).map_err(ApiError::internal)?;
    // A concurrent signup can slip past the check above and lose the insert
    // race against the unique constraint; that is still a duplicate email,
    // not a server error.
    let user = match User::create(&state.db, payload.name.trim(), &payload.email, &hash).await {
        Ok(u) => u,
        Err(e) if is_unique_violation(&e) => {
            warn!(email = %payload.email, "email already registered");
            return Err(ApiError::Validation("Email already in use".into()));
        }
        Err(e) => return Err(ApiError::internal(e)),
    };

    info!(user_id = %user.id, email = %user.email, "user signed up");
    send_token(&state, user, StatusCode::CREATED)
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(mut payload): Json<LoginRequest>,
) -> Result<(StatusCode, CookieJar, Json<AuthResponse>), ApiError> {
    payload.email = payload.email.trim().to_lowercase();

    if payload.email.is_empty() || payload.password.is_empty() {
        return Err(ApiError::Validation(
            "Please provide email and password".into(),
        ));
    }

    let user = User::find_by_email(&state.db, &payload.email)
        .await
        .map_err(ApiError::internal)?;

    // A missing user and a wrong password are indistinguishable to the caller.
    let user = match user {
        Some(u) => u,
        None => {
            warn!(email = %payload.email, "login unknown email");
            return Err(ApiError::Unauthenticated(
                "Incorrect email or password".into(),
            ));
        }
    };

    let ok = verify_password(&payload.password, &user.password_hash)
        .map_err(ApiError::internal)?;
    if !ok {
        warn!(user_id = %user.id, "login invalid password");
        return Err(ApiError::Unauthenticated(
            "Incorrect email or password".into(),
        ));
    }

    info!(user_id = %user.id, email = %user.email, "user logged in");
    send_token(&state, user, StatusCode::OK)
}

#[instrument(skip(state, payload))]
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let email = payload.email.trim().to_lowercase();
    request_password_reset(&state, &email).await?;

    Ok(Json(MessageResponse {
        status: "success",
        message: "Reset link sent successfully to your email".into(),
    }))
}

#[instrument(skip(state, payload, token))]
pub async fn reset_password(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<(StatusCode, CookieJar, Json<AuthResponse>), ApiError> {
    let user = consume_password_reset(
        &state,
        &token,
        &payload.password,
        &payload.password_confirm,
    )
    .await?;

    // Auto-login with a fresh credential after a successful reset.
    send_token(&state, user, StatusCode::OK)
}

#[instrument(skip(state, payload, current))]
pub async fn update_password(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(payload): Json<UpdatePasswordRequest>,
) -> Result<(StatusCode, CookieJar, Json<AuthResponse>), ApiError> {
    let CurrentUser(user) = current;

    let ok = verify_password(&payload.current_password, &user.password_hash)
        .map_err(ApiError::internal)?;
    if !ok {
        warn!(user_id = %user.id, "wrong current password");
        return Err(ApiError::Unauthenticated(
            "Your current password is not correct".into(),
        ));
    }

    validate_new_password(&payload.password, &payload.password_confirm)?;

    let hash = hash_password(&payload.password).map_err(ApiError::internal)?;
    let user = User::update_password(&state.db, user.id, &hash)
        .await
        .map_err(ApiError::internal)?;

    info!(user_id = %user.id, "password updated");
    // Tokens issued before this point are now stale; hand out a fresh one.
    send_token(&state, user, StatusCode::OK)
}

#[instrument(skip(current))]
pub async fn get_me(current: CurrentUser) -> Json<User> {
    Json(current.0)
}
