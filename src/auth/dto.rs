use serde::{Deserialize, Serialize};

use crate::auth::repo_types::User;

/// Request body for signup.
#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(rename = "passwordConfirm")]
    pub password_confirm: String,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Request body for requesting a password reset.
#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

/// Request body for consuming a reset token.
#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub password: String,
    #[serde(rename = "passwordConfirm")]
    pub password_confirm: String,
}

/// Request body for an authenticated password change.
#[derive(Debug, Deserialize)]
pub struct UpdatePasswordRequest {
    #[serde(rename = "currentPassword")]
    pub current_password: String,
    pub password: String,
    #[serde(rename = "passwordConfirm")]
    pub password_confirm: String,
}

/// Response for signup, login, reset and password change. The user record
/// serializes without its credential fields.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub status: &'static str,
    pub token: String,
    pub data: AuthData,
}

#[derive(Debug, Serialize)]
pub struct AuthData {
    pub user: User,
}

impl AuthResponse {
    pub fn new(token: String, user: User) -> Self {
        Self {
            status: "success",
            token,
            data: AuthData { user },
        }
    }
}

/// Plain status + message body, e.g. the generic forgot-password reply.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub status: &'static str,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;
    use uuid::Uuid;

    #[test]
    fn request_fields_use_camel_case() {
        let body = r#"{
            "name": "Ada",
            "email": "a@x.com",
            "password": "Passw0rd!",
            "passwordConfirm": "Passw0rd!"
        }"#;
        let req: SignupRequest = serde_json::from_str(body).expect("deserialize");
        assert_eq!(req.password_confirm, "Passw0rd!");

        let body = r#"{
            "currentPassword": "old",
            "password": "new",
            "passwordConfirm": "new"
        }"#;
        let req: UpdatePasswordRequest = serde_json::from_str(body).expect("deserialize");
        assert_eq!(req.current_password, "old");
    }

    #[test]
    fn auth_response_never_exposes_hash() {
        let user = User {
            id: Uuid::new_v4(),
            name: "Ada".into(),
            email: "a@x.com".into(),
            password_hash: "$argon2id$secret".into(),
            password_changed_at: None,
            password_reset_token_hash: None,
            password_reset_expires_at: None,
            created_at: OffsetDateTime::now_utc(),
        };
        let json =
            serde_json::to_string(&AuthResponse::new("tok".into(), user)).expect("serialize");
        assert!(json.contains(r#""status":"success""#));
        assert!(json.contains("a@x.com"));
        assert!(!json.contains("argon2id"));
    }
}
