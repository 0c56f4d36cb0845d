use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// User record in the database. Credential material never leaves the server:
/// the password hash and reset-token columns are excluded from serialization.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub password_changed_at: Option<OffsetDateTime>,
    #[serde(skip_serializing, default)]
    pub password_reset_token_hash: Option<String>,
    #[serde(skip_serializing, default)]
    pub password_reset_expires_at: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
}

impl User {
    /// True when the password was changed after the given token issue time.
    /// A token issued in the same second as the change still passes, which
    /// lets the auto-login token issued right after a reset work.
    pub fn changed_password_after(&self, token_iat: usize) -> bool {
        match self.password_changed_at {
            Some(changed_at) => changed_at.unix_timestamp() > token_iat as i64,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Duration;

    fn user_changed_at(changed_at: Option<OffsetDateTime>) -> User {
        User {
            id: Uuid::new_v4(),
            name: "Ada".into(),
            email: "ada@example.com".into(),
            password_hash: "$argon2id$fake".into(),
            password_changed_at: changed_at,
            password_reset_token_hash: None,
            password_reset_expires_at: None,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn never_changed_password_is_never_stale() {
        let user = user_changed_at(None);
        assert!(!user.changed_password_after(0));
    }

    #[test]
    fn token_issued_before_change_is_stale() {
        let now = OffsetDateTime::now_utc();
        let user = user_changed_at(Some(now));
        let iat = (now - Duration::minutes(5)).unix_timestamp() as usize;
        assert!(user.changed_password_after(iat));
    }

    #[test]
    fn token_issued_at_or_after_change_is_fresh() {
        let now = OffsetDateTime::now_utc();
        let user = user_changed_at(Some(now));
        assert!(!user.changed_password_after(now.unix_timestamp() as usize));
        assert!(
            !user.changed_password_after((now + Duration::minutes(1)).unix_timestamp() as usize)
        );
    }

    #[test]
    fn credential_fields_never_serialize() {
        let mut user = user_changed_at(None);
        user.password_reset_token_hash = Some("digest".into());
        let json = serde_json::to_string(&user).expect("serialize");
        assert!(!json.contains("password_hash"));
        assert!(!json.contains("argon2id"));
        assert!(!json.contains("digest"));
        assert!(json.contains("ada@example.com"));
    }
}
