use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::repo_types::User;

const USER_COLUMNS: &str = "id, name, email, password_hash, password_changed_at, \
     password_reset_token_hash, password_reset_expires_at, created_at";

impl User {
    pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Create a new user with an already-hashed password.
    pub async fn create(
        db: &PgPool,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (name, email, password_hash)
             VALUES ($1, $2, $3)
             RETURNING {USER_COLUMNS}"
        ))
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .fetch_one(db)
        .await?;
        Ok(user)
    }

    /// Replace the password and bump `password_changed_at`, which invalidates
    /// every token issued before this moment.
    pub async fn update_password(
        db: &PgPool,
        id: Uuid,
        password_hash: &str,
    ) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users
             SET password_hash = $2, password_changed_at = now()
             WHERE id = $1
             RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(password_hash)
        .fetch_one(db)
        .await?;
        Ok(user)
    }

    /// Store the digest of a freshly issued reset token. Overwrites any
    /// previous token, so at most one is live per user.
    pub async fn set_reset_token(
        db: &PgPool,
        id: Uuid,
        token_digest: &str,
        expires_at: OffsetDateTime,
    ) -> anyhow::Result<()> {
        sqlx::query(
            "UPDATE users
             SET password_reset_token_hash = $2, password_reset_expires_at = $3
             WHERE id = $1",
        )
        .bind(id)
        .bind(token_digest)
        .bind(expires_at)
        .execute(db)
        .await?;
        Ok(())
    }

    /// Clear the reset columns, e.g. after the reset email could not be sent.
    pub async fn clear_reset_token(db: &PgPool, id: Uuid) -> anyhow::Result<()> {
        sqlx::query(
            "UPDATE users
             SET password_reset_token_hash = NULL, password_reset_expires_at = NULL
             WHERE id = $1",
        )
        .bind(id)
        .execute(db)
        .await?;
        Ok(())
    }

    /// Look up the user holding an unexpired reset token with this digest.
    /// Expired or unknown digests simply find nothing.
    pub async fn find_by_reset_token(
        db: &PgPool,
        token_digest: &str,
    ) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users
             WHERE password_reset_token_hash = $1
               AND password_reset_expires_at > now()"
        ))
        .bind(token_digest)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Single-use consumption of a reset token. The update re-checks the
    /// digest and expiry in its own WHERE clause, so two concurrent
    /// presentations of the same token cannot both match: the row is only
    /// updated while the digest is still stored and unexpired, and the update
    /// clears it. `None` means the token was already consumed or expired.
    pub async fn reset_password(
        db: &PgPool,
        id: Uuid,
        password_hash: &str,
        token_digest: &str,
    ) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&consume_reset_sql())
            .bind(id)
            .bind(password_hash)
            .bind(token_digest)
            .fetch_optional(db)
            .await?;
        Ok(user)
    }
}

fn consume_reset_sql() -> String {
    format!(
        "UPDATE users
         SET password_hash = $2,
             password_changed_at = now(),
             password_reset_token_hash = NULL,
             password_reset_expires_at = NULL
         WHERE id = $1
           AND password_reset_token_hash = $3
           AND password_reset_expires_at > now()
         RETURNING {USER_COLUMNS}"
    )
}

/// True when the error wraps a Postgres unique-constraint violation, e.g. a
/// duplicate email losing the insert race.
pub(crate) fn is_unique_violation(err: &anyhow::Error) -> bool {
    err.downcast_ref::<sqlx::Error>()
        .and_then(|e| e.as_database_error())
        .map(|db| db.is_unique_violation())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consume_statement_guards_on_digest_and_expiry() {
        let sql = consume_reset_sql();
        assert!(sql.contains("password_reset_token_hash = $3"));
        assert!(sql.contains("password_reset_expires_at > now()"));
        assert!(sql.contains("password_reset_token_hash = NULL"));
    }

    #[test]
    fn unique_violation_ignores_other_errors() {
        assert!(!is_unique_violation(&anyhow::anyhow!("boom")));
        assert!(!is_unique_violation(&anyhow::Error::from(
            sqlx::Error::RowNotFound
        )));
    }
}
