use std::time::Duration;

use axum::extract::FromRef;
use axum_extra::extract::cookie::{Cookie, SameSite};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use crate::config::{Environment, JwtConfig};
use crate::state::AppState;

/// Name of the cookie carrying the bearer credential.
pub const AUTH_COOKIE: &str = "jwt";

/// JWT payload: who, when issued, when it stops being valid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub iat: usize,
    pub exp: usize,
}

#[derive(Clone)]
pub struct JwtKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
    pub ttl: Duration,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        let JwtConfig {
            secret,
            ttl_minutes,
        } = state.config.jwt.clone();
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::from_secs((ttl_minutes as u64) * 60),
        }
    }
}

impl JwtKeys {
    pub fn sign(&self, user_id: Uuid) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let exp = now + TimeDuration::seconds(self.ttl.as_secs() as i64);
        let claims = Claims {
            sub: user_id,
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(user_id = %user_id, "jwt signed");
        Ok(token)
    }

    /// Fails on a bad signature or an expired token. Zero leeway: a token is
    /// rejected the second its expiry passes.
    pub fn verify(&self, token: &str) -> anyhow::Result<Claims> {
        let mut validation = Validation::default();
        validation.leeway = 0;
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        debug!(user_id = %data.claims.sub, "jwt verified");
        Ok(data.claims)
    }
}

/// Credential cookie matching the token's own lifetime. Production adds
/// Secure + SameSite=None for the cross-site frontend.
pub fn auth_cookie(token: String, ttl: Duration, environment: Environment) -> Cookie<'static> {
    let mut builder = Cookie::build((AUTH_COOKIE, token))
        .path("/")
        .http_only(true)
        .max_age(TimeDuration::seconds(ttl.as_secs() as i64));

    builder = match environment {
        Environment::Production => builder.secure(true).same_site(SameSite::None),
        Environment::Development => builder.same_site(SameSite::Lax),
    };

    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_keys() -> JwtKeys {
        JwtKeys::from_ref(&AppState::fake())
    }

    #[tokio::test]
    async fn sign_and_verify_roundtrip() {
        let keys = make_keys();
        let user_id = Uuid::new_v4();
        let token = keys.sign(user_id).expect("sign");
        let claims = keys.verify(&token).expect("verify");
        assert_eq!(claims.sub, user_id);
        assert!(claims.exp > claims.iat);
    }

    #[tokio::test]
    async fn verify_rejects_wrong_secret() {
        let keys = make_keys();
        let other = JwtKeys {
            encoding: EncodingKey::from_secret(b"another-secret"),
            decoding: DecodingKey::from_secret(b"another-secret"),
            ttl: Duration::from_secs(300),
        };
        let token = other.sign(Uuid::new_v4()).expect("sign");
        assert!(keys.verify(&token).is_err());
    }

    #[tokio::test]
    async fn verify_rejects_expired_token() {
        let keys = make_keys();
        let past = OffsetDateTime::now_utc() - TimeDuration::minutes(30);
        let claims = Claims {
            sub: Uuid::new_v4(),
            iat: (past - TimeDuration::minutes(5)).unix_timestamp() as usize,
            exp: past.unix_timestamp() as usize,
        };
        let token = encode(&Header::default(), &claims, &keys.encoding).expect("encode");
        assert!(keys.verify(&token).is_err());
    }

    #[tokio::test]
    async fn verify_rejects_garbage() {
        let keys = make_keys();
        assert!(keys.verify("not.a.jwt").is_err());
    }

    #[test]
    fn development_cookie_attributes() {
        let cookie = auth_cookie(
            "token".into(),
            Duration::from_secs(600),
            Environment::Development,
        );
        assert_eq!(cookie.name(), AUTH_COOKIE);
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_ne!(cookie.secure(), Some(true));
        assert_eq!(cookie.max_age(), Some(TimeDuration::seconds(600)));
    }

    #[test]
    fn production_cookie_attributes() {
        let cookie = auth_cookie(
            "token".into(),
            Duration::from_secs(600),
            Environment::Production,
        );
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::None));
        assert_eq!(cookie.http_only(), Some(true));
    }
}
