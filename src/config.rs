use serde::Deserialize;

/// Deployment environment. Production cookies are Secure + SameSite=None so a
/// browser frontend on another origin can send them; development stays on Lax
/// over plain HTTP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn from_env() -> Self {
        match std::env::var("APP_ENV").as_deref() {
            Ok("production") => Environment::Production,
            _ => Environment::Development,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub environment: Environment,
    /// Base URL the password-reset link points back to.
    pub public_url: String,
    /// Frontend origin allowed to send credentialed requests.
    pub cors_origin: String,
    pub jwt: JwtConfig,
    pub smtp: SmtpConfig,
    pub reset_token_ttl_minutes: i64,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            ttl_minutes: std::env::var("JWT_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60 * 24),
        };
        let smtp = SmtpConfig {
            host: std::env::var("SMTP_HOST").unwrap_or_else(|_| "localhost".into()),
            port: std::env::var("SMTP_PORT")
                .ok()
                .and_then(|v| v.parse::<u16>().ok())
                .unwrap_or(587),
            username: std::env::var("SMTP_USERNAME").unwrap_or_default(),
            password: std::env::var("SMTP_PASSWORD").unwrap_or_default(),
            from: std::env::var("SMTP_FROM")
                .unwrap_or_else(|_| "Feedbacia <noreply@feedbacia.app>".into()),
        };
        Ok(Self {
            database_url,
            environment: Environment::from_env(),
            public_url: std::env::var("PUBLIC_URL")
                .unwrap_or_else(|_| "http://localhost:3000".into()),
            cors_origin: std::env::var("CORS_ORIGIN")
                .unwrap_or_else(|_| "http://localhost:5173".into()),
            jwt,
            smtp,
            reset_token_ttl_minutes: std::env::var("RESET_TOKEN_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(10),
        })
    }
}
