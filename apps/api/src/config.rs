use anyhow::{bail, Context, Result};
use chrono::Duration;

/// Name of the cookie carrying the encoded session bundle.
pub const SESSION_COOKIE_NAME: &str = "buyer-lead-app-session";

/// Magic-link tokens are valid for 24 hours after issuance.
pub const TOKEN_TTL_HOURS: i64 = 24;

/// Sessions (and the cookie Max-Age) last one week.
pub const SESSION_TTL_DAYS: i64 = 7;

/// The cookie signing key is derived from the secret; shorter secrets are rejected.
const MIN_SECRET_LEN: usize = 32;

/// Application configuration loaded from environment variables.
/// Built once at startup and shared read-only through `AppState`.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub session_secret: String,
    pub resend_api_key: String,
    pub email_from: String,
    pub app_url: String,
    pub port: u16,
    pub rust_log: String,
    pub production: bool,
    pub token_ttl: Duration,
    pub session_ttl: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .with_context(|| format!("Required environment variable '{key}' is not set"))
        };

        let session_secret = require("SESSION_SECRET")?;
        if session_secret.len() < MIN_SECRET_LEN {
            bail!("SESSION_SECRET must be at least {MIN_SECRET_LEN} bytes long");
        }

        let app_url = lookup("APP_URL").unwrap_or_else(|| "http://localhost:3000".to_string());

        Ok(Config {
            database_url: require("DATABASE_URL")?,
            session_secret,
            resend_api_key: require("RESEND_API_KEY")?,
            email_from: lookup("EMAIL_FROM")
                .unwrap_or_else(|| "Buyer Lead App <onboarding@resend.dev>".to_string()),
            app_url: app_url.trim_end_matches('/').to_string(),
            port: lookup("PORT")
                .unwrap_or_else(|| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            production: lookup("APP_ENV").is_some_and(|v| v == "production"),
            token_ttl: Duration::hours(TOKEN_TTL_HOURS),
            session_ttl: Duration::days(SESSION_TTL_DAYS),
        })
    }
}
