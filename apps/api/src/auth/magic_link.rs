//! Passwordless login: issue a single-use token, mail it as a link, and
//! exchange it for a session bundle.

use chrono::{DateTime, Duration, Utc};
use rand::{distr::Alphanumeric, Rng};
use tracing::{error, info, warn};

use crate::auth::session::SessionBundle;
use crate::auth::store::AuthStore;
use crate::email::{EmailMessage, MagicLinkEmail, Mailer};
use crate::errors::AppError;

pub const TOKEN_LEN: usize = 32;

/// A random, URL-safe token.
pub fn generate_token() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LEN)
        .map(char::from)
        .collect()
}

pub fn verification_url(app_url: &str, token: &str) -> String {
    format!("{app_url}/auth/verify?token={token}")
}

/// Persists a fresh token, ensures a user exists for `email`, and mails
/// the link.
///
/// A dispatch failure fails the request but leaves the token row in place.
pub async fn send_magic_link(
    store: &dyn AuthStore,
    mailer: &dyn Mailer,
    app_url: &str,
    token_ttl: Duration,
    email: &str,
) -> Result<(), AppError> {
    let token = generate_token();
    let expires = Utc::now() + token_ttl;

    store.create_verification_token(email, &token, expires).await?;
    store.upsert_user_by_email(email).await?;

    let content = MagicLinkEmail::new(&verification_url(app_url, &token));
    let message = EmailMessage {
        to: email.to_string(),
        subject: content.subject,
        text: content.text,
        html: content.html,
    };

    mailer.send(&message).await.map_err(|e| {
        error!("Failed to send magic link to {email}: {e}");
        AppError::Email(e)
    })?;

    info!("Magic link issued for {email}");
    Ok(())
}

/// Exchanges a token for a session bundle expiring `session_ttl` after `now`.
///
/// An expired token is deleted and reported as such; afterwards it is
/// indistinguishable from one that never existed.
pub async fn verify_token(
    store: &dyn AuthStore,
    token: &str,
    now: DateTime<Utc>,
    session_ttl: Duration,
) -> Result<SessionBundle, AppError> {
    let record = store
        .find_verification_token(token)
        .await?
        .ok_or(AppError::InvalidToken)?;

    if record.is_expired(now) {
        store.delete_verification_token(token).await?;
        warn!("Expired magic link presented for {}", record.email);
        return Err(AppError::TokenExpired);
    }

    let user = store
        .find_user_by_email(&record.email)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let bundle = SessionBundle::for_user(&user, now + session_ttl);
    store.delete_verification_token(token).await?;

    info!("Session issued for user {}", user.id);
    Ok(bundle)
}
