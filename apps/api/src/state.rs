use std::sync::Arc;

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use sqlx::PgPool;

use crate::auth::store::AuthStore;
use crate::config::Config;
use crate::email::Mailer;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    /// Users and verification tokens, behind a trait so the login flow can run without Postgres.
    pub auth_store: Arc<dyn AuthStore>,
    pub mailer: Arc<dyn Mailer>,
    pub config: Arc<Config>,
    /// Signs and verifies the session cookie.
    pub cookie_key: Key,
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}
