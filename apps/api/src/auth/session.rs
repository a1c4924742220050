use std::convert::Infallible;

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::{Cookie, CookieJar, Key, SameSite, SignedCookieJar};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::store::AuthStore;
use crate::config::{SESSION_COOKIE_NAME, SESSION_TTL_DAYS};
use crate::errors::AppError;
use crate::models::user::User;
use crate::state::AppState;

/// Payload of the session cookie: JSON, base64 encoded.
///
/// `expires_at` (epoch millis) is informational; the cookie's Max-Age is what
/// actually ends a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionBundle {
    pub email: String,
    #[serde(default)]
    pub user_id: Option<Uuid>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub expires_at: Option<i64>,
}

impl SessionBundle {
    pub fn for_user(user: &User, expires_at: DateTime<Utc>) -> Self {
        Self {
            email: user.email.clone(),
            user_id: Some(user.id),
            name: user.name.clone(),
            expires_at: Some(expires_at.timestamp_millis()),
        }
    }

    pub fn encode(&self) -> String {
        // Serializing a struct of strings and numbers cannot fail.
        let json = serde_json::to_vec(self).unwrap_or_default();
        STANDARD.encode(json)
    }

    /// `None` for anything that is not a base64 JSON bundle with an email.
    pub fn decode(value: &str) -> Option<Self> {
        let bytes = STANDARD.decode(value.trim()).ok()?;
        let bundle: SessionBundle = serde_json::from_slice(&bytes).ok()?;
        (!bundle.email.is_empty()).then_some(bundle)
    }
}

pub fn session_cookie(value: String, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE_NAME, value))
        .http_only(true)
        .path("/")
        .secure(secure)
        .max_age(time::Duration::days(SESSION_TTL_DAYS))
        .same_site(SameSite::Lax)
        .build()
}

/// Expires the session cookie on the client, whether or not the request
/// carried a valid one.
pub fn clear_session_cookie(jar: CookieJar) -> CookieJar {
    jar.add(
        Cookie::build((SESSION_COOKIE_NAME, ""))
            .http_only(true)
            .path("/")
            .max_age(time::Duration::ZERO)
            .same_site(SameSite::Lax)
            .build(),
    )
}

/// Maps a raw cookie value to the user it names, if that user still exists.
pub async fn resolve_session(
    store: &dyn AuthStore,
    cookie_value: Option<&str>,
) -> Result<Option<User>, AppError> {
    let Some(bundle) = cookie_value.and_then(SessionBundle::decode) else {
        return Ok(None);
    };
    store.find_user_by_email(&bundle.email).await
}

/// The authenticated caller. Rejects with 401 when the session is missing,
/// tampered with, undecodable, or names a user that no longer exists.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = SignedCookieJar::<Key>::from_request_parts(parts, state)
            .await
            .map_err(|never: Infallible| -> AppError { match never {} })?;
        let cookie = jar.get(SESSION_COOKIE_NAME);
        let user = resolve_session(state.auth_store.as_ref(), cookie.as_ref().map(|c| c.value()))
            .await?
            .ok_or(AppError::Unauthorized)?;
        Ok(CurrentUser(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::store::memory::MemoryAuthStore;
    use chrono::Duration;

    async fn store_with_user(email: &str) -> (MemoryAuthStore, User) {
        let store = MemoryAuthStore::default();
        let user = store.upsert_user_by_email(email).await.unwrap();
        (store, user)
    }

    #[test]
    fn test_encode_decode() {
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email: "agent@example.com".into(),
            name: Some("Agent".into()),
            created_at: now,
            updated_at: now,
        };
        let bundle = SessionBundle::for_user(&user, now + Duration::days(7));
        let decoded = SessionBundle::decode(&bundle.encode()).unwrap();
        assert_eq!(decoded, bundle);
    }

    #[test]
    fn test_wire_format_is_base64_camel_case_json() {
        let bundle = SessionBundle {
            email: "agent@example.com".into(),
            user_id: None,
            name: None,
            expires_at: Some(1_700_000_000_000),
        };
        let raw = STANDARD.decode(bundle.encode()).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&raw).unwrap();
        assert_eq!(json["email"], "agent@example.com");
        assert_eq!(json["expiresAt"], 1_700_000_000_000_i64);
        assert!(json.get("userId").is_some());
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(SessionBundle::decode("").is_none());
        assert!(SessionBundle::decode("%%%not-base64%%%").is_none());
        assert!(SessionBundle::decode(&STANDARD.encode("not json")).is_none());
        assert!(SessionBundle::decode(&STANDARD.encode(r#"{"userId":null}"#)).is_none());
        assert!(SessionBundle::decode(&STANDARD.encode(r#"{"email":""}"#)).is_none());
    }

    #[tokio::test]
    async fn test_resolve_session_for_existing_user() {
        let (store, user) = store_with_user("agent@example.com").await;
        let cookie = SessionBundle::for_user(&user, Utc::now()).encode();
        let resolved = resolve_session(&store, Some(cookie.as_str())).await.unwrap();
        assert_eq!(resolved, Some(user));
    }

    #[tokio::test]
    async fn test_resolve_session_undecodable_is_unauthenticated() {
        let (store, _) = store_with_user("agent@example.com").await;
        assert!(resolve_session(&store, Some("garbage")).await.unwrap().is_none());
        assert!(resolve_session(&store, None).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_resolve_session_deleted_user_is_unauthenticated() {
        let (store, user) = store_with_user("agent@example.com").await;
        let cookie = SessionBundle::for_user(&user, Utc::now() + Duration::days(7)).encode();
        store.remove_user("agent@example.com");
        assert!(resolve_session(&store, Some(cookie.as_str())).await.unwrap().is_none());
    }

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = session_cookie("value".into(), true);
        assert_eq!(cookie.name(), SESSION_COOKIE_NAME);
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.max_age(), Some(time::Duration::days(7)));

        assert_eq!(session_cookie("value".into(), false).secure(), Some(false));
    }

    #[test]
    fn test_clear_session_cookie_without_prior_cookie() {
        let jar = clear_session_cookie(CookieJar::new());
        let cookie = jar.get(SESSION_COOKIE_NAME).unwrap();
        assert_eq!(cookie.value(), "");
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.max_age(), Some(time::Duration::ZERO));
    }
}
