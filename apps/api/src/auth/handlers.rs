use axum::{
    extract::{rejection::JsonRejection, Query, State},
    response::Redirect,
    Json,
};
use axum_extra::extract::cookie::{CookieJar, SignedCookieJar};
use chrono::Utc;
use serde_json::{json, Value};

use crate::auth::magic_link::{send_magic_link, verify_token};
use crate::auth::session::{clear_session_cookie, session_cookie, CurrentUser};
use crate::auth::validation::{LoginRequest, VerifyTokenQuery};
use crate::errors::AppError;
use crate::models::user::User;
use crate::state::AppState;

/// Where the client should go once a session is established.
const POST_LOGIN_REDIRECT: &str = "/buyers";

/// POST /api/auth/login
pub async fn handle_login(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let Json(body) = payload?;
    let req = LoginRequest::parse(&body)
        .map_err(|details| AppError::validation("Invalid email address", details))?;

    send_magic_link(
        state.auth_store.as_ref(),
        state.mailer.as_ref(),
        &state.config.app_url,
        state.config.token_ttl,
        &req.email,
    )
    .await?;

    Ok(Json(json!({ "success": true })))
}

/// GET /api/auth/verify?token=
pub async fn handle_verify(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    Query(query): Query<VerifyTokenQuery>,
) -> Result<(SignedCookieJar, Json<Value>), AppError> {
    let token = query
        .token()
        .map_err(|details| AppError::validation("Invalid token format", details))?;

    let bundle = verify_token(
        state.auth_store.as_ref(),
        token,
        Utc::now(),
        state.config.session_ttl,
    )
    .await?;

    let jar = jar.add(session_cookie(bundle.encode(), state.config.production));
    Ok((
        jar,
        Json(json!({ "success": true, "redirect": POST_LOGIN_REDIRECT })),
    ))
}

/// POST /api/auth/logout
pub async fn handle_logout(jar: CookieJar) -> (CookieJar, Redirect) {
    (clear_session_cookie(jar), Redirect::to("/auth/login"))
}

/// GET /api/auth/session
pub async fn handle_session(CurrentUser(user): CurrentUser) -> Json<User> {
    Json(user)
}
