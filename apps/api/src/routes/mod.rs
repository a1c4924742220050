pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::auth::handlers as auth;
use crate::buyers::handlers as buyers;
use crate::dashboard::handlers as dashboard;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Auth
        .route("/api/auth/login", post(auth::handle_login))
        .route("/api/auth/verify", get(auth::handle_verify))
        .route("/api/auth/logout", post(auth::handle_logout))
        .route("/api/auth/session", get(auth::handle_session))
        // Buyers
        .route(
            "/api/buyers",
            get(buyers::handle_list_buyers).post(buyers::handle_create_buyer),
        )
        .route("/api/buyers/export", get(buyers::handle_export_buyers))
        .route("/api/buyers/template", get(buyers::handle_buyer_template))
        .route("/api/buyers/import", post(buyers::handle_import_buyers))
        .route(
            "/api/buyers/:id",
            get(buyers::handle_get_buyer)
                .put(buyers::handle_update_buyer)
                .delete(buyers::handle_delete_buyer),
        )
        .route("/api/buyers/:id/history", get(buyers::handle_buyer_history))
        // Dashboard
        .route("/api/dashboard", get(dashboard::handle_dashboard))
        .with_state(state)
}
