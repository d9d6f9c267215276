use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use parlor_core::health::{healthz, readyz};
use parlor_core::middleware::request_id_layer;

use crate::handlers::{
    invites::{create_invite, expire_invite, list_invites},
    login::login,
    register::register,
    session::{current_session, logout},
};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // Session
        .route("/auth/session", get(current_session))
        .route("/auth/logout", post(logout))
        // Authentication
        .route("/auth/login", post(login))
        .route("/auth/register", post(register))
        // Invite administration
        .route("/invites", get(list_invites).post(create_invite))
        .route("/invites/{code}/expire", post(expire_invite))
        .layer(TraceLayer::new_for_http())
        .layer(request_id_layer())
        .with_state(state)
}
