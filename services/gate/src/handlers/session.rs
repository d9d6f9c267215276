use std::net::SocketAddr;

use axum::{
    Json,
    extract::{ConnectInfo, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::CookieJar;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::cookies::{clear_session_cookie, session_id_from, set_session_cookie};
use crate::domain::types::Role;
use crate::error::GateError;
use crate::handlers::reject;
use crate::state::AppState;
use crate::usecase::logout::{LogoutInput, LogoutOutcome, LogoutUseCase};
use crate::usecase::session::EnsureSessionUseCase;

// ── GET /auth/session ─────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct SessionResponse {
    pub csrf_token: String,
    pub username: Option<String>,
    pub role: Option<Role>,
}

/// Ensure a live session and hand the frontend its CSRF token. Also where
/// the inactivity timeout bites: an idle session comes back empty.
pub async fn current_session(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<impl IntoResponse, GateError> {
    let usecase = EnsureSessionUseCase {
        sessions: state.session_store(),
        policy: state.policy.clone(),
    };
    let ensured = usecase
        .execute(session_id_from(&jar).as_deref(), Utc::now())
        .await?;

    let body = SessionResponse {
        csrf_token: ensured.session.csrf_token.clone(),
        username: ensured.session.username.clone(),
        role: ensured.session.role,
    };
    let jar = set_session_cookie(jar, ensured.id, state.cookie_domain.clone());
    Ok((StatusCode::OK, jar, Json(body)))
}

// ── POST /auth/logout ─────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct LogoutRequest {
    pub csrf_token: Option<String>,
}

pub async fn logout(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    jar: CookieJar,
    Json(body): Json<LogoutRequest>,
) -> Result<Response, GateError> {
    let usecase = LogoutUseCase {
        sessions: state.session_store(),
        events: state.event_log(),
        policy: state.policy.clone(),
    };
    let outcome = usecase
        .execute(
            LogoutInput {
                session_id: session_id_from(&jar),
                ip: addr.ip().to_string(),
                csrf_token: body.csrf_token,
            },
            Utc::now(),
        )
        .await?;

    Ok(match outcome {
        LogoutOutcome::LoggedOut => {
            let jar = clear_session_cookie(jar, state.cookie_domain.clone());
            (StatusCode::NO_CONTENT, jar).into_response()
        }
        LogoutOutcome::CsrfRejected => reject(
            StatusCode::FORBIDDEN,
            "CSRF_INVALID",
            "Invalid or expired form token. Reload and try again.",
        ),
    })
}
