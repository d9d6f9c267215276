use std::net::SocketAddr;

use axum::{
    Json,
    extract::{ConnectInfo, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::CookieJar;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use parlor_core::serde::rfc3339_millis;

use crate::cookies::session_id_from;
use crate::domain::repository::{EventLog, SessionStore};
use crate::domain::types::{
    CsrfValidation, EventKind, Invite, Role, SecurityEvent, Session,
};
use crate::error::GateError;
use crate::handlers::reject;
use crate::state::AppState;
use crate::usecase::csrf;
use crate::usecase::invite::CreateInviteResult;

#[derive(Serialize)]
pub struct InviteResponse {
    pub code: String,
    #[serde(serialize_with = "rfc3339_millis")]
    pub expiration_date: DateTime<Utc>,
    pub usage_count: i32,
    pub max_uses: i32,
    #[serde(serialize_with = "rfc3339_millis")]
    pub created_at: DateTime<Utc>,
}

impl From<Invite> for InviteResponse {
    fn from(invite: Invite) -> Self {
        Self {
            code: invite.code,
            expiration_date: invite.expiration_date,
            usage_count: invite.usage_count,
            max_uses: invite.max_uses,
            created_at: invite.created_at,
        }
    }
}

/// Invite management is admin-only and rides on an authenticated session.
async fn require_admin(state: &AppState, jar: &CookieJar) -> Result<Session, GateError> {
    let Some(session_id) = session_id_from(jar) else {
        return Err(GateError::Unauthorized);
    };
    let Some(session) = state.session_store().load(&session_id).await? else {
        return Err(GateError::Unauthorized);
    };
    if !session.is_authenticated() {
        return Err(GateError::Unauthorized);
    }
    if session.role != Some(Role::Admin) {
        return Err(GateError::Forbidden);
    }
    Ok(session)
}

fn csrf_ok(state: &AppState, session: &Session, supplied: Option<&str>) -> bool {
    csrf::validate(session, supplied, Utc::now(), state.policy.csrf_timeout_secs)
        == CsrfValidation::Valid
}

// ── GET /invites ──────────────────────────────────────────────────────────────

pub async fn list_invites(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<impl IntoResponse, GateError> {
    require_admin(&state, &jar).await?;
    let invites = state.invite_registry().list().await?;
    let body: Vec<InviteResponse> = invites.into_iter().map(Into::into).collect();
    Ok(Json(body))
}

// ── POST /invites ─────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct MutateInviteRequest {
    pub csrf_token: Option<String>,
}

pub async fn create_invite(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    jar: CookieJar,
    Json(body): Json<MutateInviteRequest>,
) -> Result<Response, GateError> {
    let session = require_admin(&state, &jar).await?;
    if !csrf_ok(&state, &session, body.csrf_token.as_deref()) {
        return Ok(reject(
            StatusCode::FORBIDDEN,
            "CSRF_INVALID",
            "Invalid or expired form token. Reload and try again.",
        ));
    }

    let now = Utc::now();
    let ip = addr.ip().to_string();
    let admin = session.username.as_deref();

    match state.invite_registry().create(now).await? {
        CreateInviteResult::Created(invite) => {
            state
                .event_log()
                .record(SecurityEvent::new(
                    EventKind::InviteCreated,
                    admin,
                    &ip,
                    format!("Generated invitation code '{}'", invite.code),
                    now,
                ))
                .await?;
            Ok((StatusCode::CREATED, Json(InviteResponse::from(invite))).into_response())
        }
        CreateInviteResult::NoUniqueCode => {
            state
                .event_log()
                .record(SecurityEvent::new(
                    EventKind::InviteFailure,
                    admin,
                    &ip,
                    "Failed to generate a unique invitation code",
                    now,
                ))
                .await?;
            Err(GateError::Internal(anyhow::anyhow!(
                "invitation code space exhausted after bounded retries"
            )))
        }
    }
}

// ── POST /invites/{code}/expire ───────────────────────────────────────────────

pub async fn expire_invite(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Path(code): Path<String>,
    jar: CookieJar,
    Json(body): Json<MutateInviteRequest>,
) -> Result<Response, GateError> {
    let session = require_admin(&state, &jar).await?;
    if !csrf_ok(&state, &session, body.csrf_token.as_deref()) {
        return Ok(reject(
            StatusCode::FORBIDDEN,
            "CSRF_INVALID",
            "Invalid or expired form token. Reload and try again.",
        ));
    }

    let now = Utc::now();
    if state.invite_registry().expire_now(&code, now).await? {
        state
            .event_log()
            .record(SecurityEvent::new(
                EventKind::InviteExpired,
                session.username.as_deref(),
                &addr.ip().to_string(),
                format!("Revoked invitation code '{code}'"),
                now,
            ))
            .await?;
        Ok(StatusCode::NO_CONTENT.into_response())
    } else {
        Ok(reject(
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "No such invitation code.",
        ))
    }
}
