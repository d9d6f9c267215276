use std::net::SocketAddr;

use axum::{
    Json,
    extract::{ConnectInfo, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::CookieJar;
use chrono::Utc;
use serde::Deserialize;

use crate::cookies::{clear_session_cookie, session_id_from, set_session_cookie};
use crate::error::GateError;
use crate::handlers::login::AuthResponse;
use crate::handlers::reject;
use crate::state::AppState;
use crate::usecase::register::{
    RegisterInput, RegisterOutcome, RegisterRejection, RegisterUseCase,
};

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub password_confirm: String,
    pub email: Option<String>,
    pub invite_code: String,
    pub csrf_token: Option<String>,
}

// ── POST /auth/register ───────────────────────────────────────────────────────

pub async fn register(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    jar: CookieJar,
    Json(body): Json<RegisterRequest>,
) -> Result<Response, GateError> {
    let usecase = RegisterUseCase {
        sessions: state.session_store(),
        limiter: state.rate_limiter(),
        invites: state.invite_registry(),
        users: state.user_store(),
        events: state.event_log(),
    };

    let outcome = usecase
        .execute(
            RegisterInput {
                session_id: session_id_from(&jar),
                ip: addr.ip().to_string(),
                username: body.username,
                password: body.password,
                password_confirm: body.password_confirm,
                email: body.email,
                invite_code: body.invite_code,
                csrf_token: body.csrf_token,
            },
            Utc::now(),
        )
        .await?;

    Ok(match outcome {
        RegisterOutcome::Success {
            session_id,
            username,
            role,
            csrf_token,
        } => {
            let jar = set_session_cookie(jar, session_id, state.cookie_domain.clone());
            (
                StatusCode::CREATED,
                jar,
                Json(AuthResponse {
                    username,
                    role,
                    csrf_token,
                }),
            )
                .into_response()
        }
        RegisterOutcome::Rejected(rejection) => rejection_response(rejection, jar, &state),
    })
}

fn rejection_response(
    rejection: RegisterRejection,
    jar: CookieJar,
    state: &AppState,
) -> Response {
    match rejection {
        RegisterRejection::CsrfInvalid => {
            let jar = clear_session_cookie(jar, state.cookie_domain.clone());
            (
                jar,
                reject(
                    StatusCode::FORBIDDEN,
                    "CSRF_INVALID",
                    "Invalid or expired form token. Reload and try again.",
                ),
            )
                .into_response()
        }
        RegisterRejection::IpBanned | RegisterRejection::IpRateLimited => reject(
            StatusCode::TOO_MANY_REQUESTS,
            "RATE_LIMITED",
            "Too many attempts. Please try again later.",
        ),
        RegisterRejection::RestrictedUsername => reject(
            StatusCode::FORBIDDEN,
            "RESTRICTED_USERNAME",
            "This username is restricted. Your IP has been temporarily banned.",
        ),
        RegisterRejection::ValidationFailed(details) => {
            reject(StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION", &details)
        }
        RegisterRejection::InviteInvalid => reject(
            StatusCode::UNPROCESSABLE_ENTITY,
            "INVITE_INVALID",
            "Invalid invitation code.",
        ),
        RegisterRejection::InviteExpired => reject(
            StatusCode::UNPROCESSABLE_ENTITY,
            "INVITE_EXPIRED",
            "Invitation code has expired.",
        ),
        RegisterRejection::InviteExhausted => reject(
            StatusCode::UNPROCESSABLE_ENTITY,
            "INVITE_EXHAUSTED",
            "Invitation code has reached its usage limit.",
        ),
        RegisterRejection::UsernameTaken => reject(
            StatusCode::CONFLICT,
            "USERNAME_TAKEN",
            "Username is already taken.",
        ),
    }
}
