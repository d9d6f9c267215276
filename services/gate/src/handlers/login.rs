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
use crate::usecase::login::{LoginInput, LoginOutcome, LoginRejection, LoginUseCase};

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
    pub csrf_token: Option<String>,
}

#[derive(Serialize)]
pub struct AuthResponse {
    pub username: String,
    pub role: Role,
    pub csrf_token: String,
}

// ── POST /auth/login ──────────────────────────────────────────────────────────

pub async fn login(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    jar: CookieJar,
    Json(body): Json<LoginRequest>,
) -> Result<Response, GateError> {
    let usecase = LoginUseCase {
        sessions: state.session_store(),
        limiter: state.rate_limiter(),
        users: state.user_store(),
        events: state.event_log(),
    };

    let outcome = usecase
        .execute(
            LoginInput {
                session_id: session_id_from(&jar),
                ip: addr.ip().to_string(),
                username: body.username,
                password: body.password,
                csrf_token: body.csrf_token,
            },
            Utc::now(),
        )
        .await?;

    Ok(match outcome {
        LoginOutcome::Success {
            session_id,
            username,
            role,
            csrf_token,
        } => {
            let jar = set_session_cookie(jar, session_id, state.cookie_domain.clone());
            (
                StatusCode::OK,
                jar,
                Json(AuthResponse {
                    username,
                    role,
                    csrf_token,
                }),
            )
                .into_response()
        }
        LoginOutcome::Rejected(rejection) => rejection_response(rejection, jar, &state),
    })
}

/// Credential failures get the same generic wording whether the username
/// exists or not.
fn rejection_response(rejection: LoginRejection, jar: CookieJar, state: &AppState) -> Response {
    match rejection {
        LoginRejection::CsrfInvalid => {
            // The session was destroyed; drop the cookie with it.
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
        LoginRejection::IpBanned | LoginRejection::IpRateLimited => reject(
            StatusCode::TOO_MANY_REQUESTS,
            "RATE_LIMITED",
            "Too many attempts. Please try again later.",
        ),
        LoginRejection::AccountLocked => reject(
            StatusCode::TOO_MANY_REQUESTS,
            "ACCOUNT_LOCKED",
            "Too many login attempts for this account. Please try again later.",
        ),
        LoginRejection::ValidationFailed => reject(
            StatusCode::UNPROCESSABLE_ENTITY,
            "VALIDATION",
            "Username and password are required.",
        ),
        LoginRejection::BadCredentials => reject(
            StatusCode::UNAUTHORIZED,
            "BAD_CREDENTIALS",
            "Invalid username or password.",
        ),
    }
}
