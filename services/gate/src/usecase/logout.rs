//! Logout: CSRF-checked session destruction.

use chrono::{DateTime, Utc};

use crate::domain::repository::{EventLog, SessionStore};
use crate::domain::types::{CsrfValidation, EventKind, Policy, SecurityEvent, normalize_identity};
use crate::error::GateError;
use crate::usecase::csrf;

pub struct LogoutInput {
    pub session_id: Option<String>,
    pub ip: String,
    pub csrf_token: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogoutOutcome {
    LoggedOut,
    /// Bad token on a live session — the session survives, so a cross-site
    /// request cannot forcibly log the user out.
    CsrfRejected,
}

pub struct LogoutUseCase<S, E>
where
    S: SessionStore,
    E: EventLog,
{
    pub sessions: S,
    pub events: E,
    pub policy: Policy,
}

impl<S, E> LogoutUseCase<S, E>
where
    S: SessionStore,
    E: EventLog,
{
    pub async fn execute(
        &self,
        input: LogoutInput,
        now: DateTime<Utc>,
    ) -> Result<LogoutOutcome, GateError> {
        let ip = normalize_identity(&input.ip);

        let Some(session_id) = input.session_id else {
            return Ok(LogoutOutcome::LoggedOut);
        };
        let Some(session) = self.sessions.load(&session_id).await? else {
            return Ok(LogoutOutcome::LoggedOut);
        };

        let verdict = csrf::validate(
            &session,
            input.csrf_token.as_deref(),
            now,
            self.policy.csrf_timeout_secs,
        );
        if verdict != CsrfValidation::Valid {
            return Ok(LogoutOutcome::CsrfRejected);
        }

        self.sessions.destroy(&session_id).await?;
        self.events
            .record(SecurityEvent::new(
                EventKind::Logout,
                session.username.as_deref(),
                &ip,
                "User logged out",
                now,
            ))
            .await?;
        Ok(LogoutOutcome::LoggedOut)
    }
}
