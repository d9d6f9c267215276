//! Session lifecycle: creation, inactivity timeout, transparent CSRF
//! refresh. Runs at the top of every request that carries (or wants) a
//! session cookie.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Utc};
use rand::RngExt;

use crate::domain::repository::SessionStore;
use crate::domain::types::{Policy, Session};
use crate::error::GateError;
use crate::usecase::csrf;

/// 256-bit session identifiers.
pub const SESSION_ID_BYTES: usize = 32;

pub fn generate_session_id() -> String {
    let bytes: [u8; SESSION_ID_BYTES] = rand::rng().random();
    URL_SAFE_NO_PAD.encode(bytes)
}

#[derive(Debug)]
pub struct EnsuredSession {
    pub id: String,
    pub session: Session,
    /// True when no usable session existed and a fresh one was started
    /// (first visit, unknown ID, or inactivity timeout).
    pub restarted: bool,
}

pub struct EnsureSessionUseCase<S>
where
    S: SessionStore,
{
    pub sessions: S,
    pub policy: Policy,
}

impl<S> EnsureSessionUseCase<S>
where
    S: SessionStore,
{
    /// Load-or-create. A session idle past the inactivity limit is
    /// destroyed outright — forced logout, not a CSRF re-prompt. An
    /// expired CSRF token on a live session is rotated in place without
    /// touching the rest of the session.
    pub async fn execute(
        &self,
        existing_id: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<EnsuredSession, GateError> {
        if let Some(id) = existing_id {
            if let Some(mut session) = self.sessions.load(id).await? {
                let idle = (now - session.last_activity).num_seconds();
                if idle > self.policy.session_inactivity_secs {
                    self.sessions.destroy(id).await?;
                } else {
                    let token_age = (now - session.csrf_issued_at).num_seconds();
                    if token_age > self.policy.csrf_timeout_secs {
                        csrf::rotate(&mut session, now);
                    }
                    session.last_activity = now;
                    self.sessions.save(id, &session).await?;
                    return Ok(EnsuredSession {
                        id: id.to_owned(),
                        session,
                        restarted: false,
                    });
                }
            }
        }

        let id = generate_session_id();
        let session = Session::new(csrf::generate_token(), now);
        self.sessions.save(&id, &session).await?;
        Ok(EnsuredSession {
            id,
            session,
            restarted: true,
        })
    }
}
