//! Login request orchestration. Order matters and mirrors the gate's
//! threat model: CSRF before anything, ban state before credential work,
//! account lockout before the password check. Every exit writes one audit
//! event; ban applications add their own.

use chrono::{DateTime, Utc};

use crate::domain::repository::{AttemptLedger, BanStore, EventLog, SessionStore, UserStore};
use crate::domain::types::{
    CsrfValidation, EventKind, RateLimitDecision, Role, SecurityEvent, Session,
    normalize_identity,
};
use crate::error::GateError;
use crate::usecase::csrf;
use crate::usecase::password::verify_password;
use crate::usecase::rate_limit::RateLimiter;

pub struct LoginInput {
    pub session_id: Option<String>,
    pub ip: String,
    pub username: String,
    pub password: String,
    pub csrf_token: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginRejection {
    CsrfInvalid,
    IpBanned,
    IpRateLimited,
    AccountLocked,
    ValidationFailed,
    BadCredentials,
}

#[derive(Debug)]
pub enum LoginOutcome {
    Success {
        session_id: String,
        username: String,
        role: Role,
        csrf_token: String,
    },
    Rejected(LoginRejection),
}

pub struct LoginUseCase<S, A, B, U, E>
where
    S: SessionStore,
    A: AttemptLedger,
    B: BanStore,
    U: UserStore,
    E: EventLog,
{
    pub sessions: S,
    pub limiter: RateLimiter<A, B>,
    pub users: U,
    pub events: E,
}

impl<S, A, B, U, E> LoginUseCase<S, A, B, U, E>
where
    S: SessionStore,
    A: AttemptLedger,
    B: BanStore,
    U: UserStore,
    E: EventLog,
{
    pub async fn execute(
        &self,
        input: LoginInput,
        now: DateTime<Utc>,
    ) -> Result<LoginOutcome, GateError> {
        let ip = normalize_identity(&input.ip);
        let username = normalize_identity(&input.username);
        let actor = known_actor(&username);

        // CSRF first. No session, or a token that fails to check out,
        // rejects before any credential or ledger work. A failing token on
        // a live session is treated as tampering and the session dies.
        let mut session: Session;
        let session_id: String;
        match &input.session_id {
            Some(id) => match self.sessions.load(id).await? {
                Some(s) => {
                    session = s;
                    session_id = id.clone();
                }
                None => return self.reject_csrf(actor, &ip, now).await,
            },
            None => return self.reject_csrf(actor, &ip, now).await,
        }

        let verdict = csrf::validate(
            &session,
            input.csrf_token.as_deref(),
            now,
            self.limiter.policy.csrf_timeout_secs,
        );
        if verdict != CsrfValidation::Valid {
            self.sessions.destroy(&session_id).await?;
            return self.reject_csrf(actor, &ip, now).await;
        }

        match self.limiter.check_ip(&ip, now).await? {
            RateLimitDecision::Banned => {
                self.record_event(
                    EventKind::LoginFailure,
                    actor,
                    &ip,
                    "Login attempt from banned IP",
                    now,
                )
                .await?;
                return Ok(LoginOutcome::Rejected(LoginRejection::IpBanned));
            }
            RateLimitDecision::Exceeded => {
                self.record_event(
                    EventKind::LoginFailure,
                    actor,
                    &ip,
                    "Too many login attempts from this IP",
                    now,
                )
                .await?;
                return Ok(LoginOutcome::Rejected(LoginRejection::IpRateLimited));
            }
            RateLimitDecision::Allowed => {}
        }

        if username.is_empty() || input.password.is_empty() {
            self.note_ip_failure(&ip, now).await?;
            self.record_event(
                EventKind::LoginFailure,
                actor,
                &ip,
                "Empty username or password",
                now,
            )
            .await?;
            return Ok(LoginOutcome::Rejected(LoginRejection::ValidationFailed));
        }

        if self.limiter.check_username(&username, now).await? == RateLimitDecision::Exceeded {
            // The account is locked; the attempt still counts against the IP.
            self.note_ip_failure(&ip, now).await?;
            self.record_event(
                EventKind::LoginFailure,
                actor,
                &ip,
                "Too many login attempts for this account",
                now,
            )
            .await?;
            return Ok(LoginOutcome::Rejected(LoginRejection::AccountLocked));
        }

        let user = self.users.find_by_username(&username).await?;
        let verified = match &user {
            Some(u) => verify_password(&input.password, &u.password_hash)?,
            None => false,
        };

        match (user, verified) {
            (Some(user), true) => {
                // Success resets only this IP's and this account's history.
                self.limiter.clear_ip(&ip, now).await?;
                self.limiter.clear_username(&username, now).await?;

                csrf::rotate(&mut session, now);
                session.sign_in(username.clone(), user.role);
                session.last_activity = now;
                self.sessions.save(&session_id, &session).await?;

                self.record_event(EventKind::LoginSuccess, actor, &ip, "User logged in", now)
                    .await?;
                Ok(LoginOutcome::Success {
                    session_id,
                    username,
                    role: user.role,
                    csrf_token: session.csrf_token.clone(),
                })
            }
            (user, _) => {
                self.note_ip_failure(&ip, now).await?;
                // Unknown usernames are not written to the account ledger —
                // it would let an attacker fill the table with junk keys.
                if user.is_some() {
                    self.limiter.record_username_failure(&username, now).await?;
                }
                self.record_event(EventKind::LoginFailure, actor, &ip, "Invalid credentials", now)
                    .await?;
                Ok(LoginOutcome::Rejected(LoginRejection::BadCredentials))
            }
        }
    }

    async fn reject_csrf(
        &self,
        actor: Option<&str>,
        ip: &str,
        now: DateTime<Utc>,
    ) -> Result<LoginOutcome, GateError> {
        self.record_event(
            EventKind::LoginFailure,
            actor,
            ip,
            "Invalid or expired CSRF token",
            now,
        )
        .await?;
        Ok(LoginOutcome::Rejected(LoginRejection::CsrfInvalid))
    }

    /// Record an IP failure; if that crossed the threshold, the resulting
    /// ban is a decision of its own and gets its own audit row.
    async fn note_ip_failure(&self, ip: &str, now: DateTime<Utc>) -> Result<(), GateError> {
        if self.limiter.record_ip_failure(ip, now).await? {
            self.record_event(EventKind::IpBanned, None, ip, "Escalating IP ban applied", now)
                .await?;
        }
        Ok(())
    }

    async fn record_event(
        &self,
        kind: EventKind,
        username: Option<&str>,
        ip: &str,
        details: &str,
        now: DateTime<Utc>,
    ) -> Result<(), GateError> {
        self.events
            .record(SecurityEvent::new(kind, username, ip, details, now))
            .await
    }
}

fn known_actor(username: &str) -> Option<&str> {
    if username.is_empty() { None } else { Some(username) }
}
