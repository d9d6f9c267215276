//! Registration orchestration: CSRF, ban state, restricted-username guard,
//! format validation, invite gate, account creation, atomic invite
//! consumption, session establishment. One audit event per exit.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::repository::{
    AttemptLedger, BanStore, CreateUserResult, EventLog, InviteStore, SessionStore, UserStore,
};
use crate::domain::types::{
    CsrfValidation, EventKind, GateUser, InviteStatus, RESTRICTED_SUBSTRINGS, RateLimitDecision,
    Role, SecurityEvent, Session, normalize_identity,
};
use crate::error::GateError;
use crate::usecase::csrf;
use crate::usecase::invite::{InviteRegistry, is_valid_code_format};
use crate::usecase::password::hash_password;
use crate::usecase::rate_limit::RateLimiter;

pub struct RegisterInput {
    pub session_id: Option<String>,
    pub ip: String,
    pub username: String,
    pub password: String,
    pub password_confirm: String,
    pub email: Option<String>,
    pub invite_code: String,
    pub csrf_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegisterRejection {
    CsrfInvalid,
    IpBanned,
    IpRateLimited,
    RestrictedUsername,
    ValidationFailed(String),
    InviteInvalid,
    InviteExpired,
    InviteExhausted,
    UsernameTaken,
}

#[derive(Debug)]
pub enum RegisterOutcome {
    Success {
        session_id: String,
        username: String,
        role: Role,
        csrf_token: String,
    },
    Rejected(RegisterRejection),
}

pub struct RegisterUseCase<S, A, B, I, U, E>
where
    S: SessionStore,
    A: AttemptLedger,
    B: BanStore,
    I: InviteStore,
    U: UserStore,
    E: EventLog,
{
    pub sessions: S,
    pub limiter: RateLimiter<A, B>,
    pub invites: InviteRegistry<I>,
    pub users: U,
    pub events: E,
}

impl<S, A, B, I, U, E> RegisterUseCase<S, A, B, I, U, E>
where
    S: SessionStore,
    A: AttemptLedger,
    B: BanStore,
    I: InviteStore,
    U: UserStore,
    E: EventLog,
{
    pub async fn execute(
        &self,
        input: RegisterInput,
        now: DateTime<Utc>,
    ) -> Result<RegisterOutcome, GateError> {
        let ip = normalize_identity(&input.ip);
        let username = normalize_identity(&input.username);
        let invite_code = normalize_identity(&input.invite_code);
        let email = input
            .email
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .map(str::to_owned);
        let actor = if username.is_empty() { None } else { Some(username.as_str()) };

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
                    EventKind::RegisterFailure,
                    actor,
                    &ip,
                    "Banned IP attempted registration",
                    now,
                )
                .await?;
                return Ok(RegisterOutcome::Rejected(RegisterRejection::IpBanned));
            }
            RateLimitDecision::Exceeded => {
                self.record_event(
                    EventKind::RegisterFailure,
                    actor,
                    &ip,
                    "Too many registration attempts from this IP",
                    now,
                )
                .await?;
                return Ok(RegisterOutcome::Rejected(RegisterRejection::IpRateLimited));
            }
            RateLimitDecision::Allowed => {}
        }

        // Staff-impersonating names are rejected and the IP temp-banned.
        if let Some(hit) = restricted_substring(&username) {
            self.record_event(
                EventKind::RegisterFailure,
                actor,
                &ip,
                format!("Attempted restricted username containing '{hit}'"),
                now,
            )
            .await?;
            self.limiter.apply_restricted_name_ban(&ip, now).await?;
            self.record_event(
                EventKind::IpBanned,
                None,
                &ip,
                "Temporary ban for restricted username attempt",
                now,
            )
            .await?;
            return Ok(RegisterOutcome::Rejected(RegisterRejection::RestrictedUsername));
        }

        let mut problems: Vec<&str> = Vec::new();
        if let Err(problem) = validate_username(&username) {
            problems.push(problem);
        }
        if let Err(problem) = validate_password(&input.password) {
            problems.push(problem);
        }
        if input.password != input.password_confirm {
            problems.push("Passwords do not match");
        }
        if let Some(email) = &email {
            if let Err(problem) = validate_email(email) {
                problems.push(problem);
            }
        }
        if !is_valid_code_format(&invite_code) {
            problems.push("Invalid invitation code format");
        }
        if !problems.is_empty() {
            let details = problems.join("; ");
            self.note_ip_failure(&ip, now).await?;
            self.record_event(EventKind::RegisterFailure, actor, &ip, details.clone(), now)
                .await?;
            return Ok(RegisterOutcome::Rejected(RegisterRejection::ValidationFailed(details)));
        }

        match self.invites.validate(&invite_code, now).await? {
            InviteStatus::Valid => {}
            InviteStatus::NotFound => {
                return self
                    .reject_invite(actor, &ip, &invite_code, "not found", RegisterRejection::InviteInvalid, now)
                    .await;
            }
            InviteStatus::Expired => {
                return self
                    .reject_invite(actor, &ip, &invite_code, "expired", RegisterRejection::InviteExpired, now)
                    .await;
            }
            InviteStatus::Exhausted => {
                return self
                    .reject_invite(actor, &ip, &invite_code, "exhausted", RegisterRejection::InviteExhausted, now)
                    .await;
            }
        }

        if self.users.find_by_username(&username).await?.is_some() {
            return self.reject_taken(actor, &ip, &username, now).await;
        }

        let user = GateUser {
            id: Uuid::new_v4(),
            username: username.clone(),
            email,
            password_hash: hash_password(&input.password)?,
            role: Role::User,
        };
        // The unique index is the real arbiter — a racing duplicate lands
        // here as UsernameTaken, not as a 500.
        if self.users.create(&user, now).await? == CreateUserResult::UsernameTaken {
            return self.reject_taken(actor, &ip, &username, now).await;
        }

        // The account exists at this point, so the invite is owed its use.
        // Losing the last-slot race to a concurrent registration leaves the
        // count at its ceiling; that is logged, not rolled back — invite
        // quotas are a soft bound.
        if !self.invites.consume(&invite_code, now).await? {
            self.record_event(
                EventKind::InviteFailure,
                actor,
                &ip,
                format!("Invite code '{invite_code}' exhausted concurrently during registration"),
                now,
            )
            .await?;
        }

        self.limiter.clear_ip(&ip, now).await?;

        csrf::rotate(&mut session, now);
        session.sign_in(username.clone(), user.role);
        session.last_activity = now;
        self.sessions.save(&session_id, &session).await?;

        self.record_event(
            EventKind::RegisterSuccess,
            actor,
            &ip,
            format!("Account created with invite code '{invite_code}'"),
            now,
        )
        .await?;

        Ok(RegisterOutcome::Success {
            session_id,
            username,
            role: user.role,
            csrf_token: session.csrf_token.clone(),
        })
    }

    async fn reject_csrf(
        &self,
        actor: Option<&str>,
        ip: &str,
        now: DateTime<Utc>,
    ) -> Result<RegisterOutcome, GateError> {
        self.record_event(
            EventKind::RegisterFailure,
            actor,
            ip,
            "Invalid or expired CSRF token",
            now,
        )
        .await?;
        Ok(RegisterOutcome::Rejected(RegisterRejection::CsrfInvalid))
    }

    async fn reject_invite(
        &self,
        actor: Option<&str>,
        ip: &str,
        code: &str,
        problem: &str,
        rejection: RegisterRejection,
        now: DateTime<Utc>,
    ) -> Result<RegisterOutcome, GateError> {
        self.note_ip_failure(ip, now).await?;
        self.record_event(
            EventKind::RegisterFailure,
            actor,
            ip,
            format!("Invitation code '{code}' is {problem}"),
            now,
        )
        .await?;
        Ok(RegisterOutcome::Rejected(rejection))
    }

    async fn reject_taken(
        &self,
        actor: Option<&str>,
        ip: &str,
        username: &str,
        now: DateTime<Utc>,
    ) -> Result<RegisterOutcome, GateError> {
        self.note_ip_failure(ip, now).await?;
        self.record_event(
            EventKind::RegisterFailure,
            actor,
            ip,
            format!("Username '{username}' is already in use"),
            now,
        )
        .await?;
        Ok(RegisterOutcome::Rejected(RegisterRejection::UsernameTaken))
    }

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
        details: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<(), GateError> {
        self.events
            .record(SecurityEvent::new(kind, username, ip, details, now))
            .await
    }
}

fn restricted_substring(username: &str) -> Option<&'static str> {
    RESTRICTED_SUBSTRINGS
        .iter()
        .copied()
        .find(|needle| username.contains(needle))
}

/// Usernames are already lowercased: ASCII letters, digits, `-`, `_`,
/// 3 to 50 characters.
fn validate_username(username: &str) -> Result<(), &'static str> {
    let ok = (3..=50).contains(&username.len())
        && username
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-' || b == b'_');
    if ok {
        Ok(())
    } else {
        Err("Username must be 3-50 characters of letters, digits, '-' or '_'")
    }
}

/// At least 8 printable-ASCII characters with at least one letter and one
/// non-letter. Spaces are not printable-ASCII-graphic and are rejected.
fn validate_password(password: &str) -> Result<(), &'static str> {
    let ok = password.len() >= 8
        && password.bytes().all(|b| (b'!'..=b'~').contains(&b))
        && password.bytes().any(|b| b.is_ascii_alphabetic())
        && password.bytes().any(|b| !b.is_ascii_alphabetic());
    if ok {
        Ok(())
    } else {
        Err("Password must be at least 8 characters with a letter and a non-letter, no spaces")
    }
}

fn validate_email(email: &str) -> Result<(), &'static str> {
    let ok = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.contains(char::is_whitespace)
                && !domain.contains('@')
        }
        None => false,
    };
    if ok { Ok(()) } else { Err("Invalid email address") }
}
