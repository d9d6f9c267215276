use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Audit-log actor marker used when no username was ever established.
/// An explicit marker keeps log rows unambiguous (null would be overloaded).
pub const UNKNOWN_ACTOR: &str = "unknown";

/// Username substrings that read as staff impersonation. Registering one
/// rejects the request and temp-bans the IP.
pub const RESTRICTED_SUBSTRINGS: &[&str] = &[
    "admin",
    "root",
    "sysadmin",
    "moderator",
    "support",
    "webmaster",
    "staff",
    "helpdesk",
];

/// Bound on invite-code generation retries before giving up.
pub const MAX_CODE_GENERATION_ATTEMPTS: usize = 10;

/// Lowercase + trim. Applied to every IP, username, and invite code before
/// it reaches a store, so table keys compare case-insensitively.
pub fn normalize_identity(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Account role as persisted in `users.role`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "USER",
            Self::Admin => "ADMIN",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "USER" => Some(Self::User),
            "ADMIN" => Some(Self::Admin),
            _ => None,
        }
    }
}

/// Server-side session state, stored as JSON in Redis under a
/// cookie-delivered session ID. No ambient global — every use case takes
/// and returns this value explicitly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub csrf_token: String,
    pub csrf_issued_at: DateTime<Utc>,
    pub username: Option<String>,
    pub role: Option<Role>,
    pub last_activity: DateTime<Utc>,
}

impl Session {
    pub fn new(csrf_token: String, now: DateTime<Utc>) -> Self {
        Self {
            csrf_token,
            csrf_issued_at: now,
            username: None,
            role: None,
            last_activity: now,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.username.is_some()
    }

    /// Bind an authenticated identity to this session after a successful
    /// login or registration.
    pub fn sign_in(&mut self, username: String, role: Role) {
        self.username = Some(username);
        self.role = Some(role);
    }
}

/// Result of comparing a submitted CSRF token against the session's.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CsrfValidation {
    Valid,
    Missing,
    Mismatch,
    Expired,
}

/// Rate-limit verdict for an identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    Allowed,
    Exceeded,
    Banned,
}

/// Which attempt ledger an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptScope {
    Ip,
    Username,
}

/// Active IP ban row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BanEntry {
    pub ip_address: String,
    pub ban_start: i64,
    pub ban_duration: i64,
}

impl BanEntry {
    pub fn is_active(&self, now: i64) -> bool {
        now < self.ban_start + self.ban_duration
    }
}

/// Invitation code state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invite {
    pub id: Uuid,
    pub code: String,
    pub expiration_date: DateTime<Utc>,
    pub usage_count: i32,
    pub max_uses: i32,
    pub created_at: DateTime<Utc>,
}

impl Invite {
    pub fn status(&self, now: DateTime<Utc>) -> InviteStatus {
        if now >= self.expiration_date {
            InviteStatus::Expired
        } else if self.usage_count >= self.max_uses {
            InviteStatus::Exhausted
        } else {
            InviteStatus::Valid
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InviteStatus {
    Valid,
    NotFound,
    Expired,
    Exhausted,
}

/// Registered account as the gate service sees it.
#[derive(Debug, Clone)]
pub struct GateUser {
    pub id: Uuid,
    pub username: String,
    pub email: Option<String>,
    pub password_hash: String,
    pub role: Role,
}

/// Kinds of security-relevant decisions recorded in the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    LoginSuccess,
    LoginFailure,
    RegisterSuccess,
    RegisterFailure,
    Logout,
    InviteCreated,
    InviteExpired,
    InviteFailure,
    IpBanned,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LoginSuccess => "login_success",
            Self::LoginFailure => "login_failure",
            Self::RegisterSuccess => "register_success",
            Self::RegisterFailure => "register_failure",
            Self::Logout => "logout",
            Self::InviteCreated => "invite_created",
            Self::InviteExpired => "invite_expired",
            Self::InviteFailure => "invite_failure",
            Self::IpBanned => "ip_banned",
        }
    }
}

/// One audit-trail entry. Every reject and success path in the request
/// flow writes exactly one of these.
#[derive(Debug, Clone)]
pub struct SecurityEvent {
    pub kind: EventKind,
    pub username: Option<String>,
    pub ip: String,
    pub details: String,
    pub at: DateTime<Utc>,
}

impl SecurityEvent {
    pub fn new(
        kind: EventKind,
        username: Option<&str>,
        ip: &str,
        details: impl Into<String>,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            kind,
            username: username.map(str::to_owned),
            ip: ip.to_owned(),
            details: details.into(),
            at,
        }
    }
}

/// Tunable security policy. All values come from configuration; the
/// defaults mirror the deployed ones.
#[derive(Debug, Clone)]
pub struct Policy {
    /// Failures tolerated inside the lockout window before lockout.
    pub rate_limit_attempts: i64,
    /// Trailing window (seconds) over which failures are summed.
    pub lockout_secs: i64,
    /// First-violation IP ban length (seconds).
    pub base_ban_secs: i64,
    /// Escalation cap for repeat violations (seconds).
    pub max_ban_secs: i64,
    /// Temp ban applied for restricted-username registration attempts.
    pub restricted_name_ban_secs: i64,
    /// CSRF token lifetime (seconds).
    pub csrf_timeout_secs: i64,
    /// Session inactivity limit before forced logout (seconds).
    pub session_inactivity_secs: i64,
    /// Default invite validity from creation (seconds).
    pub invite_expiration_secs: i64,
    /// Default invite use-count ceiling.
    pub invite_max_uses: i32,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            rate_limit_attempts: 6,
            lockout_secs: 15 * 60,
            base_ban_secs: 10 * 60,
            max_ban_secs: 24 * 60 * 60,
            restricted_name_ban_secs: 60 * 60,
            csrf_timeout_secs: 7 * 24 * 60 * 60,
            session_inactivity_secs: 7 * 24 * 60 * 60,
            invite_expiration_secs: 7 * 24 * 60 * 60,
            invite_max_uses: 5,
        }
    }
}
