#![allow(async_fn_in_trait)]

use chrono::{DateTime, Utc};

use crate::domain::types::{
    AttemptScope, BanEntry, GateUser, Invite, SecurityEvent, Session,
};
use crate::error::GateError;

/// Failed-attempt ledger over both scopes (IP and username). Identities
/// arrive already normalized; `attempt_time` values are epoch seconds and
/// act as exact bucket keys.
pub trait AttemptLedger: Send + Sync {
    /// Upsert one failure into the `(identity, second)` bucket. Concurrent
    /// calls for the same bucket must not lose increments — the increment
    /// happens inside the store, not read-modify-write here.
    async fn record_failure(
        &self,
        scope: AttemptScope,
        identity: &str,
        at: i64,
    ) -> Result<(), GateError>;

    /// Sum of `attempt_count` strictly after `window_start`.
    async fn count_since(
        &self,
        scope: AttemptScope,
        identity: &str,
        window_start: i64,
    ) -> Result<i64, GateError>;

    /// Drop this identity's in-window rows (on successful authentication).
    /// Other identities' history is untouched.
    async fn clear(
        &self,
        scope: AttemptScope,
        identity: &str,
        window_start: i64,
    ) -> Result<(), GateError>;

    /// Bulk-delete rows older than `threshold` across both scopes.
    /// Storage reclamation only — rate limits never depend on this running.
    async fn cleanup(&self, threshold: i64) -> Result<(), GateError>;
}

/// Escalating IP ban rows, one per IP.
pub trait BanStore: Send + Sync {
    async fn find(&self, ip: &str) -> Result<Option<BanEntry>, GateError>;

    /// Insert `(ip, now, base_secs)`; if a row exists and its ban has
    /// lapsed, restart at `now` with the duration doubled (capped at
    /// `max_secs`). A still-active row is left alone so racing
    /// threshold-crossers converge on a single doubling.
    async fn upsert_escalating(
        &self,
        ip: &str,
        now: i64,
        base_secs: i64,
        max_secs: i64,
    ) -> Result<(), GateError>;

    /// Delete rows whose ban lapsed more than `grace_secs` ago.
    async fn delete_expired(&self, now: i64, grace_secs: i64) -> Result<(), GateError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateUserResult {
    Created,
    /// Unique-index violation on `username` — surfaced as data so a losing
    /// racer gets "already taken" instead of a 500.
    UsernameTaken,
}

/// Account lookup and creation.
pub trait UserStore: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<GateUser>, GateError>;

    async fn create(
        &self,
        user: &GateUser,
        created_at: DateTime<Utc>,
    ) -> Result<CreateUserResult, GateError>;
}

/// Invitation codes. All mutation of invite rows goes through here.
pub trait InviteStore: Send + Sync {
    async fn find_by_code(&self, code: &str) -> Result<Option<Invite>, GateError>;

    /// Insert a freshly generated invite. Returns `false` when the code
    /// collided with an existing row (unique violation), so the caller can
    /// regenerate and retry.
    async fn insert(&self, invite: &Invite) -> Result<bool, GateError>;

    /// Atomic consume-or-reject: increments `usage_count` only while the
    /// code is unexpired and under its ceiling, in a single statement.
    /// Returns whether a use was actually consumed.
    async fn try_consume(&self, code: &str, now: DateTime<Utc>) -> Result<bool, GateError>;

    /// Soft-revoke: set `expiration_date = now`, keeping the row for audit.
    /// Returns `false` when no such code exists.
    async fn expire_now(&self, code: &str, now: DateTime<Utc>) -> Result<bool, GateError>;

    async fn list(&self) -> Result<Vec<Invite>, GateError>;
}

/// Append-only security audit trail.
pub trait EventLog: Send + Sync {
    async fn record(&self, event: SecurityEvent) -> Result<(), GateError>;
}

/// Server-side session storage keyed by the cookie session ID.
pub trait SessionStore: Send + Sync {
    async fn load(&self, session_id: &str) -> Result<Option<Session>, GateError>;

    async fn save(&self, session_id: &str, session: &Session) -> Result<(), GateError>;

    async fn destroy(&self, session_id: &str) -> Result<(), GateError>;
}
