use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, TimeZone, Utc};
use uuid::Uuid;

use parlor_gate::domain::repository::{
    AttemptLedger, BanStore, CreateUserResult, EventLog, InviteStore, SessionStore, UserStore,
};
use parlor_gate::domain::types::{
    AttemptScope, BanEntry, GateUser, Invite, Policy, Role, SecurityEvent, Session,
};
use parlor_gate::error::GateError;
use parlor_gate::usecase::csrf;
use parlor_gate::usecase::password::hash_password;

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 8, 1, 12, 0, 0).unwrap()
}

pub fn test_policy() -> Policy {
    Policy::default()
}

// ── MemoryAttemptLedger ──────────────────────────────────────────────────────

type Buckets = HashMap<(String, i64), i64>;

#[derive(Clone, Default)]
pub struct MemoryAttemptLedger {
    ip: Arc<Mutex<Buckets>>,
    username: Arc<Mutex<Buckets>>,
}

impl MemoryAttemptLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn table(&self, scope: AttemptScope) -> &Arc<Mutex<Buckets>> {
        match scope {
            AttemptScope::Ip => &self.ip,
            AttemptScope::Username => &self.username,
        }
    }
}

impl AttemptLedger for MemoryAttemptLedger {
    async fn record_failure(
        &self,
        scope: AttemptScope,
        identity: &str,
        at: i64,
    ) -> Result<(), GateError> {
        let mut buckets = self.table(scope).lock().unwrap();
        *buckets.entry((identity.to_owned(), at)).or_insert(0) += 1;
        Ok(())
    }

    async fn count_since(
        &self,
        scope: AttemptScope,
        identity: &str,
        window_start: i64,
    ) -> Result<i64, GateError> {
        let buckets = self.table(scope).lock().unwrap();
        Ok(buckets
            .iter()
            .filter(|((id, at), _)| id == identity && *at > window_start)
            .map(|(_, count)| *count)
            .sum())
    }

    async fn clear(
        &self,
        scope: AttemptScope,
        identity: &str,
        window_start: i64,
    ) -> Result<(), GateError> {
        let mut buckets = self.table(scope).lock().unwrap();
        buckets.retain(|(id, at), _| !(id == identity && *at > window_start));
        Ok(())
    }

    async fn cleanup(&self, threshold: i64) -> Result<(), GateError> {
        self.ip.lock().unwrap().retain(|(_, at), _| *at >= threshold);
        self.username
            .lock()
            .unwrap()
            .retain(|(_, at), _| *at >= threshold);
        Ok(())
    }
}

// ── MemoryBanStore ───────────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct MemoryBanStore {
    bans: Arc<Mutex<HashMap<String, BanEntry>>>,
}

impl MemoryBanStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, ip: &str) -> Option<BanEntry> {
        self.bans.lock().unwrap().get(ip).cloned()
    }
}

impl BanStore for MemoryBanStore {
    async fn find(&self, ip: &str) -> Result<Option<BanEntry>, GateError> {
        Ok(self.get(ip))
    }

    async fn upsert_escalating(
        &self,
        ip: &str,
        now: i64,
        base_secs: i64,
        max_secs: i64,
    ) -> Result<(), GateError> {
        let mut bans = self.bans.lock().unwrap();
        match bans.get_mut(ip) {
            // Same guard the SQL upsert carries: only a lapsed ban escalates.
            Some(ban) => {
                if ban.ban_start + ban.ban_duration <= now {
                    ban.ban_duration = (ban.ban_duration * 2).min(max_secs);
                    ban.ban_start = now;
                }
            }
            None => {
                bans.insert(
                    ip.to_owned(),
                    BanEntry {
                        ip_address: ip.to_owned(),
                        ban_start: now,
                        ban_duration: base_secs,
                    },
                );
            }
        }
        Ok(())
    }

    async fn delete_expired(&self, now: i64, grace_secs: i64) -> Result<(), GateError> {
        self.bans
            .lock()
            .unwrap()
            .retain(|_, ban| ban.ban_start + ban.ban_duration + grace_secs >= now);
        Ok(())
    }
}

// ── MemoryUserStore ──────────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct MemoryUserStore {
    users: Arc<Mutex<Vec<GateUser>>>,
}

impl MemoryUserStore {
    pub fn new(users: Vec<GateUser>) -> Self {
        Self {
            users: Arc::new(Mutex::new(users)),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn usernames(&self) -> Vec<String> {
        self.users
            .lock()
            .unwrap()
            .iter()
            .map(|u| u.username.clone())
            .collect()
    }

    pub fn find(&self, username: &str) -> Option<GateUser> {
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.username == username)
            .cloned()
    }
}

impl UserStore for MemoryUserStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<GateUser>, GateError> {
        Ok(self.find(username))
    }

    async fn create(
        &self,
        user: &GateUser,
        _created_at: DateTime<Utc>,
    ) -> Result<CreateUserResult, GateError> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.username == user.username) {
            return Ok(CreateUserResult::UsernameTaken);
        }
        users.push(user.clone());
        Ok(CreateUserResult::Created)
    }
}

// ── MemoryInviteStore ────────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct MemoryInviteStore {
    invites: Arc<Mutex<Vec<Invite>>>,
    /// Number of upcoming `insert` calls that report a code collision.
    /// Lets collision-retry tests steer the bounded loop deterministically.
    forced_collisions: Arc<Mutex<usize>>,
}

impl MemoryInviteStore {
    pub fn new(invites: Vec<Invite>) -> Self {
        Self {
            invites: Arc::new(Mutex::new(invites)),
            forced_collisions: Arc::new(Mutex::new(0)),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn force_collisions(&self, count: usize) {
        *self.forced_collisions.lock().unwrap() = count;
    }

    pub fn get(&self, code: &str) -> Option<Invite> {
        self.invites
            .lock()
            .unwrap()
            .iter()
            .find(|i| i.code == code)
            .cloned()
    }
}

impl InviteStore for MemoryInviteStore {
    async fn find_by_code(&self, code: &str) -> Result<Option<Invite>, GateError> {
        Ok(self.get(code))
    }

    async fn insert(&self, invite: &Invite) -> Result<bool, GateError> {
        {
            let mut forced = self.forced_collisions.lock().unwrap();
            if *forced > 0 {
                *forced -= 1;
                return Ok(false);
            }
        }
        let mut invites = self.invites.lock().unwrap();
        if invites.iter().any(|i| i.code == invite.code) {
            return Ok(false);
        }
        invites.push(invite.clone());
        Ok(true)
    }

    async fn try_consume(&self, code: &str, now: DateTime<Utc>) -> Result<bool, GateError> {
        let mut invites = self.invites.lock().unwrap();
        match invites.iter_mut().find(|i| {
            i.code == code && i.usage_count < i.max_uses && i.expiration_date > now
        }) {
            Some(invite) => {
                invite.usage_count += 1;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn expire_now(&self, code: &str, now: DateTime<Utc>) -> Result<bool, GateError> {
        let mut invites = self.invites.lock().unwrap();
        match invites.iter_mut().find(|i| i.code == code) {
            Some(invite) => {
                invite.expiration_date = now;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list(&self) -> Result<Vec<Invite>, GateError> {
        Ok(self.invites.lock().unwrap().clone())
    }
}

// ── MemoryEventLog ───────────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct MemoryEventLog {
    events: Arc<Mutex<Vec<SecurityEvent>>>,
}

impl MemoryEventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn recorded(&self) -> Vec<SecurityEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn kinds(&self) -> Vec<&'static str> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .map(|e| e.kind.as_str())
            .collect()
    }
}

impl EventLog for MemoryEventLog {
    async fn record(&self, event: SecurityEvent) -> Result<(), GateError> {
        self.events.lock().unwrap().push(event);
        Ok(())
    }
}

// ── MemorySessionStore ───────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct MemorySessionStore {
    sessions: Arc<Mutex<HashMap<String, Session>>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, session_id: &str) -> Option<Session> {
        self.sessions.lock().unwrap().get(session_id).cloned()
    }
}

impl SessionStore for MemorySessionStore {
    async fn load(&self, session_id: &str) -> Result<Option<Session>, GateError> {
        Ok(self.get(session_id))
    }

    async fn save(&self, session_id: &str, session: &Session) -> Result<(), GateError> {
        self.sessions
            .lock()
            .unwrap()
            .insert(session_id.to_owned(), session.clone());
        Ok(())
    }

    async fn destroy(&self, session_id: &str) -> Result<(), GateError> {
        self.sessions.lock().unwrap().remove(session_id);
        Ok(())
    }
}

// ── Fixtures ─────────────────────────────────────────────────────────────────

/// Seed a live session and return its ID plus the CSRF token a well-behaved
/// client would echo back.
pub async fn seed_session(store: &MemorySessionStore, now: DateTime<Utc>) -> (String, String) {
    let session = Session::new(csrf::generate_token(), now);
    let token = session.csrf_token.clone();
    let id = parlor_gate::usecase::session::generate_session_id();
    store.save(&id, &session).await.unwrap();
    (id, token)
}

pub fn test_user(username: &str, password: &str) -> GateUser {
    GateUser {
        id: Uuid::new_v4(),
        username: username.to_owned(),
        email: None,
        password_hash: hash_password(password).unwrap(),
        role: Role::User,
    }
}

pub fn test_invite(code: &str, max_uses: i32, expires_at: DateTime<Utc>) -> Invite {
    Invite {
        id: Uuid::new_v4(),
        code: code.to_owned(),
        expiration_date: expires_at,
        usage_count: 0,
        max_uses,
        created_at: expires_at - chrono::Duration::days(7),
    }
}
