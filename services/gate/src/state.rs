use deadpool_redis::Pool as RedisPool;
use sea_orm::DatabaseConnection;

use crate::domain::types::Policy;
use crate::infra::cache::RedisSessionStore;
use crate::infra::db::{DbAttemptLedger, DbBanStore, DbEventLog, DbInviteStore, DbUserStore};
use crate::usecase::invite::InviteRegistry;
use crate::usecase::rate_limit::RateLimiter;

/// Shared application state passed to every handler via axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub redis: RedisPool,
    pub policy: Policy,
    pub cookie_domain: String,
}

impl AppState {
    pub fn attempt_ledger(&self) -> DbAttemptLedger {
        DbAttemptLedger {
            db: self.db.clone(),
        }
    }

    pub fn ban_store(&self) -> DbBanStore {
        DbBanStore {
            db: self.db.clone(),
        }
    }

    pub fn user_store(&self) -> DbUserStore {
        DbUserStore {
            db: self.db.clone(),
        }
    }

    pub fn invite_store(&self) -> DbInviteStore {
        DbInviteStore {
            db: self.db.clone(),
        }
    }

    pub fn event_log(&self) -> DbEventLog {
        DbEventLog {
            db: self.db.clone(),
        }
    }

    pub fn session_store(&self) -> RedisSessionStore {
        RedisSessionStore {
            pool: self.redis.clone(),
            // An hour of slack past the inactivity limit; expiry is still
            // enforced by the session use case, Redis just reclaims.
            ttl_secs: self.policy.session_inactivity_secs as u64 + 3600,
        }
    }

    pub fn rate_limiter(&self) -> RateLimiter<DbAttemptLedger, DbBanStore> {
        RateLimiter {
            attempts: self.attempt_ledger(),
            bans: self.ban_store(),
            policy: self.policy.clone(),
        }
    }

    pub fn invite_registry(&self) -> InviteRegistry<DbInviteStore> {
        InviteRegistry {
            invites: self.invite_store(),
            policy: self.policy.clone(),
        }
    }
}
