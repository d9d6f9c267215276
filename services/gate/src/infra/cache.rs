use anyhow::Context as _;
use deadpool_redis::Pool;
use deadpool_redis::redis::AsyncCommands;

use crate::domain::repository::SessionStore;
use crate::domain::types::Session;
use crate::error::GateError;

/// Redis-backed session storage. Sessions are JSON blobs under
/// `gate:session:<id>` with a TTL — the TTL is a storage backstop; the
/// inactivity timeout is still enforced in the session use case.
#[derive(Clone)]
pub struct RedisSessionStore {
    pub pool: Pool,
    pub ttl_secs: u64,
}

fn session_key(session_id: &str) -> String {
    format!("gate:session:{session_id}")
}

impl SessionStore for RedisSessionStore {
    async fn load(&self, session_id: &str) -> Result<Option<Session>, GateError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| GateError::Internal(e.into()))?;
        let raw: Option<String> = conn
            .get(session_key(session_id))
            .await
            .map_err(|e: deadpool_redis::redis::RedisError| GateError::Internal(e.into()))?;
        match raw {
            None => Ok(None),
            Some(json) => match serde_json::from_str(&json) {
                Ok(session) => Ok(Some(session)),
                Err(e) => {
                    // Undecodable state is treated as no session at all;
                    // the caller will start a fresh one.
                    tracing::warn!(error = %e, "discarding undecodable session state");
                    Ok(None)
                }
            },
        }
    }

    async fn save(&self, session_id: &str, session: &Session) -> Result<(), GateError> {
        let json = serde_json::to_string(session).context("encode session")?;
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| GateError::Internal(e.into()))?;
        let (): () = conn
            .set_ex(session_key(session_id), json, self.ttl_secs)
            .await
            .map_err(|e: deadpool_redis::redis::RedisError| GateError::Internal(e.into()))?;
        Ok(())
    }

    async fn destroy(&self, session_id: &str) -> Result<(), GateError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| GateError::Internal(e.into()))?;
        let (): () = conn
            .del(session_key(session_id))
            .await
            .map_err(|e: deadpool_redis::redis::RedisError| GateError::Internal(e.into()))?;
        Ok(())
    }
}
