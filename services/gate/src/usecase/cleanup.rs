//! Storage reclamation for the rate-limit tables. Owned by a scheduled
//! task, never by request latency — and nothing breaks if it never runs:
//! rows outside the lookback window are already ignored by the counters.

use chrono::{DateTime, Utc};

use crate::domain::repository::{AttemptLedger, BanStore};
use crate::domain::types::Policy;
use crate::error::GateError;

pub struct CleanupUseCase<A, B>
where
    A: AttemptLedger,
    B: BanStore,
{
    pub attempts: A,
    pub bans: B,
    pub policy: Policy,
}

impl<A, B> CleanupUseCase<A, B>
where
    A: AttemptLedger,
    B: BanStore,
{
    pub async fn execute(&self, now: DateTime<Utc>) -> Result<(), GateError> {
        let now_s = now.timestamp();
        self.attempts.cleanup(now_s - self.policy.lockout_secs).await?;
        // Lapsed ban rows keep a full max-ban of slack before deletion so
        // a quickly-returning offender still escalates from its prior
        // duration instead of starting over.
        self.bans.delete_expired(now_s, self.policy.max_ban_secs).await?;
        Ok(())
    }
}
