//! IP and account rate limiting with escalating IP bans.
//!
//! The two scopes deliberately behave differently: an IP that keeps failing
//! gets a persistent ban row whose duration doubles per repeat violation
//! (capped), while an account lockout is only ever the flat rolling-window
//! threshold — no ban row, it unlocks as soon as the window drains.

use chrono::{DateTime, Utc};

use crate::domain::repository::{AttemptLedger, BanStore};
use crate::domain::types::{AttemptScope, Policy, RateLimitDecision};
use crate::error::GateError;

pub struct RateLimiter<A, B>
where
    A: AttemptLedger,
    B: BanStore,
{
    pub attempts: A,
    pub bans: B,
    pub policy: Policy,
}

impl<A, B> RateLimiter<A, B>
where
    A: AttemptLedger,
    B: BanStore,
{
    pub async fn is_banned(&self, ip: &str, now: DateTime<Utc>) -> Result<bool, GateError> {
        if ip.is_empty() {
            return Ok(false);
        }
        let ban = self.bans.find(ip).await?;
        Ok(ban.is_some_and(|b| b.is_active(now.timestamp())))
    }

    /// Entry point before any credential work: banned IPs are turned away
    /// without reading the ledger, then the windowed failure sum decides.
    pub async fn check_ip(
        &self,
        ip: &str,
        now: DateTime<Utc>,
    ) -> Result<RateLimitDecision, GateError> {
        if ip.is_empty() {
            return Ok(RateLimitDecision::Allowed);
        }
        if self.is_banned(ip, now).await? {
            return Ok(RateLimitDecision::Banned);
        }
        let window_start = now.timestamp() - self.policy.lockout_secs;
        let total = self
            .attempts
            .count_since(AttemptScope::Ip, ip, window_start)
            .await?;
        if total >= self.policy.rate_limit_attempts {
            return Ok(RateLimitDecision::Exceeded);
        }
        Ok(RateLimitDecision::Allowed)
    }

    /// Record one failed attempt against the IP and apply the escalating
    /// ban if the window threshold is now met. Already-banned IPs get no
    /// new ledger rows — rejected requests while banned must not grow the
    /// table. Returns whether a ban was applied by this call.
    pub async fn record_ip_failure(
        &self,
        ip: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, GateError> {
        if ip.is_empty() || self.is_banned(ip, now).await? {
            return Ok(false);
        }

        let now_s = now.timestamp();
        self.attempts
            .record_failure(AttemptScope::Ip, ip, now_s)
            .await?;

        let window_start = now_s - self.policy.lockout_secs;
        let total = self
            .attempts
            .count_since(AttemptScope::Ip, ip, window_start)
            .await?;
        if total >= self.policy.rate_limit_attempts {
            self.bans
                .upsert_escalating(ip, now_s, self.policy.base_ban_secs, self.policy.max_ban_secs)
                .await?;
            return Ok(true);
        }
        Ok(false)
    }

    /// Flat account-scoped check. Exceeding it locks the account for as
    /// long as failures remain inside the window; no ban row is written.
    /// Strictly greater than the threshold: the failure that lands exactly
    /// on it is the one that banned its source IP, and an IP ban alone
    /// must not lock the account out from everywhere else.
    pub async fn check_username(
        &self,
        username: &str,
        now: DateTime<Utc>,
    ) -> Result<RateLimitDecision, GateError> {
        if username.is_empty() {
            return Ok(RateLimitDecision::Allowed);
        }
        let window_start = now.timestamp() - self.policy.lockout_secs;
        let total = self
            .attempts
            .count_since(AttemptScope::Username, username, window_start)
            .await?;
        if total > self.policy.rate_limit_attempts {
            return Ok(RateLimitDecision::Exceeded);
        }
        Ok(RateLimitDecision::Allowed)
    }

    pub async fn record_username_failure(
        &self,
        username: &str,
        now: DateTime<Utc>,
    ) -> Result<(), GateError> {
        if username.is_empty() {
            return Ok(());
        }
        self.attempts
            .record_failure(AttemptScope::Username, username, now.timestamp())
            .await
    }

    /// Successful login wipes the succeeding IP's in-window history.
    pub async fn clear_ip(&self, ip: &str, now: DateTime<Utc>) -> Result<(), GateError> {
        if ip.is_empty() {
            return Ok(());
        }
        let window_start = now.timestamp() - self.policy.lockout_secs;
        self.attempts
            .clear(AttemptScope::Ip, ip, window_start)
            .await
    }

    pub async fn clear_username(
        &self,
        username: &str,
        now: DateTime<Utc>,
    ) -> Result<(), GateError> {
        if username.is_empty() {
            return Ok(());
        }
        let window_start = now.timestamp() - self.policy.lockout_secs;
        self.attempts
            .clear(AttemptScope::Username, username, window_start)
            .await
    }

    /// Temp ban for registration attempts on staff-impersonating usernames.
    /// Goes through the same escalation upsert, so repeat offenders double.
    pub async fn apply_restricted_name_ban(
        &self,
        ip: &str,
        now: DateTime<Utc>,
    ) -> Result<(), GateError> {
        if ip.is_empty() {
            return Ok(());
        }
        self.bans
            .upsert_escalating(
                ip,
                now.timestamp(),
                self.policy.restricted_name_ban_secs,
                self.policy.max_ban_secs,
            )
            .await
    }
}
