use serde::Deserialize;

use parlor_core::config::Config;

use crate::domain::types::Policy;

/// Gate service configuration loaded from environment variables.
/// Every policy knob is overridable; the defaults are the deployed values.
#[derive(Debug, Deserialize)]
pub struct GateConfig {
    /// SQLite connection URL, e.g. `sqlite:///var/lib/parlor/gate.sqlite`.
    pub database_url: String,
    /// Redis connection URL for the session store.
    pub redis_url: String,
    /// Cookie domain attribute (root domain, e.g. "example.com").
    pub cookie_domain: String,
    /// TCP port to listen on. Env var: `GATE_PORT`.
    #[serde(default = "default_gate_port")]
    pub gate_port: u16,

    #[serde(default = "default_rate_limit_attempts")]
    pub rate_limit_attempts: i64,
    #[serde(default = "default_lockout_secs")]
    pub lockout_secs: i64,
    #[serde(default = "default_base_ban_secs")]
    pub base_ban_secs: i64,
    #[serde(default = "default_max_ban_secs")]
    pub max_ban_secs: i64,
    #[serde(default = "default_restricted_name_ban_secs")]
    pub restricted_name_ban_secs: i64,
    #[serde(default = "default_one_week_secs")]
    pub csrf_timeout_secs: i64,
    #[serde(default = "default_one_week_secs")]
    pub session_inactivity_secs: i64,
    #[serde(default = "default_one_week_secs")]
    pub invite_expiration_secs: i64,
    #[serde(default = "default_invite_max_uses")]
    pub invite_max_uses: i32,
    #[serde(default = "default_cleanup_interval_secs")]
    pub cleanup_interval_secs: u64,
}

impl Config for GateConfig {}

impl GateConfig {
    pub fn policy(&self) -> Policy {
        Policy {
            rate_limit_attempts: self.rate_limit_attempts,
            lockout_secs: self.lockout_secs,
            base_ban_secs: self.base_ban_secs,
            max_ban_secs: self.max_ban_secs,
            restricted_name_ban_secs: self.restricted_name_ban_secs,
            csrf_timeout_secs: self.csrf_timeout_secs,
            session_inactivity_secs: self.session_inactivity_secs,
            invite_expiration_secs: self.invite_expiration_secs,
            invite_max_uses: self.invite_max_uses,
        }
    }
}

fn default_gate_port() -> u16 {
    3310
}

fn default_rate_limit_attempts() -> i64 {
    6
}

fn default_lockout_secs() -> i64 {
    15 * 60
}

fn default_base_ban_secs() -> i64 {
    10 * 60
}

fn default_max_ban_secs() -> i64 {
    24 * 60 * 60
}

fn default_restricted_name_ban_secs() -> i64 {
    60 * 60
}

fn default_one_week_secs() -> i64 {
    7 * 24 * 60 * 60
}

fn default_invite_max_uses() -> i32 {
    5
}

fn default_cleanup_interval_secs() -> u64 {
    60 * 60
}
