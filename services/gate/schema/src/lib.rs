//! sea-orm entities for the gate service tables.

pub mod banned_ips;
pub mod invitation_codes;
pub mod login_attempts;
pub mod security_events;
pub mod username_login_attempts;
pub mod users;
