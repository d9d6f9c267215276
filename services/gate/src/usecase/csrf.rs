//! CSRF token lifecycle. Tokens live in the session only — nothing here
//! touches the database. Any non-`Valid` verdict is a hard rejection of the
//! submitting request.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Utc};
use rand::RngExt;

use crate::domain::types::{CsrfValidation, Session};

/// 256 bits of entropy per token.
pub const TOKEN_BYTES: usize = 32;

pub fn generate_token() -> String {
    let bytes: [u8; TOKEN_BYTES] = rand::rng().random();
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Bind a fresh token to the session.
pub fn issue(session: &mut Session, now: DateTime<Utc>) {
    session.csrf_token = generate_token();
    session.csrf_issued_at = now;
}

/// Replace the token after a successful state-changing authentication
/// event (login, registration) so the old one cannot be replayed.
pub fn rotate(session: &mut Session, now: DateTime<Utc>) {
    issue(session, now);
}

/// Compare a submitted token against the session's. Expiry is checked
/// first — a stale token is `Expired` even if it matches.
pub fn validate(
    session: &Session,
    supplied: Option<&str>,
    now: DateTime<Utc>,
    timeout_secs: i64,
) -> CsrfValidation {
    let supplied = match supplied {
        Some(s) if !s.is_empty() => s,
        _ => return CsrfValidation::Missing,
    };

    if (now - session.csrf_issued_at).num_seconds() > timeout_secs {
        return CsrfValidation::Expired;
    }

    if constant_time_eq(supplied.as_bytes(), session.csrf_token.as_bytes()) {
        CsrfValidation::Valid
    } else {
        CsrfValidation::Mismatch
    }
}

/// Constant-time byte comparison — the comparison must not leak how much
/// of the token prefix matched.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
