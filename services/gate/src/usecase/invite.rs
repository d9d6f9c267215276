//! Invitation-code registry: validation, atomic consumption, admin
//! creation and revocation. Codes are three lowercase letters followed by
//! three digits, stored lowercase.

use chrono::{DateTime, Duration, Utc};
use rand::RngExt;
use uuid::Uuid;

use crate::domain::repository::InviteStore;
use crate::domain::types::{
    Invite, InviteStatus, MAX_CODE_GENERATION_ATTEMPTS, Policy, normalize_identity,
};
use crate::error::GateError;

const LETTERS: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
const DIGITS: &[u8] = b"0123456789";

fn generate_code() -> String {
    let mut rng = rand::rng();
    let mut code = String::with_capacity(6);
    for _ in 0..3 {
        code.push(LETTERS[rng.random_range(0..LETTERS.len())] as char);
    }
    for _ in 0..3 {
        code.push(DIGITS[rng.random_range(0..DIGITS.len())] as char);
    }
    code
}

/// Lexical shape check for submitted codes, applied before any lookup.
pub fn is_valid_code_format(code: &str) -> bool {
    let bytes = code.as_bytes();
    bytes.len() == 6
        && bytes[..3].iter().all(|b| b.is_ascii_lowercase())
        && bytes[3..].iter().all(|b| b.is_ascii_digit())
}

#[derive(Debug)]
pub enum CreateInviteResult {
    Created(Invite),
    /// The bounded retry loop never found an unused code. Callers treat
    /// this as an operational failure, not an invariant to loop on.
    NoUniqueCode,
}

pub struct InviteRegistry<I>
where
    I: InviteStore,
{
    pub invites: I,
    pub policy: Policy,
}

impl<I> InviteRegistry<I>
where
    I: InviteStore,
{
    /// Case-insensitive lookup and lifecycle check.
    pub async fn validate(
        &self,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<InviteStatus, GateError> {
        let code = normalize_identity(code);
        match self.invites.find_by_code(&code).await? {
            Some(invite) => Ok(invite.status(now)),
            None => Ok(InviteStatus::NotFound),
        }
    }

    /// Burn one use. The store performs check-and-increment in a single
    /// statement, so two registrations racing on the last slot cannot both
    /// get it.
    pub async fn consume(&self, code: &str, now: DateTime<Utc>) -> Result<bool, GateError> {
        let code = normalize_identity(code);
        self.invites.try_consume(&code, now).await
    }

    /// Mint a new code with policy expiry and use ceiling. Uniqueness rides
    /// on the unique index — a collision shows up as a failed insert and we
    /// regenerate, up to the retry bound.
    pub async fn create(&self, now: DateTime<Utc>) -> Result<CreateInviteResult, GateError> {
        for _ in 0..MAX_CODE_GENERATION_ATTEMPTS {
            let invite = Invite {
                id: Uuid::new_v4(),
                code: generate_code(),
                expiration_date: now + Duration::seconds(self.policy.invite_expiration_secs),
                usage_count: 0,
                max_uses: self.policy.invite_max_uses,
                created_at: now,
            };
            if self.invites.insert(&invite).await? {
                return Ok(CreateInviteResult::Created(invite));
            }
        }
        Ok(CreateInviteResult::NoUniqueCode)
    }

    /// Soft-revoke: the code stops validating immediately, the row stays.
    pub async fn expire_now(&self, code: &str, now: DateTime<Utc>) -> Result<bool, GateError> {
        let code = normalize_identity(code);
        self.invites.expire_now(&code, now).await
    }

    pub async fn list(&self) -> Result<Vec<Invite>, GateError> {
        self.invites.list().await
    }
}
