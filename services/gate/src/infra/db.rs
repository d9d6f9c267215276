use anyhow::Context as _;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect, SqlErr,
    ActiveValue::Set,
};
use uuid::Uuid;

use parlor_gate_schema::{
    banned_ips, invitation_codes, login_attempts, security_events, username_login_attempts, users,
};

use crate::domain::repository::{
    AttemptLedger, BanStore, CreateUserResult, EventLog, InviteStore, UserStore,
};
use crate::domain::types::{
    AttemptScope, BanEntry, GateUser, Invite, Role, SecurityEvent, UNKNOWN_ACTOR,
};
use crate::error::GateError;

// ── Attempt ledger ────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbAttemptLedger {
    pub db: DatabaseConnection,
}

impl AttemptLedger for DbAttemptLedger {
    async fn record_failure(
        &self,
        scope: AttemptScope,
        identity: &str,
        at: i64,
    ) -> Result<(), GateError> {
        // The increment lives in the upsert so two failures in the same
        // second bucket both land.
        match scope {
            AttemptScope::Ip => {
                let row = login_attempts::ActiveModel {
                    ip_address: Set(identity.to_owned()),
                    attempt_time: Set(at),
                    attempt_count: Set(1),
                };
                login_attempts::Entity::insert(row)
                    .on_conflict(
                        OnConflict::columns([
                            login_attempts::Column::IpAddress,
                            login_attempts::Column::AttemptTime,
                        ])
                        .value(
                            login_attempts::Column::AttemptCount,
                            Expr::col(login_attempts::Column::AttemptCount).add(1),
                        )
                        .to_owned(),
                    )
                    .exec_without_returning(&self.db)
                    .await
                    .context("record ip attempt")?;
            }
            AttemptScope::Username => {
                let row = username_login_attempts::ActiveModel {
                    username: Set(identity.to_owned()),
                    attempt_time: Set(at),
                    attempt_count: Set(1),
                };
                username_login_attempts::Entity::insert(row)
                    .on_conflict(
                        OnConflict::columns([
                            username_login_attempts::Column::Username,
                            username_login_attempts::Column::AttemptTime,
                        ])
                        .value(
                            username_login_attempts::Column::AttemptCount,
                            Expr::col(username_login_attempts::Column::AttemptCount).add(1),
                        )
                        .to_owned(),
                    )
                    .exec_without_returning(&self.db)
                    .await
                    .context("record username attempt")?;
            }
        }
        Ok(())
    }

    async fn count_since(
        &self,
        scope: AttemptScope,
        identity: &str,
        window_start: i64,
    ) -> Result<i64, GateError> {
        let total = match scope {
            AttemptScope::Ip => login_attempts::Entity::find()
                .select_only()
                .column_as(login_attempts::Column::AttemptCount.sum(), "total")
                .filter(login_attempts::Column::IpAddress.eq(identity))
                .filter(login_attempts::Column::AttemptTime.gt(window_start))
                .into_tuple::<Option<i64>>()
                .one(&self.db)
                .await
                .context("sum ip attempts")?,
            AttemptScope::Username => username_login_attempts::Entity::find()
                .select_only()
                .column_as(username_login_attempts::Column::AttemptCount.sum(), "total")
                .filter(username_login_attempts::Column::Username.eq(identity))
                .filter(username_login_attempts::Column::AttemptTime.gt(window_start))
                .into_tuple::<Option<i64>>()
                .one(&self.db)
                .await
                .context("sum username attempts")?,
        };
        Ok(total.flatten().unwrap_or(0))
    }

    async fn clear(
        &self,
        scope: AttemptScope,
        identity: &str,
        window_start: i64,
    ) -> Result<(), GateError> {
        match scope {
            AttemptScope::Ip => {
                login_attempts::Entity::delete_many()
                    .filter(login_attempts::Column::IpAddress.eq(identity))
                    .filter(login_attempts::Column::AttemptTime.gt(window_start))
                    .exec(&self.db)
                    .await
                    .context("clear ip attempts")?;
            }
            AttemptScope::Username => {
                username_login_attempts::Entity::delete_many()
                    .filter(username_login_attempts::Column::Username.eq(identity))
                    .filter(username_login_attempts::Column::AttemptTime.gt(window_start))
                    .exec(&self.db)
                    .await
                    .context("clear username attempts")?;
            }
        }
        Ok(())
    }

    async fn cleanup(&self, threshold: i64) -> Result<(), GateError> {
        login_attempts::Entity::delete_many()
            .filter(login_attempts::Column::AttemptTime.lt(threshold))
            .exec(&self.db)
            .await
            .context("cleanup ip attempts")?;
        username_login_attempts::Entity::delete_many()
            .filter(username_login_attempts::Column::AttemptTime.lt(threshold))
            .exec(&self.db)
            .await
            .context("cleanup username attempts")?;
        Ok(())
    }
}

// ── Ban store ─────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbBanStore {
    pub db: DatabaseConnection,
}

impl BanStore for DbBanStore {
    async fn find(&self, ip: &str) -> Result<Option<BanEntry>, GateError> {
        let row = banned_ips::Entity::find_by_id(ip.to_owned())
            .one(&self.db)
            .await
            .context("find ban")?;
        Ok(row.map(ban_from_model))
    }

    async fn upsert_escalating(
        &self,
        ip: &str,
        now: i64,
        base_secs: i64,
        max_secs: i64,
    ) -> Result<(), GateError> {
        let row = banned_ips::ActiveModel {
            ip_address: Set(ip.to_owned()),
            ban_start: Set(now),
            ban_duration: Set(base_secs),
        };
        // The DO UPDATE doubles and restarts the ban, but only when the
        // existing ban has already lapsed — otherwise N requests racing
        // over the threshold would double the duration N times instead of
        // once.
        banned_ips::Entity::insert(row)
            .on_conflict(
                OnConflict::column(banned_ips::Column::IpAddress)
                    .value(banned_ips::Column::BanStart, Expr::value(now))
                    .value(
                        banned_ips::Column::BanDuration,
                        Expr::cust_with_values("MIN(ban_duration * 2, ?)", [max_secs]),
                    )
                    .action_and_where(Expr::cust_with_values(
                        "ban_start + ban_duration <= ?",
                        [now],
                    ))
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await
            .context("upsert ban")?;
        Ok(())
    }

    async fn delete_expired(&self, now: i64, grace_secs: i64) -> Result<(), GateError> {
        banned_ips::Entity::delete_many()
            .filter(Expr::cust_with_values(
                "ban_start + ban_duration + ? < ?",
                [grace_secs, now],
            ))
            .exec(&self.db)
            .await
            .context("delete lapsed bans")?;
        Ok(())
    }
}

fn ban_from_model(model: banned_ips::Model) -> BanEntry {
    BanEntry {
        ip_address: model.ip_address,
        ban_start: model.ban_start,
        ban_duration: model.ban_duration,
    }
}

// ── User store ────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbUserStore {
    pub db: DatabaseConnection,
}

impl UserStore for DbUserStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<GateUser>, GateError> {
        let row = users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.db)
            .await
            .context("find user by username")?;
        row.map(user_from_model).transpose()
    }

    async fn create(
        &self,
        user: &GateUser,
        created_at: DateTime<Utc>,
    ) -> Result<CreateUserResult, GateError> {
        let row = users::ActiveModel {
            id: Set(user.id),
            username: Set(user.username.clone()),
            email: Set(user.email.clone()),
            password_hash: Set(user.password_hash.clone()),
            role: Set(user.role.as_str().to_owned()),
            created_at: Set(created_at),
        };
        match users::Entity::insert(row).exec_without_returning(&self.db).await {
            Ok(_) => Ok(CreateUserResult::Created),
            Err(e) => match e.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => Ok(CreateUserResult::UsernameTaken),
                _ => Err(GateError::Internal(
                    anyhow::Error::new(e).context("create user"),
                )),
            },
        }
    }
}

fn user_from_model(model: users::Model) -> Result<GateUser, GateError> {
    let role = Role::parse(&model.role).ok_or_else(|| {
        GateError::Internal(anyhow::anyhow!(
            "user '{}' has unknown role '{}'",
            model.username,
            model.role
        ))
    })?;
    Ok(GateUser {
        id: model.id,
        username: model.username,
        email: model.email,
        password_hash: model.password_hash,
        role,
    })
}

// ── Invite store ──────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbInviteStore {
    pub db: DatabaseConnection,
}

impl InviteStore for DbInviteStore {
    async fn find_by_code(&self, code: &str) -> Result<Option<Invite>, GateError> {
        let row = invitation_codes::Entity::find()
            .filter(invitation_codes::Column::Code.eq(code))
            .one(&self.db)
            .await
            .context("find invite by code")?;
        Ok(row.map(invite_from_model))
    }

    async fn insert(&self, invite: &Invite) -> Result<bool, GateError> {
        let row = invitation_codes::ActiveModel {
            id: Set(invite.id),
            code: Set(invite.code.clone()),
            expiration_date: Set(invite.expiration_date),
            usage_count: Set(invite.usage_count),
            max_uses: Set(invite.max_uses),
            created_at: Set(invite.created_at),
        };
        match invitation_codes::Entity::insert(row)
            .exec_without_returning(&self.db)
            .await
        {
            Ok(_) => Ok(true),
            Err(e) => match e.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => Ok(false),
                _ => Err(GateError::Internal(
                    anyhow::Error::new(e).context("insert invite"),
                )),
            },
        }
    }

    async fn try_consume(&self, code: &str, now: DateTime<Utc>) -> Result<bool, GateError> {
        // Check-and-increment in one statement; the affected-row count is
        // the verdict.
        let result = invitation_codes::Entity::update_many()
            .col_expr(
                invitation_codes::Column::UsageCount,
                Expr::col(invitation_codes::Column::UsageCount).add(1),
            )
            .filter(invitation_codes::Column::Code.eq(code))
            .filter(
                Expr::col(invitation_codes::Column::UsageCount)
                    .lt(Expr::col(invitation_codes::Column::MaxUses)),
            )
            .filter(invitation_codes::Column::ExpirationDate.gt(now))
            .exec(&self.db)
            .await
            .context("consume invite")?;
        Ok(result.rows_affected > 0)
    }

    async fn expire_now(&self, code: &str, now: DateTime<Utc>) -> Result<bool, GateError> {
        let result = invitation_codes::Entity::update_many()
            .col_expr(invitation_codes::Column::ExpirationDate, Expr::value(now))
            .filter(invitation_codes::Column::Code.eq(code))
            .exec(&self.db)
            .await
            .context("expire invite")?;
        Ok(result.rows_affected > 0)
    }

    async fn list(&self) -> Result<Vec<Invite>, GateError> {
        let rows = invitation_codes::Entity::find()
            .order_by_desc(invitation_codes::Column::ExpirationDate)
            .all(&self.db)
            .await
            .context("list invites")?;
        Ok(rows.into_iter().map(invite_from_model).collect())
    }
}

fn invite_from_model(model: invitation_codes::Model) -> Invite {
    Invite {
        id: model.id,
        code: model.code,
        expiration_date: model.expiration_date,
        usage_count: model.usage_count,
        max_uses: model.max_uses,
        created_at: model.created_at,
    }
}

// ── Event log ─────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbEventLog {
    pub db: DatabaseConnection,
}

impl EventLog for DbEventLog {
    async fn record(&self, event: SecurityEvent) -> Result<(), GateError> {
        let row = security_events::ActiveModel {
            id: Set(Uuid::new_v4()),
            event_type: Set(event.kind.as_str().to_owned()),
            username: Set(event.username.unwrap_or_else(|| UNKNOWN_ACTOR.to_owned())),
            ip_address: Set(event.ip),
            details: Set(event.details),
            created_at: Set(event.at),
        };
        security_events::Entity::insert(row)
            .exec_without_returning(&self.db)
            .await
            .context("record security event")?;
        Ok(())
    }
}
