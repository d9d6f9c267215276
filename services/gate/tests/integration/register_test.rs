use chrono::Duration;

use parlor_gate::domain::types::{AttemptScope, Role};
use parlor_gate::usecase::invite::InviteRegistry;
use parlor_gate::usecase::password::verify_password;
use parlor_gate::usecase::rate_limit::RateLimiter;
use parlor_gate::usecase::register::{
    RegisterInput, RegisterOutcome, RegisterRejection, RegisterUseCase,
};

use crate::helpers::{
    MemoryAttemptLedger, MemoryBanStore, MemoryEventLog, MemoryInviteStore, MemorySessionStore,
    MemoryUserStore, seed_session, t0, test_invite, test_policy, test_user,
};

struct World {
    sessions: MemorySessionStore,
    attempts: MemoryAttemptLedger,
    bans: MemoryBanStore,
    invites: MemoryInviteStore,
    users: MemoryUserStore,
    events: MemoryEventLog,
}

impl World {
    fn new() -> Self {
        Self {
            sessions: MemorySessionStore::new(),
            attempts: MemoryAttemptLedger::new(),
            bans: MemoryBanStore::new(),
            invites: MemoryInviteStore::new(vec![test_invite(
                "abc123",
                5,
                t0() + Duration::days(7),
            )]),
            users: MemoryUserStore::empty(),
            events: MemoryEventLog::new(),
        }
    }

    fn usecase(
        &self,
    ) -> RegisterUseCase<
        MemorySessionStore,
        MemoryAttemptLedger,
        MemoryBanStore,
        MemoryInviteStore,
        MemoryUserStore,
        MemoryEventLog,
    > {
        RegisterUseCase {
            sessions: self.sessions.clone(),
            limiter: RateLimiter {
                attempts: self.attempts.clone(),
                bans: self.bans.clone(),
                policy: test_policy(),
            },
            invites: InviteRegistry {
                invites: self.invites.clone(),
                policy: test_policy(),
            },
            users: self.users.clone(),
            events: self.events.clone(),
        }
    }

    async fn ip_count(&self, ip: &str) -> i64 {
        use parlor_gate::domain::repository::AttemptLedger as _;
        let window_start = t0().timestamp() - test_policy().lockout_secs;
        self.attempts
            .count_since(AttemptScope::Ip, ip, window_start)
            .await
            .unwrap()
    }
}

fn request(session_id: &str, csrf: &str, username: &str) -> RegisterInput {
    RegisterInput {
        session_id: Some(session_id.to_owned()),
        ip: "1.2.3.4".to_owned(),
        username: username.to_owned(),
        password: "sturdy-pass-9!".to_owned(),
        password_confirm: "sturdy-pass-9!".to_owned(),
        email: Some("new@example.com".to_owned()),
        invite_code: "abc123".to_owned(),
        csrf_token: Some(csrf.to_owned()),
    }
}

#[tokio::test]
async fn successful_registration_creates_user_and_consumes_invite() {
    let world = World::new();
    let (sid, token) = seed_session(&world.sessions, t0()).await;

    let outcome = world
        .usecase()
        .execute(request(&sid, &token, "NewComer"), t0())
        .await
        .unwrap();

    let RegisterOutcome::Success {
        session_id,
        username,
        role,
        csrf_token,
    } = outcome
    else {
        panic!("expected success, got {outcome:?}");
    };
    assert_eq!(session_id, sid);
    assert_eq!(username, "newcomer", "stored lowercase");
    assert_eq!(role, Role::User);
    assert_ne!(csrf_token, token);

    let user = world.users.find("newcomer").expect("user row");
    assert_eq!(user.email.as_deref(), Some("new@example.com"));
    assert!(verify_password("sturdy-pass-9!", &user.password_hash).unwrap());

    assert_eq!(world.invites.get("abc123").unwrap().usage_count, 1);
    let session = world.sessions.get(&sid).unwrap();
    assert_eq!(session.username.as_deref(), Some("newcomer"));
    assert_eq!(world.events.kinds(), vec!["register_success"]);
}

#[tokio::test]
async fn restricted_username_is_rejected_and_temp_bans_the_ip() {
    let world = World::new();
    let (sid, token) = seed_session(&world.sessions, t0()).await;

    let outcome = world
        .usecase()
        .execute(request(&sid, &token, "site_admin_2026"), t0())
        .await
        .unwrap();

    assert!(matches!(
        outcome,
        RegisterOutcome::Rejected(RegisterRejection::RestrictedUsername)
    ));
    let ban = world.bans.get("1.2.3.4").expect("temp ban row");
    assert_eq!(ban.ban_duration, test_policy().restricted_name_ban_secs);
    assert_eq!(world.events.kinds(), vec!["register_failure", "ip_banned"]);
    assert!(world.users.usernames().is_empty());
}

#[tokio::test]
async fn format_problems_reject_with_details_and_count_against_the_ip() {
    let world = World::new();
    let (sid, token) = seed_session(&world.sessions, t0()).await;

    let mut input = request(&sid, &token, "ok_name");
    input.password = "lettersonly".into();
    input.password_confirm = "different-1".into();
    input.invite_code = "WRONG".into();

    let outcome = world.usecase().execute(input, t0()).await.unwrap();
    let RegisterOutcome::Rejected(RegisterRejection::ValidationFailed(details)) = outcome else {
        panic!("expected validation failure, got {outcome:?}");
    };
    assert!(details.contains("Password"));
    assert!(details.contains("do not match"));
    assert!(details.contains("invitation code format"));
    assert_eq!(world.ip_count("1.2.3.4").await, 1);
    assert!(world.users.usernames().is_empty());
}

#[tokio::test]
async fn exhausted_invite_rejects_registration() {
    let world = World::new();
    {
        use parlor_gate::domain::repository::InviteStore as _;
        for _ in 0..5 {
            world.invites.try_consume("abc123", t0()).await.unwrap();
        }
    }
    let (sid, token) = seed_session(&world.sessions, t0()).await;

    let outcome = world
        .usecase()
        .execute(request(&sid, &token, "late_comer"), t0())
        .await
        .unwrap();
    assert!(matches!(
        outcome,
        RegisterOutcome::Rejected(RegisterRejection::InviteExhausted)
    ));
    assert!(world.users.usernames().is_empty());
    assert_eq!(world.invites.get("abc123").unwrap().usage_count, 5);
}

#[tokio::test]
async fn unknown_invite_rejects_registration() {
    let world = World::new();
    let (sid, token) = seed_session(&world.sessions, t0()).await;

    let mut input = request(&sid, &token, "hopeful");
    input.invite_code = "zzz999".into();
    let outcome = world.usecase().execute(input, t0()).await.unwrap();
    assert!(matches!(
        outcome,
        RegisterOutcome::Rejected(RegisterRejection::InviteInvalid)
    ));
}

#[tokio::test]
async fn taken_username_rejects_without_consuming_the_invite() {
    let world = World::new();
    {
        use parlor_gate::domain::repository::UserStore as _;
        world
            .users
            .create(&test_user("newcomer", "whatever-1!"), t0())
            .await
            .unwrap();
    }
    let (sid, token) = seed_session(&world.sessions, t0()).await;

    let outcome = world
        .usecase()
        .execute(request(&sid, &token, "newcomer"), t0())
        .await
        .unwrap();
    assert!(matches!(
        outcome,
        RegisterOutcome::Rejected(RegisterRejection::UsernameTaken)
    ));
    assert_eq!(world.invites.get("abc123").unwrap().usage_count, 0);
}

#[tokio::test]
async fn banned_ip_cannot_register() {
    let world = World::new();
    {
        use parlor_gate::domain::repository::BanStore as _;
        world
            .bans
            .upsert_escalating("1.2.3.4", t0().timestamp(), 600, 86400)
            .await
            .unwrap();
    }
    let (sid, token) = seed_session(&world.sessions, t0()).await;

    let outcome = world
        .usecase()
        .execute(request(&sid, &token, "anyone"), t0())
        .await
        .unwrap();
    assert!(matches!(
        outcome,
        RegisterOutcome::Rejected(RegisterRejection::IpBanned)
    ));
}

#[tokio::test]
async fn bad_csrf_token_destroys_the_session() {
    let world = World::new();
    let (sid, _token) = seed_session(&world.sessions, t0()).await;

    let outcome = world
        .usecase()
        .execute(request(&sid, "forged", "whoever"), t0())
        .await
        .unwrap();
    assert!(matches!(
        outcome,
        RegisterOutcome::Rejected(RegisterRejection::CsrfInvalid)
    ));
    assert!(world.sessions.get(&sid).is_none());
}
