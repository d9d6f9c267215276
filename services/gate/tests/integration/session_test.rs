use chrono::Duration;

use parlor_gate::usecase::session::EnsureSessionUseCase;

use crate::helpers::{MemorySessionStore, seed_session, t0, test_policy};

fn usecase(store: &MemorySessionStore) -> EnsureSessionUseCase<MemorySessionStore> {
    EnsureSessionUseCase {
        sessions: store.clone(),
        policy: test_policy(),
    }
}

#[tokio::test]
async fn first_visit_starts_a_session_with_a_csrf_token() {
    let store = MemorySessionStore::new();
    let ensured = usecase(&store).execute(None, t0()).await.unwrap();

    assert!(ensured.restarted);
    assert!(!ensured.session.csrf_token.is_empty());
    assert!(!ensured.session.is_authenticated());
    assert!(store.get(&ensured.id).is_some());
}

#[tokio::test]
async fn return_visit_keeps_the_session_and_refreshes_activity() {
    let store = MemorySessionStore::new();
    let (id, token) = seed_session(&store, t0()).await;

    let later = t0() + Duration::hours(1);
    let ensured = usecase(&store).execute(Some(&id), later).await.unwrap();

    assert!(!ensured.restarted);
    assert_eq!(ensured.id, id);
    assert_eq!(ensured.session.csrf_token, token);
    assert_eq!(ensured.session.last_activity, later);
}

#[tokio::test]
async fn idle_session_is_destroyed_and_replaced() {
    let store = MemorySessionStore::new();
    let (id, _) = seed_session(&store, t0()).await;
    // Simulate a logged-in session so the forced logout is observable.
    {
        let mut session = store.get(&id).unwrap();
        session.sign_in("bob".into(), parlor_gate::domain::types::Role::User);
        use parlor_gate::domain::repository::SessionStore as _;
        store.save(&id, &session).await.unwrap();
    }

    let policy = test_policy();
    let idle = t0() + Duration::seconds(policy.session_inactivity_secs + 10);
    let ensured = usecase(&store).execute(Some(&id), idle).await.unwrap();

    assert!(ensured.restarted);
    assert_ne!(ensured.id, id);
    assert!(!ensured.session.is_authenticated());
    assert!(store.get(&id).is_none(), "stale session must be gone");
}

#[tokio::test]
async fn expired_csrf_token_is_rotated_without_restarting_the_session() {
    let store = MemorySessionStore::new();
    let (id, old_token) = seed_session(&store, t0()).await;

    let policy = test_policy();
    // Past the CSRF timeout but inside the inactivity window: same
    // session, fresh token.
    assert!(policy.csrf_timeout_secs <= policy.session_inactivity_secs);
    let at = t0() + Duration::seconds(policy.csrf_timeout_secs);
    let ensured = usecase(&store).execute(Some(&id), at).await.unwrap();
    assert!(!ensured.restarted);
    assert_eq!(ensured.session.csrf_token, old_token, "not expired yet");

    let at = t0() + Duration::seconds(policy.csrf_timeout_secs + 1);
    let ensured = usecase(&store).execute(Some(&id), at).await.unwrap();
    assert!(!ensured.restarted);
    assert_eq!(ensured.id, id);
    assert_ne!(ensured.session.csrf_token, old_token);
    assert_eq!(ensured.session.csrf_issued_at, at);
}

#[tokio::test]
async fn unknown_session_id_gets_a_fresh_session() {
    let store = MemorySessionStore::new();
    let ensured = usecase(&store)
        .execute(Some("no-such-session"), t0())
        .await
        .unwrap();
    assert!(ensured.restarted);
    assert_ne!(ensured.id, "no-such-session");
}
