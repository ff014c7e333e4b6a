//! Service-level tests for the flat lifecycle and credential-issuance
//! state machine, run against an in-memory store.

use audix_admin::config::SecurityConfig;
use audix_admin::db::Store;
use audix_admin::entities::{flats, prelude::*};
use audix_admin::services::{
    LifecycleError, LifecycleService, SeaOrmLifecycleService, flat_status, request_status,
};
use sea_orm::{ActiveModelTrait, EntityTrait, Set};

/// Light Argon2 params keep the hashing tests fast.
fn test_security() -> SecurityConfig {
    SecurityConfig {
        argon2_memory_cost_kib: 1024,
        argon2_time_cost: 1,
        argon2_parallelism: 1,
        setup_code_ttl_minutes: 60,
    }
}

async fn spawn_service() -> (Store, SeaOrmLifecycleService) {
    let store = Store::new("sqlite::memory:").await.expect("store");
    let service = SeaOrmLifecycleService::new(store.clone(), test_security());
    (store, service)
}

async fn approved_flat(service: &SeaOrmLifecycleService, flat_id: &str) {
    let id = service
        .create_request(flat_id, "Jane", "")
        .await
        .expect("create request");
    service.approve_request(id).await.expect("approve request");
}

#[tokio::test]
async fn approving_a_request_creates_an_active_flat() {
    let (store, service) = spawn_service().await;

    let id = service
        .create_request("B12", "Jane", "second floor")
        .await
        .expect("create request");

    let flat_id = service.approve_request(id).await.expect("approve");
    assert_eq!(flat_id, "B12");

    let flat = store
        .get_flat("B12")
        .await
        .expect("get flat")
        .expect("flat row");
    assert_eq!(flat.status, flat_status::ACTIVE);
    assert_eq!(flat.strike_count, 0);
    assert_eq!(flat.ban_until, None);
    assert!(!flat.requires_admin_revoke);
    assert_eq!(flat.pin_hash, None);

    let request = store
        .get_request(id)
        .await
        .expect("get request")
        .expect("request row");
    assert_eq!(request.status, request_status::APPROVED);
}

#[tokio::test]
async fn reapproval_preserves_suspension_history() {
    let (store, service) = spawn_service().await;
    approved_flat(&service, "B12").await;

    // Accumulate suspension state as the authentication flow would.
    let flat = store.get_flat("B12").await.unwrap().unwrap();
    let ban_until = (chrono::Utc::now() + chrono::Duration::days(2)).to_rfc3339();
    let mut active: flats::ActiveModel = flat.into();
    active.strike_count = Set(3);
    active.ban_until = Set(Some(ban_until.clone()));
    active.requires_admin_revoke = Set(true);
    active.update(&store.conn).await.expect("seed suspension");

    let second = service
        .create_request("B12", "Jane again", "")
        .await
        .expect("second request");
    service.approve_request(second).await.expect("re-approve");

    let flat = store.get_flat("B12").await.unwrap().unwrap();
    assert_eq!(flat.status, flat_status::ACTIVE);
    assert_eq!(flat.strike_count, 3);
    assert_eq!(flat.ban_until, Some(ban_until));
    assert!(flat.requires_admin_revoke);
}

#[tokio::test]
async fn approving_is_idempotent_but_terminal_states_hold() {
    let (_store, service) = spawn_service().await;

    let id = service.create_request("C3", "Ann", "").await.unwrap();
    service.approve_request(id).await.expect("first approve");
    let again = service.approve_request(id).await.expect("second approve");
    assert_eq!(again, "C3");

    // A rejected request can never be approved afterwards.
    let rejected = service.create_request("C4", "Ben", "").await.unwrap();
    service.reject_request(rejected).await.expect("reject");
    service.reject_request(rejected).await.expect("re-reject is a no-op");
    assert!(matches!(
        service.approve_request(rejected).await,
        Err(LifecycleError::Validation(_))
    ));
    assert!(matches!(
        service.reject_request(id).await,
        Err(LifecycleError::Validation(_))
    ));
}

#[tokio::test]
async fn approving_missing_request_mutates_nothing() {
    let (store, service) = spawn_service().await;

    assert!(matches!(
        service.approve_request(9999).await,
        Err(LifecycleError::RequestNotFound)
    ));
    assert!(matches!(
        service.reject_request(9999).await,
        Err(LifecycleError::RequestNotFound)
    ));

    assert!(store.list_flats(None, 10).await.unwrap().is_empty());
    assert!(store.list_requests(None, 10).await.unwrap().is_empty());
}

#[tokio::test]
async fn requests_list_newest_first_with_status_filter() {
    let (_store, service) = spawn_service().await;

    let first = service.create_request("A1", "One", "").await.unwrap();
    let second = service.create_request("A2", "Two", "").await.unwrap();
    service.reject_request(first).await.unwrap();

    let pending = service
        .list_requests(Some(request_status::PENDING), None)
        .await
        .unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id, second);

    let all = service.list_requests(None, None).await.unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].id, second);
    assert_eq!(all[1].id, first);
}

#[tokio::test]
async fn setup_code_shape_and_pin_invalidation() {
    let (store, service) = spawn_service().await;
    approved_flat(&service, "B12").await;

    // Simulate an already-provisioned device.
    let flat = store.get_flat("B12").await.unwrap().unwrap();
    let mut active: flats::ActiveModel = flat.into();
    active.pin_hash = Set(Some("argon2id$previous".to_string()));
    active.update(&store.conn).await.unwrap();

    let issued = service
        .generate_setup_code("B12", None)
        .await
        .expect("issue code");

    let pattern = regex::Regex::new(r"^[A-HJ-NP-Z]{4}-[2-9]{4}$").unwrap();
    assert!(
        pattern.is_match(&issued.code),
        "unexpected code shape: {}",
        issued.code
    );

    // The flat's device credential is voided by the issuance.
    let flat = store.get_flat("B12").await.unwrap().unwrap();
    assert_eq!(flat.pin_hash, None);

    // Only the hash is persisted.
    let codes = store.list_setup_codes("B12").await.unwrap();
    assert_eq!(codes.len(), 1);
    assert_ne!(codes[0].code_hash, issued.code);
    assert!(codes[0].code_hash.starts_with("$argon2id$"));
    assert_eq!(codes[0].used_at, None);

    let expires = chrono::DateTime::parse_from_rfc3339(&issued.expires_at).expect("expires_at");
    let minutes = (expires.with_timezone(&chrono::Utc) - chrono::Utc::now()).num_minutes();
    assert!((58..=60).contains(&minutes), "ttl was {minutes} minutes");

    let second = service.generate_setup_code("B12", Some(5)).await.unwrap();
    assert_ne!(second.code, issued.code);
    assert_eq!(store.list_setup_codes("B12").await.unwrap().len(), 2);
}

#[tokio::test]
async fn setup_code_for_missing_flat_inserts_nothing() {
    let (store, service) = spawn_service().await;

    assert!(matches!(
        service.generate_setup_code("ghost", None).await,
        Err(LifecycleError::FlatNotFound)
    ));

    let rows = SetupCodes::find().all(&store.conn).await.unwrap();
    assert!(rows.is_empty());
}

#[tokio::test]
async fn flats_listing_is_case_insensitive_and_sorted() {
    let (_store, service) = spawn_service().await;
    approved_flat(&service, "A101").await;
    approved_flat(&service, "B12").await;
    approved_flat(&service, "a205").await;

    let hits = service.list_flats(Some("a1"), None).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].flat_id, "A101");

    let all = service.list_flats(None, None).await.unwrap();
    let ids: Vec<&str> = all.iter().map(|f| f.flat_id.as_str()).collect();
    assert_eq!(ids, vec!["A101", "B12", "a205"]);
}

#[tokio::test]
async fn revoke_ban_clears_both_suspension_mechanisms() {
    let (store, service) = spawn_service().await;
    approved_flat(&service, "B12").await;

    let flat = store.get_flat("B12").await.unwrap().unwrap();
    let mut active: flats::ActiveModel = flat.into();
    active.ban_until = Set(Some((chrono::Utc::now() + chrono::Duration::hours(6)).to_rfc3339()));
    active.requires_admin_revoke = Set(true);
    active.update(&store.conn).await.unwrap();

    service.revoke_ban("B12").await.expect("revoke");

    let flat = store.get_flat("B12").await.unwrap().unwrap();
    assert_eq!(flat.ban_until, None);
    assert!(!flat.requires_admin_revoke);

    assert!(matches!(
        service.revoke_ban("ghost").await,
        Err(LifecycleError::FlatNotFound)
    ));
}

#[tokio::test]
async fn disable_is_a_separate_kill_switch() {
    let (store, service) = spawn_service().await;
    approved_flat(&service, "B12").await;

    service.set_disabled("B12", true).await.expect("disable");
    let flat = store.get_flat("B12").await.unwrap().unwrap();
    assert_eq!(flat.status, flat_status::DISABLED);

    service.set_disabled("B12", false).await.expect("re-enable");
    let flat = store.get_flat("B12").await.unwrap().unwrap();
    assert_eq!(flat.status, flat_status::ACTIVE);

    assert!(matches!(
        service.set_disabled("ghost", true).await,
        Err(LifecycleError::FlatNotFound)
    ));
}

#[tokio::test]
async fn admin_mutations_are_audited() {
    let (store, service) = spawn_service().await;

    let id = service.create_request("B12", "Jane", "").await.unwrap();
    service.approve_request(id).await.unwrap();
    service.generate_setup_code("B12", None).await.unwrap();
    service.revoke_ban("B12").await.unwrap();
    service.set_disabled("B12", true).await.unwrap();

    let entries = AdminAudit::find().all(&store.conn).await.unwrap();
    let actions: Vec<&str> = entries.iter().map(|e| e.action.as_str()).collect();
    assert!(actions.contains(&"request.approve"));
    assert!(actions.contains(&"setup_code.issue"));
    assert!(actions.contains(&"flat.revoke_ban"));
    assert!(actions.contains(&"flat.set_disabled"));
}

#[tokio::test]
async fn validation_rejects_blank_intake_fields() {
    let (_store, service) = spawn_service().await;

    assert!(matches!(
        service.create_request("", "Jane", "").await,
        Err(LifecycleError::Validation(_))
    ));
    assert!(matches!(
        service.create_request("B12", "  ", "").await,
        Err(LifecycleError::Validation(_))
    ));
}
