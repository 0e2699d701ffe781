#![forbid(unsafe_code)]

use it_core::{Role, Username};
use it_storage::{AccountStore, NewAccount, StoreError};
use std::path::PathBuf;

fn temp_dir(test_name: &str) -> PathBuf {
    let base = std::env::temp_dir();
    let pid = std::process::id();
    let nonce = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    let dir = base.join(format!("it_storage_{test_name}_{pid}_{nonce}"));
    std::fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

fn new_account(username: &str, password: &str, role: Role) -> NewAccount {
    NewAccount {
        username: Username::try_new(username).expect("username"),
        password: password.to_string(),
        role,
        folder_ref: Some(format!("{username}-folder")),
        created_at_ms: 1_000,
    }
}

#[test]
fn duplicate_registration_leaves_the_original_untouched() {
    let dir = temp_dir("duplicate_registration_leaves_the_original_untouched");
    let mut store = AccountStore::open(&dir).expect("open store");

    let original = store
        .create(new_account("7376221CS101", "first-pass", Role::Student))
        .expect("create");

    let mut second = new_account("7376221CS101", "second-pass", Role::Teacher);
    second.folder_ref = Some("other".to_string());
    second.created_at_ms = 2_000;
    let err = store.create(second).expect_err("duplicate");
    assert!(matches!(err, StoreError::AccountExists));

    let username = Username::try_new("7376221CS101").expect("username");
    let stored = store
        .find_by_username(&username)
        .expect("find")
        .expect("account exists");
    assert_eq!(stored, original);
    assert!(
        store
            .verify_credentials(&username, "first-pass")
            .expect("verify")
            .is_some()
    );
    assert!(
        store
            .verify_credentials(&username, "second-pass")
            .expect("verify")
            .is_none()
    );
}

#[test]
fn credentials_are_checked_against_the_hash() {
    let dir = temp_dir("credentials_are_checked_against_the_hash");
    let mut store = AccountStore::open(&dir).expect("open store");
    store
        .create(new_account("teacher1", "hunter2", Role::Teacher))
        .expect("create");

    let username = Username::try_new("teacher1").expect("username");
    let account = store
        .verify_credentials(&username, "hunter2")
        .expect("verify")
        .expect("valid credentials");
    assert_eq!(account.role, Role::Teacher);
    assert!(
        store
            .verify_credentials(&username, " hunter2 ")
            .expect("verify")
            .is_none()
    );

    let unknown = Username::try_new("nobody").expect("username");
    assert!(
        store
            .verify_credentials(&unknown, "hunter2")
            .expect("verify")
            .is_none()
    );
}

#[test]
fn empty_password_is_rejected() {
    let dir = temp_dir("empty_password_is_rejected");
    let mut store = AccountStore::open(&dir).expect("open store");
    let err = store
        .create(new_account("student1", "", Role::Student))
        .expect_err("empty password");
    assert!(matches!(err, StoreError::InvalidInput(_)));
}

#[test]
fn sessions_expire_and_can_be_revoked() {
    let dir = temp_dir("sessions_expire_and_can_be_revoked");
    let mut store = AccountStore::open(&dir).expect("open store");
    store
        .create(new_account("student1", "pw", Role::Student))
        .expect("create");
    let username = Username::try_new("student1").expect("username");

    let session = store
        .create_session(&username, 10_000, 500)
        .expect("create session");
    assert_eq!(session.token.len(), 64);
    assert_eq!(session.expires_at_ms, 10_500);

    let account = store
        .resolve_session(&session.token, 10_100)
        .expect("resolve")
        .expect("live session");
    assert_eq!(account.username, username);
    assert!(
        store
            .resolve_session("not-a-token", 10_100)
            .expect("resolve")
            .is_none()
    );

    assert!(
        store
            .resolve_session(&session.token, 10_500)
            .expect("resolve")
            .is_none(),
        "expired at the boundary"
    );
    assert!(
        !store.revoke_session(&session.token).expect("revoke"),
        "expired session was already removed"
    );

    let other = store
        .create_session(&username, 20_000, 500)
        .expect("create session");
    assert!(store.revoke_session(&other.token).expect("revoke"));
    assert!(
        store
            .resolve_session(&other.token, 20_001)
            .expect("resolve")
            .is_none()
    );
}

#[test]
fn purge_drops_only_expired_sessions() {
    let dir = temp_dir("purge_drops_only_expired_sessions");
    let mut store = AccountStore::open(&dir).expect("open store");
    store
        .create(new_account("student1", "pw", Role::Student))
        .expect("create");
    let username = Username::try_new("student1").expect("username");

    store.create_session(&username, 0, 100).expect("short");
    let long = store.create_session(&username, 0, 10_000).expect("long");

    assert_eq!(store.purge_expired_sessions(5_000).expect("purge"), 1);
    assert!(
        store
            .resolve_session(&long.token, 5_000)
            .expect("resolve")
            .is_some()
    );
}

#[test]
fn folder_ref_can_be_recorded_later() {
    let dir = temp_dir("folder_ref_can_be_recorded_later");
    let mut store = AccountStore::open(&dir).expect("open store");
    let mut account = new_account("student1", "pw", Role::Student);
    account.folder_ref = None;
    store.create(account).expect("create");
    let username = Username::try_new("student1").expect("username");

    store
        .set_folder_ref(&username, "folders/student1")
        .expect("set folder");
    let stored = store
        .find_by_username(&username)
        .expect("find")
        .expect("exists");
    assert_eq!(stored.folder_ref.as_deref(), Some("folders/student1"));

    let ghost = Username::try_new("ghost").expect("username");
    assert!(matches!(
        store.set_folder_ref(&ghost, "x"),
        Err(StoreError::UnknownAccount)
    ));
}

#[test]
fn delete_removes_the_account_and_its_sessions() {
    let dir = temp_dir("delete_removes_the_account_and_its_sessions");
    let mut store = AccountStore::open(&dir).expect("open store");
    store
        .create(new_account("student1", "pw", Role::Student))
        .expect("create");
    let username = Username::try_new("student1").expect("username");
    let session = store.create_session(&username, 0, 10_000).expect("session");

    assert!(store.delete(&username).expect("delete"));
    assert!(store.find_by_username(&username).expect("find").is_none());
    assert!(
        store
            .resolve_session(&session.token, 1)
            .expect("resolve")
            .is_none()
    );
    assert!(!store.delete(&username).expect("second delete"));

    store
        .create(new_account("student1", "again", Role::Student))
        .expect("name is free again");
}

#[test]
fn stored_hashes_are_argon2_phc_strings() {
    let dir = temp_dir("stored_hashes_are_argon2_phc_strings");
    let mut store = AccountStore::open(&dir).expect("open store");
    store
        .create(new_account("student1", "pw", Role::Student))
        .expect("create");
    drop(store);

    let conn = rusqlite::Connection::open(dir.join("interntrack_accounts.db")).expect("open db");
    let hash: String = conn
        .query_row(
            "SELECT password_hash FROM accounts WHERE username = 'student1'",
            [],
            |row| row.get(0),
        )
        .expect("row");
    assert!(hash.starts_with("$argon2id$"), "{hash}");
    assert!(!hash.contains("pw$"));
}
