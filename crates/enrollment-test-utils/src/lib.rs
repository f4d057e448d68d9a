//! Testing utilities for the enrollment workspace
//!
//! Shared fixtures for stores, requests and services.

#![allow(missing_docs)]

use chrono::Utc;
use enrollment_core::{
    AccountStatus, Actor, ActorId, EnrollmentConfig, EnrollmentRequest, GuardianInput,
    LoginState, NewAccount, StudentProfile, DEFAULT_PASSWORD_HASH,
};
use enrollment_service::EnrollmentService;
use enrollment_store::InMemoryStore;

pub const STUDENT_TYPE: &str = "Student";

/// Store with one actor and the student account type
pub fn seeded_store() -> (InMemoryStore, ActorId) {
    let store = InMemoryStore::new();
    let actor_id = store.add_actor(Actor::new("Secretaria"));
    store.add_account_type(STUDENT_TYPE);
    (store, actor_id)
}

/// Store with one actor and no account types at all
pub fn store_without_account_types() -> (InMemoryStore, ActorId) {
    let store = InMemoryStore::new();
    let actor_id = store.add_actor(Actor::new("Secretaria"));
    (store, actor_id)
}

pub fn guardian_input(name: &str) -> GuardianInput {
    GuardianInput {
        phone: Some("+244 923 000 000".to_string()),
        email: Some("guardian@example.org".to_string()),
        workplace: Some("Hospital Central".to_string()),
        ..GuardianInput::named(name)
    }
}

pub fn sample_request(student_name: &str) -> EnrollmentRequest {
    EnrollmentRequest::new(guardian_input("Maria Santos"), StudentProfile::named(student_name))
}

/// Existing unlinked account holding `username`
pub fn taken_username(store: &InMemoryStore, username: &str) {
    let account_type = store.add_account_type(STUDENT_TYPE);
    store
        .seed_account(NewAccount {
            display_name: username.to_string(),
            username: username.to_string(),
            password_hash: DEFAULT_PASSWORD_HASH.to_string(),
            account_type_id: account_type.id,
            status: AccountStatus::Active,
            login_state: LoginState::LoggedOut,
            student_id: None,
            must_change_password: false,
            created_at: Utc::now(),
        })
        .unwrap();
}

pub fn setup_service(store: InMemoryStore) -> EnrollmentService<InMemoryStore> {
    EnrollmentService::new(store, EnrollmentConfig::new())
}

pub fn setup_service_with(
    store: InMemoryStore,
    config: EnrollmentConfig,
) -> EnrollmentService<InMemoryStore> {
    EnrollmentService::new(store, config)
}
