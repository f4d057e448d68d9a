//! End-to-end enrollment against the in-memory store

use enrollment_core::{
    AccountStatus, ActorId, EnrollmentConfig, EnrollmentError, EnrollmentResult, ErrorKind,
    ErrorResponse, LoginState, RecordStatus, DEFAULT_PASSWORD_HASH,
};
use enrollment_service::EnrollmentService;
use enrollment_store::{Fault, InMemoryStore, StoreCounts};
use enrollment_test_utils::{
    sample_request, seeded_store, setup_service, setup_service_with, store_without_account_types,
    taken_username,
};
use pretty_assertions::assert_eq;

const EMPTY: StoreCounts = StoreCounts {
    guardians: 0,
    students: 0,
    accounts: 0,
};

async fn enroll(
    service: &EnrollmentService<InMemoryStore>,
    actor_id: ActorId,
    name: &str,
) -> Result<EnrollmentResult, EnrollmentError> {
    service
        .create_student_with_guardian(&sample_request(name), actor_id)
        .await
}

#[tokio::test]
async fn creates_guardian_student_and_account() {
    let (store, actor_id) = seeded_store();
    let service = setup_service(store.clone());

    let result = enroll(&service, actor_id, "João da Silva").await.unwrap();

    assert!(result.success);
    assert_eq!(result.message, "Student created successfully");
    assert_eq!(result.data.student.name(), "João da Silva");
    assert_eq!(result.data.guardian.name, "Maria Santos");
    assert_eq!(result.data.guardian.status, RecordStatus::Active);
    assert_eq!(result.data.student.guardian_id, result.data.guardian.id);
    assert_eq!(result.data.student.actor_id, actor_id);
    assert_eq!(result.data.guardian.actor_id, actor_id);

    assert_eq!(
        store.counts(),
        StoreCounts {
            guardians: 1,
            students: 1,
            accounts: 1
        }
    );
    assert_eq!(store.guardians(), vec![result.data.guardian.clone()]);
    assert_eq!(store.students(), vec![result.data.student.clone()]);

    let account = store.account_for_student(result.data.student.id).unwrap();
    assert_eq!(account.username, "joao.da");
    assert_eq!(account.display_name, "João da Silva");
    assert_eq!(account.student_id, Some(result.data.student.id));
}

#[tokio::test]
async fn provisions_account_with_default_credential() {
    let (store, actor_id) = seeded_store();
    let service = setup_service(store.clone());

    let result = enroll(&service, actor_id, "Ana").await.unwrap();
    let account = store.account_for_student(result.data.student.id).unwrap();

    assert_eq!(account.username, "ana");
    assert_eq!(account.password_hash, DEFAULT_PASSWORD_HASH);
    assert_eq!(account.status, AccountStatus::Active);
    assert_eq!(account.login_state, LoginState::LoggedOut);
    assert!(account.must_change_password);
}

#[tokio::test]
async fn configured_credential_and_reset_flag_are_applied() {
    let (store, actor_id) = seeded_store();
    let config = EnrollmentConfig::new()
        .with_default_password_hash("$2b$10$deploymentspecificplaceholderhashvalue")
        .with_password_reset(false);
    let service = setup_service_with(store.clone(), config);

    let result = enroll(&service, actor_id, "Ana").await.unwrap();
    let account = store.account_for_student(result.data.student.id).unwrap();

    assert_eq!(
        account.password_hash,
        "$2b$10$deploymentspecificplaceholderhashvalue"
    );
    assert!(!account.must_change_password);
}

#[tokio::test]
async fn result_does_not_expose_the_account() {
    let (store, actor_id) = seeded_store();
    let service = setup_service(store);

    let result = enroll(&service, actor_id, "Ana").await.unwrap();
    let json = serde_json::to_value(&result).unwrap();

    let data = json["data"].as_object().unwrap();
    let mut keys: Vec<_> = data.keys().cloned().collect();
    keys.sort();
    assert_eq!(keys, vec!["guardian".to_string(), "student".to_string()]);
    let text = json.to_string();
    assert!(!text.contains("password_hash"));
    assert!(!text.contains("username"));
}

#[tokio::test]
async fn same_name_gets_suffixed_usernames() {
    let (store, actor_id) = seeded_store();
    let service = setup_service(store.clone());

    let mut usernames = Vec::new();
    for _ in 0..3 {
        let result = enroll(&service, actor_id, "João da Silva").await.unwrap();
        let account = store.account_for_student(result.data.student.id).unwrap();
        usernames.push(account.username);
    }

    assert_eq!(usernames, vec!["joao.da", "joao.da1", "joao.da2"]);
    assert_eq!(store.counts().accounts, 3);
}

#[tokio::test]
async fn pre_existing_accounts_are_skipped() {
    let (store, actor_id) = seeded_store();
    taken_username(&store, "ana");
    taken_username(&store, "ana1");
    let service = setup_service(store.clone());

    let result = enroll(&service, actor_id, "ANA").await.unwrap();
    let account = store.account_for_student(result.data.student.id).unwrap();

    assert_eq!(account.username, "ana2");
}

#[tokio::test]
async fn unknown_actor_is_rejected_without_writes() {
    let (store, _) = seeded_store();
    let service = setup_service(store.clone());
    let stranger = ActorId::new();

    for _ in 0..2 {
        let err = enroll(&service, stranger, "Ana").await.unwrap_err();
        assert!(matches!(&err, EnrollmentError::ActorNotFound(id) if *id == stranger));
        assert_eq!(err.status_code(), 404);
        assert_eq!(store.counts(), EMPTY);
    }
}

#[tokio::test]
async fn unusable_names_are_rejected_without_writes() {
    let (store, actor_id) = seeded_store();
    let service = setup_service(store.clone());

    for name in ["", "   ", "!!! ???", "¿¡"] {
        let err = enroll(&service, actor_id, name).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidRequest, "{name:?}");
        assert_eq!(err.status_code(), 422);
    }
    assert_eq!(store.counts(), EMPTY);
}

#[tokio::test]
async fn missing_account_type_rolls_everything_back() {
    let (store, actor_id) = store_without_account_types();
    let service = setup_service(store.clone());

    let err = enroll(&service, actor_id, "Ana").await.unwrap_err();

    assert!(matches!(
        &err,
        EnrollmentError::AccountTypeMissing { designation } if designation == "Student"
    ));
    assert_eq!(err.kind(), ErrorKind::Configuration);
    assert_eq!(store.counts(), EMPTY);
}

#[tokio::test]
async fn configured_account_type_is_used() {
    let (store, actor_id) = seeded_store();
    let aluno = store.add_account_type("Aluno");
    let service = setup_service_with(
        store.clone(),
        EnrollmentConfig::new().with_student_account_type("Aluno"),
    );

    let result = enroll(&service, actor_id, "Ana").await.unwrap();
    let account = store.account_for_student(result.data.student.id).unwrap();

    assert_eq!(account.account_type_id, aluno.id);
}

#[tokio::test]
async fn failure_at_any_write_leaves_store_unchanged() {
    for fault in [
        Fault::GuardianInsert,
        Fault::StudentInsert,
        Fault::AccountInsert,
        Fault::Commit,
    ] {
        let (store, actor_id) = seeded_store();
        let service = setup_service(store.clone());
        store.inject_fault(fault);

        let err = enroll(&service, actor_id, "Ana").await.unwrap_err();

        assert!(matches!(err, EnrollmentError::Store(_)), "{fault:?}");
        assert_eq!(err.kind(), ErrorKind::OperationFailed, "{fault:?}");
        assert_eq!(store.counts(), EMPTY, "{fault:?}");
    }
}

#[tokio::test]
async fn store_recovers_after_a_failed_enrollment() {
    let (store, actor_id) = seeded_store();
    let service = setup_service(store.clone());
    store.inject_fault(Fault::AccountInsert);

    assert!(enroll(&service, actor_id, "Ana").await.is_err());
    let result = enroll(&service, actor_id, "Ana").await.unwrap();

    let account = store.account_for_student(result.data.student.id).unwrap();
    assert_eq!(account.username, "ana");
    assert_eq!(store.counts().guardians, 1);
}

#[tokio::test]
async fn username_taken_at_insert_moves_to_next_candidate() {
    let (store, actor_id) = seeded_store();
    let service = setup_service(store.clone());
    store.inject_fault(Fault::AccountUsernameTaken);

    let result = enroll(&service, actor_id, "Ana").await.unwrap();
    let account = store.account_for_student(result.data.student.id).unwrap();

    assert_eq!(account.username, "ana1");
    assert_eq!(store.counts().accounts, 1);
}

#[tokio::test]
async fn commit_conflict_retries_whole_transaction() {
    let (store, actor_id) = seeded_store();
    let service = setup_service(store.clone());
    store.inject_fault(Fault::CommitConflict);

    let result = enroll(&service, actor_id, "Ana").await.unwrap();

    assert_eq!(
        store.counts(),
        StoreCounts {
            guardians: 1,
            students: 1,
            accounts: 1
        }
    );
    assert_eq!(store.students(), vec![result.data.student]);
}

#[tokio::test]
async fn commit_conflict_without_retry_budget_fails_cleanly() {
    let (store, actor_id) = seeded_store();
    let service = setup_service_with(
        store.clone(),
        EnrollmentConfig::new().with_commit_attempts(1),
    );
    store.inject_fault(Fault::CommitConflict);

    let err = enroll(&service, actor_id, "Ana").await.unwrap_err();

    assert!(matches!(&err, EnrollmentError::Store(e) if e.is_username_conflict()));
    assert_eq!(err.kind(), ErrorKind::OperationFailed);
    assert_eq!(store.counts(), EMPTY);
}

#[tokio::test]
async fn username_space_exhaustion_is_reported() {
    let (store, actor_id) = seeded_store();
    taken_username(&store, "ana");
    taken_username(&store, "ana1");
    let service = setup_service_with(
        store.clone(),
        EnrollmentConfig::new().with_max_username_attempts(2),
    );

    let err = enroll(&service, actor_id, "Ana").await.unwrap_err();

    assert!(matches!(
        &err,
        EnrollmentError::UsernameExhausted { base, attempts: 2 } if base == "ana"
    ));
    assert_eq!(
        store.counts(),
        StoreCounts {
            accounts: 2,
            ..EMPTY
        }
    );
}

#[tokio::test]
async fn error_responses_hide_root_causes() {
    let (store, actor_id) = seeded_store();
    let service = setup_service(store.clone());
    store.inject_fault(Fault::Commit);

    let err = enroll(&service, actor_id, "Ana").await.unwrap_err();
    let response = ErrorResponse::from_error(&err);

    assert_eq!(
        response,
        ErrorResponse {
            status: 500,
            kind: ErrorKind::OperationFailed,
            message: "Failed to create student with guardian".to_string(),
        }
    );

    let err = enroll(&service, ActorId::new(), "Ana").await.unwrap_err();
    let response = ErrorResponse::from(&err);
    assert_eq!(response.status, 404);
    assert_eq!(response.message, "Actor not found");
}
