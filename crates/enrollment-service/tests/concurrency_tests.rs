//! Concurrent enrollments racing for the same username

use enrollment_core::EnrollmentConfig;
use enrollment_test_utils::{sample_request, seeded_store, setup_service_with};
use futures::future::join_all;
use std::collections::BTreeSet;
use std::sync::Arc;

const CONCURRENT: usize = 20;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_enrollments_get_distinct_usernames() {
    let (store, actor_id) = seeded_store();
    let config = EnrollmentConfig::new().with_commit_attempts(CONCURRENT as u32 + 1);
    let service = Arc::new(setup_service_with(store.clone(), config));

    let handles = (0..CONCURRENT).map(|_| {
        let service = Arc::clone(&service);
        tokio::spawn(async move {
            service
                .create_student_with_guardian(&sample_request("João da Silva"), actor_id)
                .await
        })
    });
    let results = join_all(handles).await;

    for result in results {
        let enrolled = result.unwrap().unwrap();
        assert!(enrolled.success);
    }

    let counts = store.counts();
    assert_eq!(counts.guardians, CONCURRENT);
    assert_eq!(counts.students, CONCURRENT);
    assert_eq!(counts.accounts, CONCURRENT);

    let usernames: BTreeSet<String> = store.accounts().into_iter().map(|a| a.username).collect();
    assert_eq!(usernames.len(), CONCURRENT);
    assert!(usernames.contains("joao.da"));
    for username in &usernames {
        assert!(username.starts_with("joao.da"), "{username}");
    }

    for student in store.students() {
        let account = store.account_for_student(student.id).unwrap();
        assert_eq!(account.student_id, Some(student.id));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn different_names_do_not_interfere() {
    let (store, actor_id) = seeded_store();
    let service = Arc::new(setup_service_with(store.clone(), EnrollmentConfig::new()));

    let names = ["Ana Paula", "Bruno Costa", "Carla Mendes", "Diogo Neto"];
    let handles = names.iter().map(|name| {
        let service = Arc::clone(&service);
        let request = sample_request(name);
        tokio::spawn(async move { service.create_student_with_guardian(&request, actor_id).await })
    });

    for result in join_all(handles).await {
        result.unwrap().unwrap();
    }

    let usernames: BTreeSet<String> = store.accounts().into_iter().map(|a| a.username).collect();
    let expected: BTreeSet<String> = ["ana.paula", "bruno.costa", "carla.mendes", "diogo.neto"]
        .into_iter()
        .map(String::from)
        .collect();
    assert_eq!(usernames, expected);
}
