mod support;

use std::io::Write;
use std::time::Duration;

use support::*;
use timetable_backend::db::{
    RepositoryBuilder, RepositoryConfig, RepositoryFactory, RepositoryType, SlotRepository,
};
use timetable_backend::notify::{RetryPolicy, DEFAULT_TOPIC};
use timetable_backend::reference::{LocalReferenceData, ReferenceDataProvider};

#[test]
fn test_config_file_with_all_sections() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
[repository]
type = "local"

[notifications]
max_attempts = 5
initial_backoff_ms = 100
topic = "routine.changed"

[reference]
seed_path = "/srv/timetable/reference.json"
"#
    )
    .unwrap();

    let config = RepositoryConfig::from_file(file.path()).unwrap();
    assert_eq!(config.repository_type().unwrap(), RepositoryType::Local);
    assert_eq!(config.notifications.topic, "routine.changed");

    let policy = RetryPolicy::from(&config.notifications);
    assert_eq!(policy.max_attempts, 5);
    assert_eq!(policy.initial_backoff, Duration::from_millis(100));

    let seed = with_scoped_env(&[("REFERENCE_SEED", None)], || config.reference_seed());
    assert_eq!(
        seed.unwrap().to_str(),
        Some("/srv/timetable/reference.json")
    );
}

#[test]
fn test_notification_defaults() {
    let config = RepositoryConfig::from_toml_str("[repository]\ntype = \"memory\"\n").unwrap();
    assert_eq!(config.notifications.max_attempts, 3);
    assert_eq!(config.notifications.topic, DEFAULT_TOPIC);
    assert!(config.reference.seed_path.is_none());
}

#[test]
fn test_reference_seed_env_overrides_file() {
    let config = RepositoryConfig::local();
    let seed = with_scoped_env(&[("REFERENCE_SEED", Some("/tmp/seed.json"))], || {
        config.reference_seed()
    });
    assert_eq!(seed.unwrap().to_str(), Some("/tmp/seed.json"));
}

#[test]
fn test_invalid_config_is_configuration_error() {
    let err = RepositoryConfig::from_toml_str("[repository\n").unwrap_err();
    assert!(err.to_string().contains("Failed to parse config file"));
}

#[tokio::test]
async fn test_factory_builds_local_repository() {
    let repo = RepositoryFactory::create(RepositoryType::Local, None)
        .await
        .unwrap();
    assert!(repo.health_check().await.unwrap());
    assert!(repo.supports_transactions());

    let repo = RepositoryFactory::from_repository_config(&RepositoryConfig::local())
        .await
        .unwrap();
    assert!(repo.health_check().await.unwrap());
}

#[tokio::test]
async fn test_builder_reads_environment() {
    let builder = with_scoped_env(
        &[
            ("REPOSITORY_TYPE", Some("local")),
            ("DATABASE_URL", None),
            ("PG_DATABASE_URL", None),
        ],
        || RepositoryBuilder::new().from_env(),
    )
    .unwrap();
    let repo = builder.build().await.unwrap();
    assert!(repo.health_check().await.unwrap());
}

#[cfg(not(feature = "postgres-repo"))]
#[tokio::test]
async fn test_postgres_without_feature_is_rejected() {
    let err = RepositoryFactory::create(RepositoryType::Postgres, None)
        .await
        .err()
        .unwrap();
    assert!(err.to_string().contains("not enabled"));
}

#[tokio::test]
async fn test_reference_seed_file_round_trip() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(serde_json::to_string(&seed()).unwrap().as_bytes())
        .unwrap();

    let reference = LocalReferenceData::from_json_file(file.path()).unwrap();
    let found = reference.teacher(teacher(2)).await.unwrap();
    assert_eq!(found.name, "Bina Karki");
    assert_eq!(reference.time_slots().await.len(), 8);
    assert!(reference.time_slot(timetable_backend::models::SlotIndex::new(BREAK_SLOT))
        .await
        .unwrap()
        .is_break);
}
