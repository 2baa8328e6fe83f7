/// Startup and shutdown behavior of the store
use std::sync::Arc;

use habity::storage::migrations;
use habity::*;
use tempfile::tempdir;

#[tokio::test]
async fn test_repository_after_close_returns_empty_results() {
    let dir = tempdir().unwrap();
    let app = Habity::new(DatabaseConfig::new(dir.path()));
    app.initialize().await.unwrap();
    let id = app
        .habits()
        .add_habit(NewHabit::named("Read"))
        .await
        .unwrap();

    app.shutdown().await.unwrap();
    let habits = app.habits();

    assert_eq!(habits.add_habit(NewHabit::named("Late")).await.unwrap(), 0);
    assert!(habits.get_active_habits().await.unwrap().is_empty());
    assert!(habits.get_habit_by_id(id).await.unwrap().is_none());
    assert!(!habits
        .update_habit(
            id,
            HabitChanges {
                name: Some("x".to_string()),
                ..HabitChanges::default()
            }
        )
        .await
        .unwrap());
    assert!(!habits.deactivate_habit(id).await.unwrap());
    assert!(habits.get_logs_for_habit(id).await.unwrap().is_empty());

    // Shutting down twice is harmless
    app.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_close_commits_pending_transaction() {
    let dir = tempdir().unwrap();
    let config = DatabaseConfig::new(dir.path());

    let app = Habity::new(config.clone());
    app.initialize().await.unwrap();

    let db = app.database();
    db.transaction_start().await.unwrap();
    db.execute("INSERT INTO habits (name) VALUES ('Pending')", &[])
        .await
        .unwrap();
    app.shutdown().await.unwrap();

    let reopened = Habity::new(config);
    reopened.initialize().await.unwrap();
    let names: Vec<String> = reopened
        .habits()
        .get_active_habits()
        .await
        .unwrap()
        .into_iter()
        .map(|h| h.name)
        .collect();
    assert_eq!(names, vec!["Pending".to_string()]);
}

#[tokio::test]
async fn test_initialize_is_repeatable() {
    let dir = tempdir().unwrap();
    let db = Arc::new(Database::new(
        &DatabaseConfig::new(dir.path().join("a").join("b")),
        Arc::new(StaticKeyProvider::default()),
    ));
    let app = Habity::from_database(db.clone());

    app.initialize().await.unwrap();
    app.initialize().await.unwrap();

    assert!(!migrations::needs_initialization(&db, &["habits", "logs"]).await);
    assert_eq!(
        migrations::schema_version(&db).await.unwrap(),
        migrations::CURRENT_VERSION
    );
}

#[tokio::test]
async fn test_required_tables_check() {
    let db = Database::in_memory();
    assert!(migrations::needs_initialization(&db, &["habits", "logs"]).await);

    db.execute("CREATE TABLE logs (id INTEGER)", &[]).await.unwrap();
    assert!(migrations::needs_initialization(&db, &["habits", "logs"]).await);

    db.execute("CREATE TABLE habits (id INTEGER)", &[]).await.unwrap();
    assert!(!migrations::needs_initialization(&db, &["habits", "logs"]).await);
}

#[tokio::test]
async fn test_not_a_database_file_is_fatal() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("habity.db"), vec![0x42u8; 4096]).unwrap();

    let app = Habity::new(DatabaseConfig::new(dir.path()));
    let err = app.initialize().await.unwrap_err();
    assert!(matches!(
        err,
        AppError::Database(StorageError::Initialization { .. })
    ));
    assert!(!app.database().is_open().await);

    let reason = app.initializer().last_error().await.unwrap();
    assert!(reason.starts_with("Failed to initialize database"));
}

#[tokio::test]
async fn test_settings_persist_until_reset() {
    let dir = tempdir().unwrap();
    let config = DatabaseConfig::new(dir.path());

    let first = Habity::new(config.clone());
    first.initialize().await.unwrap();
    first.settings().set("language", "en").await.unwrap();
    first.settings().set("week_starts_monday", &true).await.unwrap();
    first.shutdown().await.unwrap();

    let second = Habity::new(config);
    second.initialize().await.unwrap();
    assert_eq!(
        second.settings().get::<String>("language").await.unwrap().as_deref(),
        Some("en")
    );
    assert_eq!(
        second.settings().get::<bool>("week_starts_monday").await.unwrap(),
        Some(true)
    );

    second
        .habits()
        .add_habit(NewHabit::named("Read"))
        .await
        .unwrap();
    second.initializer().reset().await.unwrap();

    assert!(second.settings().keys().await.unwrap().is_empty());
    assert!(second.habits().get_active_habits().await.unwrap().is_empty());
}
